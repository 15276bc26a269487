use std::sync::Arc;

use docrunner_core::{
    Authenticator, Config, EnvFile, PipelineOrchestrator, ProcessRunner, RunConfigStore,
    RunSupervisor, SanitizedConfig,
};

/// Orchestrator behind a type-erased runner, so tests can swap in a mock.
pub type Orchestrator = PipelineOrchestrator<dyn ProcessRunner>;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    orchestrator: Arc<Orchestrator>,
    supervisor: RunSupervisor,
    run_config: RunConfigStore,
    env_file: EnvFile,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        let run_config = RunConfigStore::new(config.workspace.run_config_path());
        let env_file = EnvFile::new(config.workspace.env_file_path());

        Self {
            config,
            authenticator,
            orchestrator,
            supervisor: RunSupervisor::new(),
            run_config,
            env_file,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn supervisor(&self) -> &RunSupervisor {
        &self.supervisor
    }

    pub fn run_config(&self) -> &RunConfigStore {
        &self.run_config
    }

    pub fn env_file(&self) -> &EnvFile {
        &self.env_file
    }

    /// Capacity of a run's event channel.
    pub fn event_buffer_size(&self) -> usize {
        self.config.events.buffer_size
    }
}
