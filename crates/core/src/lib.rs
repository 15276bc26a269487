pub mod auth;
pub mod config;
pub mod env_file;
pub mod events;
pub mod metrics;
pub mod pipeline;
pub mod process;
pub mod run_config;
pub mod supervisor;
pub mod testing;
pub mod workdir;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, LoginSession,
    NoneAuthenticator, SessionAuthenticator, SESSION_COOKIE,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig, StagesConfig, WorkspaceConfig,
};
pub use env_file::{EnvFile, EnvFileError, LLM_PROVIDER};
pub use events::{EventKind, EventStream, RunEvent};
pub use pipeline::{
    stages_from_config, ArgumentRule, PipelineError, PipelineOrchestrator, RunOutcome, RunPhase,
    RunReport, StageDescriptor, StagePhase,
};
pub use process::{
    CommandRunner, Invocation, OutputLine, OutputOrigin, ProcessError, ProcessOutcome,
    ProcessRunner, RunnerConfig, RunningProcess,
};
pub use run_config::{NewRunConfiguration, RunConfigError, RunConfigStore, RunConfiguration};
pub use supervisor::{ActiveRun, RunGuard, RunSupervisor, SupervisorError};
pub use workdir::{DirectoryReconciler, ExtensionFilter, MigrationSummary, ReconcileError};
