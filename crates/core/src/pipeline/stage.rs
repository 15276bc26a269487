//! Stage descriptors: the fixed, ordered list of external scripts.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::StagesConfig;
use crate::process::Invocation;

/// How a stage's arguments are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentRule {
    /// One invocation with the run configuration path.
    RunConfig,
    /// One invocation per document in the processing area, its path as the sole argument.
    PerDocument,
}

/// Part of the run a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    Preprocessing,
    Acquiring,
    Analyzing,
}

/// One step of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageDescriptor {
    pub name: String,
    pub program: String,
    pub script: String,
    pub args: ArgumentRule,
    /// Used in progress messages.
    pub label: String,
    pub phase: StagePhase,
}

impl StageDescriptor {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        script: impl Into<String>,
        args: ArgumentRule,
        label: impl Into<String>,
        phase: StagePhase,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            script: script.into(),
            args,
            label: label.into(),
            phase,
        }
    }

    /// `program script argument`
    pub fn invocation(&self, argument: &Path) -> Invocation {
        Invocation::new(
            self.script.clone(),
            self.program.clone(),
            [self.script.clone(), argument.display().to_string()],
        )
    }
}

/// Build the pipeline: preprocess, acquire, then analyze each document.
pub fn stages_from_config(config: &StagesConfig) -> Arc<[StageDescriptor]> {
    Arc::from(vec![
        StageDescriptor::new(
            "preprocess",
            &config.interpreter,
            &config.preprocess,
            ArgumentRule::RunConfig,
            "Preprocessing",
            StagePhase::Preprocessing,
        ),
        StageDescriptor::new(
            "acquire",
            &config.interpreter,
            &config.acquire,
            ArgumentRule::RunConfig,
            "Document download",
            StagePhase::Acquiring,
        ),
        StageDescriptor::new(
            "analyze",
            &config.interpreter,
            &config.analyze,
            ArgumentRule::PerDocument,
            "Document analysis",
            StagePhase::Analyzing,
        ),
    ])
}
