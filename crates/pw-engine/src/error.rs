// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime.

use pw_core::PipelineError;
use thiserror::Error;

/// Errors the engine can raise, covering factory/registry (config)
/// failures, execute-time resolution failures, and execution proper.
/// Wraps `pw_core::PipelineError` for the data-model-level variants so
/// a single type flows through `Pipeline::execute`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("unknown step type: {0}")]
    UnknownStepType(String),

    #[error("step '{step}' missing required key '{key}'")]
    MissingConfigKey { step: String, key: String },

    #[error("step '{step}': invalid value for '{key}': {reason}")]
    InvalidConfigValue {
        step: String,
        key: String,
        reason: String,
    },

    #[error("jump target '{0}' does not exist in this pipeline")]
    UnknownNextStep(String),

    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("execution cancelled: {0}")]
    Cancelled(String),

    #[error("execution timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("{message}")]
    Compensated {
        message: String,
        #[source]
        primary: Box<EngineError>,
    },

    #[error("definition '{0}' not registered")]
    DefinitionNotFound(String),

    #[error("state machine instance '{0}' not found")]
    InstanceNotFound(String),

    #[error("duplicate instance id: {0}")]
    DuplicateInstance(String),

    #[error("transition '{event}' not allowed from state '{state}'")]
    TransitionNotAllowed { event: String, state: String },

    #[error("unknown transition event: {0}")]
    UnknownTransition(String),

    #[error("state '{0}' is final; no further transitions accepted")]
    TerminalState(String),

    #[error("guard rejected transition '{0}'")]
    GuardRejected(String),

    #[error("service '{0}' not found")]
    ServiceNotFound(String),

    #[error("service '{service}' does not implement {capability}")]
    ServiceCapabilityMismatch { service: String, capability: String },

    #[error("circuit breaker open for step '{0}'")]
    CircuitOpen(String),
}

impl EngineError {
    /// Wrap the original failure that triggered compensation together
    /// with the (optional) first compensation-step error. The primary
    /// cause is always preserved — compensation failures are reported
    /// in addition to it, never instead of it (spec.md §7).
    pub fn compensated(primary: EngineError, compensation_error: Option<String>) -> EngineError {
        let suffix = match &compensation_error {
            Some(err) => format!(" (compensation executed; compensation error: {err})"),
            None => " (compensation executed)".to_string(),
        };
        EngineError::Compensated {
            message: format!("{primary}{suffix}"),
            primary: Box::new(primary),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
