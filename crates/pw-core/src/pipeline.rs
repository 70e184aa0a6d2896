// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline definition: the named, ordered sequence of step configs
//! plus its error-handling policy, timeout, and compensation list.
//!
//! This is the static, config-derived shape built once at load time
//! (`pw-engine::registry` turns it into a runnable `Pipeline` of live
//! `Step` trait objects). It stays in `pw-core` because step factories
//! in `pw-engine` need to read `StepConfig` values, and `pw-core` must
//! not depend back on `pw-engine`.

use crate::value::Value;
use indexmap::IndexMap;
use std::time::Duration;

/// Circuit breaker on `NextStep` jumps: a pipeline that jumps back to
/// the same step more than this many times fails instead of looping
/// forever (see SPEC_FULL.md Open Question #1 — backward jumps are
/// allowed, bounded by this guard).
pub const MAX_STEP_VISITS: u32 = 5;

/// How a pipeline reacts when a step returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnError {
    #[default]
    Stop,
    Skip,
    Compensate,
}

/// A single step's configuration as read from the pipeline definition:
/// `type` and `name` are pulled out explicitly because the factory
/// protocol always needs them; everything else stays in `params` for
/// the step's own factory to interpret.
#[derive(Debug, Clone, PartialEq)]
pub struct StepConfig {
    pub step_type: String,
    pub name: String,
    pub params: IndexMap<String, Value>,
}

impl StepConfig {
    pub fn new(step_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            step_type: step_type.into(),
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// A named, ordered sequence of step configs plus its error-handling
/// policy. Constructed once at configuration load time; `pw_engine`'s
/// `RunnablePipeline` is what actually gets executed concurrently.
#[derive(Debug, Clone)]
pub struct PipelineDefinition {
    pub name: String,
    pub steps: Vec<StepConfig>,
    pub on_error: OnError,
    pub timeout: Option<Duration>,
    pub compensation: Vec<StepConfig>,
    /// Original path template (e.g. `/orders/:id`) for steps that
    /// extract path parameters from an HTTP trigger.
    pub route_pattern: Option<String>,
    pub metadata: IndexMap<String, Value>,
}

impl PipelineDefinition {
    pub fn new(name: impl Into<String>, steps: Vec<StepConfig>) -> Self {
        Self {
            name: name.into(),
            steps,
            on_error: OnError::default(),
            timeout: None,
            compensation: Vec::new(),
            route_pattern: None,
            metadata: IndexMap::new(),
        }
    }

    pub fn position_of(&self, step_name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == step_name)
    }
}

/// The value a step returns. `output` is merged into `StepOutputs` by
/// the executor; whether it is also merged into `Current` is left to
/// each step's own discretion (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    pub output: Option<IndexMap<String, Value>>,
    pub stop: bool,
    pub next_step: Option<String>,
}

impl StepResult {
    pub fn ok(output: IndexMap<String, Value>) -> Self {
        Self {
            output: Some(output),
            stop: false,
            next_step: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn stopping(output: IndexMap<String, Value>) -> Self {
        Self {
            output: Some(output),
            stop: true,
            next_step: None,
        }
    }

    pub fn jumping_to(mut self, next_step: impl Into<String>) -> Self {
        self.next_step = Some(next_step.into());
        self
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
