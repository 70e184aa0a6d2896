// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution event schema emitted by the pipeline executor.
//!
//! Recording is best-effort: an `EventRecorder` is an optional
//! collaborator and its errors must never fail the pipeline (see
//! `Pipeline::execute` in `pw-engine`).

use crate::id::ExecutionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The ten event types the executor emits, per the pipeline lifecycle.
///
/// Wire names use dots (`execution.started`, `step.failed`, ...), not
/// the default snake_case of the Rust variant names, matching how the
/// teacher's own `core::event::Event` pins stable wire tags with
/// per-variant `#[serde(rename = "...")]` rather than relying on
/// `rename_all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventPayload {
    #[serde(rename = "execution.started")]
    ExecutionStarted { pipeline: String },
    #[serde(rename = "execution.completed")]
    ExecutionCompleted { pipeline: String },
    #[serde(rename = "execution.failed")]
    ExecutionFailed { pipeline: String, error: String },
    #[serde(rename = "step.started")]
    StepStarted { step: String },
    #[serde(rename = "step.completed")]
    StepCompleted { step: String, elapsed: Duration },
    #[serde(rename = "step.failed")]
    StepFailed { step: String, error: String, elapsed: Duration },
    #[serde(rename = "step.skipped")]
    StepSkipped { step: String, error: String },
    #[serde(rename = "step.compensated")]
    StepCompensated { step: String },
    #[serde(rename = "saga.compensating")]
    SagaCompensating { steps: Vec<String> },
    #[serde(rename = "saga.compensated")]
    SagaCompensated,
}

/// A single emitted event: execution id, monotonic sequence number,
/// and the type-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub execution_id: ExecutionId,
    pub sequence: u64,
    pub payload: EventPayload,
}

/// Optional collaborator that records events as the executor emits
/// them. Implementations must be non-blocking-semantic — the executor
/// never waits on a recording to affect step timing, and a recorder
/// that errors is logged and otherwise ignored.
pub trait EventRecorder: Send + Sync {
    fn record(&self, event: PipelineEvent) -> Result<(), String>;
}

/// An `EventRecorder` that drops every event; the default when a
/// pipeline is constructed without an explicit recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventRecorder;

impl EventRecorder for NullEventRecorder {
    fn record(&self, _event: PipelineEvent) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
