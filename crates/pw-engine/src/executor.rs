// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline executor: the sequential driver that turns a
//! `PipelineDefinition` plus its live `Step` objects into a runnable
//! pipeline, and carries one invocation through to completion
//! (spec.md §4.1).
//!
//! Cancellation and pipeline-level timeout are unified: the whole
//! step-loop future is wrapped in `tokio::time::timeout` when a
//! timeout is configured. There is no separate cancellation token —
//! dropping that future mid-`await` (whether because the deadline
//! passed or the caller abandoned the call) is itself the
//! cancellation, consistent with how futures are cancelled throughout
//! this codebase.

use crate::error::EngineError;
use crate::registry::{AppContext, RegistryAccessor, Step, StepRegistry};
use indexmap::IndexMap;
use pw_core::{
    iso8601_ms, Clock, EventPayload, EventRecorder, ExecutionId, IdGen, OnError, PipelineContext,
    PipelineDefinition, ResponseSink, Value, MAX_STEP_VISITS,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Stamps a monotonically increasing sequence number onto every event
/// and forwards it to the recorder. Held by shared reference across
/// the whole execution so composite steps and the main loop can emit
/// through the same counter without fighting the borrow checker over
/// `&mut` across `.await` points.
struct EventSequencer<'a> {
    recorder: &'a dyn EventRecorder,
    execution_id: ExecutionId,
    counter: AtomicU64,
}

impl<'a> EventSequencer<'a> {
    fn emit(&self, payload: EventPayload) {
        let sequence = self.counter.fetch_add(1, Ordering::SeqCst);
        let event = pw_core::PipelineEvent {
            execution_id: self.execution_id.clone(),
            sequence,
            payload,
        };
        if let Err(err) = self.recorder.record(event) {
            tracing::warn!(error = %err, "event recording failed; continuing");
        }
    }
}

/// A `PipelineDefinition` paired with the live steps its factories
/// built, ready to be invoked repeatedly and concurrently.
pub struct RunnablePipeline<G: IdGen, C: Clock> {
    definition: PipelineDefinition,
    steps: Vec<Arc<dyn Step>>,
    compensation: Vec<Arc<dyn Step>>,
    event_recorder: Arc<dyn EventRecorder>,
    id_gen: G,
    clock: C,
}

impl<G: IdGen, C: Clock> RunnablePipeline<G, C> {
    /// Build live steps for every entry in `definition.steps` and
    /// `definition.compensation` via `registry`, then wrap them up with
    /// the collaborators that don't vary per invocation.
    pub fn build(
        definition: PipelineDefinition,
        registry: &StepRegistry,
        app: &AppContext,
        accessor: &RegistryAccessor,
        event_recorder: Arc<dyn EventRecorder>,
        id_gen: G,
        clock: C,
    ) -> Result<Self, EngineError> {
        let steps = definition
            .steps
            .iter()
            .map(|cfg| registry.create(&cfg.step_type, cfg, app, accessor))
            .collect::<Result<Vec<_>, _>>()?;
        let compensation = definition
            .compensation
            .iter()
            .map(|cfg| registry.create(&cfg.step_type, cfg, app, accessor))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            definition,
            steps,
            compensation,
            event_recorder,
            id_gen,
            clock,
        })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Drive this pipeline to completion for one `trigger_data` payload,
    /// with no ambient HTTP response sink. Equivalent to
    /// `execute_with_response_sink(trigger_data, None)`.
    pub async fn execute(
        &self,
        trigger_data: IndexMap<String, Value>,
    ) -> Result<PipelineContext, EngineError> {
        self.execute_with_response_sink(trigger_data, None).await
    }

    /// Drive this pipeline to completion for one `trigger_data` payload.
    ///
    /// `response_sink` is the ambient HTTP response writer, present
    /// when the pipeline was triggered by an HTTP route; it is copied
    /// into the constructed `PipelineContext` (spec.md §4.1 step 3) so
    /// HTTP-aware steps can write to it directly.
    pub async fn execute_with_response_sink(
        &self,
        trigger_data: IndexMap<String, Value>,
        response_sink: Option<Arc<dyn ResponseSink>>,
    ) -> Result<PipelineContext, EngineError> {
        let sequencer = EventSequencer {
            recorder: self.event_recorder.as_ref(),
            execution_id: ExecutionId::new(self.id_gen.next()),
            counter: AtomicU64::new(0),
        };

        sequencer.emit(EventPayload::ExecutionStarted {
            pipeline: self.definition.name.clone(),
        });

        let run = self.run_steps(&sequencer, trigger_data, response_sink);
        let result = match self.definition.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, run).await {
                Ok(outcome) => outcome,
                Err(_) => Err(EngineError::TimedOut(timeout)),
            },
            None => run.await,
        };

        match &result {
            Ok(_) => sequencer.emit(EventPayload::ExecutionCompleted {
                pipeline: self.definition.name.clone(),
            }),
            Err(err) => sequencer.emit(EventPayload::ExecutionFailed {
                pipeline: self.definition.name.clone(),
                error: err.to_string(),
            }),
        }

        result
    }

    async fn run_steps(
        &self,
        sequencer: &EventSequencer<'_>,
        trigger_data: IndexMap<String, Value>,
        response_sink: Option<Arc<dyn ResponseSink>>,
    ) -> Result<PipelineContext, EngineError> {
        let mut ctx = PipelineContext::new(trigger_data);
        if let Some(sink) = response_sink {
            ctx = ctx.with_response_sink(sink);
        }
        ctx.metadata.insert(
            "pipeline".to_string(),
            Value::String(self.definition.name.clone()),
        );
        ctx.metadata.insert(
            "started_at".to_string(),
            Value::String(iso8601_ms(self.clock.now_ms())),
        );
        for (key, value) in &self.definition.metadata {
            ctx.metadata.insert(key.clone(), value.clone());
        }

        let mut visits: HashMap<String, u32> = HashMap::new();
        let mut index = 0usize;

        while index < self.steps.len() {
            let step = &self.steps[index];
            let step_name = self.definition.steps[index].name.clone();

            let step_visits = visits.entry(step_name.clone()).or_insert(0);
            *step_visits += 1;
            if *step_visits > MAX_STEP_VISITS {
                return Err(EngineError::Cancelled(format!(
                    "circuit breaker: step '{step_name}' entered {step_visits} times (limit {MAX_STEP_VISITS})"
                )));
            }

            sequencer.emit(EventPayload::StepStarted {
                step: step_name.clone(),
            });
            let start = Instant::now();

            match step.execute(&mut ctx).await {
                Ok(mut outcome) => {
                    sequencer.emit(EventPayload::StepCompleted {
                        step: step_name.clone(),
                        elapsed: start.elapsed(),
                    });
                    ctx.record_output(&step_name, outcome.output.take().unwrap_or_default());

                    if outcome.stop {
                        ctx.metadata.insert(
                            "completed_at".to_string(),
                            Value::String(iso8601_ms(self.clock.now_ms())),
                        );
                        return Ok(ctx);
                    }

                    match outcome.next_step {
                        Some(next_step) => match self.definition.position_of(&next_step) {
                            Some(next_index) => {
                                index = next_index;
                                continue;
                            }
                            None => return Err(EngineError::UnknownNextStep(next_step)),
                        },
                        None => index += 1,
                    }
                }
                Err(err) => {
                    sequencer.emit(EventPayload::StepFailed {
                        step: step_name.clone(),
                        error: err.to_string(),
                        elapsed: start.elapsed(),
                    });

                    match self.definition.on_error {
                        OnError::Stop => return Err(err),
                        OnError::Skip => {
                            sequencer.emit(EventPayload::StepSkipped {
                                step: step_name.clone(),
                                error: err.to_string(),
                            });
                            ctx.record_skipped(&step_name, &err.to_string());
                            index += 1;
                        }
                        OnError::Compensate => {
                            let compensation_error =
                                self.run_compensation(sequencer, &mut ctx).await;
                            return Err(EngineError::compensated(err, compensation_error));
                        }
                    }
                }
            }
        }

        ctx.metadata.insert(
            "completed_at".to_string(),
            Value::String(iso8601_ms(self.clock.now_ms())),
        );
        Ok(ctx)
    }

    /// Run `Compensation` in reverse, best-effort: every compensator
    /// runs even if an earlier one fails, but only the first failure
    /// is reported back to the caller.
    async fn run_compensation(
        &self,
        sequencer: &EventSequencer<'_>,
        ctx: &mut PipelineContext,
    ) -> Option<String> {
        if self.compensation.is_empty() {
            return None;
        }

        let names: Vec<String> = self
            .definition
            .compensation
            .iter()
            .map(|cfg| cfg.name.clone())
            .collect();
        sequencer.emit(EventPayload::SagaCompensating { steps: names });

        let mut first_error = None;
        for (cfg, step) in self
            .definition
            .compensation
            .iter()
            .zip(self.compensation.iter())
            .rev()
        {
            let step_name = cfg.name.clone();
            sequencer.emit(EventPayload::StepStarted {
                step: step_name.clone(),
            });
            let start = Instant::now();

            match step.execute(ctx).await {
                Ok(mut outcome) => {
                    sequencer.emit(EventPayload::StepCompleted {
                        step: step_name.clone(),
                        elapsed: start.elapsed(),
                    });
                    if let Some(output) = outcome.output.take() {
                        ctx.record_output(&step_name, output);
                    }
                    sequencer.emit(EventPayload::StepCompensated {
                        step: step_name.clone(),
                    });
                }
                Err(err) => {
                    sequencer.emit(EventPayload::StepFailed {
                        step: step_name.clone(),
                        error: err.to_string(),
                        elapsed: start.elapsed(),
                    });
                    if first_error.is_none() {
                        first_error = Some(err.to_string());
                    }
                }
            }
        }

        if first_error.is_none() {
            sequencer.emit(EventPayload::SagaCompensated);
        }
        first_error
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
