// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.circuit_breaker`: a three-state (closed/open/half-open) guard
//! in front of a single child step, with an optional fallback while
//! open (spec.md §4.3). State is guarded by a `parking_lot::Mutex` held
//! only across the synchronous state check/update, never across the
//! child's `execute().await`, so concurrent invocations stay atomic
//! without blocking each other through the child call.

use crate::error::EngineError;
use crate::registry::{step_config_from_value, AppContext, RegistryAccessor, Step, StepFactory};
use async_trait::async_trait;
use parking_lot::Mutex;
use pw_core::{parse_duration, Clock, PipelineContext, StepResult, SystemClock, Value};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
enum CircuitState {
    Closed { failures: u32 },
    Open { opened_at_ms: i64 },
    HalfOpen,
}

struct CircuitBreakerStep<C: Clock> {
    name: String,
    child: Arc<dyn Step>,
    fallback: Option<Arc<dyn Step>>,
    failure_threshold: u32,
    reset_timeout: Duration,
    clock: C,
    state: Mutex<CircuitState>,
}

impl<C: Clock> CircuitBreakerStep<C> {
    /// Decide whether the child call may proceed right now, transitioning
    /// Open -> HalfOpen if the reset timeout has elapsed. Returns `true`
    /// when the caller should invoke the child.
    fn admit(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            CircuitState::Closed { .. } => true,
            // A probe is already in flight; reject until it resolves.
            CircuitState::HalfOpen => false,
            CircuitState::Open { opened_at_ms } => {
                let elapsed_ms = self.clock.elapsed_ms(opened_at_ms);
                if elapsed_ms >= self.reset_timeout.as_millis() as i64 {
                    *state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_success(&self) {
        let mut state = self.state.lock();
        *state = CircuitState::Closed { failures: 0 };
    }

    fn record_failure(&self) {
        let mut state = self.state.lock();
        *state = match *state {
            CircuitState::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.failure_threshold {
                    CircuitState::Open {
                        opened_at_ms: self.clock.now_ms(),
                    }
                } else {
                    CircuitState::Closed { failures }
                }
            }
            CircuitState::HalfOpen | CircuitState::Open { .. } => CircuitState::Open {
                opened_at_ms: self.clock.now_ms(),
            },
        };
    }
}

#[async_trait]
impl<C: Clock + 'static> Step for CircuitBreakerStep<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        if !self.admit() {
            return match &self.fallback {
                Some(fallback) => {
                    let mut outcome = fallback.execute(ctx).await?;
                    let mut output = outcome.output.take().unwrap_or_default();
                    output.insert("circuit_breaker_open".to_string(), Value::Bool(true));
                    outcome.output = Some(output);
                    Ok(outcome)
                }
                None => Err(EngineError::CircuitOpen(self.name.clone())),
            };
        }

        match self.child.execute(ctx).await {
            Ok(outcome) => {
                self.record_success();
                Ok(outcome)
            }
            Err(err) => {
                self.record_failure();
                Err(EngineError::StepFailed {
                    step: self.name.clone(),
                    source: Box::new(err),
                })
            }
        }
    }
}

fn build(
    config: &pw_core::StepConfig,
    app: &AppContext,
    accessor: &RegistryAccessor,
    clock: impl Clock + 'static,
) -> Result<Arc<dyn Step>, EngineError> {
    let child_value = config
        .get("step")
        .ok_or_else(|| EngineError::MissingConfigKey {
            step: config.name.clone(),
            key: "step".to_string(),
        })?;
    let child_config = step_config_from_value(&config.name, 0, child_value)?;
    let registry = accessor();
    let child = registry.create(&child_config.step_type, &child_config, app, accessor)?;

    let fallback = match config.get("fallback") {
        Some(v) => {
            let fallback_config = step_config_from_value(&config.name, 0, v)?;
            Some(registry.create(
                &fallback_config.step_type,
                &fallback_config,
                app,
                accessor,
            )?)
        }
        None => None,
    };

    let failure_threshold = match config.get("failure_threshold") {
        Some(v) => {
            let n = v.as_i64().ok_or_else(|| EngineError::InvalidConfigValue {
                step: config.name.clone(),
                key: "failure_threshold".to_string(),
                reason: "expected an integer".to_string(),
            })?;
            if n <= 0 {
                return Err(EngineError::InvalidConfigValue {
                    step: config.name.clone(),
                    key: "failure_threshold".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            n as u32
        }
        None => DEFAULT_FAILURE_THRESHOLD,
    };

    let reset_timeout = match config.get("reset_timeout").and_then(Value::as_str) {
        Some(s) => parse_duration(s).map_err(|reason| EngineError::InvalidConfigValue {
            step: config.name.clone(),
            key: "reset_timeout".to_string(),
            reason,
        })?,
        None => DEFAULT_RESET_TIMEOUT,
    };

    Ok(Arc::new(CircuitBreakerStep {
        name: config.name.clone(),
        child,
        fallback,
        failure_threshold,
        reset_timeout,
        clock,
        state: Mutex::new(CircuitState::Closed { failures: 0 }),
    }) as Arc<dyn Step>)
}

pub fn circuit_breaker_factory() -> StepFactory {
    Arc::new(|config, app, accessor| build(config, app, accessor, SystemClock))
}

/// Test/integration seam: build a circuit breaker against a caller-
/// supplied clock (e.g. `FakeClock`) instead of wall-clock time.
pub fn circuit_breaker_factory_with_clock(clock: impl Clock + 'static) -> StepFactory {
    Arc::new(move |config, app, accessor| build(config, app, accessor, clock.clone()))
}

#[cfg(test)]
#[path = "circuit_breaker_tests.rs"]
mod tests;
