// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.retry_with_backoff`: run a single child step with exponential
//! backoff between failures (spec.md §4.3). Cancellation between
//! sleeps is honored implicitly — the whole step execution, including
//! any sleep it is suspended in, is wrapped in the pipeline's own
//! `tokio::time::timeout` deadline by the executor, so a timed-out or
//! cancelled run simply drops this future mid-sleep.

use crate::error::EngineError;
use crate::registry::{step_config_from_value, AppContext, RegistryAccessor, Step, StepFactory};
use async_trait::async_trait;
use pw_core::{parse_duration, PipelineContext, StepResult, Value};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_MULTIPLIER: f64 = 2.0;

struct RetryStep {
    name: String,
    child: Arc<dyn Step>,
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

#[async_trait]
impl Step for RetryStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        let mut delay = self.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                let next = delay.mul_f64(self.multiplier);
                delay = next.min(self.max_delay);
            }

            match self.child.execute(ctx).await {
                Ok(mut outcome) => {
                    let mut output = outcome.output.take().unwrap_or_default();
                    output.insert(
                        "retry_attempts".to_string(),
                        Value::Int(i64::from(attempt)),
                    );
                    outcome.output = Some(output);
                    return Ok(outcome);
                }
                Err(err) => last_error = Some(err),
            }
        }

        Err(EngineError::StepFailed {
            step: self.name.clone(),
            source: Box::new(last_error.unwrap_or_else(|| {
                EngineError::Cancelled(format!("{} exhausted retries with no error", self.name))
            })),
        })
    }
}

pub fn retry_with_backoff_factory() -> StepFactory {
    Arc::new(|config, app, accessor| {
        let child_value = config
            .get("step")
            .ok_or_else(|| EngineError::MissingConfigKey {
                step: config.name.clone(),
                key: "step".to_string(),
            })?;
        let child_config = step_config_from_value(&config.name, 0, child_value)?;
        let registry = accessor();
        let child = registry.create(&child_config.step_type, &child_config, app, accessor)?;

        let max_retries = match config.get("max_retries") {
            Some(v) => v.as_i64().ok_or_else(|| EngineError::InvalidConfigValue {
                step: config.name.clone(),
                key: "max_retries".to_string(),
                reason: "expected an integer".to_string(),
            })? as u32,
            None => DEFAULT_MAX_RETRIES,
        };

        let initial_delay = match config.get("initial_delay").and_then(Value::as_str) {
            Some(s) => parse_duration_config(&config.name, "initial_delay", s)?,
            None => DEFAULT_INITIAL_DELAY,
        };
        let max_delay = match config.get("max_delay").and_then(Value::as_str) {
            Some(s) => parse_duration_config(&config.name, "max_delay", s)?,
            None => DEFAULT_MAX_DELAY,
        };
        let multiplier = match config.get("multiplier") {
            Some(v) => v.as_f64().ok_or_else(|| EngineError::InvalidConfigValue {
                step: config.name.clone(),
                key: "multiplier".to_string(),
                reason: "expected a number".to_string(),
            })?,
            None => DEFAULT_MULTIPLIER,
        };

        Ok(Arc::new(RetryStep {
            name: config.name.clone(),
            child,
            max_retries,
            initial_delay,
            max_delay,
            multiplier,
        }) as Arc<dyn Step>)
    })
}

fn parse_duration_config(step: &str, key: &str, raw: &str) -> Result<Duration, EngineError> {
    parse_duration(raw).map_err(|reason| EngineError::InvalidConfigValue {
        step: step.to_string(),
        key: key.to_string(),
        reason,
    })
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
