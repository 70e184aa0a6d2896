// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.state_machine_transition`: an adapter step that fires a named
//! transition on a state machine instance, resolved as a
//! `TransitionTrigger` capability by service name (spec.md §4.5).

use crate::context::{resolve, ServiceRegistry};
use crate::error::EngineError;
use crate::registry::{AppContext, Step, StepFactory};
use crate::template::{resolve_template, resolve_value};
use async_trait::async_trait;
use indexmap::IndexMap;
use pw_core::{PipelineContext, StepResult, Value};
use std::sync::Arc;

struct StateMachineTransitionStep {
    name: String,
    service: String,
    instance_id_template: String,
    event_template: String,
    data_template: IndexMap<String, Value>,
    fail_on_error: bool,
    services: Arc<dyn ServiceRegistry>,
}

#[async_trait]
impl Step for StateMachineTransitionStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        let instance_id = resolve_template(ctx, &self.instance_id_template)?;
        let event = resolve_template(ctx, &self.event_template)?;

        let mut data = IndexMap::new();
        for (key, template) in &self.data_template {
            let value = match template {
                Value::String(s) => resolve_value(ctx, s)?,
                other => other.clone(),
            };
            data.insert(key.clone(), value);
        }

        let trigger = resolve(self.services.as_ref(), &self.service, |c, s| {
            c.into_transition_trigger(s)
        })?;

        match trigger.trigger(&instance_id, &event, data) {
            Ok(result_data) => {
                let mut output = IndexMap::new();
                output.insert("transition_ok".to_string(), Value::Bool(true));
                output.insert("data".to_string(), Value::Map(result_data));
                Ok(StepResult::ok(output))
            }
            Err(err) if self.fail_on_error => Err(err),
            Err(err) => {
                let mut output = IndexMap::new();
                output.insert("transition_ok".to_string(), Value::Bool(false));
                output.insert("error".to_string(), Value::String(err.to_string()));
                Ok(StepResult::ok(output))
            }
        }
    }
}

pub fn state_machine_transition_factory() -> StepFactory {
    Arc::new(|config, app: &AppContext, _accessor| {
        let service = config
            .get("service")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::MissingConfigKey {
                step: config.name.clone(),
                key: "service".to_string(),
            })?
            .to_string();

        let instance_id_template = config
            .get("entity_id")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::MissingConfigKey {
                step: config.name.clone(),
                key: "entity_id".to_string(),
            })?
            .to_string();

        let event_template = config
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::MissingConfigKey {
                step: config.name.clone(),
                key: "event".to_string(),
            })?
            .to_string();

        let data_template = config
            .get("data")
            .map(|v| {
                v.as_map().cloned().ok_or_else(|| EngineError::InvalidConfigValue {
                    step: config.name.clone(),
                    key: "data".to_string(),
                    reason: "expected a map".to_string(),
                })
            })
            .transpose()?
            .unwrap_or_default();

        let fail_on_error = config
            .get("fail_on_error")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        Ok(Arc::new(StateMachineTransitionStep {
            name: config.name.clone(),
            service,
            instance_id_template,
            event_template,
            data_template,
            fail_on_error,
            services: app.services.clone(),
        }) as Arc<dyn Step>)
    })
}

#[cfg(test)]
#[path = "state_machine_transition_tests.rs"]
mod tests;
