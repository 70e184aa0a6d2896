// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.conditional`: resolve a field, match it against a `routes`
//! table, and jump to the matching step (spec.md §4.3).

use crate::error::EngineError;
use crate::registry::{Step, StepFactory};
use crate::template::resolve_value;
use async_trait::async_trait;
use indexmap::IndexMap;
use pw_core::{PipelineContext, StepResult, Value};
use std::sync::Arc;

struct ConditionalStep {
    name: String,
    field: String,
    routes: IndexMap<String, String>,
    default: Option<String>,
}

#[async_trait]
impl Step for ConditionalStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        let resolved = resolve_value(ctx, &self.field)?;
        let matched_value = resolved.render();

        let target = self
            .routes
            .get(&matched_value)
            .cloned()
            .or_else(|| self.default.clone());

        let Some(target) = target else {
            return Err(EngineError::InvalidConfigValue {
                step: self.name.clone(),
                key: "field".to_string(),
                reason: format!("no route matches '{matched_value}' and no default is set"),
            });
        };

        let mut output = IndexMap::new();
        output.insert("matched_value".to_string(), Value::String(matched_value));
        output.insert("next_step".to_string(), Value::String(target.clone()));
        Ok(StepResult::ok(output).jumping_to(target))
    }
}

pub fn conditional_factory() -> StepFactory {
    Arc::new(|config, _app, _accessor| {
        let field = config
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::MissingConfigKey {
                step: config.name.clone(),
                key: "field".to_string(),
            })?
            .to_string();

        let routes_value = config
            .get("routes")
            .ok_or_else(|| EngineError::MissingConfigKey {
                step: config.name.clone(),
                key: "routes".to_string(),
            })?;
        let routes_map = routes_value
            .as_map()
            .ok_or_else(|| EngineError::InvalidConfigValue {
                step: config.name.clone(),
                key: "routes".to_string(),
                reason: "expected a map".to_string(),
            })?;
        if routes_map.is_empty() {
            return Err(EngineError::InvalidConfigValue {
                step: config.name.clone(),
                key: "routes".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let mut routes = IndexMap::new();
        for (key, value) in routes_map {
            let target = value.as_str().ok_or_else(|| EngineError::InvalidConfigValue {
                step: config.name.clone(),
                key: format!("routes.{key}"),
                reason: "expected a string target step name".to_string(),
            })?;
            routes.insert(key.clone(), target.to_string());
        }

        let default = config
            .get("default")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Arc::new(ConditionalStep {
            name: config.name.clone(),
            field,
            routes,
            default,
        }) as Arc<dyn Step>)
    })
}

#[cfg(test)]
#[path = "conditional_tests.rs"]
mod tests;
