// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.set`: writes a small map of resolved values into `Current`,
//! the primitive building block for tests and demos that need to
//! shape context state without a real integration behind it.

use async_trait::async_trait;
use indexmap::IndexMap;
use pw_core::{PipelineContext, StepConfig, StepResult, Value};
use pw_engine::{resolve_value, AppContext, EngineError, RegistryAccessor, Step, StepFactory};
use std::sync::Arc;

struct SetStep {
    name: String,
    values: IndexMap<String, Value>,
}

#[async_trait]
impl Step for SetStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        let mut output = IndexMap::new();
        for (key, value) in &self.values {
            let resolved = match value.as_str() {
                Some(template) => resolve_value(ctx, template)?,
                None => value.clone(),
            };
            ctx.current.insert(key.clone(), resolved.clone());
            output.insert(key.clone(), resolved);
        }
        Ok(StepResult::ok(output))
    }
}

pub fn set_factory() -> StepFactory {
    Arc::new(
        |config: &StepConfig, _app: &AppContext, _accessor: &RegistryAccessor| {
            let values = config
                .get("values")
                .and_then(Value::as_map)
                .ok_or_else(|| EngineError::MissingConfigKey {
                    step: config.name.clone(),
                    key: "values".to_string(),
                })?
                .clone();

            Ok(Arc::new(SetStep {
                name: config.name.clone(),
                values,
            }) as Arc<dyn Step>)
        },
    )
}

#[cfg(test)]
#[path = "set_tests.rs"]
mod tests;
