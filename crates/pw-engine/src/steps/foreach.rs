// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.foreach`: run a fixed sequence of sub-steps once per item of a
//! resolved collection, isolating each iteration's `current` map from
//! the others (spec.md §4.3).

use crate::error::EngineError;
use crate::registry::{step_config_from_value, AppContext, RegistryAccessor, Step, StepFactory};
use crate::template::resolve_value;
use async_trait::async_trait;
use indexmap::IndexMap;
use pw_core::{PipelineContext, StepConfig, StepResult, Value};
use std::sync::Arc;

struct ForEachStep {
    name: String,
    collection: String,
    item_key: String,
    index_key: String,
    sub_steps: Vec<Arc<dyn Step>>,
}

#[async_trait]
impl Step for ForEachStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        let resolved = resolve_value(ctx, &self.collection)?;
        let items: Vec<Value> = match &resolved {
            Value::Null => Vec::new(),
            Value::List(items) => items.clone(),
            other => {
                return Err(EngineError::InvalidConfigValue {
                    step: self.name.clone(),
                    key: "collection".to_string(),
                    reason: format!("expected a list, got {other:?}"),
                })
            }
        };

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let mut child = ctx.child_for_iteration(&self.item_key, item, &self.index_key, index);

            let mut stopped = false;
            for sub_step in &self.sub_steps {
                let outcome = sub_step.execute(&mut child).await.map_err(|source| {
                    EngineError::StepFailed {
                        step: format!("{}[{}].{}", self.name, index, sub_step.name()),
                        source: Box::new(source),
                    }
                })?;
                if let Some(output) = &outcome.output {
                    child.record_output(sub_step.name(), output.clone());
                }
                if outcome.stop {
                    stopped = true;
                    break;
                }
            }

            let mut entry = IndexMap::new();
            entry.insert(
                "iteration".to_string(),
                Value::Int(index as i64),
            );
            entry.insert("steps".to_string(), child.composite_view());
            entry.insert("stopped".to_string(), Value::Bool(stopped));
            results.push(Value::Map(entry));
        }

        let mut output = IndexMap::new();
        let count = results.len() as i64;
        output.insert("results".to_string(), Value::List(results));
        output.insert("count".to_string(), Value::Int(count));
        Ok(StepResult::ok(output))
    }
}

fn build_sub_steps(
    parent_name: &str,
    config: &StepConfig,
    app: &AppContext,
    accessor: &RegistryAccessor,
) -> Result<Vec<Arc<dyn Step>>, EngineError> {
    let steps_value = config
        .get("steps")
        .ok_or_else(|| EngineError::MissingConfigKey {
            step: parent_name.to_string(),
            key: "steps".to_string(),
        })?;
    let entries = steps_value
        .as_list()
        .ok_or_else(|| EngineError::InvalidConfigValue {
            step: parent_name.to_string(),
            key: "steps".to_string(),
            reason: "expected a list".to_string(),
        })?;

    let registry = accessor();
    let mut built = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let sub_config = step_config_from_value(parent_name, index, entry)?;
        let step = registry.create(&sub_config.step_type, &sub_config, app, accessor)?;
        built.push(step);
    }
    Ok(built)
}

pub fn foreach_factory() -> StepFactory {
    Arc::new(|config, app, accessor| {
        let collection = config
            .get("collection")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::MissingConfigKey {
                step: config.name.clone(),
                key: "collection".to_string(),
            })?
            .to_string();

        let item_key = config
            .get("item_key")
            .and_then(Value::as_str)
            .unwrap_or("item")
            .to_string();
        let index_key = config
            .get("index_key")
            .and_then(Value::as_str)
            .unwrap_or("index")
            .to_string();

        let sub_steps = build_sub_steps(&config.name, config, app, accessor)?;
        if sub_steps.is_empty() {
            return Err(EngineError::InvalidConfigValue {
                step: config.name.clone(),
                key: "steps".to_string(),
                reason: "must contain at least one sub-step".to_string(),
            });
        }

        Ok(Arc::new(ForEachStep {
            name: config.name.clone(),
            collection,
            item_key,
            index_key,
            sub_steps,
        }) as Arc<dyn Step>)
    })
}

#[cfg(test)]
#[path = "foreach_tests.rs"]
mod tests;
