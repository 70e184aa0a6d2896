// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.log`: renders a template against the current context and
//! emits it through `tracing` at a configurable level. No side effect
//! beyond the log line; mainly useful for tracing pipeline progress
//! and as a harmless step in scenario tests.

use async_trait::async_trait;
use indexmap::IndexMap;
use pw_core::{PipelineContext, StepConfig, StepResult, Value};
use pw_engine::{resolve_template, AppContext, EngineError, RegistryAccessor, Step, StepFactory};
use std::sync::Arc;

struct LogStep {
    name: String,
    message: String,
    level: String,
}

#[async_trait]
impl Step for LogStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        let rendered = resolve_template(ctx, &self.message)?;
        match self.level.as_str() {
            "error" => tracing::error!(step = %self.name, "{rendered}"),
            "warn" => tracing::warn!(step = %self.name, "{rendered}"),
            "debug" => tracing::debug!(step = %self.name, "{rendered}"),
            _ => tracing::info!(step = %self.name, "{rendered}"),
        }

        let mut output = IndexMap::new();
        output.insert("logged".to_string(), Value::String(rendered));
        Ok(StepResult::ok(output))
    }
}

pub fn log_factory() -> StepFactory {
    Arc::new(
        |config: &StepConfig, _app: &AppContext, _accessor: &RegistryAccessor| {
            let message = config
                .get("message")
                .and_then(Value::as_str)
                .ok_or_else(|| EngineError::MissingConfigKey {
                    step: config.name.clone(),
                    key: "message".to_string(),
                })?
                .to_string();
            let level = config
                .get("level")
                .and_then(Value::as_str)
                .unwrap_or("info")
                .to_string();

            Ok(Arc::new(LogStep {
                name: config.name.clone(),
                message,
                level,
            }) as Arc<dyn Step>)
        },
    )
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
