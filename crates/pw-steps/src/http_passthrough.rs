// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.http_passthrough`: marks the in-process HTTP response as
//! handled and stops the pipeline, standing in for an adapter that
//! writes directly to a request's response sink (spec.md §7). This
//! crate has no real HTTP server behind it; the step only flips the
//! metadata flag callers are expected to check.

use async_trait::async_trait;
use indexmap::IndexMap;
use pw_core::{
    PipelineContext, StepConfig, StepResult, Value, METADATA_RESPONSE_HANDLED,
};
use pw_engine::{resolve_template, AppContext, EngineError, RegistryAccessor, Step, StepFactory};
use std::sync::Arc;

struct HttpPassthroughStep {
    name: String,
    body_template: String,
}

#[async_trait]
impl Step for HttpPassthroughStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        let body = resolve_template(ctx, &self.body_template)?;
        ctx.metadata
            .insert(METADATA_RESPONSE_HANDLED.to_string(), Value::Bool(true));

        let mut output = IndexMap::new();
        output.insert("body".to_string(), Value::String(body));
        Ok(StepResult::stopping(output))
    }
}

pub fn http_passthrough_factory() -> StepFactory {
    Arc::new(
        |config: &StepConfig, _app: &AppContext, _accessor: &RegistryAccessor| {
            let body_template = config
                .get("body")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();

            Ok(Arc::new(HttpPassthroughStep {
                name: config.name.clone(),
                body_template,
            }) as Arc<dyn Step>)
        },
    )
}

#[cfg(test)]
#[path = "http_passthrough_tests.rs"]
mod tests;
