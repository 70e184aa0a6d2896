// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step.fail`: a deterministic test double that always fails with a
//! configurable message. Exists so error-strategy and compensation
//! behavior can be exercised end-to-end without a real integration
//! that happens to be flaky.

use async_trait::async_trait;
use pw_core::{PipelineContext, StepConfig, StepResult, Value};
use pw_engine::{AppContext, EngineError, RegistryAccessor, Step, StepFactory};
use std::sync::Arc;

struct FailStep {
    name: String,
    message: String,
}

#[async_trait]
impl Step for FailStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        Err(EngineError::StepFailed {
            step: self.name.clone(),
            source: Box::new(EngineError::Cancelled(self.message.clone())),
        })
    }
}

pub fn fail_factory() -> StepFactory {
    Arc::new(
        |config: &StepConfig, _app: &AppContext, _accessor: &RegistryAccessor| {
            let message = config
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("forced failure")
                .to_string();

            Ok(Arc::new(FailStep {
                name: config.name.clone(),
                message,
            }) as Arc<dyn Step>)
        },
    )
}

#[cfg(test)]
#[path = "fail_tests.rs"]
mod tests;
