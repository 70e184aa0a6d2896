// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-engine: the runnable half of the workflow engine — the step
//! registry and factory protocol, the template engine, the composite
//! steps (foreach, retry, circuit breaker, conditional, state-machine
//! transition), the state machine engine, and the pipeline executor
//! itself. Data types shared with configuration loading live in
//! `pw-core`; this crate is where they get run.

pub mod context;
pub mod error;
pub mod executor;
pub mod registry;
pub mod state_machine;
pub mod steps;
pub mod template;

pub use context::{
    resolve, BrokerConsumerCapability, BrokerProducerCapability, CacheCapability, Capability,
    DatabaseProviderCapability, EmptyServiceRegistry, PolicyEngineCapability,
    RateLimitProviderCapability, ServiceRegistry, TransitionTrigger,
};
pub use error::EngineError;
pub use executor::RunnablePipeline;
pub use registry::{
    step_config_from_value, AppContext, RegistryAccessor, Step, StepFactory, StepRegistry,
};
pub use state_machine::{
    Guard, StateDef, StateMachineDefinition, StateMachineEngine, StateMachineError,
    StateMachineInstance, TransitionDef, TransitionListener,
};
pub use steps::register_composites;
pub use template::{resolve_path, resolve_template, resolve_value};
