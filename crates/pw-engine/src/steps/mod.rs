// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composite step implementations: steps that own and sequence other
//! steps, built via the same factory protocol as any primitive.

pub mod circuit_breaker;
pub mod conditional;
pub mod foreach;
pub mod retry;
pub mod state_machine_transition;

pub use circuit_breaker::circuit_breaker_factory;
pub use conditional::conditional_factory;
pub use foreach::foreach_factory;
pub use retry::retry_with_backoff_factory;
pub use state_machine_transition::state_machine_transition_factory;

/// Register every composite step type this crate ships into
/// `registry`. Application code registers its own primitives
/// separately, then calls this once composites can see them through
/// the registry accessor.
pub fn register_composites(registry: &mut crate::registry::StepRegistry) {
    registry.register("step.foreach", foreach_factory());
    registry.register("step.retry_with_backoff", retry_with_backoff_factory());
    registry.register("step.circuit_breaker", circuit_breaker_factory());
    registry.register("step.conditional", conditional_factory());
    registry.register(
        "step.state_machine_transition",
        state_machine_transition_factory(),
    );
}
