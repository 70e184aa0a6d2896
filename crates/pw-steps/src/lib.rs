// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-steps: a small set of illustrative primitive step factories
//! (log, set, fail, http passthrough) registered through the same
//! factory protocol as `pw-engine`'s composite steps. These stand in
//! for the much larger catalog of concrete integration steps a real
//! deployment would register (database queries, cache writes, broker
//! publishes); only enough is built here to exercise the registry and
//! executor end-to-end.

mod fail;
mod http_passthrough;
mod log;
mod set;

pub use fail::fail_factory;
pub use http_passthrough::http_passthrough_factory;
pub use log::log_factory;
pub use set::set_factory;

use pw_engine::StepRegistry;

/// Register every primitive step type this crate ships into
/// `registry`. Call before `pw_engine::register_composites` so
/// composite factories can see these primitives through the registry
/// accessor if they need to.
pub fn register_primitives(registry: &mut StepRegistry) {
    registry.register("step.log", log_factory());
    registry.register("step.set", set_factory());
    registry.register("step.fail", fail_factory());
    registry.register("step.http_passthrough", http_passthrough_factory());
}
