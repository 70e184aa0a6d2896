// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error taxonomy shared by the data model and template engine.
//!
//! This stays narrow on purpose: factory/execute/transition failures
//! each have their own call site and their own typed variant on
//! `pw-engine`'s `EngineError`, which is what every producer in this
//! workspace actually constructs and what flows through
//! `Pipeline::execute`. `PipelineError` exists only for the one error
//! that genuinely originates below the engine, in `pw-core`'s own
//! template/value-walking code, and flows up into `EngineError` through
//! `#[from]`.
use thiserror::Error;

/// Errors raised resolving template paths or walking `Value`s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("unresolved template path: {0}")]
    UnresolvedPath(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
