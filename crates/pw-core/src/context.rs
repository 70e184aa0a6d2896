// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-execution scratchpad carried through one pipeline run.

use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An opaque handle to an in-flight HTTP response. The host application
/// hands one in through `PipelineContext::with_response_sink` before
/// executing a pipeline triggered by an HTTP route; HTTP-aware steps
/// (e.g. a passthrough step) cast it back and write directly instead of
/// returning output for something else to write. The executor never
/// interprets it.
pub trait ResponseSink: Send + Sync {
    fn write_status(&self, status: u16);
    fn write_header(&self, name: &str, value: &str);
    fn write_body(&self, body: &[u8]);
}

impl fmt::Debug for dyn ResponseSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<response sink>")
    }
}

/// Metadata flag the executor sets when a response sink is present, so
/// steps that only need to know whether one exists (without needing to
/// call into it) can check the generic metadata map rather than the
/// typed `response_sink` field.
pub const METADATA_RESPONSE_SINK: &str = "_response_sink";

/// Metadata flag a passthrough step sets to tell the caller not to
/// write a second response.
pub const METADATA_RESPONSE_HANDLED: &str = "_response_handled";

/// The mutable record carried through one `Pipeline::execute` call.
///
/// `trigger_data` is immutable by convention (nothing in this crate
/// enforces it at the type level, matching the source system) while
/// `current` and `step_outputs` are mutated as steps run. See
/// `Pipeline::execute` for the merge invariants.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub trigger_data: IndexMap<String, Value>,
    pub step_outputs: IndexMap<String, IndexMap<String, Value>>,
    pub current: IndexMap<String, Value>,
    pub metadata: HashMap<String, Value>,
    pub response_sink: Option<Arc<dyn ResponseSink>>,
}

impl PipelineContext {
    pub fn new(trigger_data: IndexMap<String, Value>) -> Self {
        Self {
            trigger_data,
            step_outputs: IndexMap::new(),
            current: IndexMap::new(),
            metadata: HashMap::new(),
            response_sink: None,
        }
    }

    /// Stash an ambient HTTP response sink, setting the
    /// `METADATA_RESPONSE_SINK` presence flag at the same time (spec.md
    /// §4.1 step 3: "if an HTTP response writer is present in the
    /// ambient context under a well-known key, copy it into metadata so
    /// HTTP-aware steps can write directly").
    pub fn with_response_sink(mut self, sink: Arc<dyn ResponseSink>) -> Self {
        self.metadata
            .insert(METADATA_RESPONSE_SINK.to_string(), Value::Bool(true));
        self.response_sink = Some(sink);
        self
    }

    /// Merge a step's output into `step_outputs[step_name]`, replacing
    /// whatever was there before (see SPEC_FULL.md Open Question #2:
    /// a step re-entered via `NextStep` overwrites its prior output).
    pub fn record_output(&mut self, step_name: &str, output: IndexMap<String, Value>) {
        self.step_outputs.insert(step_name.to_string(), output);
    }

    /// Record the `{_error, _skipped: true}` bucket for a step skipped
    /// under the `skip` error strategy.
    pub fn record_skipped(&mut self, step_name: &str, error: &str) {
        let mut bucket = IndexMap::new();
        bucket.insert("_error".to_string(), Value::String(error.to_string()));
        bucket.insert("_skipped".to_string(), Value::Bool(true));
        self.step_outputs.insert(step_name.to_string(), bucket);
    }

    /// Build a composite, read-only view used by the template engine
    /// and ForEach's collection resolver: `current` overlaid with the
    /// virtual `steps` and `trigger` roots.
    pub fn composite_view(&self) -> Value {
        let mut root = self.current.clone();
        root.insert(
            "steps".to_string(),
            Value::Map(
                self.step_outputs
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::Map(v.clone())))
                    .collect(),
            ),
        );
        root.insert(
            "trigger".to_string(),
            Value::Map(self.trigger_data.clone()),
        );
        Value::Map(root)
    }

    /// Build a child context for one ForEach iteration: a shallow copy
    /// of `trigger_data`, `metadata`, and `current`, with one extra
    /// inner-level copy of `step_outputs` so sub-step mutations never
    /// leak back into the parent (spec invariant: ForEach isolation).
    pub fn child_for_iteration(
        &self,
        item_key: &str,
        item: Value,
        index_key: &str,
        index: usize,
    ) -> PipelineContext {
        let mut child = PipelineContext {
            trigger_data: self.trigger_data.clone(),
            step_outputs: self.step_outputs.clone(),
            current: self.current.clone(),
            metadata: self.metadata.clone(),
            response_sink: self.response_sink.clone(),
        };
        child.current.insert(item_key.to_string(), item);
        child
            .current
            .insert(index_key.to_string(), Value::Int(index as i64));
        child
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
