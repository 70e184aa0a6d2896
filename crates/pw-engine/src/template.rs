// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `{{path}}` template resolution.
//!
//! A pure, read-only path walker — no function calls, no arbitrary
//! expressions (spec.md §9). Anything more complex belongs in a
//! dedicated step, not a template string. Grounded in the teacher's
//! `${var}` regex-based `interpolate` (a `LazyLock<Regex>` plus
//! `replace_all`), generalized from flat string vars to dotted paths
//! resolved against a three-tier lookup.

use pw_core::{PipelineContext, PipelineError, Value};
use regex::Regex;
use std::sync::LazyLock;

/// Matches `{{path.to.value}}`, capturing the dotted path.
#[allow(clippy::expect_used)]
static TEMPLATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z0-9_-]+)*)\s*\}\}")
        .expect("constant regex pattern is valid")
});

/// Resolve a single dotted path against the three-tier lookup order
/// from spec.md §4.4: `Current[key]` for a bare key, then
/// `TriggerData[key]`, then the composite view (`current` overlaid
/// with virtual `steps`/`trigger` roots) for dotted paths.
pub fn resolve_path(ctx: &PipelineContext, path: &str) -> Result<Value, PipelineError> {
    if !path.contains('.') {
        if let Some(v) = ctx.current.get(path) {
            return Ok(v.clone());
        }
        if let Some(v) = ctx.trigger_data.get(path) {
            return Ok(v.clone());
        }
    }

    let view = ctx.composite_view();
    view.get_path(path)
        .cloned()
        .ok_or_else(|| PipelineError::UnresolvedPath(path.to_string()))
}

/// Resolve every `{{path}}` occurrence in `template` against `ctx`.
///
/// A template with no `{{` is returned unchanged without walking the
/// context at all. An unresolved path is a hard error — per spec.md
/// §4.4 this must never silently substitute an empty string, so that
/// step factories using this at execute time fail loudly.
pub fn resolve_template(ctx: &PipelineContext, template: &str) -> Result<String, PipelineError> {
    if !template.contains("{{") {
        return Ok(template.to_string());
    }

    // A template that is *exactly* one placeholder resolves to the
    // value's own rendering (so `{{steps.parse.count}}` interpolating
    // an int doesn't get stringified before the caller can use it as
    // one); anything richer falls back to string substitution.
    if let Some(caps) = TEMPLATE_PATTERN.captures(template) {
        if caps.get(0).map(|m| m.as_str()) == Some(template.trim()) {
            let path = &caps[1];
            return resolve_path(ctx, path).map(|v| v.render());
        }
    }

    let mut first_error = None;
    let resolved = TEMPLATE_PATTERN.replace_all(template, |caps: &regex::Captures| {
        let path = &caps[1];
        match resolve_path(ctx, path) {
            Ok(v) => v.render(),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
                String::new()
            }
        }
    });

    match first_error {
        Some(e) => Err(e),
        None => Ok(resolved.to_string()),
    }
}

/// Resolve a template path to a full `Value` (not its string
/// rendering), for callers that need typed results — e.g. a
/// `conditional` step matching a resolved field against route keys.
pub fn resolve_value(ctx: &PipelineContext, path_or_template: &str) -> Result<Value, PipelineError> {
    let trimmed = path_or_template.trim();
    if let Some(inner) = trimmed
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
    {
        return resolve_path(ctx, inner.trim());
    }
    resolve_path(ctx, trimmed)
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
