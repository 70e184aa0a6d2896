// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn display_message_names_the_unresolved_path() {
    let err = PipelineError::UnresolvedPath("foo.bar".to_string());
    assert_eq!(err.to_string(), "unresolved template path: foo.bar");
}

#[test]
fn unresolved_path_is_clonable_and_comparable() {
    let a = PipelineError::UnresolvedPath("x.y".to_string());
    let b = a.clone();
    assert_eq!(a, b);
}
