// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn order_definition() -> StateMachineDefinition {
    StateMachineDefinition::new("order", "pending")
        .with_state("pending", false)
        .with_state("approved", false)
        .with_state("shipped", true)
        .with_transition("approve", "pending", "approved", None)
        .with_transition("ship", "approved", "shipped", None)
}

#[test]
fn register_rejects_unknown_initial_state() {
    let def = StateMachineDefinition::new("bad", "ghost").with_state("real", false);
    let engine = StateMachineEngine::new();
    assert!(matches!(
        engine.register_definition(def),
        Err(StateMachineError::UnknownInitialState(s)) if s == "ghost"
    ));
}

#[test]
fn register_rejects_transition_to_unknown_state() {
    let def = StateMachineDefinition::new("bad", "pending")
        .with_state("pending", false)
        .with_transition("go", "pending", "nowhere", None);
    let engine = StateMachineEngine::new();
    assert!(matches!(
        engine.register_definition(def),
        Err(StateMachineError::UnknownTransitionState { .. })
    ));
}

#[test]
fn create_workflow_starts_in_initial_state() {
    let engine = StateMachineEngine::new();
    engine.register_definition(order_definition()).unwrap();
    engine
        .create_workflow("order", "order-1", IndexMap::new())
        .unwrap();
    let instance = engine.get_instance("order-1").unwrap();
    assert_eq!(instance.current_state, "pending");
}

#[test]
fn duplicate_instance_id_errors() {
    let engine = StateMachineEngine::new();
    engine.register_definition(order_definition()).unwrap();
    engine
        .create_workflow("order", "order-1", IndexMap::new())
        .unwrap();
    let result = engine.create_workflow("order", "order-1", IndexMap::new());
    assert!(matches!(result, Err(StateMachineError::DuplicateInstance(_))));
}

#[test]
fn transition_from_wrong_state_leaves_state_unchanged() {
    let engine = StateMachineEngine::new();
    engine.register_definition(order_definition()).unwrap();
    engine
        .create_workflow("order", "order-1", IndexMap::new())
        .unwrap();

    // "ship" requires "approved"; instance is still "pending".
    let result = engine.trigger_transition("order-1", "ship", IndexMap::new());
    assert!(matches!(
        result,
        Err(StateMachineError::NotAllowedFromState { .. })
    ));
    assert_eq!(engine.get_instance("order-1").unwrap().current_state, "pending");
}

#[test]
fn repeating_approve_on_already_approved_order_fails() {
    let engine = StateMachineEngine::new();
    engine.register_definition(order_definition()).unwrap();
    engine
        .create_workflow("order", "order-1", IndexMap::new())
        .unwrap();
    engine
        .trigger_transition("order-1", "approve", IndexMap::new())
        .unwrap();

    let result = engine.trigger_transition("order-1", "approve", IndexMap::new());
    assert!(matches!(
        result,
        Err(StateMachineError::NotAllowedFromState { .. })
    ));
}

#[test]
fn final_state_rejects_further_transitions() {
    let def = StateMachineDefinition::new("order", "pending")
        .with_state("pending", false)
        .with_state("shipped", true)
        .with_transition("ship", "pending", "shipped", None)
        .with_transition("cancel", "shipped", "pending", None);
    let engine = StateMachineEngine::new();
    engine.register_definition(def).unwrap();
    engine
        .create_workflow("order", "order-1", IndexMap::new())
        .unwrap();
    engine
        .trigger_transition("order-1", "ship", IndexMap::new())
        .unwrap();

    let result = engine.trigger_transition("order-1", "cancel", IndexMap::new());
    assert!(matches!(result, Err(StateMachineError::TerminalState(_))));
}

#[test]
fn unknown_event_fails_without_mutating_state() {
    let engine = StateMachineEngine::new();
    engine.register_definition(order_definition()).unwrap();
    engine
        .create_workflow("order", "order-1", IndexMap::new())
        .unwrap();
    let result = engine.trigger_transition("order-1", "teleport", IndexMap::new());
    assert!(matches!(result, Err(StateMachineError::UnknownTransition(_))));
    assert_eq!(engine.get_instance("order-1").unwrap().current_state, "pending");
}

#[test]
fn guard_can_reject_transition() {
    let guard: Guard = Arc::new(|data| data.get("amount").and_then(Value::as_i64).unwrap_or(0) > 100);
    let def = StateMachineDefinition::new("order", "pending")
        .with_state("pending", false)
        .with_state("approved", false)
        .with_transition("approve", "pending", "approved", Some(guard));
    let engine = StateMachineEngine::new();
    engine.register_definition(def).unwrap();
    engine
        .create_workflow("order", "order-1", IndexMap::new())
        .unwrap();

    let mut small = IndexMap::new();
    small.insert("amount".to_string(), Value::Int(10));
    let result = engine.trigger_transition("order-1", "approve", small);
    assert!(matches!(result, Err(StateMachineError::GuardRejected(_))));

    let mut big = IndexMap::new();
    big.insert("amount".to_string(), Value::Int(500));
    let instance = engine
        .trigger_transition("order-1", "approve", big)
        .unwrap();
    assert_eq!(instance.current_state, "approved");
}

#[test]
fn data_merge_is_last_writer_wins_per_key() {
    let engine = StateMachineEngine::new();
    engine.register_definition(order_definition()).unwrap();
    let mut initial = IndexMap::new();
    initial.insert("note".to_string(), Value::String("first".to_string()));
    engine
        .create_workflow("order", "order-1", initial)
        .unwrap();

    let mut update = IndexMap::new();
    update.insert("note".to_string(), Value::String("second".to_string()));
    let instance = engine
        .trigger_transition("order-1", "approve", update)
        .unwrap();
    assert_eq!(
        instance.data.get("note"),
        Some(&Value::String("second".to_string()))
    );
}

#[test]
fn listener_is_notified_on_commit() {
    struct Recorder(Mutex<Vec<String>>);
    impl TransitionListener for Recorder {
        fn on_transition(&self, instance_id: &str, event: &str, _instance: &StateMachineInstance) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{instance_id}:{event}"));
        }
    }
    use std::sync::Mutex;

    let engine = StateMachineEngine::new();
    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
    engine.add_listener(recorder.clone());
    engine.register_definition(order_definition()).unwrap();
    engine
        .create_workflow("order", "order-1", IndexMap::new())
        .unwrap();
    engine
        .trigger_transition("order-1", "approve", IndexMap::new())
        .unwrap();

    assert_eq!(*recorder.0.lock().unwrap(), vec!["order-1:approve"]);
}
