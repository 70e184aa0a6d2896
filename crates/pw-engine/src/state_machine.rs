// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named finite state machines with guarded transitions.
//!
//! A separate but closely-integrated component: definitions are
//! registered once, instances are created and persist across pipeline
//! runs, and `TriggerTransition` is the single write path. Instance
//! maps and per-instance state are guarded by a readers-writer lock —
//! reads (listing, querying) proceed in parallel, transitions take the
//! write lock for the compare-and-swap of `CurrentState` (spec.md §5).
//!
//! Listener invocation order under concurrent transitions (an Open
//! Question in spec.md §9): this engine serializes transitions by
//! holding the write lock for the full lookup/guard/update/notify
//! sequence, so listeners for one instance fire in the order their
//! triggering transitions acquired the lock.

use indexmap::IndexMap;
use parking_lot::RwLock;
use pw_core::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("definition '{0}' not registered")]
    DefinitionNotFound(String),
    #[error("initial state '{0}' is not one of the definition's states")]
    UnknownInitialState(String),
    #[error("transition '{transition}' references unknown state '{state}'")]
    UnknownTransitionState { transition: String, state: String },
    #[error("instance '{0}' not found")]
    InstanceNotFound(String),
    #[error("duplicate instance id: {0}")]
    DuplicateInstance(String),
    #[error("transition '{event}' not allowed from state '{state}'")]
    NotAllowedFromState { event: String, state: String },
    #[error("unknown transition event: {0}")]
    UnknownTransition(String),
    #[error("state '{0}' is final; no further transitions accepted")]
    TerminalState(String),
    #[error("guard rejected transition '{0}'")]
    GuardRejected(String),
}

/// One named state in a definition.
#[derive(Debug, Clone, Default)]
pub struct StateDef {
    pub is_final: bool,
}

/// Predicate gating a transition in addition to the source-state
/// check: receives the instance's current data merged with the
/// incoming transition data, returns whether the transition may fire.
pub type Guard = Arc<dyn Fn(&IndexMap<String, Value>) -> bool + Send + Sync>;

/// One named transition: source/target state plus an optional guard.
#[derive(Clone)]
pub struct TransitionDef {
    pub from_state: String,
    pub to_state: String,
    pub guard: Option<Guard>,
}

impl std::fmt::Debug for TransitionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionDef")
            .field("from_state", &self.from_state)
            .field("to_state", &self.to_state)
            .field("guard", &self.guard.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A named FSM template: states, transitions keyed by event name, and
/// the state new instances start in.
#[derive(Debug, Clone)]
pub struct StateMachineDefinition {
    pub name: String,
    pub initial_state: String,
    pub states: HashMap<String, StateDef>,
    pub transitions: HashMap<String, TransitionDef>,
}

impl StateMachineDefinition {
    pub fn new(name: impl Into<String>, initial_state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial_state: initial_state.into(),
            states: HashMap::new(),
            transitions: HashMap::new(),
        }
    }

    pub fn with_state(mut self, name: impl Into<String>, is_final: bool) -> Self {
        self.states.insert(name.into(), StateDef { is_final });
        self
    }

    pub fn with_transition(
        mut self,
        event: impl Into<String>,
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        guard: Option<Guard>,
    ) -> Self {
        self.transitions.insert(
            event.into(),
            TransitionDef {
                from_state: from_state.into(),
                to_state: to_state.into(),
                guard,
            },
        );
        self
    }

    fn validate(&self) -> Result<(), StateMachineError> {
        if !self.states.contains_key(&self.initial_state) {
            return Err(StateMachineError::UnknownInitialState(
                self.initial_state.clone(),
            ));
        }
        for (event, transition) in &self.transitions {
            if !self.states.contains_key(&transition.from_state) {
                return Err(StateMachineError::UnknownTransitionState {
                    transition: event.clone(),
                    state: transition.from_state.clone(),
                });
            }
            if !self.states.contains_key(&transition.to_state) {
                return Err(StateMachineError::UnknownTransitionState {
                    transition: event.clone(),
                    state: transition.to_state.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A live instance of a definition: current state plus a free-form
/// data map mutated by transitions.
#[derive(Debug, Clone)]
pub struct StateMachineInstance {
    pub definition_name: String,
    pub current_state: String,
    pub data: IndexMap<String, Value>,
}

/// Notified after a transition commits. Errors are logged and never
/// fatal (spec.md §4.5 step 7).
pub trait TransitionListener: Send + Sync {
    fn on_transition(&self, instance_id: &str, event: &str, instance: &StateMachineInstance);
}

struct Inner {
    definitions: HashMap<String, StateMachineDefinition>,
    instances: HashMap<String, StateMachineInstance>,
    listeners: Vec<Arc<dyn TransitionListener>>,
}

/// Registers definitions, creates instances, and executes guarded
/// transitions. Cheaply `Clone`-able (an `Arc` around the guarded
/// state) so it can be shared as a service-registry capability.
#[derive(Clone)]
pub struct StateMachineEngine {
    inner: Arc<RwLock<Inner>>,
}

impl Default for StateMachineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachineEngine {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                definitions: HashMap::new(),
                instances: HashMap::new(),
                listeners: Vec::new(),
            })),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn TransitionListener>) {
        self.inner.write().listeners.push(listener);
    }

    pub fn register_definition(
        &self,
        def: StateMachineDefinition,
    ) -> Result<(), StateMachineError> {
        def.validate()?;
        // Transition names are keyed by event in a map, so uniqueness
        // within one definition is structural rather than checked here.
        self.inner.write().definitions.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn create_workflow(
        &self,
        definition_name: &str,
        instance_id: &str,
        initial_data: IndexMap<String, Value>,
    ) -> Result<(), StateMachineError> {
        let mut inner = self.inner.write();
        let def = inner
            .definitions
            .get(definition_name)
            .ok_or_else(|| StateMachineError::DefinitionNotFound(definition_name.to_string()))?;
        if inner.instances.contains_key(instance_id) {
            return Err(StateMachineError::DuplicateInstance(
                instance_id.to_string(),
            ));
        }
        let instance = StateMachineInstance {
            definition_name: definition_name.to_string(),
            current_state: def.initial_state.clone(),
            data: initial_data,
        };
        inner.instances.insert(instance_id.to_string(), instance);
        Ok(())
    }

    pub fn get_instance(&self, instance_id: &str) -> Option<StateMachineInstance> {
        self.inner.read().instances.get(instance_id).cloned()
    }

    /// Fire `event` on `instance_id`. Holds the write lock for the
    /// full lookup/guard/commit/notify sequence.
    pub fn trigger_transition(
        &self,
        instance_id: &str,
        event: &str,
        data: IndexMap<String, Value>,
    ) -> Result<StateMachineInstance, StateMachineError> {
        let mut inner = self.inner.write();

        let definition_name = inner
            .instances
            .get(instance_id)
            .ok_or_else(|| StateMachineError::InstanceNotFound(instance_id.to_string()))?
            .definition_name
            .clone();
        let def = inner
            .definitions
            .get(&definition_name)
            .ok_or_else(|| StateMachineError::DefinitionNotFound(definition_name.clone()))?
            .clone();
        let transition = def
            .transitions
            .get(event)
            .ok_or_else(|| StateMachineError::UnknownTransition(event.to_string()))?
            .clone();

        {
            let instance = inner
                .instances
                .get(instance_id)
                .ok_or_else(|| StateMachineError::InstanceNotFound(instance_id.to_string()))?;

            if instance.current_state != transition.from_state {
                return Err(StateMachineError::NotAllowedFromState {
                    event: event.to_string(),
                    state: instance.current_state.clone(),
                });
            }
            if def
                .states
                .get(&instance.current_state)
                .is_some_and(|s| s.is_final)
            {
                return Err(StateMachineError::TerminalState(
                    instance.current_state.clone(),
                ));
            }
            if let Some(guard) = &transition.guard {
                let mut merged = instance.data.clone();
                for (k, v) in &data {
                    merged.insert(k.clone(), v.clone());
                }
                if !guard(&merged) {
                    return Err(StateMachineError::GuardRejected(event.to_string()));
                }
            }
        }

        let instance = inner
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| StateMachineError::InstanceNotFound(instance_id.to_string()))?;
        for (k, v) in data {
            instance.data.insert(k, v);
        }
        instance.current_state = transition.to_state.clone();
        let snapshot = instance.clone();

        for listener in &inner.listeners {
            listener.on_transition(instance_id, event, &snapshot);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
