// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service registry abstraction and the capability interfaces steps
//! check resolved services against.
//!
//! Services are looked up by name and must satisfy a specific
//! capability set; factories can't always verify this at construction
//! time (a registry may be populated incrementally during application
//! init), so the mismatch is surfaced as a typed execute-time error
//! instead (spec.md §4.6, §9).

use crate::error::EngineError;
use pw_core::Value;
use std::sync::Arc;

/// Read/write key-value cache capability.
pub trait CacheCapability: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Publish-side broker capability.
pub trait BrokerProducerCapability: Send + Sync {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), String>;
}

/// Subscribe-side broker capability.
pub trait BrokerConsumerCapability: Send + Sync {
    fn subscribe(&self, topic: &str) -> Result<(), String>;
}

/// Minimal database-provider capability; concrete query shape is an
/// integration concern out of scope here.
pub trait DatabaseProviderCapability: Send + Sync {
    fn query(&self, statement: &str) -> Result<Vec<String>, String>;
}

/// Policy-evaluation capability (e.g. an authorization engine).
pub trait PolicyEngineCapability: Send + Sync {
    fn evaluate(&self, policy: &str, input: &str) -> Result<bool, String>;
}

/// Token-bucket style rate limiting capability.
pub trait RateLimitProviderCapability: Send + Sync {
    fn try_acquire(&self, key: &str) -> bool;
}

/// The capability the `state_machine_transition` step depends on,
/// kept abstract (rather than depending on `StateMachineEngine`
/// directly) so steps remain testable without a live engine instance.
pub trait TransitionTrigger: Send + Sync {
    fn trigger(
        &self,
        instance_id: &str,
        event: &str,
        data: indexmap::IndexMap<String, Value>,
    ) -> Result<indexmap::IndexMap<String, Value>, EngineError>;
}

/// A resolved service, tagged by which capability it was registered
/// under. Kept as a closed enum (rather than `Arc<dyn Any>` +
/// downcast) because `dyn Any` can only downcast to a concrete sized
/// type, not back to one of these trait objects.
#[derive(Clone)]
pub enum Capability {
    Cache(Arc<dyn CacheCapability>),
    BrokerProducer(Arc<dyn BrokerProducerCapability>),
    BrokerConsumer(Arc<dyn BrokerConsumerCapability>),
    DatabaseProvider(Arc<dyn DatabaseProviderCapability>),
    PolicyEngine(Arc<dyn PolicyEngineCapability>),
    RateLimitProvider(Arc<dyn RateLimitProviderCapability>),
    TransitionTrigger(Arc<dyn TransitionTrigger>),
}

impl Capability {
    fn mismatch(service: &str, wanted: &str) -> EngineError {
        EngineError::ServiceCapabilityMismatch {
            service: service.to_string(),
            capability: wanted.to_string(),
        }
    }

    pub fn into_cache(self, service: &str) -> Result<Arc<dyn CacheCapability>, EngineError> {
        match self {
            Capability::Cache(c) => Ok(c),
            _ => Err(Capability::mismatch(service, "Cache")),
        }
    }

    pub fn into_broker_producer(
        self,
        service: &str,
    ) -> Result<Arc<dyn BrokerProducerCapability>, EngineError> {
        match self {
            Capability::BrokerProducer(c) => Ok(c),
            _ => Err(Capability::mismatch(service, "BrokerProducer")),
        }
    }

    pub fn into_broker_consumer(
        self,
        service: &str,
    ) -> Result<Arc<dyn BrokerConsumerCapability>, EngineError> {
        match self {
            Capability::BrokerConsumer(c) => Ok(c),
            _ => Err(Capability::mismatch(service, "BrokerConsumer")),
        }
    }

    pub fn into_database_provider(
        self,
        service: &str,
    ) -> Result<Arc<dyn DatabaseProviderCapability>, EngineError> {
        match self {
            Capability::DatabaseProvider(c) => Ok(c),
            _ => Err(Capability::mismatch(service, "DatabaseProvider")),
        }
    }

    pub fn into_policy_engine(
        self,
        service: &str,
    ) -> Result<Arc<dyn PolicyEngineCapability>, EngineError> {
        match self {
            Capability::PolicyEngine(c) => Ok(c),
            _ => Err(Capability::mismatch(service, "PolicyEngine")),
        }
    }

    pub fn into_rate_limit_provider(
        self,
        service: &str,
    ) -> Result<Arc<dyn RateLimitProviderCapability>, EngineError> {
        match self {
            Capability::RateLimitProvider(c) => Ok(c),
            _ => Err(Capability::mismatch(service, "RateLimitProvider")),
        }
    }

    pub fn into_transition_trigger(
        self,
        service: &str,
    ) -> Result<Arc<dyn TransitionTrigger>, EngineError> {
        match self {
            Capability::TransitionTrigger(c) => Ok(c),
            _ => Err(Capability::mismatch(service, "TransitionTrigger")),
        }
    }
}

/// Process-wide lookup table exposing configured collaborators
/// (caches, databases, brokers, state machines, ...) by name.
/// Registration happens during application init; steps may assume a
/// fully-populated registry at execute time.
pub trait ServiceRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Capability>;
}

/// Resolve `name` and downcast it to the capability the caller needs
/// in one call, surfacing both "not found" and "wrong capability" as
/// typed errors (spec.md §4.6, §9).
pub fn resolve<T>(
    registry: &dyn ServiceRegistry,
    name: &str,
    into: impl FnOnce(Capability, &str) -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    let capability = registry
        .lookup(name)
        .ok_or_else(|| EngineError::ServiceNotFound(name.to_string()))?;
    into(capability, name)
}

/// An empty registry, useful as a default / test double.
#[derive(Default)]
pub struct EmptyServiceRegistry;

impl ServiceRegistry for EmptyServiceRegistry {
    fn lookup(&self, _name: &str) -> Option<Capability> {
        None
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
