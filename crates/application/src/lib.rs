//! Application services and ports of the access decision engine.

#![forbid(unsafe_code)]

mod access_decision_service;
mod access_ports;
mod predicate_builder;
mod principal_resolver;
mod query_augmenter;
mod relationship_resolver;
mod round_trip;

#[cfg(test)]
mod test_fakes;

pub use access_decision_service::AccessDecisionService;
pub use access_ports::{ActorHierarchyRepository, PrincipalRepository, ResourceStore};
pub use predicate_builder::PredicateBuilder;
pub use principal_resolver::PrincipalResolver;
pub use query_augmenter::QueryAugmenter;
pub use relationship_resolver::RelationshipResolver;
pub use round_trip::{AccessEngineConfig, DEFAULT_ROUND_TRIP_TIMEOUT};
