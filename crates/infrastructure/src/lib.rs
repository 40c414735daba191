//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_access_directory;
mod postgres_actor_hierarchy_repository;
mod postgres_principal_repository;
mod postgres_resource_store;

pub use in_memory_access_directory::InMemoryAccessDirectory;
pub use postgres_actor_hierarchy_repository::PostgresActorHierarchyRepository;
pub use postgres_principal_repository::PostgresPrincipalRepository;
pub use postgres_resource_store::PostgresResourceStore;
