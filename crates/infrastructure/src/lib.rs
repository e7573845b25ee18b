//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_achievement_store;
mod in_memory_permission_cache;
mod in_memory_reference_ledger;
mod jwt_credential_verifier;
mod mongo_achievement_store;
mod postgres_profile_repository;
mod postgres_reference_ledger;
mod postgres_role_permission_repository;
mod postgres_user_repository;
mod redis_permission_cache;

pub use in_memory_achievement_store::InMemoryAchievementStore;
pub use in_memory_permission_cache::InMemoryPermissionCache;
pub use in_memory_reference_ledger::InMemoryReferenceLedger;
pub use jwt_credential_verifier::{JwtCredentialVerifier, MIN_SECRET_LENGTH, TOKEN_ISSUER};
pub use mongo_achievement_store::{ACHIEVEMENTS_COLLECTION, DEFAULT_TIMEOUT, MongoAchievementStore};
pub use postgres_profile_repository::PostgresProfileRepository;
pub use postgres_reference_ledger::PostgresReferenceLedger;
pub use postgres_role_permission_repository::PostgresRolePermissionRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use redis_permission_cache::RedisPermissionCache;
