//! Laurel API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod extract;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use laurel_application::{
    AchievementService, AuthorizationService, PermissionCache, ProfileService, RoleAdminService,
    UserAdminService,
};
use laurel_core::AppError;
use laurel_infrastructure::{
    InMemoryPermissionCache, JwtCredentialVerifier, MongoAchievementStore,
    PostgresProfileRepository, PostgresReferenceLedger, PostgresRolePermissionRepository,
    PostgresUserRepository, RedisPermissionCache,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::api_config::{ApiConfig, PermissionCacheConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let achievement_store = MongoAchievementStore::connect(
        &config.mongodb_url,
        &config.mongodb_database,
        config.document_store_timeout,
    )
    .await?;
    achievement_store.ensure_indexes().await?;

    let permission_cache: Arc<dyn PermissionCache> = match &config.permission_cache {
        PermissionCacheConfig::Memory => {
            info!(ttl = ?config.permission_cache_ttl, "using in-memory permission cache");
            Arc::new(InMemoryPermissionCache::new(config.permission_cache_ttl))
        }
        PermissionCacheConfig::Redis { url } => {
            let client = redis::Client::open(url.as_str()).map_err(|error| {
                AppError::Validation(format!("invalid REDIS_URL: {error}"))
            })?;
            info!(ttl = ?config.permission_cache_ttl, "using redis permission cache");
            Arc::new(RedisPermissionCache::new(
                client,
                "laurel:permissions",
                config.permission_cache_ttl,
            ))
        }
    };

    let role_repository = Arc::new(PostgresRolePermissionRepository::new(pool.clone()));
    let profile_repository = Arc::new(PostgresProfileRepository::new(pool.clone()));
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let authorization_service =
        AuthorizationService::new(role_repository.clone(), permission_cache);

    let app_state = AppState {
        achievement_service: AchievementService::new(
            authorization_service.clone(),
            Arc::new(achievement_store),
            Arc::new(PostgresReferenceLedger::new(pool)),
            profile_repository.clone(),
        ),
        profile_service: ProfileService::new(
            authorization_service.clone(),
            profile_repository.clone(),
            user_repository.clone(),
        ),
        role_admin_service: RoleAdminService::new(
            authorization_service.clone(),
            role_repository.clone(),
        ),
        user_admin_service: UserAdminService::new(
            authorization_service.clone(),
            user_repository,
            role_repository,
            profile_repository,
        ),
        authorization_service,
        credential_verifier: Arc::new(JwtCredentialVerifier::new(&config.jwt_secret)?),
    };

    let app = api_router::build_router(app_state, &config.frontend_url)?;
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "laurel-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
