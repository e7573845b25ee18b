//! Redis-backed permission cache shared by every api instance.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use laurel_application::PermissionCache;
use laurel_core::{AppError, AppResult};
use laurel_domain::{Permission, RoleId};
use redis::AsyncCommands;

/// Redis implementation of the permission cache port.
///
/// Entries are JSON arrays of permission names written with `SET EX`, so
/// expiry is enforced by Redis itself.
#[derive(Clone)]
pub struct RedisPermissionCache {
    client: redis::Client,
    key_prefix: String,
    ttl: Duration,
}

impl RedisPermissionCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            ttl,
        }
    }

    fn key_for(&self, role_id: RoleId) -> String {
        format!("{}:role={role_id}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl PermissionCache for RedisPermissionCache {
    async fn get(&self, role_id: RoleId) -> AppResult<Option<BTreeSet<Permission>>> {
        let mut connection = self.connection().await?;

        let encoded: Option<String> = connection
            .get(self.key_for(role_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read permission cache entry: {error}"))
            })?;

        encoded.as_deref().map(decode_permissions).transpose()
    }

    async fn set(&self, role_id: RoleId, permissions: BTreeSet<Permission>) -> AppResult<()> {
        if self.ttl.is_zero() {
            return Ok(());
        }

        let value = serde_json::to_string(&permissions).map_err(|error| {
            AppError::Internal(format!("failed to encode permission cache entry: {error}"))
        })?;
        let ttl_seconds = self.ttl.as_secs().max(1);
        let mut connection = self.connection().await?;

        connection
            .set_ex(self.key_for(role_id), value, ttl_seconds)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write permission cache entry: {error}"))
            })
    }

    async fn invalidate(&self, role_id: RoleId) -> AppResult<()> {
        let mut connection = self.connection().await?;

        connection
            .del(self.key_for(role_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to drop permission cache entry: {error}"))
            })
    }
}

fn decode_permissions(value: &str) -> AppResult<BTreeSet<Permission>> {
    serde_json::from_str(value).map_err(|error| {
        AppError::Internal(format!("invalid permission cache entry '{value}': {error}"))
    })
}
