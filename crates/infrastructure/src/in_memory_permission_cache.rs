use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use laurel_application::PermissionCache;
use laurel_core::AppResult;
use laurel_domain::{Permission, RoleId};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PermissionCacheEntry {
    permissions: BTreeSet<Permission>,
    expires_at: Instant,
}

/// In-process permission cache with a fixed ttl per entry.
///
/// Expired entries are pruned when read. A zero ttl disables caching.
#[derive(Debug)]
pub struct InMemoryPermissionCache {
    entries: RwLock<HashMap<RoleId, PermissionCacheEntry>>,
    ttl: Duration,
}

impl InMemoryPermissionCache {
    /// Default time-to-live of a cached permission set.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    /// Creates an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for InMemoryPermissionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

#[async_trait]
impl PermissionCache for InMemoryPermissionCache {
    async fn get(&self, role_id: RoleId) -> AppResult<Option<BTreeSet<Permission>>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&role_id) {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.permissions.clone()));
                }
            } else {
                return Ok(None);
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(&role_id)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(&role_id);
        }

        Ok(None)
    }

    async fn set(&self, role_id: RoleId, permissions: BTreeSet<Permission>) -> AppResult<()> {
        if self.ttl.is_zero() {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now.checked_add(self.ttl).unwrap_or(now);

        self.entries.write().await.insert(
            role_id,
            PermissionCacheEntry {
                permissions,
                expires_at,
            },
        );

        Ok(())
    }

    async fn invalidate(&self, role_id: RoleId) -> AppResult<()> {
        self.entries.write().await.remove(&role_id);
        Ok(())
    }
}
