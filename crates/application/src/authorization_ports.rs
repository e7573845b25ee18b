use std::collections::BTreeSet;

use async_trait::async_trait;
use laurel_core::AppResult;
use laurel_domain::{Permission, PermissionDefinition, PermissionId, RoleDefinition, RoleId};

/// Time-bounded cache of role permission sets.
///
/// Entries older than the adapter's ttl behave as absent. The cache only
/// accelerates lookups; the role permission repository stays authoritative.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Returns the cached permission set for a role, if fresh.
    async fn get(&self, role_id: RoleId) -> AppResult<Option<BTreeSet<Permission>>>;

    /// Stores the permission set for a role, replacing any previous entry.
    async fn set(&self, role_id: RoleId, permissions: BTreeSet<Permission>) -> AppResult<()>;

    /// Drops the cached entry for a role.
    async fn invalidate(&self, role_id: RoleId) -> AppResult<()>;
}

/// Repository port for roles, permissions and their grants.
#[async_trait]
pub trait RolePermissionRepository: Send + Sync {
    /// Lists the permissions granted to a role.
    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>>;

    /// Finds a role by id.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>>;

    /// Finds a role by its unique name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<RoleDefinition>>;

    /// Stores a new role. Fails with a conflict when the name is taken.
    async fn create_role(&self, role: &RoleDefinition) -> AppResult<()>;

    /// Finds a permission definition by name.
    async fn find_permission(
        &self,
        permission: &Permission,
    ) -> AppResult<Option<PermissionDefinition>>;

    /// Grants a permission to a role. Returns false when it was already granted.
    async fn grant_permission(&self, role_id: RoleId, permission_id: PermissionId)
    -> AppResult<bool>;

    /// Revokes a permission from a role. Returns false when it was not granted.
    async fn revoke_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool>;
}
