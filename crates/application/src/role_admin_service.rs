use std::sync::Arc;

use laurel_core::{AppError, AppResult, UserIdentity};
use laurel_domain::{Permission, PermissionDefinition, RoleDefinition, RoleId};
use tracing::info;

use crate::{AuthorizationService, RolePermissionRepository};

/// Role with its current grant set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissions {
    /// Role row.
    pub role: RoleDefinition,
    /// Granted permissions in name order.
    pub permissions: Vec<Permission>,
}

/// Administrative service for roles and their permission grants.
///
/// Every successful grant change invalidates the role's cached permission set.
#[derive(Clone)]
pub struct RoleAdminService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn RolePermissionRepository>,
}

impl RoleAdminService {
    /// Creates a role administration service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn RolePermissionRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Creates a role without grants.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        name: &str,
        description: &str,
    ) -> AppResult<RoleDefinition> {
        self.authorization_service
            .require_permission(actor, &Permission::ROLES_CREATE)
            .await?;

        let role = RoleDefinition::new(name, description)?;
        if self.repository.find_role_by_name(&role.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name
            )));
        }

        self.repository.create_role(&role).await?;
        info!(role = %role.name, role_id = %role.id, subject = actor.subject(), "role created");
        Ok(role)
    }

    /// Returns a role together with its live grants.
    pub async fn list_role_permissions(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
    ) -> AppResult<RolePermissions> {
        self.authorization_service
            .require_permission(actor, &Permission::ROLES_VIEW)
            .await?;

        let role = self.find_role(role_id).await?;
        self.with_permissions(role).await
    }

    /// Looks a role up by name and returns it with its live grants.
    pub async fn get_role_by_name(
        &self,
        actor: &UserIdentity,
        name: &str,
    ) -> AppResult<RolePermissions> {
        self.authorization_service
            .require_permission(actor, &Permission::ROLES_VIEW)
            .await?;

        let role = self
            .repository
            .find_role_by_name(name.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{}' not found", name.trim())))?;
        self.with_permissions(role).await
    }

    /// Grants a permission to a role.
    pub async fn grant_permission(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        permission: &Permission,
    ) -> AppResult<()> {
        let (role, definition) = self.resolve_change(actor, role_id, permission).await?;

        if self
            .repository
            .grant_permission(role.id, definition.id)
            .await?
        {
            info!(role = %role.name, %permission, subject = actor.subject(), "permission granted");
        }

        self.authorization_service.invalidate_role(role.id).await;
        Ok(())
    }

    /// Revokes a permission from a role.
    pub async fn revoke_permission(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        permission: &Permission,
    ) -> AppResult<()> {
        let (role, definition) = self.resolve_change(actor, role_id, permission).await?;

        if self
            .repository
            .revoke_permission(role.id, definition.id)
            .await?
        {
            info!(role = %role.name, %permission, subject = actor.subject(), "permission revoked");
        }

        self.authorization_service.invalidate_role(role.id).await;
        Ok(())
    }

    async fn resolve_change(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        permission: &Permission,
    ) -> AppResult<(RoleDefinition, PermissionDefinition)> {
        self.authorization_service
            .require_permission(actor, &Permission::ROLES_MANAGE)
            .await?;

        let role = self.find_role(role_id).await?;
        let definition = self
            .repository
            .find_permission(permission)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("permission '{permission}' not found")))?;

        Ok((role, definition))
    }

    async fn with_permissions(&self, role: RoleDefinition) -> AppResult<RolePermissions> {
        let mut permissions = self.repository.list_permissions_for_role(role.id).await?;
        permissions.sort();
        permissions.dedup();

        Ok(RolePermissions { role, permissions })
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<RoleDefinition> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' not found")))
    }
}

#[cfg(test)]
mod tests;
