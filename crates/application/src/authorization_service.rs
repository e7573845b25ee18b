use std::collections::BTreeSet;
use std::sync::Arc;

use laurel_core::{AppError, AppResult, UserIdentity};
use laurel_domain::{Permission, RoleId};
use tracing::{debug, error, warn};

use crate::authorization_ports::{PermissionCache, RolePermissionRepository};

/// Outcome of an access check that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The caller holds the permission.
    Allow,
    /// The caller lacks the permission.
    Deny,
}

impl AccessDecision {
    /// Returns whether access is granted.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Application service resolving role permissions and deciding access.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn RolePermissionRepository>,
    cache: Arc<dyn PermissionCache>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RolePermissionRepository>,
        cache: Arc<dyn PermissionCache>,
    ) -> Self {
        Self { repository, cache }
    }

    /// Returns the permission set of a role, consulting the cache first.
    ///
    /// Repository failures propagate; cache failures count as a miss.
    pub async fn resolve_role_permissions(
        &self,
        role_id: RoleId,
    ) -> AppResult<BTreeSet<Permission>> {
        match self.cache.get(role_id).await {
            Ok(Some(permissions)) => return Ok(permissions),
            Ok(None) => {}
            Err(cache_error) => {
                warn!(%role_id, error = %cache_error, "permission cache read failed");
            }
        }

        let permissions: BTreeSet<Permission> = self
            .repository
            .list_permissions_for_role(role_id)
            .await?
            .into_iter()
            .collect();

        if let Err(cache_error) = self.cache.set(role_id, permissions.clone()).await {
            warn!(%role_id, error = %cache_error, "permission cache write failed");
        }

        Ok(permissions)
    }

    /// Decides whether the caller holds a permission.
    ///
    /// The credential's embedded snapshot is checked first, then the live
    /// role grants. A resolver failure is returned as `AppError::Internal`
    /// and never reported as a denial.
    pub async fn authorize(
        &self,
        identity: &UserIdentity,
        permission: &Permission,
    ) -> AppResult<AccessDecision> {
        if identity.has_embedded_permission(permission.as_str()) {
            return Ok(AccessDecision::Allow);
        }

        let Some(raw_role_id) = identity.role_id() else {
            debug!(subject = identity.subject(), %permission, "denied: no role assigned");
            return Ok(AccessDecision::Deny);
        };

        let Ok(role_id) = RoleId::parse(raw_role_id) else {
            debug!(subject = identity.subject(), %permission, "denied: unparsable role id");
            return Ok(AccessDecision::Deny);
        };

        let permissions = self
            .resolve_role_permissions(role_id)
            .await
            .map_err(|resolve_error| {
                error!(%role_id, error = %resolve_error, "failed to resolve role permissions");
                match resolve_error {
                    AppError::Internal(message) => AppError::Internal(message),
                    other => AppError::Internal(format!(
                        "failed to resolve permissions for role '{role_id}': {other}"
                    )),
                }
            })?;

        if permissions.contains(permission) {
            Ok(AccessDecision::Allow)
        } else {
            debug!(
                subject = identity.subject(),
                %role_id,
                %permission,
                "denied: permission not granted"
            );
            Ok(AccessDecision::Deny)
        }
    }

    /// Ensures the caller holds a permission.
    pub async fn require_permission(
        &self,
        identity: &UserIdentity,
        permission: &Permission,
    ) -> AppResult<()> {
        match self.authorize(identity, permission).await? {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny => Err(AppError::Forbidden(format!(
                "subject '{}' is missing permission '{}'",
                identity.subject(),
                permission.as_str()
            ))),
        }
    }

    /// Drops the cached permission set of a role.
    pub async fn invalidate_role(&self, role_id: RoleId) {
        if let Err(cache_error) = self.cache.invalidate(role_id).await {
            warn!(%role_id, error = %cache_error, "permission cache invalidation failed");
        }
    }
}
