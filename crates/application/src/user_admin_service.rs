use std::sync::Arc;

use chrono::{DateTime, Utc};
use laurel_core::{AppError, AppResult, UserIdentity};
use laurel_domain::{
    LecturerProfile, Permission, RoleDefinition, RoleId, StudentProfile, UserAccount,
    UserAccountChanges, UserId,
};
use tracing::info;

use crate::{
    AuthorizationService, CreateUserInput, ProfileRepository, RolePermissionRepository,
    UserRepository,
};

/// Account of the caller with its live role grants and linked profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerProfile {
    /// Account row.
    pub user: UserAccount,
    /// Assigned role, if any.
    pub role: Option<RoleDefinition>,
    /// Permissions currently granted through the role, in name order.
    pub permissions: Vec<Permission>,
    /// Student profile linked to the account.
    pub student: Option<StudentProfile>,
    /// Lecturer profile linked to the account.
    pub lecturer: Option<LecturerProfile>,
}

/// Administrative service for user accounts and role assignment.
///
/// Role assignment does not touch the permission cache: cached entries are
/// keyed by role, and a role's grant set is unchanged by who holds it.
/// Credentials issued before the change keep their embedded role until they
/// are refreshed.
#[derive(Clone)]
pub struct UserAdminService {
    authorization_service: AuthorizationService,
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RolePermissionRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl UserAdminService {
    /// Creates a user administration service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RolePermissionRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            authorization_service,
            users,
            roles,
            profiles,
        }
    }

    /// Lists every account.
    pub async fn list_users(&self, actor: &UserIdentity) -> AppResult<Vec<UserAccount>> {
        self.authorization_service
            .require_permission(actor, &Permission::USERS_LIST)
            .await?;

        self.users.list_users().await
    }

    /// Returns one account.
    pub async fn get_user(&self, actor: &UserIdentity, user_id: UserId) -> AppResult<UserAccount> {
        self.authorization_service
            .require_permission(actor, &Permission::USERS_VIEW)
            .await?;

        self.find_user(user_id).await
    }

    /// Creates an active account.
    pub async fn create_user(
        &self,
        actor: &UserIdentity,
        input: CreateUserInput,
        now: DateTime<Utc>,
    ) -> AppResult<UserAccount> {
        self.authorization_service
            .require_permission(actor, &Permission::USERS_CREATE)
            .await?;

        let user = UserAccount::new(
            input.username,
            input.email,
            input.full_name,
            input.role_id,
            now,
        )?;
        if let Some(role_id) = user.role_id {
            self.find_role(role_id).await?;
        }

        self.users.create_user(&user).await?;
        info!(
            user_id = %user.id,
            username = %user.username,
            subject = actor.subject(),
            "user created"
        );

        Ok(user)
    }

    /// Applies account changes. The role is changed through [`Self::assign_role`].
    pub async fn update_user(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        changes: UserAccountChanges,
        now: DateTime<Utc>,
    ) -> AppResult<UserAccount> {
        self.authorization_service
            .require_permission(actor, &Permission::USERS_UPDATE)
            .await?;

        let mut user = self.find_user(user_id).await?;
        user.apply(changes, now)?;
        self.users.update_user(&user).await?;
        info!(%user_id, subject = actor.subject(), "user updated");

        Ok(user)
    }

    /// Deletes an account that has no student or lecturer profile.
    pub async fn delete_user(&self, actor: &UserIdentity, user_id: UserId) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, &Permission::USERS_DELETE)
            .await?;

        if self.profiles.find_student_by_user(user_id).await?.is_some()
            || self.profiles.find_lecturer_by_user(user_id).await?.is_some()
        {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' still has a linked profile"
            )));
        }

        if !self.users.delete_user(user_id).await? {
            return Err(user_not_found(user_id));
        }
        info!(%user_id, subject = actor.subject(), "user deleted");

        Ok(())
    }

    /// Assigns a role to an account.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: RoleId,
        now: DateTime<Utc>,
    ) -> AppResult<UserAccount> {
        self.authorization_service
            .require_permission(actor, &Permission::USERS_ASSIGN_ROLE)
            .await?;

        let role = self.find_role(role_id).await?;
        let mut user = self.find_user(user_id).await?;
        if !self.users.assign_role(user_id, role.id, now).await? {
            return Err(user_not_found(user_id));
        }
        info!(%user_id, role = %role.name, subject = actor.subject(), "role assigned");

        user.role_id = Some(role.id);
        user.updated_at = now;
        Ok(user)
    }

    /// Returns the caller's own account. Requires no permission.
    pub async fn current_profile(&self, actor: &UserIdentity) -> AppResult<CallerProfile> {
        let user_id = UserId::parse(actor.subject())
            .map_err(|_| AppError::Unauthorized("credential subject is not a user id".to_owned()))?;
        let user = self.find_user(user_id).await?;

        let (role, permissions) = match user.role_id {
            Some(role_id) => {
                let role = self.roles.find_role(role_id).await?;
                let permissions = self
                    .authorization_service
                    .resolve_role_permissions(role_id)
                    .await?
                    .into_iter()
                    .collect();
                (role, permissions)
            }
            None => (None, Vec::new()),
        };

        Ok(CallerProfile {
            student: self.profiles.find_student_by_user(user.id).await?,
            lecturer: self.profiles.find_lecturer_by_user(user.id).await?,
            user,
            role,
            permissions,
        })
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<UserAccount> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<RoleDefinition> {
        self.roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' not found")))
    }
}

fn user_not_found(user_id: UserId) -> AppError {
    AppError::NotFound(format!("user '{user_id}' not found"))
}
