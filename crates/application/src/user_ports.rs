use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_core::AppResult;
use laurel_domain::{RoleId, UserAccount, UserId};

/// Repository port for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new account. Fails with a conflict when username or email is taken.
    async fn create_user(&self, user: &UserAccount) -> AppResult<()>;

    /// Finds an account by id.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>>;

    /// Lists every account ordered by username.
    async fn list_users(&self) -> AppResult<Vec<UserAccount>>;

    /// Persists account changes. Fails with not found when the account is missing.
    async fn update_user(&self, user: &UserAccount) -> AppResult<()>;

    /// Deletes an account. Returns false when it did not exist.
    async fn delete_user(&self, user_id: UserId) -> AppResult<bool>;

    /// Changes the role of an account. Returns false when the account is missing.
    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;
}

/// Input for creating a user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    /// Unique login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Role assigned on creation.
    pub role_id: Option<RoleId>,
}
