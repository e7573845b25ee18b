//! PostgreSQL-backed user account repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_application::UserRepository;
use laurel_core::{AppError, AppResult};
use laurel_domain::{RoleId, UserAccount, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL implementation of the user repository port.
///
/// Password hashes are owned by the sign-in service; accounts created here
/// carry none until a credential is set.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    full_name: String,
    role_id: Option<Uuid>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            role_id: row.role_id.map(RoleId::from_uuid),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, full_name, role_id, is_active, created_at, updated_at";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, user: &UserAccount) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, full_name, role_id, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.full_name.as_str())
        .bind(user.role_id.map(|role_id| role_id.as_uuid()))
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| account_conflict_or_internal(error, "create user"))?;

        Ok(())
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user: {error}")))?;

        Ok(row.map(UserAccount::from))
    }

    async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        Ok(rows.into_iter().map(UserAccount::from).collect())
    }

    async fn update_user(&self, user: &UserAccount) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, full_name = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.full_name.as_str())
        .bind(user.is_active)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| account_conflict_or_internal(error, "update user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{}' not found", user.id)));
        }

        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete user: {error}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET role_id = $2, updated_at = $3 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(role_id.as_uuid())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to assign role: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}

fn account_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(
            "an account with this username or email already exists".to_owned(),
        );
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
