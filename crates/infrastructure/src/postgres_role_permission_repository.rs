use std::str::FromStr;

use async_trait::async_trait;
use laurel_application::RolePermissionRepository;
use laurel_core::{AppError, AppResult};
use laurel_domain::{Permission, PermissionDefinition, PermissionId, RoleDefinition, RoleId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed repository for roles and their permission grants.
#[derive(Clone)]
pub struct PostgresRolePermissionRepository {
    pool: PgPool,
}

impl PostgresRolePermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionNameRow {
    name: String,
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: String,
}

impl From<RoleRow> for RoleDefinition {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::from_uuid(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    name: String,
    resource: String,
    action: String,
    description: String,
}

#[async_trait]
impl RolePermissionRepository for PostgresRolePermissionRepository {
    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionNameRow>(
            r#"
            SELECT permissions.name
            FROM role_permissions
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE role_permissions.role_id = $1
            ORDER BY permissions.name
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load permissions for role '{role_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| {
                Permission::from_str(row.name.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{}' for role '{role_id}': {error}",
                        row.name
                    ))
                })
            })
            .collect()
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(row.map(RoleDefinition::from))
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<RoleDefinition>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description
            FROM roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role by name: {error}")))?;

        Ok(row.map(RoleDefinition::from))
    }

    async fn create_role(&self, role: &RoleDefinition) -> AppResult<()> {
        sqlx::query("INSERT INTO roles (id, name, description) VALUES ($1, $2, $3)")
            .bind(role.id.as_uuid())
            .bind(role.name.as_str())
            .bind(role.description.as_str())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                if let sqlx::Error::Database(ref database_error) = error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return AppError::Conflict(format!("role '{}' already exists", role.name));
                }
                AppError::Internal(format!("failed to create role: {error}"))
            })?;

        Ok(())
    }

    async fn find_permission(
        &self,
        permission: &Permission,
    ) -> AppResult<Option<PermissionDefinition>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, resource, action, description
            FROM permissions
            WHERE name = $1
            "#,
        )
        .bind(permission.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?;

        row.map(|row| {
            let name = Permission::from_str(row.name.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode permission '{}': {error}",
                    row.name
                ))
            })?;

            Ok(PermissionDefinition {
                id: PermissionId::from_uuid(row.id),
                name,
                resource: row.resource,
                action: row.action,
                description: row.description,
            })
        })
        .transpose()
    }

    async fn grant_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to grant permission: {error}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE role_id = $1 AND permission_id = $2
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke permission: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use laurel_application::RolePermissionRepository;
    use laurel_core::AppError;
    use laurel_domain::{Permission, RoleDefinition, RoleId};
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;

    use super::PostgresRolePermissionRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for role permission tests: {error}");
        }

        Some(pool)
    }

    #[tokio::test]
    async fn grant_and_revoke_follow_role_permissions_rows() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let role_id = RoleId::new();
        let insert = sqlx::query("INSERT INTO roles (id, name, description) VALUES ($1, $2, '')")
            .bind(role_id.as_uuid())
            .bind(format!("role-{role_id}"))
            .execute(&pool)
            .await;
        assert!(insert.is_ok());

        let repository = PostgresRolePermissionRepository::new(pool);
        let definition = repository
            .find_permission(&Permission::ACHIEVEMENTS_VERIFY)
            .await
            .ok()
            .flatten();
        let Some(definition) = definition else {
            panic!("seeded permission is missing");
        };

        assert_eq!(
            repository
                .grant_permission(role_id, definition.id)
                .await
                .ok(),
            Some(true)
        );
        assert_eq!(
            repository
                .grant_permission(role_id, definition.id)
                .await
                .ok(),
            Some(false)
        );
        assert_eq!(
            repository.list_permissions_for_role(role_id).await.ok(),
            Some(vec![Permission::ACHIEVEMENTS_VERIFY])
        );

        assert_eq!(
            repository
                .revoke_permission(role_id, definition.id)
                .await
                .ok(),
            Some(true)
        );
        assert_eq!(
            repository.list_permissions_for_role(role_id).await.ok(),
            Some(Vec::new())
        );
        assert!(
            repository
                .find_role(RoleId::new())
                .await
                .is_ok_and(|role| role.is_none())
        );
    }

    #[tokio::test]
    async fn created_role_is_found_by_name_once() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresRolePermissionRepository::new(pool);
        let role = RoleDefinition::new(format!("Role {}", RoleId::new()), "created in test")
            .unwrap_or_else(|_| unreachable!());

        assert!(repository.create_role(&role).await.is_ok());
        let found = repository.find_role_by_name(&role.name).await.ok().flatten();
        assert_eq!(found, Some(role.clone()));

        let duplicate = repository.create_role(&RoleDefinition { id: RoleId::new(), ..role }).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }
}
