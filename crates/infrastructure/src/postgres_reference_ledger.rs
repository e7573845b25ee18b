use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_application::ReferenceLedger;
use laurel_core::{AppError, AppResult};
use laurel_domain::{
    AchievementId, AchievementReference, ReferenceId, ReferenceSnapshot, ReferenceStatus,
    StudentId, UserId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed ledger of achievement workflow references.
#[derive(Clone)]
pub struct PostgresReferenceLedger {
    pool: PgPool,
}

impl PostgresReferenceLedger {
    /// Creates a ledger with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReferenceRow {
    id: Uuid,
    student_id: Uuid,
    achievement_id: String,
    status: String,
    submitted_at: Option<DateTime<Utc>>,
    verified_at: Option<DateTime<Utc>>,
    verified_by: Option<Uuid>,
    rejection_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReferenceRow> for AchievementReference {
    type Error = AppError;

    fn try_from(row: ReferenceRow) -> Result<Self, Self::Error> {
        let status = ReferenceStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode status of reference '{}': {error}",
                row.id
            ))
        })?;
        let achievement_id = AchievementId::new(row.achievement_id).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode achievement id of reference '{}': {error}",
                row.id
            ))
        })?;

        Ok(Self::from_snapshot(ReferenceSnapshot {
            id: ReferenceId::from_uuid(row.id),
            student_id: StudentId::from_uuid(row.student_id),
            achievement_id,
            status,
            submitted_at: row.submitted_at,
            verified_at: row.verified_at,
            verified_by: row.verified_by.map(UserId::from_uuid),
            rejection_note: row.rejection_note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

fn decode_rows(rows: Vec<ReferenceRow>) -> AppResult<Vec<AchievementReference>> {
    rows.into_iter().map(AchievementReference::try_from).collect()
}

#[async_trait]
impl ReferenceLedger for PostgresReferenceLedger {
    async fn create(&self, reference: &AchievementReference) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO achievement_references (
                id,
                student_id,
                achievement_id,
                status,
                submitted_at,
                verified_at,
                verified_by,
                rejection_note,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(reference.id().as_uuid())
        .bind(reference.student_id().as_uuid())
        .bind(reference.achievement_id().as_str())
        .bind(reference.status().as_str())
        .bind(reference.submitted_at())
        .bind(reference.verified_at())
        .bind(reference.verified_by().map(|user_id| user_id.as_uuid()))
        .bind(reference.rejection_note())
        .bind(reference.created_at())
        .bind(reference.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create achievement reference: {error}"))
        })?;

        Ok(())
    }

    async fn find_by_achievement_id(
        &self,
        achievement_id: &AchievementId,
    ) -> AppResult<Option<AchievementReference>> {
        let row = sqlx::query_as::<_, ReferenceRow>(
            r#"
            SELECT id, student_id, achievement_id, status, submitted_at, verified_at,
                verified_by, rejection_note, created_at, updated_at
            FROM achievement_references
            WHERE achievement_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(achievement_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load achievement reference: {error}"))
        })?;

        row.map(AchievementReference::try_from).transpose()
    }

    async fn list_by_achievement_ids(
        &self,
        achievement_ids: &[AchievementId],
    ) -> AppResult<Vec<AchievementReference>> {
        if achievement_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = achievement_ids
            .iter()
            .map(|achievement_id| achievement_id.as_str().to_owned())
            .collect();
        let rows = sqlx::query_as::<_, ReferenceRow>(
            r#"
            SELECT DISTINCT ON (achievement_id)
                id, student_id, achievement_id, status, submitted_at, verified_at,
                verified_by, rejection_note, created_at, updated_at
            FROM achievement_references
            WHERE achievement_id = ANY($1)
            ORDER BY achievement_id, created_at DESC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load achievement references: {error}"))
        })?;

        decode_rows(rows)
    }

    async fn list_by_student(
        &self,
        student_id: StudentId,
    ) -> AppResult<Vec<AchievementReference>> {
        let rows = sqlx::query_as::<_, ReferenceRow>(
            r#"
            SELECT id, student_id, achievement_id, status, submitted_at, verified_at,
                verified_by, rejection_note, created_at, updated_at
            FROM achievement_references
            WHERE student_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(student_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list student references: {error}"))
        })?;

        decode_rows(rows)
    }

    async fn history(
        &self,
        achievement_id: &AchievementId,
    ) -> AppResult<Vec<AchievementReference>> {
        let rows = sqlx::query_as::<_, ReferenceRow>(
            r#"
            SELECT id, student_id, achievement_id, status, submitted_at, verified_at,
                verified_by, rejection_note, created_at, updated_at
            FROM achievement_references
            WHERE achievement_id = $1
            ORDER BY created_at DESC, updated_at DESC
            "#,
        )
        .bind(achievement_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load achievement history: {error}"))
        })?;

        decode_rows(rows)
    }

    async fn update_status(
        &self,
        expected_status: ReferenceStatus,
        reference: &AchievementReference,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE achievement_references
            SET status = $3,
                submitted_at = $4,
                verified_at = $5,
                verified_by = $6,
                rejection_note = $7,
                updated_at = $8
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(reference.id().as_uuid())
        .bind(expected_status.as_str())
        .bind(reference.status().as_str())
        .bind(reference.submitted_at())
        .bind(reference.verified_at())
        .bind(reference.verified_by().map(|user_id| user_id.as_uuid()))
        .bind(reference.rejection_note())
        .bind(reference.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update achievement reference: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "achievement '{}' is no longer '{}'",
                reference.achievement_id(),
                expected_status.as_str()
            )));
        }

        Ok(())
    }

    async fn override_status(
        &self,
        reference_id: ReferenceId,
        status: ReferenceStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE achievement_references
            SET status = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(reference_id.as_uuid())
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to override reference status: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "achievement reference '{reference_id}' not found"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
