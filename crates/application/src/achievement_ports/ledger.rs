use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_core::AppResult;
use laurel_domain::{
    AchievementId, AchievementReference, ReferenceId, ReferenceStatus, StudentId,
};

/// Relational-store port for achievement workflow references.
#[async_trait]
pub trait ReferenceLedger: Send + Sync {
    /// Inserts a new reference row.
    async fn create(&self, reference: &AchievementReference) -> AppResult<()>;

    /// Finds the current reference of an achievement.
    async fn find_by_achievement_id(
        &self,
        achievement_id: &AchievementId,
    ) -> AppResult<Option<AchievementReference>>;

    /// Loads the current references of several achievements at once.
    async fn list_by_achievement_ids(
        &self,
        achievement_ids: &[AchievementId],
    ) -> AppResult<Vec<AchievementReference>>;

    /// Lists every reference owned by a student, newest first.
    async fn list_by_student(&self, student_id: StudentId)
    -> AppResult<Vec<AchievementReference>>;

    /// Lists every reference row recorded for an achievement, newest first.
    async fn history(&self, achievement_id: &AchievementId)
    -> AppResult<Vec<AchievementReference>>;

    /// Persists a transitioned reference if its stored status still equals
    /// `expected_status`; otherwise returns `AppError::Conflict`.
    async fn update_status(
        &self,
        expected_status: ReferenceStatus,
        reference: &AchievementReference,
    ) -> AppResult<()>;

    /// Writes a status unconditionally, touching only `status` and `updated_at`.
    async fn override_status(
        &self,
        reference_id: ReferenceId,
        status: ReferenceStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()>;
}
