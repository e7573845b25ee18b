use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_core::AppResult;
use laurel_domain::{
    Achievement, AchievementId, AchievementPatch, Attachment, NewAchievement, StudentId,
};

use super::query::{AchievementListQuery, AchievementPage, PageRequest, ScanCursor};

/// Document-store port for achievement content.
///
/// Soft-deleted documents (those carrying `deleted_at`) are invisible to every
/// read except `hard_delete`. Adapters bound each call with a timeout and
/// report timeouts as `AppError::Internal`.
#[async_trait]
pub trait AchievementStore: Send + Sync {
    /// Stores a new achievement for the owner and returns it with its assigned id.
    async fn create(
        &self,
        student_id: StudentId,
        achievement: NewAchievement,
        now: DateTime<Utc>,
    ) -> AppResult<Achievement>;

    /// Finds a live achievement.
    async fn find(&self, achievement_id: &AchievementId) -> AppResult<Option<Achievement>>;

    /// Applies a patch to a live achievement and refreshes `updated_at`.
    async fn update(
        &self,
        achievement_id: &AchievementId,
        patch: &AchievementPatch,
        now: DateTime<Utc>,
    ) -> AppResult<Achievement>;

    /// Marks a live achievement as deleted.
    async fn soft_delete(&self, achievement_id: &AchievementId, now: DateTime<Utc>)
    -> AppResult<()>;

    /// Clears the soft-delete marker. Used to compensate failed deletions.
    async fn restore(&self, achievement_id: &AchievementId) -> AppResult<()>;

    /// Physically removes a document, deleted or not. Returns false when absent.
    async fn hard_delete(&self, achievement_id: &AchievementId) -> AppResult<bool>;

    /// Lists live achievements matching the query, newest first.
    async fn list(
        &self,
        query: &AchievementListQuery,
        page: PageRequest,
    ) -> AppResult<AchievementPage>;

    /// Appends one attachment to a live achievement.
    async fn push_attachment(
        &self,
        achievement_id: &AchievementId,
        attachment: Attachment,
        now: DateTime<Utc>,
    ) -> AppResult<Achievement>;

    /// Lists up to `limit` live achievements created in `[from, to]`, ordered
    /// by `(created_at, id)` and starting strictly after `after` when given.
    async fn list_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<&ScanCursor>,
        limit: u32,
    ) -> AppResult<Vec<Achievement>>;
}
