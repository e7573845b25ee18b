use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_application::ReferenceLedger;
use laurel_core::{AppError, AppResult};
use laurel_domain::{
    AchievementId, AchievementReference, ReferenceId, ReferenceStatus, StudentId,
};
use tokio::sync::RwLock;

/// In-memory reference ledger implementation.
#[derive(Debug, Default)]
pub struct InMemoryReferenceLedger {
    rows: RwLock<Vec<AchievementReference>>,
}

impl InMemoryReferenceLedger {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut rows: Vec<AchievementReference>) -> Vec<AchievementReference> {
    rows.reverse();
    rows.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
    rows
}

#[async_trait]
impl ReferenceLedger for InMemoryReferenceLedger {
    async fn create(&self, reference: &AchievementReference) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id() == reference.id()) {
            return Err(AppError::Conflict(format!(
                "achievement reference '{}' already exists",
                reference.id()
            )));
        }

        rows.push(reference.clone());
        Ok(())
    }

    async fn find_by_achievement_id(
        &self,
        achievement_id: &AchievementId,
    ) -> AppResult<Option<AchievementReference>> {
        Ok(self.history(achievement_id).await?.into_iter().next())
    }

    async fn list_by_achievement_ids(
        &self,
        achievement_ids: &[AchievementId],
    ) -> AppResult<Vec<AchievementReference>> {
        let mut current = Vec::with_capacity(achievement_ids.len());
        for achievement_id in achievement_ids {
            if let Some(reference) = self.find_by_achievement_id(achievement_id).await? {
                current.push(reference);
            }
        }
        Ok(current)
    }

    async fn list_by_student(
        &self,
        student_id: StudentId,
    ) -> AppResult<Vec<AchievementReference>> {
        let rows = self.rows.read().await;
        Ok(newest_first(
            rows.iter()
                .filter(|row| row.student_id() == student_id)
                .cloned()
                .collect(),
        ))
    }

    async fn history(
        &self,
        achievement_id: &AchievementId,
    ) -> AppResult<Vec<AchievementReference>> {
        let rows = self.rows.read().await;
        Ok(newest_first(
            rows.iter()
                .filter(|row| row.achievement_id() == achievement_id)
                .cloned()
                .collect(),
        ))
    }

    async fn update_status(
        &self,
        expected_status: ReferenceStatus,
        reference: &AchievementReference,
    ) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let Some(stored) = rows
            .iter_mut()
            .find(|row| row.id() == reference.id() && row.status() == expected_status)
        else {
            return Err(AppError::Conflict(format!(
                "achievement '{}' is no longer '{}'",
                reference.achievement_id(),
                expected_status.as_str()
            )));
        };

        *stored = reference.clone();
        Ok(())
    }

    async fn override_status(
        &self,
        reference_id: ReferenceId,
        status: ReferenceStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let stored = rows
            .iter_mut()
            .find(|row| row.id() == reference_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("achievement reference '{reference_id}' not found"))
            })?;

        let mut snapshot = stored.snapshot();
        snapshot.status = status;
        snapshot.updated_at = now;
        *stored = AchievementReference::from_snapshot(snapshot);
        Ok(())
    }
}
