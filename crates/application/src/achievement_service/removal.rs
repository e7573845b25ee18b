use super::*;

impl AchievementService {
    /// Soft-deletes a draft achievement owned by the caller.
    pub async fn delete(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
    ) -> AppResult<()> {
        self.require(actor, &Permission::ACHIEVEMENTS_DELETE).await?;
        let student = self.caller_student(actor).await?;

        let reference = self.reference_for(achievement_id).await?;
        ensure_owner(&student, reference.student_id())?;
        ensure_draft(&reference, "deleted")?;

        self.store.soft_delete(achievement_id, Utc::now()).await?;

        if let Err(ledger_error) = self
            .apply_transition(reference, ReferenceTransition::Delete)
            .await
        {
            if let Err(compensation_error) = self.store.restore(achievement_id).await {
                error!(
                    %achievement_id,
                    error = %compensation_error,
                    "failed to restore achievement after reference update failed"
                );
            }
            return Err(ledger_error);
        }

        info!(%achievement_id, "achievement deleted");
        Ok(())
    }

    /// Permanently removes an achievement document regardless of owner or status.
    ///
    /// A surviving reference is kept for audit but marked `deleted`.
    pub async fn hard_delete(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
    ) -> AppResult<()> {
        self.require(actor, &Permission::ACHIEVEMENTS_HARD_DELETE)
            .await?;

        let removed = self.store.hard_delete(achievement_id).await?;
        let reference = self.ledger.find_by_achievement_id(achievement_id).await?;

        if !removed && reference.is_none() {
            return Err(achievement_not_found(achievement_id));
        }

        if let Some(reference) = reference
            && reference.status() != ReferenceStatus::Deleted
        {
            self.ledger
                .override_status(reference.id(), ReferenceStatus::Deleted, Utc::now())
                .await?;
        }

        info!(%achievement_id, subject = actor.subject(), "achievement permanently removed");
        Ok(())
    }
}
