use super::*;

impl AchievementService {
    /// Submits an achievement for verification.
    ///
    /// When no reference exists yet the document must belong to the caller,
    /// and a reference is created directly in `submitted` state.
    pub async fn submit(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
    ) -> AppResult<AchievementReference> {
        self.require(actor, &Permission::ACHIEVEMENTS_SUBMIT).await?;
        let student = self.caller_student(actor).await?;

        let Some(reference) = self.ledger.find_by_achievement_id(achievement_id).await? else {
            let achievement = self.live_achievement(achievement_id).await?;
            ensure_owner(&student, achievement.student_id)?;

            let reference =
                AchievementReference::new_submitted(student.id, achievement.id, Utc::now());
            self.ledger.create(&reference).await?;
            info!(%achievement_id, "achievement submitted without prior reference");
            return Ok(reference);
        };

        ensure_owner(&student, reference.student_id())?;
        let reference = self
            .apply_transition(reference, ReferenceTransition::Submit)
            .await?;
        info!(%achievement_id, "achievement submitted");
        Ok(reference)
    }

    /// Marks a submitted achievement as verified by the caller.
    pub async fn verify(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
    ) -> AppResult<AchievementReference> {
        self.require(actor, &Permission::ACHIEVEMENTS_VERIFY).await?;
        let verifier = actor_user_id(actor)?;

        let reference = self.reference_for(achievement_id).await?;
        let reference = self
            .apply_transition(reference, ReferenceTransition::Verify { verifier })
            .await?;
        info!(%achievement_id, %verifier, "achievement verified");
        Ok(reference)
    }

    /// Rejects a submitted achievement with a note for the student.
    pub async fn reject(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
        note: String,
    ) -> AppResult<AchievementReference> {
        self.require(actor, &Permission::ACHIEVEMENTS_REJECT).await?;
        let verifier = actor_user_id(actor)?;

        let reference = self.reference_for(achievement_id).await?;
        let reference = self
            .apply_transition(reference, ReferenceTransition::Reject { verifier, note })
            .await?;
        info!(%achievement_id, %verifier, "achievement rejected");
        Ok(reference)
    }
}
