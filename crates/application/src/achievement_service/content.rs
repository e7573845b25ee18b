use super::*;

impl AchievementService {
    /// Creates an achievement owned by the calling student together with its
    /// draft reference.
    pub async fn create(
        &self,
        actor: &UserIdentity,
        achievement: NewAchievement,
    ) -> AppResult<AchievementDetail> {
        self.require(actor, &Permission::ACHIEVEMENTS_CREATE).await?;
        let student = self.caller_student(actor).await?;
        let now = Utc::now();

        let stored = self.store.create(student.id, achievement, now).await?;
        let reference = AchievementReference::new_draft(student.id, stored.id.clone(), now);

        if let Err(ledger_error) = self.ledger.create(&reference).await {
            if let Err(compensation_error) = self.store.hard_delete(&stored.id).await {
                error!(
                    achievement_id = %stored.id,
                    student_id = %student.id,
                    error = %compensation_error,
                    "failed to remove achievement after reference write failed; document is orphaned"
                );
            }
            return Err(ledger_error);
        }

        info!(achievement_id = %stored.id, student_id = %student.id, "achievement created");

        Ok(AchievementDetail {
            achievement: stored,
            reference: Some(reference),
        })
    }

    /// Returns one live achievement and its reference.
    pub async fn get(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
    ) -> AppResult<AchievementDetail> {
        self.require(actor, &Permission::ACHIEVEMENTS_VIEW).await?;

        let achievement = self.live_achievement(achievement_id).await?;
        let reference = self.ledger.find_by_achievement_id(achievement_id).await?;

        Ok(AchievementDetail {
            achievement,
            reference,
        })
    }

    /// Lists live achievements. Student callers only see their own.
    pub async fn list(
        &self,
        actor: &UserIdentity,
        mut query: AchievementListQuery,
        page: PageRequest,
    ) -> AppResult<AchievementPage> {
        self.require(actor, &Permission::ACHIEVEMENTS_LIST).await?;

        let user_id = actor_user_id(actor)?;
        if let Some(student) = self.profiles.find_student_by_user(user_id).await? {
            query.student_id = Some(student.id);
        }

        self.store.list(&query, page).await
    }

    /// Edits a draft achievement owned by the caller.
    pub async fn update(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
        patch: AchievementPatch,
    ) -> AppResult<Achievement> {
        self.require(actor, &Permission::ACHIEVEMENTS_UPDATE).await?;
        let patch = patch.validated()?;
        let student = self.caller_student(actor).await?;

        let achievement = self.live_achievement(achievement_id).await?;
        ensure_owner(&student, achievement.student_id)?;
        let reference = self.reference_for(achievement_id).await?;
        ensure_draft(&reference, "edited")?;

        self.store.update(achievement_id, &patch, Utc::now()).await
    }

    /// Appends attachment metadata to a draft achievement owned by the caller.
    pub async fn add_attachment(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
        attachment: NewAttachment,
    ) -> AppResult<Achievement> {
        self.require(actor, &Permission::ACHIEVEMENTS_UPLOAD_ATTACHMENT)
            .await?;
        let now = Utc::now();
        let attachment = attachment.into_attachment(now)?;
        let student = self.caller_student(actor).await?;

        let achievement = self.live_achievement(achievement_id).await?;
        ensure_owner(&student, achievement.student_id)?;
        let reference = self.reference_for(achievement_id).await?;
        ensure_draft(&reference, "given attachments")?;

        self.store
            .push_attachment(achievement_id, attachment, now)
            .await
    }

    /// Lists the attachments of a live achievement.
    pub async fn list_attachments(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
    ) -> AppResult<Vec<Attachment>> {
        self.require(actor, &Permission::ACHIEVEMENTS_VIEW_ATTACHMENTS)
            .await?;

        Ok(self.live_achievement(achievement_id).await?.attachments)
    }

    /// Lists the status history of an achievement, newest first.
    pub async fn history(
        &self,
        actor: &UserIdentity,
        achievement_id: &AchievementId,
    ) -> AppResult<Vec<AchievementReference>> {
        self.require(actor, &Permission::ACHIEVEMENTS_HISTORY).await?;

        let history = self.ledger.history(achievement_id).await?;
        if history.is_empty() {
            return Err(achievement_not_found(achievement_id));
        }

        Ok(history)
    }

    /// Lists every live achievement of a student with its reference.
    pub async fn list_student_achievements(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
    ) -> AppResult<Vec<AchievementDetail>> {
        self.require(actor, &Permission::STUDENTS_READ_ACHIEVEMENTS)
            .await?;

        if self.profiles.find_student(student_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "student '{student_id}' not found"
            )));
        }

        let references = self.ledger.list_by_student(student_id).await?;
        let mut details = Vec::with_capacity(references.len());

        for reference in references {
            if reference.status() == ReferenceStatus::Deleted {
                continue;
            }

            match self.store.find(reference.achievement_id()).await? {
                Some(achievement) => details.push(AchievementDetail {
                    achievement,
                    reference: Some(reference),
                }),
                None => warn!(
                    achievement_id = %reference.achievement_id(),
                    reference_id = %reference.id(),
                    "reference points at a missing achievement document"
                ),
            }
        }

        Ok(details)
    }
}
