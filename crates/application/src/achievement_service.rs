use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use laurel_core::{AppError, AppResult, UserIdentity};
use laurel_domain::{
    Achievement, AchievementId, AchievementPatch, AchievementReference, Attachment,
    NewAchievement, NewAttachment, Permission, ReferenceStatus, ReferenceTransition, StudentId,
    StudentProfile, TransitionOutcome, UserId,
};
use tracing::{error, info, warn};

use crate::achievement_ports::{
    AchievementListQuery, AchievementPage, AchievementStore, PageRequest, ReferenceLedger,
    ScanCursor,
};
use crate::{AuthorizationService, ProfileRepository};

mod content;
mod reconciliation;
mod removal;
mod transitions;

/// Achievement document together with its workflow reference.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementDetail {
    /// Document content.
    pub achievement: Achievement,
    /// Workflow reference; absent only for orphan documents.
    pub reference: Option<AchievementReference>,
}

/// Outcome of one orphan reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Documents inspected.
    pub scanned: usize,
    /// Draft references created for documents that had none.
    pub repaired: usize,
}

/// Orchestrates achievement content and workflow status across both stores.
///
/// There is no transaction spanning the document store and the reference
/// ledger. Creation and soft deletion compensate on partial failure, and
/// [`AchievementService::reconcile_orphans`] repairs documents whose
/// compensation also failed.
#[derive(Clone)]
pub struct AchievementService {
    authorization_service: AuthorizationService,
    store: Arc<dyn AchievementStore>,
    ledger: Arc<dyn ReferenceLedger>,
    profiles: Arc<dyn ProfileRepository>,
}

impl AchievementService {
    /// Creates an achievement service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        store: Arc<dyn AchievementStore>,
        ledger: Arc<dyn ReferenceLedger>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            authorization_service,
            store,
            ledger,
            profiles,
        }
    }

    async fn require(&self, actor: &UserIdentity, permission: &Permission) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, permission)
            .await
    }

    async fn caller_student(&self, actor: &UserIdentity) -> AppResult<StudentProfile> {
        let user_id = actor_user_id(actor)?;
        self.profiles
            .find_student_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("student profile not found".to_owned()))
    }

    async fn live_achievement(&self, achievement_id: &AchievementId) -> AppResult<Achievement> {
        self.store
            .find(achievement_id)
            .await?
            .ok_or_else(|| achievement_not_found(achievement_id))
    }

    async fn reference_for(
        &self,
        achievement_id: &AchievementId,
    ) -> AppResult<AchievementReference> {
        self.ledger
            .find_by_achievement_id(achievement_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "achievement reference for '{achievement_id}' not found"
                ))
            })
    }

    async fn apply_transition(
        &self,
        mut reference: AchievementReference,
        transition: ReferenceTransition,
    ) -> AppResult<AchievementReference> {
        let expected_status = reference.status();
        let outcome = reference.apply(transition, Utc::now())?;

        if outcome == TransitionOutcome::Applied {
            self.ledger.update_status(expected_status, &reference).await?;
        }

        Ok(reference)
    }
}

fn actor_user_id(actor: &UserIdentity) -> AppResult<UserId> {
    if actor.subject().trim().is_empty() {
        return Err(AppError::Validation(
            "caller subject must not be empty".to_owned(),
        ));
    }
    UserId::parse(actor.subject())
}

fn achievement_not_found(achievement_id: &AchievementId) -> AppError {
    AppError::NotFound(format!("achievement '{achievement_id}' not found"))
}

fn ensure_owner(student: &StudentProfile, owner: StudentId) -> AppResult<()> {
    if student.id != owner {
        return Err(AppError::Forbidden(
            "achievement belongs to another student".to_owned(),
        ));
    }
    Ok(())
}

fn ensure_draft(reference: &AchievementReference, action: &str) -> AppResult<()> {
    if reference.status() != ReferenceStatus::Draft {
        return Err(AppError::Conflict(format!(
            "only draft achievements can be {action}"
        )));
    }
    Ok(())
}
