//! Verification workflow status of an achievement.
//!
//! An [`AchievementReference`] is the relational-store row that tracks where an
//! achievement document sits in its verification lifecycle:
//!
//! ```text
//! draft ──submit──▶ submitted ──verify──▶ verified
//!   │                   └──────reject───▶ rejected
//!   └──delete──▶ deleted
//! ```
//!
//! `verified`, `rejected` and `deleted` are terminal. Submitting an already
//! submitted reference is a no-op so the first submission time is preserved.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use laurel_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{AchievementId, ReferenceId, StudentId, UserId};

/// Workflow status of an achievement reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStatus {
    /// Created, editable by the owner.
    Draft,
    /// Waiting for a verifier.
    Submitted,
    /// Accepted by a verifier.
    Verified,
    /// Rejected by a verifier.
    Rejected,
    /// Withdrawn by the owner while still a draft.
    Deleted,
}

impl ReferenceStatus {
    /// Returns the stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Deleted => "deleted",
        }
    }

    /// Returns whether no modeled transition leaves this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Rejected | Self::Deleted)
    }
}

impl FromStr for ReferenceStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            "deleted" => Ok(Self::Deleted),
            _ => Err(AppError::Validation(format!(
                "unknown reference status '{value}'"
            ))),
        }
    }
}

/// Modeled status transition requested by the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTransition {
    /// Owner submits the achievement for verification.
    Submit,
    /// Verifier accepts a submitted achievement.
    Verify {
        /// Acting verifier.
        verifier: UserId,
    },
    /// Verifier rejects a submitted achievement.
    Reject {
        /// Acting verifier.
        verifier: UserId,
        /// Reason shown to the student.
        note: String,
    },
    /// Owner withdraws a draft achievement.
    Delete,
}

impl ReferenceTransition {
    /// Returns the status the transition leads to.
    #[must_use]
    pub fn target_status(&self) -> ReferenceStatus {
        match self {
            Self::Submit => ReferenceStatus::Submitted,
            Self::Verify { .. } => ReferenceStatus::Verified,
            Self::Reject { .. } => ReferenceStatus::Rejected,
            Self::Delete => ReferenceStatus::Deleted,
        }
    }
}

/// Outcome of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The reference changed and must be persisted.
    Applied,
    /// The reference already was in the requested state.
    Unchanged,
}

/// Persisted field set of a reference, used to rehydrate rows from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSnapshot {
    /// Row identifier.
    pub id: ReferenceId,
    /// Owning student.
    pub student_id: StudentId,
    /// Linked document key.
    pub achievement_id: AchievementId,
    /// Current status.
    pub status: ReferenceStatus,
    /// First submission time.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Verification time.
    pub verified_at: Option<DateTime<Utc>>,
    /// Verifier or rejecter.
    pub verified_by: Option<UserId>,
    /// Rejection reason.
    pub rejection_note: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Workflow-status row linked to exactly one achievement document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementReference {
    id: ReferenceId,
    student_id: StudentId,
    achievement_id: AchievementId,
    status: ReferenceStatus,
    submitted_at: Option<DateTime<Utc>>,
    verified_at: Option<DateTime<Utc>>,
    verified_by: Option<UserId>,
    rejection_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AchievementReference {
    /// Creates a draft reference for a freshly stored achievement.
    #[must_use]
    pub fn new_draft(
        student_id: StudentId,
        achievement_id: AchievementId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReferenceId::new(),
            student_id,
            achievement_id,
            status: ReferenceStatus::Draft,
            submitted_at: None,
            verified_at: None,
            verified_by: None,
            rejection_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a reference directly in `submitted` state.
    ///
    /// Used when an achievement is submitted before any reference exists.
    #[must_use]
    pub fn new_submitted(
        student_id: StudentId,
        achievement_id: AchievementId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status: ReferenceStatus::Submitted,
            submitted_at: Some(now),
            ..Self::new_draft(student_id, achievement_id, now)
        }
    }

    /// Rehydrates a reference from persisted fields.
    #[must_use]
    pub fn from_snapshot(snapshot: ReferenceSnapshot) -> Self {
        Self {
            id: snapshot.id,
            student_id: snapshot.student_id,
            achievement_id: snapshot.achievement_id,
            status: snapshot.status,
            submitted_at: snapshot.submitted_at,
            verified_at: snapshot.verified_at,
            verified_by: snapshot.verified_by,
            rejection_note: snapshot.rejection_note,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }

    /// Returns the persisted field set.
    #[must_use]
    pub fn snapshot(&self) -> ReferenceSnapshot {
        ReferenceSnapshot {
            id: self.id,
            student_id: self.student_id,
            achievement_id: self.achievement_id.clone(),
            status: self.status,
            submitted_at: self.submitted_at,
            verified_at: self.verified_at,
            verified_by: self.verified_by,
            rejection_note: self.rejection_note.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Applies a modeled transition.
    ///
    /// Returns `Conflict` when the transition is not allowed from the current
    /// status; the reference is left untouched in that case.
    pub fn apply(
        &mut self,
        transition: ReferenceTransition,
        now: DateTime<Utc>,
    ) -> AppResult<TransitionOutcome> {
        match (self.status, transition) {
            (ReferenceStatus::Submitted, ReferenceTransition::Submit) => {
                Ok(TransitionOutcome::Unchanged)
            }
            (ReferenceStatus::Draft, ReferenceTransition::Submit) => {
                self.status = ReferenceStatus::Submitted;
                self.submitted_at = Some(now);
                self.updated_at = now;
                Ok(TransitionOutcome::Applied)
            }
            (ReferenceStatus::Submitted, ReferenceTransition::Verify { verifier }) => {
                self.status = ReferenceStatus::Verified;
                self.verified_at = Some(now);
                self.verified_by = Some(verifier);
                self.updated_at = now;
                Ok(TransitionOutcome::Applied)
            }
            (ReferenceStatus::Submitted, ReferenceTransition::Reject { verifier, note }) => {
                let note = note.trim();
                if note.is_empty() {
                    return Err(AppError::Conflict(
                        "a rejection note is required to reject an achievement".to_owned(),
                    ));
                }
                self.status = ReferenceStatus::Rejected;
                self.rejection_note = Some(note.to_owned());
                self.verified_by = Some(verifier);
                self.updated_at = now;
                Ok(TransitionOutcome::Applied)
            }
            (ReferenceStatus::Draft, ReferenceTransition::Delete) => {
                self.status = ReferenceStatus::Deleted;
                self.updated_at = now;
                Ok(TransitionOutcome::Applied)
            }
            (ReferenceStatus::Draft, ReferenceTransition::Verify { .. })
            | (ReferenceStatus::Draft, ReferenceTransition::Reject { .. }) => {
                Err(AppError::Conflict(format!(
                    "achievement '{}' must be submitted before it can be reviewed",
                    self.achievement_id
                )))
            }
            (_, ReferenceTransition::Delete) => Err(AppError::Conflict(
                "only draft achievements can be deleted".to_owned(),
            )),
            (status, transition) => Err(AppError::Conflict(format!(
                "cannot move achievement '{}' from '{}' to '{}'",
                self.achievement_id,
                status.as_str(),
                transition.target_status().as_str()
            ))),
        }
    }

    /// Returns the row identifier.
    #[must_use]
    pub fn id(&self) -> ReferenceId {
        self.id
    }

    /// Returns the owning student.
    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    /// Returns the linked document key.
    #[must_use]
    pub fn achievement_id(&self) -> &AchievementId {
        &self.achievement_id
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ReferenceStatus {
        self.status
    }

    /// Returns the first submission time.
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Returns the verification time.
    #[must_use]
    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    /// Returns the verifier or rejecter.
    #[must_use]
    pub fn verified_by(&self) -> Option<UserId> {
        self.verified_by
    }

    /// Returns the rejection reason.
    #[must_use]
    pub fn rejection_note(&self) -> Option<&str> {
        self.rejection_note.as_deref()
    }

    /// Returns the creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last modification time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
