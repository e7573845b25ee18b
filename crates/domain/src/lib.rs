//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod achievement;
mod identifiers;
mod profile;
mod reference;
mod security;

pub use achievement::{
    Achievement, AchievementId, AchievementPatch, AchievementType, Attachment, AttributeValue,
    NewAchievement, NewAttachment,
};
pub use identifiers::{LecturerId, PermissionId, ReferenceId, RoleId, StudentId, UserId};
pub use profile::{LecturerProfile, StudentProfile, UserAccount, UserAccountChanges};
pub use reference::{
    AchievementReference, ReferenceSnapshot, ReferenceStatus, ReferenceTransition,
    TransitionOutcome,
};
pub use security::{Permission, PermissionDefinition, RoleDefinition};
