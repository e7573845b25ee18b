use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use laurel_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{PermissionId, RoleId};

/// Permission name in `resource.action` form, e.g. `achievements.create`.
///
/// Permissions are administrative rows; the names below are the ones the
/// achievement workflow and profile directory enforce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Allows creating achievements.
    pub const ACHIEVEMENTS_CREATE: Self = Self::from_static("achievements.create");
    /// Allows reading a single achievement.
    pub const ACHIEVEMENTS_VIEW: Self = Self::from_static("achievements.view");
    /// Allows listing achievements.
    pub const ACHIEVEMENTS_LIST: Self = Self::from_static("achievements.list");
    /// Allows editing draft achievements.
    pub const ACHIEVEMENTS_UPDATE: Self = Self::from_static("achievements.update");
    /// Allows soft-deleting draft achievements.
    pub const ACHIEVEMENTS_DELETE: Self = Self::from_static("achievements.delete");
    /// Allows permanently removing achievement documents.
    pub const ACHIEVEMENTS_HARD_DELETE: Self = Self::from_static("achievements.hard_delete");
    /// Allows submitting achievements for verification.
    pub const ACHIEVEMENTS_SUBMIT: Self = Self::from_static("achievements.submit");
    /// Allows verifying submitted achievements.
    pub const ACHIEVEMENTS_VERIFY: Self = Self::from_static("achievements.verify");
    /// Allows rejecting submitted achievements.
    pub const ACHIEVEMENTS_REJECT: Self = Self::from_static("achievements.reject");
    /// Allows reading the status history of an achievement.
    pub const ACHIEVEMENTS_HISTORY: Self = Self::from_static("achievements.history");
    /// Allows attaching file metadata to achievements.
    pub const ACHIEVEMENTS_UPLOAD_ATTACHMENT: Self =
        Self::from_static("achievements.upload_attachment");
    /// Allows reading achievement attachments.
    pub const ACHIEVEMENTS_VIEW_ATTACHMENTS: Self =
        Self::from_static("achievements.view_attachments");
    /// Allows reading a student profile.
    pub const STUDENTS_VIEW: Self = Self::from_static("students.view");
    /// Allows reading every achievement of a student.
    pub const STUDENTS_READ_ACHIEVEMENTS: Self = Self::from_static("students.read_achievements");
    /// Allows reading a lecturer profile.
    pub const LECTURERS_VIEW: Self = Self::from_static("lecturers.view");
    /// Allows listing the advisees of a lecturer.
    pub const LECTURERS_VIEW_ADVISEES: Self = Self::from_static("lecturers.view_advisees");
    /// Allows creating student profiles.
    pub const STUDENTS_CREATE: Self = Self::from_static("students.create");
    /// Allows listing student profiles.
    pub const STUDENTS_LIST: Self = Self::from_static("students.list");
    /// Allows assigning or clearing a student's advisor.
    pub const STUDENTS_SET_ADVISOR: Self = Self::from_static("students.set_advisor");
    /// Allows creating lecturer profiles.
    pub const LECTURERS_CREATE: Self = Self::from_static("lecturers.create");
    /// Allows listing lecturer profiles.
    pub const LECTURERS_LIST: Self = Self::from_static("lecturers.list");
    /// Allows listing user accounts.
    pub const USERS_LIST: Self = Self::from_static("users.list");
    /// Allows reading a user account.
    pub const USERS_VIEW: Self = Self::from_static("users.view");
    /// Allows creating user accounts.
    pub const USERS_CREATE: Self = Self::from_static("users.create");
    /// Allows editing user accounts.
    pub const USERS_UPDATE: Self = Self::from_static("users.update");
    /// Allows deleting user accounts.
    pub const USERS_DELETE: Self = Self::from_static("users.delete");
    /// Allows changing the role of a user account.
    pub const USERS_ASSIGN_ROLE: Self = Self::from_static("users.assign_role");
    /// Allows reading role grants.
    pub const ROLES_VIEW: Self = Self::from_static("roles.view");
    /// Allows creating roles.
    pub const ROLES_CREATE: Self = Self::from_static("roles.create");
    /// Allows granting and revoking role permissions.
    pub const ROLES_MANAGE: Self = Self::from_static("roles.manage");

    const fn from_static(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    /// Creates a validated permission name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        let Some((resource, action)) = trimmed.split_once('.') else {
            return Err(AppError::Validation(format!(
                "permission '{value}' must use the 'resource.action' form"
            )));
        };

        let segment_is_valid = |segment: &str| {
            !segment.is_empty()
                && segment.chars().all(|character| {
                    character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
                })
        };

        if !segment_is_valid(resource) || !action.split('.').all(segment_is_valid) {
            return Err(AppError::Validation(format!(
                "permission '{value}' may only contain lowercase letters, digits, '_' and '.'"
            )));
        }

        Ok(Self(Cow::Owned(trimmed.to_owned())))
    }

    /// Returns the stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// Returns the resource part of the permission name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.as_str()
            .split_once('.')
            .map_or(self.as_str(), |(resource, _)| resource)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for Permission {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.0.into_owned()
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Role row as stored in the relational store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Stable role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

impl RoleDefinition {
    /// Creates a role with a fresh id.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> AppResult<Self> {
        let name = name.into();
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err(AppError::Validation("role name is required".to_owned()));
        }

        Ok(Self {
            id: RoleId::new(),
            name: normalized,
            description: description.into().trim().to_owned(),
        })
    }
}

/// Permission row as stored in the relational store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDefinition {
    /// Stable permission row identifier.
    pub id: PermissionId,
    /// Permission name checked by access decisions.
    pub name: Permission,
    /// Resource the permission applies to.
    pub resource: String,
    /// Action the permission allows on the resource.
    pub action: String,
    /// Human-readable description.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Permission, RoleDefinition};

    #[test]
    fn well_known_permission_roundtrips_through_parser() {
        let parsed = Permission::from_str(Permission::ACHIEVEMENTS_UPLOAD_ATTACHMENT.as_str());
        assert!(parsed.is_ok());
        assert_eq!(
            parsed.unwrap_or(Permission::ACHIEVEMENTS_VIEW),
            Permission::ACHIEVEMENTS_UPLOAD_ATTACHMENT
        );
    }

    #[test]
    fn borrowed_and_owned_permissions_compare_equal() {
        let owned = Permission::new(" achievements.create ");
        assert!(owned.is_ok());
        assert_eq!(
            owned.unwrap_or(Permission::ROLES_VIEW),
            Permission::ACHIEVEMENTS_CREATE
        );
    }

    #[test]
    fn malformed_permission_names_are_rejected() {
        for value in ["", "achievements", ".create", "achievements.", "Achievements.Create"] {
            assert!(Permission::new(value).is_err(), "accepted '{value}'");
        }
    }

    #[test]
    fn resource_is_the_first_segment() {
        assert_eq!(Permission::STUDENTS_READ_ACHIEVEMENTS.resource(), "students");
    }

    #[test]
    fn permission_serializes_as_plain_string() {
        let encoded = serde_json::to_string(&Permission::ROLES_MANAGE);
        assert_eq!(encoded.ok().as_deref(), Some("\"roles.manage\""));

        let decoded = serde_json::from_str::<Permission>("\"not a permission\"");
        assert!(decoded.is_err());
    }

    #[test]
    fn role_names_collapse_inner_whitespace() {
        let role = RoleDefinition::new(" Dosen   Wali ", "Academic advisor ");
        assert!(role.is_ok_and(|role| role.name == "Dosen Wali"
            && role.description == "Academic advisor"));

        for name in ["", "   "] {
            assert!(RoleDefinition::new(name, "").is_err(), "accepted '{name}'");
        }
    }
}
