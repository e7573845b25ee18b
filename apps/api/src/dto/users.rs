use chrono::{DateTime, Utc};
use laurel_application::{CallerProfile, CreateUserInput};
use laurel_core::AppResult;
use laurel_domain::{RoleId, UserAccount, UserAccountChanges};
use serde::{Deserialize, Serialize};

use super::{LecturerResponse, RoleResponse, StudentResponse};

/// Incoming payload for account creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub role_id: Option<String>,
}

impl CreateUserRequest {
    /// Parses identifiers into the service input.
    pub fn into_input(self) -> AppResult<CreateUserInput> {
        Ok(CreateUserInput {
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            role_id: self
                .role_id
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .map(RoleId::parse)
                .transpose()?,
        })
    }
}

/// Incoming payload for a partial account update.
///
/// Unknown fields, `roleId` included, are refused; roles change through
/// `PUT /users/{id}/role`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl From<UpdateUserRequest> for UserAccountChanges {
    fn from(value: UpdateUserRequest) -> Self {
        Self {
            username: value.username,
            email: value.email,
            full_name: value.full_name,
            is_active: value.is_active,
        }
    }
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub role_id: String,
}

/// API representation of a user account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(value: UserAccount) -> Self {
        Self {
            id: value.id.to_string(),
            username: value.username,
            email: value.email,
            full_name: value.full_name,
            role_id: value.role_id.map(|role_id| role_id.to_string()),
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// The caller's own account, role grants and linked profiles.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerProfileResponse {
    pub user: UserResponse,
    pub role: Option<RoleResponse>,
    pub permissions: Vec<String>,
    pub student: Option<StudentResponse>,
    pub lecturer: Option<LecturerResponse>,
}

impl From<CallerProfile> for CallerProfileResponse {
    fn from(value: CallerProfile) -> Self {
        Self {
            user: UserResponse::from(value.user),
            role: value.role.map(RoleResponse::from),
            permissions: value.permissions.into_iter().map(String::from).collect(),
            student: value.student.map(StudentResponse::from),
            lecturer: value.lecturer.map(LecturerResponse::from),
        }
    }
}
