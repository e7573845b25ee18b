use chrono::{DateTime, Utc};
use laurel_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{LecturerId, RoleId, StudentId, UserId};

/// User account row. Credentials are verified outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Stable user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Assigned role, if any.
    pub role_id: Option<RoleId>,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// Creates an active account with a fresh id.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        role_id: Option<RoleId>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: UserId::new(),
            username: validate_username(username.into())?,
            email: validate_email(email.into())?,
            full_name: required(full_name, "full name")?,
            role_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies profile changes. Role assignment is a separate operation.
    pub fn apply(&mut self, changes: UserAccountChanges, now: DateTime<Utc>) -> AppResult<()> {
        let username = changes.username.map(validate_username).transpose()?;
        let email = changes.email.map(validate_email).transpose()?;
        let full_name = changes
            .full_name
            .map(|value| required(value, "full name"))
            .transpose()?;

        if let Some(username) = username {
            self.username = username;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(full_name) = full_name {
            self.full_name = full_name;
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;

        Ok(())
    }
}

/// Partial update of a user account; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAccountChanges {
    /// New login name.
    pub username: Option<String>,
    /// New contact email.
    pub email: Option<String>,
    /// New display name.
    pub full_name: Option<String>,
    /// New activation flag.
    pub is_active: Option<bool>,
}

/// Student profile linked to a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Stable student identifier, used as achievement owner key.
    pub id: StudentId,
    /// Linked user account.
    pub user_id: UserId,
    /// Institutional student number.
    pub student_number: String,
    /// Study program.
    pub program_study: String,
    /// Academic year label, e.g. `2023/2024`.
    pub academic_year: String,
    /// Lecturer user acting as academic advisor.
    pub advisor_user_id: Option<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl StudentProfile {
    /// Creates a student profile without an advisor.
    pub fn new(
        user_id: UserId,
        student_number: impl Into<String>,
        program_study: impl Into<String>,
        academic_year: impl Into<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: StudentId::new(),
            user_id,
            student_number: required(student_number, "student number")?,
            program_study: required(program_study, "program study")?,
            academic_year: required(academic_year, "academic year")?,
            advisor_user_id: None,
            created_at: now,
        })
    }

    /// Returns whether the given user is this student's advisor.
    #[must_use]
    pub fn is_advised_by(&self, user_id: UserId) -> bool {
        self.advisor_user_id == Some(user_id)
    }
}

/// Lecturer profile linked to a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LecturerProfile {
    /// Stable lecturer identifier.
    pub id: LecturerId,
    /// Linked user account.
    pub user_id: UserId,
    /// Institutional lecturer code.
    pub lecturer_code: String,
    /// Department name.
    pub department: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl LecturerProfile {
    /// Creates a lecturer profile.
    pub fn new(
        user_id: UserId,
        lecturer_code: impl Into<String>,
        department: impl Into<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: LecturerId::new(),
            user_id,
            lecturer_code: required(lecturer_code, "lecturer code")?,
            department: required(department, "department")?,
            created_at: now,
        })
    }
}

fn required(value: impl Into<String>, field: &str) -> AppResult<String> {
    let value = NonEmptyString::new(value)
        .map_err(|_| AppError::Validation(format!("{field} is required")))?;
    Ok(value.as_str().trim().to_owned())
}

fn validate_username(value: String) -> AppResult<String> {
    let username = required(value, "username")?;
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "username '{username}' must not contain whitespace"
        )));
    }
    Ok(username)
}

fn validate_email(value: String) -> AppResult<String> {
    let email = required(value, "email")?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(email.to_lowercase())
        }
        _ => Err(AppError::Validation(format!(
            "email '{email}' is not a valid address"
        ))),
    }
}
