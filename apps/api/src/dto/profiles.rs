use chrono::{DateTime, Utc};
use laurel_application::{CreateLecturerInput, CreateStudentInput};
use laurel_core::AppResult;
use laurel_domain::{LecturerId, LecturerProfile, StudentProfile, UserId};
use serde::{Deserialize, Serialize};

/// API representation of a student profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: String,
    pub user_id: String,
    pub student_number: String,
    pub program_study: String,
    pub academic_year: String,
    pub advisor_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StudentProfile> for StudentResponse {
    fn from(value: StudentProfile) -> Self {
        Self {
            id: value.id.to_string(),
            user_id: value.user_id.to_string(),
            student_number: value.student_number,
            program_study: value.program_study,
            academic_year: value.academic_year,
            advisor_user_id: value.advisor_user_id.map(|user_id| user_id.to_string()),
            created_at: value.created_at,
        }
    }
}

/// API representation of a lecturer profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LecturerResponse {
    pub id: String,
    pub user_id: String,
    pub lecturer_code: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
}

impl From<LecturerProfile> for LecturerResponse {
    fn from(value: LecturerProfile) -> Self {
        Self {
            id: value.id.to_string(),
            user_id: value.user_id.to_string(),
            lecturer_code: value.lecturer_code,
            department: value.department,
            created_at: value.created_at,
        }
    }
}

/// Incoming payload for student profile creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub user_id: String,
    #[serde(alias = "studentId")]
    pub student_number: String,
    pub program_study: String,
    pub academic_year: String,
    #[serde(default)]
    pub advisor_id: Option<String>,
}

impl CreateStudentRequest {
    /// Parses identifiers into the service input.
    pub fn into_input(self) -> AppResult<CreateStudentInput> {
        Ok(CreateStudentInput {
            user_id: UserId::parse(self.user_id.as_str())?,
            student_number: self.student_number,
            program_study: self.program_study,
            academic_year: self.academic_year,
            advisor_id: optional_lecturer(self.advisor_id.as_deref())?,
        })
    }
}

/// Incoming payload for advisor assignment; a missing or null `advisorId`
/// clears the advisor.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAdvisorRequest {
    #[serde(default)]
    pub advisor_id: Option<String>,
}

impl SetAdvisorRequest {
    /// Parses the lecturer id, if any.
    pub fn advisor(&self) -> AppResult<Option<LecturerId>> {
        optional_lecturer(self.advisor_id.as_deref())
    }
}

/// Incoming payload for lecturer profile creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLecturerRequest {
    pub user_id: String,
    #[serde(alias = "lecturerId")]
    pub lecturer_code: String,
    pub department: String,
}

impl CreateLecturerRequest {
    /// Parses identifiers into the service input.
    pub fn into_input(self) -> AppResult<CreateLecturerInput> {
        Ok(CreateLecturerInput {
            user_id: UserId::parse(self.user_id.as_str())?,
            lecturer_code: self.lecturer_code,
            department: self.department,
        })
    }
}

fn optional_lecturer(value: Option<&str>) -> AppResult<Option<LecturerId>> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(LecturerId::parse)
        .transpose()
}
