use async_trait::async_trait;
use laurel_core::AppResult;
use laurel_domain::{LecturerId, LecturerProfile, StudentId, StudentProfile, UserId};

/// Repository port for student and lecturer profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds a student profile by id.
    async fn find_student(&self, student_id: StudentId) -> AppResult<Option<StudentProfile>>;

    /// Finds the student profile linked to a user account.
    async fn find_student_by_user(&self, user_id: UserId) -> AppResult<Option<StudentProfile>>;

    /// Finds a lecturer profile by id.
    async fn find_lecturer(&self, lecturer_id: LecturerId) -> AppResult<Option<LecturerProfile>>;

    /// Finds the lecturer profile linked to a user account.
    async fn find_lecturer_by_user(&self, user_id: UserId) -> AppResult<Option<LecturerProfile>>;

    /// Lists students advised by the given lecturer user.
    async fn list_students_by_advisor(
        &self,
        advisor_user_id: UserId,
    ) -> AppResult<Vec<StudentProfile>>;

    /// Lists every student profile ordered by student number.
    async fn list_students(&self) -> AppResult<Vec<StudentProfile>>;

    /// Lists every lecturer profile ordered by lecturer code.
    async fn list_lecturers(&self) -> AppResult<Vec<LecturerProfile>>;

    /// Stores a new student profile. Fails with a conflict on duplicate keys.
    async fn create_student(&self, student: &StudentProfile) -> AppResult<()>;

    /// Stores a new lecturer profile. Fails with a conflict on duplicate keys.
    async fn create_lecturer(&self, lecturer: &LecturerProfile) -> AppResult<()>;

    /// Sets or clears the advisor of a student. Returns false when the student is missing.
    async fn set_student_advisor(
        &self,
        student_id: StudentId,
        advisor_user_id: Option<UserId>,
    ) -> AppResult<bool>;
}

/// Input for creating a student profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStudentInput {
    /// User account the profile belongs to.
    pub user_id: UserId,
    /// Institutional student number.
    pub student_number: String,
    /// Study program.
    pub program_study: String,
    /// Academic year label.
    pub academic_year: String,
    /// Lecturer assigned as advisor on creation.
    pub advisor_id: Option<LecturerId>,
}

/// Input for creating a lecturer profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLecturerInput {
    /// User account the profile belongs to.
    pub user_id: UserId,
    /// Institutional lecturer code.
    pub lecturer_code: String,
    /// Department name.
    pub department: String,
}
