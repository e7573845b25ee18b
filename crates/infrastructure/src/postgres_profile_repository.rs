use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_application::ProfileRepository;
use laurel_core::{AppError, AppResult};
use laurel_domain::{LecturerId, LecturerProfile, StudentId, StudentProfile, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed student and lecturer directory.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct StudentRow {
    id: Uuid,
    user_id: Uuid,
    student_number: String,
    program_study: String,
    academic_year: String,
    advisor_user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<StudentRow> for StudentProfile {
    fn from(row: StudentRow) -> Self {
        Self {
            id: StudentId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            student_number: row.student_number,
            program_study: row.program_study,
            academic_year: row.academic_year,
            advisor_user_id: row.advisor_user_id.map(UserId::from_uuid),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LecturerRow {
    id: Uuid,
    user_id: Uuid,
    lecturer_code: String,
    department: String,
    created_at: DateTime<Utc>,
}

impl From<LecturerRow> for LecturerProfile {
    fn from(row: LecturerRow) -> Self {
        Self {
            id: LecturerId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            lecturer_code: row.lecturer_code,
            department: row.department,
            created_at: row.created_at,
        }
    }
}

const STUDENT_COLUMNS: &str = "id, user_id, student_number, program_study, academic_year, \
                               advisor_user_id, created_at";
const LECTURER_COLUMNS: &str = "id, user_id, lecturer_code, department, created_at";

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_student(&self, student_id: StudentId) -> AppResult<Option<StudentProfile>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(student_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load student: {error}")))?;

        Ok(row.map(StudentProfile::from))
    }

    async fn find_student_by_user(&self, user_id: UserId) -> AppResult<Option<StudentProfile>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load student for user: {error}"))
        })?;

        Ok(row.map(StudentProfile::from))
    }

    async fn find_lecturer(&self, lecturer_id: LecturerId) -> AppResult<Option<LecturerProfile>> {
        let row = sqlx::query_as::<_, LecturerRow>(&format!(
            "SELECT {LECTURER_COLUMNS} FROM lecturers WHERE id = $1"
        ))
        .bind(lecturer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load lecturer: {error}")))?;

        Ok(row.map(LecturerProfile::from))
    }

    async fn find_lecturer_by_user(&self, user_id: UserId) -> AppResult<Option<LecturerProfile>> {
        let row = sqlx::query_as::<_, LecturerRow>(&format!(
            "SELECT {LECTURER_COLUMNS} FROM lecturers WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load lecturer for user: {error}"))
        })?;

        Ok(row.map(LecturerProfile::from))
    }

    async fn list_students_by_advisor(
        &self,
        advisor_user_id: UserId,
    ) -> AppResult<Vec<StudentProfile>> {
        let rows = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE advisor_user_id = $1 \
             ORDER BY student_number"
        ))
        .bind(advisor_user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list advisees: {error}")))?;

        Ok(rows.into_iter().map(StudentProfile::from).collect())
    }

    async fn list_students(&self) -> AppResult<Vec<StudentProfile>> {
        let rows = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY student_number"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list students: {error}")))?;

        Ok(rows.into_iter().map(StudentProfile::from).collect())
    }

    async fn list_lecturers(&self) -> AppResult<Vec<LecturerProfile>> {
        let rows = sqlx::query_as::<_, LecturerRow>(&format!(
            "SELECT {LECTURER_COLUMNS} FROM lecturers ORDER BY lecturer_code"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list lecturers: {error}")))?;

        Ok(rows.into_iter().map(LecturerProfile::from).collect())
    }

    async fn create_student(&self, student: &StudentProfile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO students (
                id, user_id, student_number, program_study, academic_year,
                advisor_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(student.id.as_uuid())
        .bind(student.user_id.as_uuid())
        .bind(student.student_number.as_str())
        .bind(student.program_study.as_str())
        .bind(student.academic_year.as_str())
        .bind(student.advisor_user_id.map(|user_id| user_id.as_uuid()))
        .bind(student.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| profile_conflict_or_internal(error, "create student"))?;

        Ok(())
    }

    async fn create_lecturer(&self, lecturer: &LecturerProfile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO lecturers (id, user_id, lecturer_code, department, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(lecturer.id.as_uuid())
        .bind(lecturer.user_id.as_uuid())
        .bind(lecturer.lecturer_code.as_str())
        .bind(lecturer.department.as_str())
        .bind(lecturer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| profile_conflict_or_internal(error, "create lecturer"))?;

        Ok(())
    }

    async fn set_student_advisor(
        &self,
        student_id: StudentId,
        advisor_user_id: Option<UserId>,
    ) -> AppResult<bool> {
        let result = sqlx::query("UPDATE students SET advisor_user_id = $2 WHERE id = $1")
            .bind(student_id.as_uuid())
            .bind(advisor_user_id.map(|user_id| user_id.as_uuid()))
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to set student advisor: {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

fn profile_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "cannot {operation}: profile number or user is already registered"
        ));
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
