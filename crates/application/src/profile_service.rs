use std::sync::Arc;

use chrono::{DateTime, Utc};
use laurel_core::{AppError, AppResult, UserIdentity};
use laurel_domain::{
    LecturerId, LecturerProfile, Permission, StudentId, StudentProfile, UserId,
};
use tracing::info;

use crate::{
    AuthorizationService, CreateLecturerInput, CreateStudentInput, ProfileRepository,
    UserRepository,
};

/// Directory of student and lecturer profiles.
#[derive(Clone)]
pub struct ProfileService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn ProfileRepository>,
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    /// Creates a profile service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn ProfileRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            users,
        }
    }

    /// Returns one student profile.
    pub async fn get_student(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
    ) -> AppResult<StudentProfile> {
        self.authorization_service
            .require_permission(actor, &Permission::STUDENTS_VIEW)
            .await?;

        self.find_student(student_id).await
    }

    /// Lists every student profile.
    pub async fn list_students(&self, actor: &UserIdentity) -> AppResult<Vec<StudentProfile>> {
        self.authorization_service
            .require_permission(actor, &Permission::STUDENTS_LIST)
            .await?;

        self.repository.list_students().await
    }

    /// Creates the student profile of an existing user.
    pub async fn create_student(
        &self,
        actor: &UserIdentity,
        input: CreateStudentInput,
        now: DateTime<Utc>,
    ) -> AppResult<StudentProfile> {
        self.authorization_service
            .require_permission(actor, &Permission::STUDENTS_CREATE)
            .await?;

        let mut student = StudentProfile::new(
            input.user_id,
            input.student_number,
            input.program_study,
            input.academic_year,
            now,
        )?;
        self.ensure_user_exists(student.user_id).await?;
        if self
            .repository
            .find_student_by_user(student.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "user '{}' already has a student profile",
                student.user_id
            )));
        }

        if let Some(advisor_id) = input.advisor_id {
            student.advisor_user_id = Some(self.find_lecturer(advisor_id).await?.user_id);
        }

        self.repository.create_student(&student).await?;
        info!(
            student_id = %student.id,
            user_id = %student.user_id,
            subject = actor.subject(),
            "student profile created"
        );

        Ok(student)
    }

    /// Assigns a lecturer as advisor of a student, or clears it with `None`.
    pub async fn set_student_advisor(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
        advisor_id: Option<LecturerId>,
    ) -> AppResult<StudentProfile> {
        self.authorization_service
            .require_permission(actor, &Permission::STUDENTS_SET_ADVISOR)
            .await?;

        let mut student = self.find_student(student_id).await?;
        let advisor_user_id = match advisor_id {
            Some(lecturer_id) => Some(self.find_lecturer(lecturer_id).await?.user_id),
            None => None,
        };

        if !self
            .repository
            .set_student_advisor(student_id, advisor_user_id)
            .await?
        {
            return Err(student_not_found(student_id));
        }

        info!(
            %student_id,
            advisor_user_id = advisor_user_id.map(|id| id.to_string()),
            subject = actor.subject(),
            "student advisor changed"
        );
        student.advisor_user_id = advisor_user_id;
        Ok(student)
    }

    /// Returns one lecturer profile.
    pub async fn get_lecturer(
        &self,
        actor: &UserIdentity,
        lecturer_id: LecturerId,
    ) -> AppResult<LecturerProfile> {
        self.authorization_service
            .require_permission(actor, &Permission::LECTURERS_VIEW)
            .await?;

        self.find_lecturer(lecturer_id).await
    }

    /// Lists every lecturer profile.
    pub async fn list_lecturers(&self, actor: &UserIdentity) -> AppResult<Vec<LecturerProfile>> {
        self.authorization_service
            .require_permission(actor, &Permission::LECTURERS_LIST)
            .await?;

        self.repository.list_lecturers().await
    }

    /// Creates the lecturer profile of an existing user.
    pub async fn create_lecturer(
        &self,
        actor: &UserIdentity,
        input: CreateLecturerInput,
        now: DateTime<Utc>,
    ) -> AppResult<LecturerProfile> {
        self.authorization_service
            .require_permission(actor, &Permission::LECTURERS_CREATE)
            .await?;

        let lecturer =
            LecturerProfile::new(input.user_id, input.lecturer_code, input.department, now)?;
        self.ensure_user_exists(lecturer.user_id).await?;
        if self
            .repository
            .find_lecturer_by_user(lecturer.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "user '{}' already has a lecturer profile",
                lecturer.user_id
            )));
        }

        self.repository.create_lecturer(&lecturer).await?;
        info!(
            lecturer_id = %lecturer.id,
            user_id = %lecturer.user_id,
            subject = actor.subject(),
            "lecturer profile created"
        );

        Ok(lecturer)
    }

    /// Lists the students advised by a lecturer.
    pub async fn list_advisees(
        &self,
        actor: &UserIdentity,
        lecturer_id: LecturerId,
    ) -> AppResult<Vec<StudentProfile>> {
        self.authorization_service
            .require_permission(actor, &Permission::LECTURERS_VIEW_ADVISEES)
            .await?;

        let lecturer = self.find_lecturer(lecturer_id).await?;
        self.repository
            .list_students_by_advisor(lecturer.user_id)
            .await
    }

    async fn ensure_user_exists(&self, user_id: UserId) -> AppResult<()> {
        match self.users.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("user '{user_id}' not found"))),
        }
    }

    async fn find_student(&self, student_id: StudentId) -> AppResult<StudentProfile> {
        self.repository
            .find_student(student_id)
            .await?
            .ok_or_else(|| student_not_found(student_id))
    }

    async fn find_lecturer(&self, lecturer_id: LecturerId) -> AppResult<LecturerProfile> {
        self.repository
            .find_lecturer(lecturer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("lecturer '{lecturer_id}' not found")))
    }
}

fn student_not_found(student_id: StudentId) -> AppError {
    AppError::NotFound(format!("student '{student_id}' not found"))
}

#[cfg(test)]
mod tests;
