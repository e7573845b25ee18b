use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use laurel_core::{AppError, AppResult, UserIdentity};
use laurel_domain::{
    LecturerId, LecturerProfile, Permission, PermissionDefinition, PermissionId, RoleDefinition,
    RoleId, StudentId, StudentProfile, UserAccount, UserId,
};

use crate::{
    AuthorizationService, CreateLecturerInput, CreateStudentInput, PermissionCache,
    ProfileRepository, RolePermissionRepository, UserRepository,
};

use super::ProfileService;

struct NoGrants;

#[async_trait]
impl RolePermissionRepository for NoGrants {
    async fn list_permissions_for_role(&self, _role_id: RoleId) -> AppResult<Vec<Permission>> {
        Ok(Vec::new())
    }

    async fn find_role(&self, _role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        Ok(None)
    }

    async fn find_role_by_name(&self, _name: &str) -> AppResult<Option<RoleDefinition>> {
        Ok(None)
    }

    async fn create_role(&self, _role: &RoleDefinition) -> AppResult<()> {
        Ok(())
    }

    async fn find_permission(
        &self,
        _permission: &Permission,
    ) -> AppResult<Option<PermissionDefinition>> {
        Ok(None)
    }

    async fn grant_permission(
        &self,
        _role_id: RoleId,
        _permission_id: PermissionId,
    ) -> AppResult<bool> {
        Ok(false)
    }

    async fn revoke_permission(
        &self,
        _role_id: RoleId,
        _permission_id: PermissionId,
    ) -> AppResult<bool> {
        Ok(false)
    }
}

struct NoCache;

#[async_trait]
impl PermissionCache for NoCache {
    async fn get(&self, _role_id: RoleId) -> AppResult<Option<BTreeSet<Permission>>> {
        Ok(None)
    }

    async fn set(&self, _role_id: RoleId, _permissions: BTreeSet<Permission>) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _role_id: RoleId) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Directory {
    students: Mutex<Vec<StudentProfile>>,
    lecturers: Mutex<Vec<LecturerProfile>>,
}

#[async_trait]
impl ProfileRepository for Directory {
    async fn find_student(&self, student_id: StudentId) -> AppResult<Option<StudentProfile>> {
        let students = self.students.lock().await;
        Ok(students.iter().find(|s| s.id == student_id).cloned())
    }

    async fn find_student_by_user(&self, user_id: UserId) -> AppResult<Option<StudentProfile>> {
        let students = self.students.lock().await;
        Ok(students.iter().find(|s| s.user_id == user_id).cloned())
    }

    async fn find_lecturer(&self, lecturer_id: LecturerId) -> AppResult<Option<LecturerProfile>> {
        let lecturers = self.lecturers.lock().await;
        Ok(lecturers.iter().find(|l| l.id == lecturer_id).cloned())
    }

    async fn find_lecturer_by_user(&self, user_id: UserId) -> AppResult<Option<LecturerProfile>> {
        let lecturers = self.lecturers.lock().await;
        Ok(lecturers.iter().find(|l| l.user_id == user_id).cloned())
    }

    async fn list_students_by_advisor(
        &self,
        advisor_user_id: UserId,
    ) -> AppResult<Vec<StudentProfile>> {
        Ok(self
            .students
            .lock()
            .await
            .iter()
            .filter(|student| student.is_advised_by(advisor_user_id))
            .cloned()
            .collect())
    }

    async fn list_students(&self) -> AppResult<Vec<StudentProfile>> {
        Ok(self.students.lock().await.clone())
    }

    async fn list_lecturers(&self) -> AppResult<Vec<LecturerProfile>> {
        Ok(self.lecturers.lock().await.clone())
    }

    async fn create_student(&self, student: &StudentProfile) -> AppResult<()> {
        self.students.lock().await.push(student.clone());
        Ok(())
    }

    async fn create_lecturer(&self, lecturer: &LecturerProfile) -> AppResult<()> {
        self.lecturers.lock().await.push(lecturer.clone());
        Ok(())
    }

    async fn set_student_advisor(
        &self,
        student_id: StudentId,
        advisor_user_id: Option<UserId>,
    ) -> AppResult<bool> {
        let mut students = self.students.lock().await;
        let Some(student) = students.iter_mut().find(|s| s.id == student_id) else {
            return Ok(false);
        };
        student.advisor_user_id = advisor_user_id;
        Ok(true)
    }
}

#[derive(Default)]
struct KnownUsers {
    ids: Vec<UserId>,
}

#[async_trait]
impl UserRepository for KnownUsers {
    async fn create_user(&self, _user: &UserAccount) -> AppResult<()> {
        Ok(())
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        if !self.ids.contains(&user_id) {
            return Ok(None);
        }
        let mut user =
            UserAccount::new("someone", "someone@campus.ac.id", "Someone", None, Utc::now())?;
        user.id = user_id;
        Ok(Some(user))
    }

    async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        Ok(Vec::new())
    }

    async fn update_user(&self, _user: &UserAccount) -> AppResult<()> {
        Ok(())
    }

    async fn delete_user(&self, _user_id: UserId) -> AppResult<bool> {
        Ok(false)
    }

    async fn assign_role(
        &self,
        _user_id: UserId,
        _role_id: RoleId,
        _now: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(false)
    }
}

fn student(advisor_user_id: Option<UserId>) -> StudentProfile {
    let mut profile =
        StudentProfile::new(UserId::new(), "434221042", "Informatics", "2022/2023", Utc::now())
            .unwrap_or_else(|_| unreachable!());
    profile.advisor_user_id = advisor_user_id;
    profile
}

fn lecturer() -> LecturerProfile {
    LecturerProfile::new(UserId::new(), "D-1021", "Informatics", Utc::now())
        .unwrap_or_else(|_| unreachable!())
}

fn caller(permissions: &[Permission]) -> UserIdentity {
    UserIdentity::new(
        UserId::new().to_string(),
        "caller",
        None,
        Some(
            permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        ),
    )
}

fn service(directory: Arc<Directory>, users: KnownUsers) -> ProfileService {
    ProfileService::new(
        AuthorizationService::new(Arc::new(NoGrants), Arc::new(NoCache)),
        directory,
        Arc::new(users),
    )
}

#[tokio::test]
async fn advisees_are_resolved_through_lecturer_user() {
    let lecturer = lecturer();
    let advisee = student(Some(lecturer.user_id));
    let directory = Arc::new(Directory {
        students: Mutex::new(vec![advisee.clone(), student(None)]),
        lecturers: Mutex::new(vec![lecturer.clone()]),
    });
    let service = service(directory, KnownUsers::default());

    let advisees = service
        .list_advisees(&caller(&[Permission::LECTURERS_VIEW_ADVISEES]), lecturer.id)
        .await;
    assert_eq!(advisees.ok(), Some(vec![advisee]));

    let missing = service
        .list_advisees(
            &caller(&[Permission::LECTURERS_VIEW_ADVISEES]),
            LecturerId::new(),
        )
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn profile_reads_require_permission() {
    let profile = student(None);
    let directory = Arc::new(Directory {
        students: Mutex::new(vec![profile.clone()]),
        lecturers: Mutex::default(),
    });
    let service = service(directory, KnownUsers::default());

    let denied = service.get_student(&caller(&[]), profile.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let found = service
        .get_student(&caller(&[Permission::STUDENTS_VIEW]), profile.id)
        .await;
    assert_eq!(found.ok(), Some(profile));

    let lecturer = service
        .get_lecturer(&caller(&[Permission::LECTURERS_VIEW]), LecturerId::new())
        .await;
    assert!(matches!(lecturer, Err(AppError::NotFound(_))));

    let listing = service.list_lecturers(&caller(&[Permission::STUDENTS_LIST])).await;
    assert!(matches!(listing, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn created_student_gets_advisor_user_from_lecturer() {
    let advisor = lecturer();
    let user_id = UserId::new();
    let directory = Arc::new(Directory {
        students: Mutex::default(),
        lecturers: Mutex::new(vec![advisor.clone()]),
    });
    let service = service(directory.clone(), KnownUsers { ids: vec![user_id] });
    let admin = caller(&[Permission::STUDENTS_CREATE, Permission::STUDENTS_LIST]);
    let input = CreateStudentInput {
        user_id,
        student_number: "434221077".to_owned(),
        program_study: "Informatics".to_owned(),
        academic_year: "2024/2025".to_owned(),
        advisor_id: Some(advisor.id),
    };

    let created = service
        .create_student(&admin, input.clone(), Utc::now())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(created.advisor_user_id, Some(advisor.user_id));
    assert_eq!(service.list_students(&admin).await.ok(), Some(vec![created]));

    let again = service.create_student(&admin, input, Utc::now()).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn profiles_require_an_existing_user_and_advisor() {
    let user_id = UserId::new();
    let directory = Arc::new(Directory::default());
    let service = service(directory.clone(), KnownUsers { ids: vec![user_id] });
    let admin = caller(&[Permission::STUDENTS_CREATE, Permission::LECTURERS_CREATE]);

    let unknown_user = service
        .create_lecturer(
            &admin,
            CreateLecturerInput {
                user_id: UserId::new(),
                lecturer_code: "D-2001".to_owned(),
                department: "Mathematics".to_owned(),
            },
            Utc::now(),
        )
        .await;
    assert!(matches!(unknown_user, Err(AppError::NotFound(_))));

    let unknown_advisor = service
        .create_student(
            &admin,
            CreateStudentInput {
                user_id,
                student_number: "434221078".to_owned(),
                program_study: "Informatics".to_owned(),
                academic_year: "2024/2025".to_owned(),
                advisor_id: Some(LecturerId::new()),
            },
            Utc::now(),
        )
        .await;
    assert!(matches!(unknown_advisor, Err(AppError::NotFound(_))));
    assert!(directory.students.lock().await.is_empty());

    let lecturer = service
        .create_lecturer(
            &admin,
            CreateLecturerInput {
                user_id,
                lecturer_code: "D-2001".to_owned(),
                department: "Mathematics".to_owned(),
            },
            Utc::now(),
        )
        .await;
    assert!(lecturer.is_ok());
    assert_eq!(directory.lecturers.lock().await.len(), 1);
}

#[tokio::test]
async fn advisor_can_be_assigned_and_cleared() {
    let advisor = lecturer();
    let profile = student(None);
    let directory = Arc::new(Directory {
        students: Mutex::new(vec![profile.clone()]),
        lecturers: Mutex::new(vec![advisor.clone()]),
    });
    let service = service(directory.clone(), KnownUsers::default());
    let admin = caller(&[Permission::STUDENTS_SET_ADVISOR]);

    let assigned = service
        .set_student_advisor(&admin, profile.id, Some(advisor.id))
        .await;
    assert!(assigned.is_ok_and(|student| student.is_advised_by(advisor.user_id)));

    let cleared = service.set_student_advisor(&admin, profile.id, None).await;
    assert!(cleared.is_ok_and(|student| student.advisor_user_id.is_none()));
    assert_eq!(directory.students.lock().await[0].advisor_user_id, None);

    let missing = service
        .set_student_advisor(&admin, StudentId::new(), Some(advisor.id))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let denied = service
        .set_student_advisor(&caller(&[]), profile.id, None)
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}
