use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use chrono::Utc;

use laurel_core::UserIdentity;
use laurel_domain::{LecturerId, StudentId};

use crate::dto::{
    AchievementDetailResponse, CreateLecturerRequest, CreateStudentRequest, LecturerResponse,
    SetAdvisorRequest, StudentResponse,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list_students_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<StudentResponse>>> {
    let students = state
        .profile_service
        .list_students(&user)
        .await?
        .into_iter()
        .map(StudentResponse::from)
        .collect();

    Ok(Json(students))
}

pub async fn create_student_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiJson(payload): ApiJson<CreateStudentRequest>,
) -> ApiResult<(StatusCode, Json<StudentResponse>)> {
    let student = state
        .profile_service
        .create_student(&user, payload.into_input()?, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(StudentResponse::from(student))))
}

pub async fn get_student_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(student_id): ApiPath<String>,
) -> ApiResult<Json<StudentResponse>> {
    let student_id = StudentId::parse(student_id.as_str())?;
    let student = state.profile_service.get_student(&user, student_id).await?;

    Ok(Json(StudentResponse::from(student)))
}

pub async fn set_student_advisor_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(student_id): ApiPath<String>,
    ApiJson(payload): ApiJson<SetAdvisorRequest>,
) -> ApiResult<Json<StudentResponse>> {
    let student_id = StudentId::parse(student_id.as_str())?;
    let student = state
        .profile_service
        .set_student_advisor(&user, student_id, payload.advisor()?)
        .await?;

    Ok(Json(StudentResponse::from(student)))
}

pub async fn student_achievements_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(student_id): ApiPath<String>,
) -> ApiResult<Json<Vec<AchievementDetailResponse>>> {
    let student_id = StudentId::parse(student_id.as_str())?;
    let achievements = state
        .achievement_service
        .list_student_achievements(&user, student_id)
        .await?
        .into_iter()
        .map(AchievementDetailResponse::from)
        .collect();

    Ok(Json(achievements))
}

pub async fn list_lecturers_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<LecturerResponse>>> {
    let lecturers = state
        .profile_service
        .list_lecturers(&user)
        .await?
        .into_iter()
        .map(LecturerResponse::from)
        .collect();

    Ok(Json(lecturers))
}

pub async fn create_lecturer_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiJson(payload): ApiJson<CreateLecturerRequest>,
) -> ApiResult<(StatusCode, Json<LecturerResponse>)> {
    let lecturer = state
        .profile_service
        .create_lecturer(&user, payload.into_input()?, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(LecturerResponse::from(lecturer))))
}

pub async fn get_lecturer_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(lecturer_id): ApiPath<String>,
) -> ApiResult<Json<LecturerResponse>> {
    let lecturer_id = LecturerId::parse(lecturer_id.as_str())?;
    let lecturer = state
        .profile_service
        .get_lecturer(&user, lecturer_id)
        .await?;

    Ok(Json(LecturerResponse::from(lecturer)))
}

pub async fn lecturer_advisees_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(lecturer_id): ApiPath<String>,
) -> ApiResult<Json<Vec<StudentResponse>>> {
    let lecturer_id = LecturerId::parse(lecturer_id.as_str())?;
    let advisees = state
        .profile_service
        .list_advisees(&user, lecturer_id)
        .await?
        .into_iter()
        .map(StudentResponse::from)
        .collect();

    Ok(Json(advisees))
}
