use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use chrono::Utc;

use laurel_core::UserIdentity;
use laurel_domain::{RoleId, UserId};

use crate::dto::{AssignRoleRequest, CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .user_admin_service
        .list_users(&user)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let created = state
        .user_admin_service
        .create_user(&user, payload.into_input()?, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(user_id): ApiPath<String>,
) -> ApiResult<Json<UserResponse>> {
    let user_id = UserId::parse(user_id.as_str())?;
    let account = state.user_admin_service.get_user(&user, user_id).await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(user_id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user_id = UserId::parse(user_id.as_str())?;
    let account = state
        .user_admin_service
        .update_user(&user, user_id, payload.into(), Utc::now())
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(user_id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::parse(user_id.as_str())?;
    state.user_admin_service.delete_user(&user, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(user_id): ApiPath<String>,
    ApiJson(payload): ApiJson<AssignRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user_id = UserId::parse(user_id.as_str())?;
    let role_id = RoleId::parse(payload.role_id.as_str())?;
    let account = state
        .user_admin_service
        .assign_role(&user, user_id, role_id, Utc::now())
        .await?;

    Ok(Json(UserResponse::from(account)))
}
