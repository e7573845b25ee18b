use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;

use laurel_core::UserIdentity;
use laurel_domain::{Permission, RoleId};

use crate::dto::{CreateRoleRequest, RolePermissionsResponse, RoleResponse};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiJson(payload): ApiJson<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .role_admin_service
        .create_role(&user, &payload.name, &payload.description)
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn get_role_by_name_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(name): ApiPath<String>,
) -> ApiResult<Json<RolePermissionsResponse>> {
    let role = state
        .role_admin_service
        .get_role_by_name(&user, &name)
        .await?;

    Ok(Json(RolePermissionsResponse::from(role)))
}

pub async fn list_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(role_id): ApiPath<String>,
) -> ApiResult<Json<RolePermissionsResponse>> {
    let role_id = RoleId::parse(role_id.as_str())?;
    let role = state
        .role_admin_service
        .list_role_permissions(&user, role_id)
        .await?;

    Ok(Json(RolePermissionsResponse::from(role)))
}

pub async fn grant_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath((role_id, permission)): ApiPath<(String, String)>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::parse(role_id.as_str())?;
    let permission = Permission::new(permission)?;
    state
        .role_admin_service
        .grant_permission(&user, role_id, &permission)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath((role_id, permission)): ApiPath<(String, String)>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::parse(role_id.as_str())?;
    let permission = Permission::new(permission)?;
    state
        .role_admin_service
        .revoke_permission(&user, role_id, &permission)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
