use axum::Json;
use axum::extract::{Extension, State};

use laurel_core::UserIdentity;

use crate::dto::CallerProfileResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<CallerProfileResponse>> {
    let profile = state.user_admin_service.current_profile(&user).await?;

    Ok(Json(CallerProfileResponse::from(profile)))
}
