use super::*;

pub async fn submit_achievement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<Json<ReferenceResponse>> {
    let achievement_id = achievement_id(raw_id)?;
    let reference = state
        .achievement_service
        .submit(&user, &achievement_id)
        .await?;

    Ok(Json(ReferenceResponse::from(reference)))
}

pub async fn verify_achievement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<Json<ReferenceResponse>> {
    let achievement_id = achievement_id(raw_id)?;
    let reference = state
        .achievement_service
        .verify(&user, &achievement_id)
        .await?;

    Ok(Json(ReferenceResponse::from(reference)))
}

pub async fn reject_achievement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
    ApiJson(payload): ApiJson<RejectAchievementRequest>,
) -> ApiResult<Json<ReferenceResponse>> {
    let achievement_id = achievement_id(raw_id)?;
    let reference = state
        .achievement_service
        .reject(&user, &achievement_id, payload.note)
        .await?;

    Ok(Json(ReferenceResponse::from(reference)))
}

pub async fn achievement_history_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<Json<Vec<ReferenceResponse>>> {
    let achievement_id = achievement_id(raw_id)?;
    let history = state
        .achievement_service
        .history(&user, &achievement_id)
        .await?
        .into_iter()
        .map(ReferenceResponse::from)
        .collect();

    Ok(Json(history))
}
