use super::*;

pub async fn list_achievements_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiQuery(params): ApiQuery<AchievementListParams>,
) -> ApiResult<Json<AchievementPageResponse>> {
    state
        .authorization_service
        .require_permission(&user, &Permission::ACHIEVEMENTS_LIST)
        .await?;
    let (query, page) = params.into_query()?;
    let page = state.achievement_service.list(&user, query, page).await?;

    Ok(Json(AchievementPageResponse::from(page)))
}

pub async fn create_achievement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<(StatusCode, Json<AchievementDetailResponse>)> {
    state
        .authorization_service
        .require_permission(&user, &Permission::ACHIEVEMENTS_CREATE)
        .await?;
    let payload: CreateAchievementRequest = decode_body(body)?;
    let content = payload.into_new_achievement(Utc::now())?;
    let detail = state.achievement_service.create(&user, content).await?;

    Ok((
        StatusCode::CREATED,
        Json(AchievementDetailResponse::from(detail)),
    ))
}

pub async fn get_achievement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<Json<AchievementDetailResponse>> {
    let achievement_id = achievement_id(raw_id)?;
    let detail = state
        .achievement_service
        .get(&user, &achievement_id)
        .await?;

    Ok(Json(AchievementDetailResponse::from(detail)))
}

pub async fn update_achievement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<AchievementResponse>> {
    state
        .authorization_service
        .require_permission(&user, &Permission::ACHIEVEMENTS_UPDATE)
        .await?;
    let achievement_id = achievement_id(raw_id)?;
    let payload: UpdateAchievementRequest = decode_body(body)?;
    let patch = payload.into_patch()?;
    let achievement = state
        .achievement_service
        .update(&user, &achievement_id, patch)
        .await?;

    Ok(Json(AchievementResponse::from(achievement)))
}

pub async fn delete_achievement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let achievement_id = achievement_id(raw_id)?;
    state
        .achievement_service
        .delete(&user, &achievement_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn hard_delete_achievement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let achievement_id = achievement_id(raw_id)?;
    state
        .achievement_service
        .hard_delete(&user, &achievement_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_attachments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<Json<Vec<AttachmentResponse>>> {
    let achievement_id = achievement_id(raw_id)?;
    let attachments = state
        .achievement_service
        .list_attachments(&user, &achievement_id)
        .await?
        .into_iter()
        .map(AttachmentResponse::from)
        .collect();

    Ok(Json(attachments))
}

pub async fn add_attachment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiPath(raw_id): ApiPath<String>,
    ApiJson(payload): ApiJson<AddAttachmentRequest>,
) -> ApiResult<(StatusCode, Json<AchievementResponse>)> {
    let achievement_id = achievement_id(raw_id)?;
    let achievement = state
        .achievement_service
        .add_attachment(&user, &achievement_id, payload.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AchievementResponse::from(achievement)),
    ))
}
