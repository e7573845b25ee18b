use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use laurel_core::{AppError, AppResult, UserIdentity};
use laurel_domain::{AchievementId, Permission};

use crate::dto::{
    AchievementDetailResponse, AchievementListParams, AchievementPageResponse,
    AchievementResponse, AddAttachmentRequest, AttachmentResponse, CreateAchievementRequest,
    ReferenceResponse, RejectAchievementRequest, UpdateAchievementRequest,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

mod content;
mod workflow;

pub use content::{
    add_attachment_handler, create_achievement_handler, delete_achievement_handler,
    get_achievement_handler, hard_delete_achievement_handler, list_achievements_handler,
    list_attachments_handler, update_achievement_handler,
};
pub use workflow::{
    achievement_history_handler, reject_achievement_handler, submit_achievement_handler,
    verify_achievement_handler,
};

fn achievement_id(raw: String) -> AppResult<AchievementId> {
    AchievementId::new(raw)
}

fn decode_body<T: DeserializeOwned>(body: Value) -> AppResult<T> {
    serde_json::from_value(body)
        .map_err(|error| AppError::Validation(format!("invalid request body: {error}")))
}
