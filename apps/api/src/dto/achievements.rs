use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use laurel_application::{AchievementDetail, AchievementListQuery, AchievementPage, PageRequest};
use laurel_core::{AppError, AppResult};
use laurel_domain::{
    Achievement, AchievementPatch, AchievementReference, AchievementType, Attachment,
    AttributeValue, NewAchievement, NewAttachment, StudentId,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the server owns; clients may not set them.
const RESERVED_KEYS: [&str; 6] = [
    "id",
    "_id",
    "studentId",
    "createdAt",
    "updatedAt",
    "deletedAt",
];

/// Incoming payload for achievement creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAchievementRequest {
    pub achievement_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<AddAttachmentRequest>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreateAchievementRequest {
    /// Validates the payload into achievement content.
    ///
    /// A client-sent `studentId` is dropped; the owner is always the caller's
    /// student profile.
    pub fn into_new_achievement(self, now: DateTime<Utc>) -> AppResult<NewAchievement> {
        let mut extra = self.extra;
        extra.remove("studentId");
        reject_reserved_keys(&extra)?;

        let attachments = self
            .attachments
            .into_iter()
            .map(|attachment| NewAttachment::from(attachment).into_attachment(now))
            .collect::<AppResult<Vec<_>>>()?;

        let mut achievement = NewAchievement::new(
            parse_achievement_type(self.achievement_type.as_str())?,
            self.title,
            self.description,
        )?
        .with_tags(self.tags)
        .with_attachments(attachments)
        .with_points(self.points)?;

        if let Some(details) = self.details {
            achievement = achievement.with_details(parse_details(details)?);
        }

        Ok(achievement)
    }
}

/// Incoming payload for a partial achievement update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAchievementRequest {
    #[serde(default)]
    pub achievement_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpdateAchievementRequest {
    /// Converts the payload into a content patch.
    pub fn into_patch(self) -> AppResult<AchievementPatch> {
        reject_reserved_keys(&self.extra)?;

        Ok(AchievementPatch {
            achievement_type: self
                .achievement_type
                .as_deref()
                .map(parse_achievement_type)
                .transpose()?,
            title: self.title,
            description: self.description,
            details: self.details.map(parse_details).transpose()?,
            tags: self.tags,
            points: self.points,
        })
    }
}

/// Incoming attachment metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAttachmentRequest {
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub file_type: String,
}

impl From<AddAttachmentRequest> for NewAttachment {
    fn from(value: AddAttachmentRequest) -> Self {
        Self {
            file_name: value.file_name,
            file_url: value.file_url,
            file_type: value.file_type,
        }
    }
}

/// Incoming payload for a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RejectAchievementRequest {
    #[serde(default)]
    pub note: String,
}

/// Query string of the achievement listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub student_id: Option<String>,
    pub achievement_type: Option<String>,
    pub search: Option<String>,
}

impl AchievementListParams {
    /// Validates the parameters into a filter and page window.
    pub fn into_query(self) -> AppResult<(AchievementListQuery, PageRequest)> {
        let page = PageRequest::new(
            self.page.unwrap_or(PageRequest::DEFAULT_PAGE),
            self.limit.unwrap_or(PageRequest::DEFAULT_LIMIT),
        )?;

        let query = AchievementListQuery {
            student_id: self
                .student_id
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .map(StudentId::parse)
                .transpose()?,
            achievement_type: self
                .achievement_type
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .map(parse_achievement_type)
                .transpose()?,
            search: self.search,
        };

        Ok((query, page))
    }
}

/// API representation of an attachment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponse {
    fn from(value: Attachment) -> Self {
        Self {
            file_name: value.file_name,
            file_url: value.file_url,
            file_type: value.file_type,
            uploaded_at: value.uploaded_at,
        }
    }
}

/// API representation of achievement content.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementResponse {
    pub id: String,
    pub student_id: String,
    pub achievement_type: &'static str,
    pub title: String,
    pub description: String,
    pub details: Value,
    pub tags: Vec<String>,
    pub attachments: Vec<AttachmentResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Achievement> for AchievementResponse {
    fn from(value: Achievement) -> Self {
        Self {
            id: value.id.to_string(),
            student_id: value.student_id.to_string(),
            achievement_type: value.achievement_type.as_str(),
            title: value.title,
            description: value.description,
            details: Value::Object(
                value
                    .details
                    .iter()
                    .map(|(key, attribute)| (key.clone(), attribute.to_json()))
                    .collect(),
            ),
            tags: value.tags,
            attachments: value
                .attachments
                .into_iter()
                .map(AttachmentResponse::from)
                .collect(),
            points: value.points,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// API representation of a workflow reference.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceResponse {
    pub id: String,
    pub student_id: String,
    pub achievement_id: String,
    pub status: &'static str,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AchievementReference> for ReferenceResponse {
    fn from(value: AchievementReference) -> Self {
        Self {
            id: value.id().to_string(),
            student_id: value.student_id().to_string(),
            achievement_id: value.achievement_id().to_string(),
            status: value.status().as_str(),
            submitted_at: value.submitted_at(),
            verified_at: value.verified_at(),
            verified_by: value.verified_by().map(|user_id| user_id.to_string()),
            rejection_note: value.rejection_note().map(ToOwned::to_owned),
            created_at: value.created_at(),
            updated_at: value.updated_at(),
        }
    }
}

/// Achievement content together with its workflow reference.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDetailResponse {
    #[serde(flatten)]
    pub achievement: AchievementResponse,
    pub status: Option<&'static str>,
    pub reference: Option<ReferenceResponse>,
}

impl From<AchievementDetail> for AchievementDetailResponse {
    fn from(value: AchievementDetail) -> Self {
        Self {
            achievement: AchievementResponse::from(value.achievement),
            status: value
                .reference
                .as_ref()
                .map(|reference| reference.status().as_str()),
            reference: value.reference.map(ReferenceResponse::from),
        }
    }
}

/// One page of achievements.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementPageResponse {
    pub items: Vec<AchievementResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl From<AchievementPage> for AchievementPageResponse {
    fn from(value: AchievementPage) -> Self {
        let total_pages = value.total_pages();
        Self {
            items: value
                .items
                .into_iter()
                .map(AchievementResponse::from)
                .collect(),
            total: value.total,
            page: value.page,
            limit: value.limit,
            total_pages,
        }
    }
}

fn reject_reserved_keys(extra: &Map<String, Value>) -> AppResult<()> {
    if let Some(key) = RESERVED_KEYS.iter().find(|key| extra.contains_key(**key)) {
        return Err(AppError::Validation(format!(
            "field '{key}' is managed by the server and cannot be set"
        )));
    }
    Ok(())
}

fn parse_achievement_type(value: &str) -> AppResult<AchievementType> {
    AchievementType::from_str(value.trim())
}

fn parse_details(value: Value) -> AppResult<BTreeMap<String, AttributeValue>> {
    match AttributeValue::from_json(value)? {
        AttributeValue::Map(entries) => Ok(entries),
        AttributeValue::Null => Ok(BTreeMap::new()),
        _ => Err(AppError::Validation(
            "details must be a JSON object".to_owned(),
        )),
    }
}
