use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use laurel_core::{AppError, AppResult};
use laurel_domain::{
    Achievement, AchievementId, AchievementPatch, AchievementType, Attachment, AttributeValue,
    NewAchievement, StudentId,
};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document, doc};
use serde::{Deserialize, Serialize};

/// Stored shape of one achievement in the `achievements` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AchievementDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub(super) id: Option<ObjectId>,
    pub(super) student_id: String,
    pub(super) achievement_type: String,
    pub(super) title: String,
    #[serde(default)]
    pub(super) description: String,
    #[serde(default)]
    pub(super) details: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub(super) tags: Vec<String>,
    #[serde(default)]
    pub(super) attachments: Vec<AttachmentDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) points: Option<i64>,
    pub(super) created_at: bson::DateTime,
    pub(super) updated_at: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) deleted_at: Option<bson::DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AttachmentDocument {
    pub(super) file_name: String,
    pub(super) file_url: String,
    #[serde(default)]
    pub(super) file_type: String,
    pub(super) uploaded_at: bson::DateTime,
}

impl AchievementDocument {
    pub(super) fn from_new(
        id: ObjectId,
        student_id: StudentId,
        achievement: NewAchievement,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            student_id: student_id.to_string(),
            achievement_type: achievement.achievement_type.as_str().to_owned(),
            title: achievement.title,
            description: achievement.description,
            details: achievement.details,
            tags: achievement.tags,
            attachments: achievement
                .attachments
                .into_iter()
                .map(AttachmentDocument::from)
                .collect(),
            points: achievement.points,
            created_at: to_bson_datetime(now),
            updated_at: to_bson_datetime(now),
            deleted_at: None,
        }
    }

    pub(super) fn into_achievement(self) -> AppResult<Achievement> {
        let Some(object_id) = self.id else {
            return Err(AppError::Internal(
                "achievement document is missing its _id".to_owned(),
            ));
        };
        let id = AchievementId::new(object_id.to_hex())?;
        let student_id = StudentId::parse(self.student_id.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "achievement '{id}' has an invalid studentId: {error}"
            ))
        })?;
        let achievement_type =
            AchievementType::from_str(self.achievement_type.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "achievement '{id}' has an invalid achievementType: {error}"
                ))
            })?;

        Ok(Achievement {
            id,
            student_id,
            achievement_type,
            title: self.title,
            description: self.description,
            details: self.details,
            tags: self.tags,
            attachments: self
                .attachments
                .into_iter()
                .map(AttachmentDocument::into_attachment)
                .collect::<AppResult<Vec<_>>>()?,
            points: self.points,
            created_at: from_bson_datetime(self.created_at)?,
            updated_at: from_bson_datetime(self.updated_at)?,
            deleted_at: self.deleted_at.map(from_bson_datetime).transpose()?,
        })
    }
}

impl From<Attachment> for AttachmentDocument {
    fn from(attachment: Attachment) -> Self {
        Self {
            file_name: attachment.file_name,
            file_url: attachment.file_url,
            file_type: attachment.file_type,
            uploaded_at: to_bson_datetime(attachment.uploaded_at),
        }
    }
}

impl AttachmentDocument {
    fn into_attachment(self) -> AppResult<Attachment> {
        Ok(Attachment {
            file_name: self.file_name,
            file_url: self.file_url,
            file_type: self.file_type,
            uploaded_at: from_bson_datetime(self.uploaded_at)?,
        })
    }
}

/// Builds the `$set` document for a content patch.
pub(super) fn patch_update(patch: &AchievementPatch, now: DateTime<Utc>) -> AppResult<Document> {
    let mut set = doc! { "updatedAt": to_bson_datetime(now) };

    if let Some(achievement_type) = patch.achievement_type {
        set.insert("achievementType", achievement_type.as_str());
    }
    if let Some(title) = &patch.title {
        set.insert("title", title.as_str());
    }
    if let Some(description) = &patch.description {
        set.insert("description", description.as_str());
    }
    if let Some(details) = &patch.details {
        set.insert("details", encode(details, "details")?);
    }
    if let Some(tags) = &patch.tags {
        set.insert("tags", tags.clone());
    }
    if let Some(points) = patch.points {
        set.insert("points", points);
    }

    Ok(doc! { "$set": set })
}

pub(super) fn encode<T: Serialize>(value: &T, field: &str) -> AppResult<Bson> {
    bson::to_bson(value)
        .map_err(|error| AppError::Internal(format!("failed to encode {field}: {error}")))
}

pub(super) fn to_bson_datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

fn from_bson_datetime(value: bson::DateTime) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis()).ok_or_else(|| {
        AppError::Internal(format!("timestamp '{value}' is out of range"))
    })
}

/// Escapes regex metacharacters so free text matches literally.
pub(super) fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        if "\\^$.|?*+()[]{}".contains(character) {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use laurel_domain::{AchievementPatch, AchievementType, NewAchievement, StudentId};
    use mongodb::bson::oid::ObjectId;

    use super::{AchievementDocument, escape_regex, patch_update};

    #[test]
    fn stored_document_uses_camel_case_keys() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).single().unwrap_or_default();
        let content = NewAchievement::new(AchievementType::Academic, "Dean's list", "semester 5")
            .unwrap_or_else(|_| unreachable!());
        let document =
            AchievementDocument::from_new(ObjectId::new(), StudentId::new(), content, now);

        let encoded = mongodb::bson::to_document(&document).unwrap_or_default();
        for key in ["_id", "studentId", "achievementType", "createdAt", "updatedAt"] {
            assert!(encoded.contains_key(key), "missing key '{key}'");
        }
        assert!(!encoded.contains_key("deletedAt"));
    }

    #[test]
    fn document_converts_back_to_achievement() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).single().unwrap_or_default();
        let student_id = StudentId::new();
        let object_id = ObjectId::new();
        let content = NewAchievement::new(AchievementType::Publication, "Paper", "IEEE")
            .and_then(|content| content.with_points(Some(30)))
            .unwrap_or_else(|_| unreachable!());

        let achievement = AchievementDocument::from_new(object_id, student_id, content, now)
            .into_achievement();
        assert!(achievement.is_ok());
        let achievement = achievement.unwrap_or_else(|_| unreachable!());
        assert_eq!(achievement.id.as_str(), object_id.to_hex());
        assert_eq!(achievement.student_id, student_id);
        assert_eq!(achievement.points, Some(30));
        assert_eq!(achievement.created_at, now);
        assert!(!achievement.is_deleted());
    }

    #[test]
    fn patch_sets_only_changed_fields() {
        let patch = AchievementPatch {
            title: Some("Renamed".to_owned()),
            ..AchievementPatch::default()
        };

        let update = patch_update(&patch, Utc::now()).unwrap_or_default();
        let set = update.get_document("$set").cloned().unwrap_or_default();
        assert_eq!(set.get_str("title").ok(), Some("Renamed"));
        assert!(set.contains_key("updatedAt"));
        assert!(!set.contains_key("description"));
        assert!(!set.contains_key("studentId"));
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        assert_eq!(escape_regex("c++ (intro)"), "c\\+\\+ \\(intro\\)");
        assert_eq!(escape_regex("plain"), "plain");
    }
}
