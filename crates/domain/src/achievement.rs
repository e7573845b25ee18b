//! Achievement documents and their embedded attachments.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use laurel_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::StudentId;

/// Opaque document-store key of an achievement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementId(String);

impl AchievementId {
    /// Creates an achievement identifier from its string form.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = NonEmptyString::new(value)
            .map_err(|_| AppError::Validation("achievement id must not be empty".to_owned()))?;
        Ok(Self(String::from(value).trim().to_owned()))
    }

    /// Returns the string form of the document key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for AchievementId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Category of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    /// Academic distinction.
    Academic,
    /// Competition result.
    Competition,
    /// Organizational role or activity.
    Organization,
    /// Publication.
    Publication,
    /// Certification.
    Certification,
    /// Anything else.
    Other,
}

impl AchievementType {
    /// Returns the stable storage value for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Competition => "competition",
            Self::Organization => "organization",
            Self::Publication => "publication",
            Self::Certification => "certification",
            Self::Other => "other",
        }
    }
}

impl FromStr for AchievementType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "academic" => Ok(Self::Academic),
            "competition" => Ok(Self::Competition),
            "organization" => Ok(Self::Organization),
            "publication" => Ok(Self::Publication),
            "certification" => Ok(Self::Certification),
            "other" => Ok(Self::Other),
            _ => Err(AppError::Validation(format!(
                "unknown achievement type '{value}'"
            ))),
        }
    }
}

/// Value stored in the type-specific attribute bag of an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Explicit null.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    String(String),
    /// Ordered list of values.
    List(Vec<AttributeValue>),
    /// Nested string-keyed map.
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Converts a JSON value into an attribute value.
    pub fn from_json(value: Value) -> AppResult<Self> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => Self::Number(number.as_f64().ok_or_else(|| {
                AppError::Validation(format!(
                    "attribute number '{number}' is not representable"
                ))
            })?),
            Value::String(value) => Self::String(value),
            Value::Array(values) => Self::List(
                values
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<AppResult<Vec<_>>>()?,
            ),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| Self::from_json(value).map(|value| (key, value)))
                    .collect::<AppResult<BTreeMap<_, _>>>()?,
            ),
        })
    }

    /// Converts the attribute value into JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Number(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(value) => Value::String(value.clone()),
            Self::List(values) => Value::Array(values.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// File metadata attached to an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name.
    pub file_name: String,
    /// Location where the file can be fetched.
    pub file_url: String,
    /// File type tag, e.g. `pdf`.
    pub file_type: String,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

/// Input for a new attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    /// Original file name.
    pub file_name: String,
    /// Location where the file can be fetched.
    pub file_url: String,
    /// File type tag.
    pub file_type: String,
}

impl NewAttachment {
    /// Validates the input and stamps it with the upload time.
    pub fn into_attachment(self, uploaded_at: DateTime<Utc>) -> AppResult<Attachment> {
        let file_name = NonEmptyString::new(self.file_name)
            .map_err(|_| AppError::Validation("attachment file name is required".to_owned()))?;
        let file_url = NonEmptyString::new(self.file_url)
            .map_err(|_| AppError::Validation("attachment file url is required".to_owned()))?;

        Ok(Attachment {
            file_name: file_name.into(),
            file_url: file_url.into(),
            file_type: self.file_type.trim().to_owned(),
            uploaded_at,
        })
    }
}

/// Achievement document as held by the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct Achievement {
    /// Document key.
    pub id: AchievementId,
    /// Owning student.
    pub student_id: StudentId,
    /// Achievement category.
    pub achievement_type: AchievementType,
    /// Title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Type-specific attributes.
    pub details: BTreeMap<String, AttributeValue>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Attached files.
    pub attachments: Vec<Attachment>,
    /// Optional score awarded for the achievement.
    pub points: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; present means hidden from normal reads.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Achievement {
    /// Returns whether the document has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns whether title or description contain the needle, ignoring case.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(needle.as_str())
            || self.description.to_lowercase().contains(needle.as_str())
    }
}

/// Validated content for a new achievement.
///
/// The owner is not part of the content: the workflow assigns it from the
/// caller's student profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAchievement {
    /// Achievement category.
    pub achievement_type: AchievementType,
    /// Title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Type-specific attributes.
    pub details: BTreeMap<String, AttributeValue>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Attachments supplied at creation time.
    pub attachments: Vec<Attachment>,
    /// Optional score.
    pub points: Option<i64>,
}

impl NewAchievement {
    /// Creates validated achievement content.
    pub fn new(
        achievement_type: AchievementType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> AppResult<Self> {
        let title = NonEmptyString::new(title)
            .map_err(|_| AppError::Validation("achievement title is required".to_owned()))?;

        Ok(Self {
            achievement_type,
            title: String::from(title).trim().to_owned(),
            description: description.into(),
            details: BTreeMap::new(),
            tags: Vec::new(),
            attachments: Vec::new(),
            points: None,
        })
    }

    /// Sets the attribute bag.
    #[must_use]
    pub fn with_details(mut self, details: BTreeMap<String, AttributeValue>) -> Self {
        self.details = details;
        self
    }

    /// Sets normalized tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = normalize_tags(tags);
        self
    }

    /// Sets the initial attachments.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Sets the score.
    pub fn with_points(mut self, points: Option<i64>) -> AppResult<Self> {
        self.points = validate_points(points)?;
        Ok(self)
    }
}

/// Partial update of achievement content.
///
/// Identity, owner and creation timestamp are not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementPatch {
    /// New category.
    pub achievement_type: Option<AchievementType>,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement attribute bag.
    pub details: Option<BTreeMap<String, AttributeValue>>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
    /// New score.
    pub points: Option<i64>,
}

impl AchievementPatch {
    /// Validates and normalizes the patch.
    pub fn validated(mut self) -> AppResult<Self> {
        if let Some(title) = self.title.take() {
            let title = NonEmptyString::new(title).map_err(|_| {
                AppError::Validation("achievement title must not be empty".to_owned())
            })?;
            self.title = Some(String::from(title).trim().to_owned());
        }

        self.tags = self.tags.map(normalize_tags);
        self.points = validate_points(self.points)?;

        if self.is_empty() {
            return Err(AppError::Validation(
                "achievement update must change at least one field".to_owned(),
            ));
        }

        Ok(self)
    }

    /// Returns whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.achievement_type.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.details.is_none()
            && self.tags.is_none()
            && self.points.is_none()
    }

    /// Applies the patch to a document and refreshes its update timestamp.
    pub fn apply_to(&self, achievement: &mut Achievement, now: DateTime<Utc>) {
        if let Some(achievement_type) = self.achievement_type {
            achievement.achievement_type = achievement_type;
        }
        if let Some(title) = &self.title {
            achievement.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            achievement.description.clone_from(description);
        }
        if let Some(details) = &self.details {
            achievement.details.clone_from(details);
        }
        if let Some(tags) = &self.tags {
            achievement.tags.clone_from(tags);
        }
        if self.points.is_some() {
            achievement.points = self.points;
        }
        achievement.updated_at = now;
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_owned());
        }
    }
    normalized
}

fn validate_points(points: Option<i64>) -> AppResult<Option<i64>> {
    match points {
        Some(value) if value < 0 => Err(AppError::Validation(
            "achievement points must not be negative".to_owned(),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::*;

    fn sample_achievement() -> Achievement {
        let created_at = Utc::now() - Duration::hours(1);
        Achievement {
            id: AchievementId::new("65a1f0c2e4b0a1b2c3d4e5f6").unwrap_or_else(|_| unreachable!()),
            student_id: StudentId::new(),
            achievement_type: AchievementType::Competition,
            title: "National Robotics Cup".to_owned(),
            description: "First place in the autonomous track".to_owned(),
            details: BTreeMap::new(),
            tags: vec!["robotics".to_owned()],
            attachments: Vec::new(),
            points: Some(80),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    #[test]
    fn achievement_type_roundtrips_storage_value() {
        for value in [
            AchievementType::Academic,
            AchievementType::Competition,
            AchievementType::Organization,
            AchievementType::Publication,
            AchievementType::Certification,
            AchievementType::Other,
        ] {
            assert_eq!(AchievementType::from_str(value.as_str()).ok(), Some(value));
        }
        assert!(AchievementType::from_str("sports").is_err());
    }

    #[test]
    fn attribute_bag_accepts_nested_json() {
        let value = json!({
            "competitionLevel": "national",
            "rank": 1,
            "team": ["alice", "bob"],
            "sponsor": null,
            "onsite": true
        });

        let converted = AttributeValue::from_json(value.clone());
        assert!(converted.is_ok());
        let converted = converted.unwrap_or(AttributeValue::Null);
        assert!(matches!(converted, AttributeValue::Map(_)));
        assert_eq!(converted.to_json(), json!({
            "competitionLevel": "national",
            "rank": 1.0,
            "team": ["alice", "bob"],
            "sponsor": null,
            "onsite": true
        }));
    }

    #[test]
    fn attribute_value_deserializes_untagged() {
        let decoded = serde_json::from_value::<AttributeValue>(json!([1, "two", false]));
        assert_eq!(
            decoded.ok(),
            Some(AttributeValue::List(vec![
                AttributeValue::Number(1.0),
                AttributeValue::String("two".to_owned()),
                AttributeValue::Bool(false),
            ]))
        );
    }

    #[test]
    fn new_achievement_requires_title_and_normalizes_tags() {
        assert!(NewAchievement::new(AchievementType::Academic, "  ", "desc").is_err());

        let content = NewAchievement::new(AchievementType::Academic, " Dean's list ", "")
            .map(|content| content.with_tags(vec![" gpa ".to_owned(), "gpa".to_owned(), String::new()]));
        assert!(content.is_ok());
        let content = content.unwrap_or_else(|_| unreachable!());
        assert_eq!(content.title, "Dean's list");
        assert_eq!(content.tags, vec!["gpa".to_owned()]);
    }

    #[test]
    fn negative_points_are_rejected() {
        let content = NewAchievement::new(AchievementType::Other, "Volunteer", "")
            .and_then(|content| content.with_points(Some(-1)));
        assert!(content.is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(AchievementPatch::default().validated().is_err());
    }

    #[test]
    fn patch_refreshes_update_timestamp_and_keeps_identity() {
        let mut achievement = sample_achievement();
        let original_id = achievement.id.clone();
        let original_owner = achievement.student_id;
        let original_created_at = achievement.created_at;
        let now = Utc::now();

        let patch = AchievementPatch {
            title: Some("International Robotics Cup".to_owned()),
            ..AchievementPatch::default()
        }
        .validated()
        .unwrap_or_default();
        patch.apply_to(&mut achievement, now);

        assert_eq!(achievement.title, "International Robotics Cup");
        assert_eq!(achievement.id, original_id);
        assert_eq!(achievement.student_id, original_owner);
        assert_eq!(achievement.created_at, original_created_at);
        assert_eq!(achievement.updated_at, now);
    }

    #[test]
    fn text_match_covers_title_and_description_case_insensitively() {
        let achievement = sample_achievement();
        assert!(achievement.matches_text("ROBOTICS"));
        assert!(achievement.matches_text("autonomous"));
        assert!(!achievement.matches_text("chess"));
    }

    #[test]
    fn attachment_requires_name_and_url() {
        let now = Utc::now();
        let missing_url = NewAttachment {
            file_name: "certificate.pdf".to_owned(),
            file_url: " ".to_owned(),
            file_type: "pdf".to_owned(),
        };
        assert!(missing_url.into_attachment(now).is_err());

        let attachment = NewAttachment {
            file_name: "certificate.pdf".to_owned(),
            file_url: "https://files.example.edu/certificate.pdf".to_owned(),
            file_type: " pdf ".to_owned(),
        }
        .into_attachment(now);
        assert_eq!(attachment.map(|value| value.file_type).ok().as_deref(), Some("pdf"));
    }
}
