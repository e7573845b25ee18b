use std::future::IntoFuture;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_application::{
    AchievementListQuery, AchievementPage, AchievementStore, PageRequest, ScanCursor,
};
use laurel_core::{AppError, AppResult};
use laurel_domain::{
    Achievement, AchievementId, AchievementPatch, Attachment, NewAchievement, StudentId,
};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Cursor, Database, IndexModel};
use tracing::info;

mod document;

use document::{
    AchievementDocument, AttachmentDocument, encode, escape_regex, patch_update,
    to_bson_datetime,
};

/// Collection holding achievement documents.
pub const ACHIEVEMENTS_COLLECTION: &str = "achievements";

/// Default upper bound for a single document-store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// MongoDB-backed achievement store.
#[derive(Clone)]
pub struct MongoAchievementStore {
    collection: Collection<AchievementDocument>,
    timeout: Duration,
}

impl MongoAchievementStore {
    /// Creates a store over an existing database handle.
    #[must_use]
    pub fn new(database: &Database, timeout: Duration) -> Self {
        Self {
            collection: database.collection(ACHIEVEMENTS_COLLECTION),
            timeout,
        }
    }

    /// Connects to MongoDB and opens the named database.
    pub async fn connect(url: &str, database: &str, timeout: Duration) -> AppResult<Self> {
        let client = tokio::time::timeout(timeout, Client::with_uri_str(url))
            .await
            .map_err(|_| {
                AppError::Internal("timed out while connecting to the document store".to_owned())
            })?
            .map_err(|error| {
                AppError::Internal(format!("failed to connect to the document store: {error}"))
            })?;

        Ok(Self::new(&client.database(database), timeout))
    }

    /// Creates the indexes used by owner listings and reconciliation scans.
    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let indexes = [
            IndexModel::builder()
                .keys(doc! { "studentId": 1, "createdAt": -1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "createdAt": 1 })
                .build(),
        ];

        for index in indexes {
            self.bounded("create achievement index", self.collection.create_index(index))
                .await?;
        }

        info!(collection = ACHIEVEMENTS_COLLECTION, "document store indexes ensured");
        Ok(())
    }

    async fn bounded<F, T>(&self, operation: &str, call: F) -> AppResult<T>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AppError::Internal(format!(
                    "document store timed out while trying to {operation}"
                ))
            })?
            .map_err(|error| AppError::Internal(format!("failed to {operation}: {error}")))
    }

    async fn collect(
        &self,
        operation: &str,
        mut cursor: Cursor<AchievementDocument>,
    ) -> AppResult<Vec<Achievement>> {
        let drain = async {
            let mut documents = Vec::new();
            while cursor.advance().await? {
                documents.push(cursor.deserialize_current()?);
            }
            Ok::<_, mongodb::error::Error>(documents)
        };

        self.bounded(operation, drain)
            .await?
            .into_iter()
            .map(AchievementDocument::into_achievement)
            .collect()
    }

    async fn find_live_after_update(
        &self,
        operation: &str,
        achievement_id: &AchievementId,
        update: Document,
    ) -> AppResult<Achievement> {
        let filter = live_filter(achievement_id)?;
        self.bounded(
            operation,
            self.collection
                .find_one_and_update(filter, update)
                .return_document(ReturnDocument::After),
        )
        .await?
        .ok_or_else(|| not_found(achievement_id))?
        .into_achievement()
    }
}

#[async_trait]
impl AchievementStore for MongoAchievementStore {
    async fn create(
        &self,
        student_id: StudentId,
        achievement: NewAchievement,
        now: DateTime<Utc>,
    ) -> AppResult<Achievement> {
        let document =
            AchievementDocument::from_new(ObjectId::new(), student_id, achievement, now);

        self.bounded("insert achievement", self.collection.insert_one(&document))
            .await?;

        document.into_achievement()
    }

    async fn find(&self, achievement_id: &AchievementId) -> AppResult<Option<Achievement>> {
        let filter = live_filter(achievement_id)?;
        self.bounded("find achievement", self.collection.find_one(filter))
            .await?
            .map(AchievementDocument::into_achievement)
            .transpose()
    }

    async fn update(
        &self,
        achievement_id: &AchievementId,
        patch: &AchievementPatch,
        now: DateTime<Utc>,
    ) -> AppResult<Achievement> {
        let update = patch_update(patch, now)?;
        self.find_live_after_update("update achievement", achievement_id, update)
            .await
    }

    async fn soft_delete(
        &self,
        achievement_id: &AchievementId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let filter = live_filter(achievement_id)?;
        let stamp = to_bson_datetime(now);
        let result = self
            .bounded(
                "soft delete achievement",
                self.collection.update_one(
                    filter,
                    doc! { "$set": { "deletedAt": stamp, "updatedAt": stamp } },
                ),
            )
            .await?;

        if result.matched_count == 0 {
            return Err(not_found(achievement_id));
        }
        Ok(())
    }

    async fn restore(&self, achievement_id: &AchievementId) -> AppResult<()> {
        let filter = doc! { "_id": object_id(achievement_id)? };
        let result = self
            .bounded(
                "restore achievement",
                self.collection
                    .update_one(filter, doc! { "$unset": { "deletedAt": "" } }),
            )
            .await?;

        if result.matched_count == 0 {
            return Err(not_found(achievement_id));
        }
        Ok(())
    }

    async fn hard_delete(&self, achievement_id: &AchievementId) -> AppResult<bool> {
        let filter = doc! { "_id": object_id(achievement_id)? };
        let result = self
            .bounded("hard delete achievement", self.collection.delete_one(filter))
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn list(
        &self,
        query: &AchievementListQuery,
        page: PageRequest,
    ) -> AppResult<AchievementPage> {
        let filter = list_filter(query);

        let total = self
            .bounded(
                "count achievements",
                self.collection.count_documents(filter.clone()),
            )
            .await?;

        let cursor = self
            .bounded(
                "list achievements",
                self.collection
                    .find(filter)
                    .sort(doc! { "createdAt": -1, "_id": -1 })
                    .skip(page.offset())
                    .limit(i64::from(page.limit())),
            )
            .await?;
        let items = self.collect("read achievement page", cursor).await?;

        Ok(AchievementPage {
            items,
            total,
            page: page.page(),
            limit: page.limit(),
        })
    }

    async fn push_attachment(
        &self,
        achievement_id: &AchievementId,
        attachment: Attachment,
        now: DateTime<Utc>,
    ) -> AppResult<Achievement> {
        let attachment = encode(&AttachmentDocument::from(attachment), "attachment")?;
        let update = doc! {
            "$push": { "attachments": attachment },
            "$set": { "updatedAt": to_bson_datetime(now) },
        };
        self.find_live_after_update("append attachment", achievement_id, update)
            .await
    }

    async fn list_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<&ScanCursor>,
        limit: u32,
    ) -> AppResult<Vec<Achievement>> {
        let filter = scan_filter(from, to, after)?;

        let cursor = self
            .bounded(
                "scan recent achievements",
                self.collection
                    .find(filter)
                    .sort(doc! { "createdAt": 1, "_id": 1 })
                    .limit(i64::from(limit)),
            )
            .await?;
        self.collect("read recent achievements", cursor).await
    }
}

fn object_id(achievement_id: &AchievementId) -> AppResult<ObjectId> {
    ObjectId::parse_str(achievement_id.as_str()).map_err(|_| {
        AppError::Validation(format!(
            "achievement id '{achievement_id}' is not a valid document id"
        ))
    })
}

fn live_filter(achievement_id: &AchievementId) -> AppResult<Document> {
    Ok(doc! { "_id": object_id(achievement_id)?, "deletedAt": Bson::Null })
}

fn scan_filter(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    after: Option<&ScanCursor>,
) -> AppResult<Document> {
    let mut filter = doc! {
        "deletedAt": Bson::Null,
        "createdAt": { "$gte": to_bson_datetime(from), "$lte": to_bson_datetime(to) },
    };

    if let Some(cursor) = after {
        let created_at = to_bson_datetime(cursor.created_at);
        filter.insert(
            "$or",
            vec![
                doc! { "createdAt": { "$gt": created_at } },
                doc! { "createdAt": created_at, "_id": { "$gt": object_id(&cursor.achievement_id)? } },
            ],
        );
    }

    Ok(filter)
}

fn list_filter(query: &AchievementListQuery) -> Document {
    let mut filter = doc! { "deletedAt": Bson::Null };

    if let Some(student_id) = query.student_id {
        filter.insert("studentId", student_id.to_string());
    }
    if let Some(achievement_type) = query.achievement_type {
        filter.insert("achievementType", achievement_type.as_str());
    }
    if let Some(search) = query.search_text() {
        let pattern = escape_regex(search);
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }

    filter
}

fn not_found(achievement_id: &AchievementId) -> AppError {
    AppError::NotFound(format!("achievement '{achievement_id}' not found"))
}
