use async_trait::async_trait;
use chrono::{DateTime, Utc};
use laurel_application::{
    AchievementListQuery, AchievementPage, AchievementStore, PageRequest, ScanCursor,
};
use laurel_core::{AppError, AppResult};
use laurel_domain::{
    Achievement, AchievementId, AchievementPatch, Attachment, NewAchievement, StudentId,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory achievement store implementation.
///
/// Documents are kept in insertion order; listings sort newest first with
/// later insertions winning ties.
#[derive(Debug, Default)]
pub struct InMemoryAchievementStore {
    documents: RwLock<Vec<Achievement>>,
}

impl InMemoryAchievementStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(achievement_id: &AchievementId) -> AppError {
    AppError::NotFound(format!("achievement '{achievement_id}' not found"))
}

fn live_mut<'a>(
    documents: &'a mut [Achievement],
    achievement_id: &AchievementId,
) -> AppResult<&'a mut Achievement> {
    documents
        .iter_mut()
        .find(|document| &document.id == achievement_id && !document.is_deleted())
        .ok_or_else(|| not_found(achievement_id))
}

#[async_trait]
impl AchievementStore for InMemoryAchievementStore {
    async fn create(
        &self,
        student_id: StudentId,
        achievement: NewAchievement,
        now: DateTime<Utc>,
    ) -> AppResult<Achievement> {
        let stored = Achievement {
            id: AchievementId::new(Uuid::new_v4().simple().to_string())?,
            student_id,
            achievement_type: achievement.achievement_type,
            title: achievement.title,
            description: achievement.description,
            details: achievement.details,
            tags: achievement.tags,
            attachments: achievement.attachments,
            points: achievement.points,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.documents.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, achievement_id: &AchievementId) -> AppResult<Option<Achievement>> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .find(|document| &document.id == achievement_id && !document.is_deleted())
            .cloned())
    }

    async fn update(
        &self,
        achievement_id: &AchievementId,
        patch: &AchievementPatch,
        now: DateTime<Utc>,
    ) -> AppResult<Achievement> {
        let mut documents = self.documents.write().await;
        let document = live_mut(documents.as_mut_slice(), achievement_id)?;
        patch.apply_to(document, now);
        Ok(document.clone())
    }

    async fn soft_delete(
        &self,
        achievement_id: &AchievementId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut documents = self.documents.write().await;
        let document = live_mut(documents.as_mut_slice(), achievement_id)?;
        document.deleted_at = Some(now);
        document.updated_at = now;
        Ok(())
    }

    async fn restore(&self, achievement_id: &AchievementId) -> AppResult<()> {
        let mut documents = self.documents.write().await;
        let document = documents
            .iter_mut()
            .find(|document| &document.id == achievement_id)
            .ok_or_else(|| not_found(achievement_id))?;
        document.deleted_at = None;
        Ok(())
    }

    async fn hard_delete(&self, achievement_id: &AchievementId) -> AppResult<bool> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|document| &document.id != achievement_id);
        Ok(documents.len() < before)
    }

    async fn list(
        &self,
        query: &AchievementListQuery,
        page: PageRequest,
    ) -> AppResult<AchievementPage> {
        let documents = self.documents.read().await;
        let search = query.search_text();

        let mut matching: Vec<&Achievement> = documents
            .iter()
            .rev()
            .filter(|document| !document.is_deleted())
            .filter(|document| {
                query
                    .student_id
                    .is_none_or(|student_id| document.student_id == student_id)
            })
            .filter(|document| {
                query
                    .achievement_type
                    .is_none_or(|achievement_type| document.achievement_type == achievement_type)
            })
            .filter(|document| search.is_none_or(|needle| document.matches_text(needle)))
            .collect();
        matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);

        Ok(AchievementPage {
            items: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
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
        let mut documents = self.documents.write().await;
        let document = live_mut(documents.as_mut_slice(), achievement_id)?;
        document.attachments.push(attachment);
        document.updated_at = now;
        Ok(document.clone())
    }

    async fn list_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<&ScanCursor>,
        limit: u32,
    ) -> AppResult<Vec<Achievement>> {
        let documents = self.documents.read().await;

        let mut matching: Vec<Achievement> = documents
            .iter()
            .filter(|document| {
                !document.is_deleted() && document.created_at >= from && document.created_at <= to
            })
            .filter(|document| after.is_none_or(|cursor| cursor.precedes(document)))
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            (left.created_at, left.id.as_str()).cmp(&(right.created_at, right.id.as_str()))
        });
        matching.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use laurel_application::{AchievementListQuery, AchievementStore, PageRequest, ScanCursor};
    use laurel_core::AppError;
    use laurel_domain::{AchievementPatch, AchievementType, NewAchievement, StudentId};

    use super::InMemoryAchievementStore;

    fn content(achievement_type: AchievementType, title: &str) -> NewAchievement {
        NewAchievement::new(achievement_type, title, "")
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn list_filters_and_pages_newest_first() {
        let store = InMemoryAchievementStore::new();
        let owner = StudentId::new();
        let start = Utc::now();

        for (minutes, title) in [(0, "Chess open"), (1, "Robotics cup"), (2, "Math olympiad")] {
            let created = store
                .create(
                    owner,
                    content(AchievementType::Competition, title),
                    start + Duration::minutes(minutes),
                )
                .await;
            assert!(created.is_ok());
        }
        let other = store
            .create(
                StudentId::new(),
                content(AchievementType::Academic, "Dean's list"),
                start,
            )
            .await;
        assert!(other.is_ok());

        let query = AchievementListQuery {
            student_id: Some(owner),
            ..AchievementListQuery::default()
        };
        let page = store
            .list(&query, PageRequest::new(1, 2).unwrap_or_default())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(page.total, 3);
        let titles: Vec<&str> = page.items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["Math olympiad", "Robotics cup"]);

        let academic = store
            .list(
                &AchievementListQuery {
                    achievement_type: Some(AchievementType::Academic),
                    ..AchievementListQuery::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(academic.total, 1);
    }

    #[tokio::test]
    async fn deleted_documents_are_hidden_until_restored() {
        let store = InMemoryAchievementStore::new();
        let now = Utc::now();
        let created = store
            .create(StudentId::new(), content(AchievementType::Other, "Volunteer"), now)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(store.soft_delete(&created.id, now).await.is_ok());
        assert!(matches!(store.find(&created.id).await, Ok(None)));

        let patch = AchievementPatch {
            title: Some("Renamed".to_owned()),
            ..AchievementPatch::default()
        };
        assert!(matches!(
            store.update(&created.id, &patch, now).await,
            Err(AppError::NotFound(_))
        ));

        assert!(store.restore(&created.id).await.is_ok());
        assert!(matches!(store.find(&created.id).await, Ok(Some(_))));
        assert!(matches!(store.hard_delete(&created.id).await, Ok(true)));
        assert!(matches!(store.hard_delete(&created.id).await, Ok(false)));
    }

    #[tokio::test]
    async fn window_scan_resumes_after_cursor() {
        let store = InMemoryAchievementStore::new();
        let created_at = Utc::now() - Duration::minutes(10);
        for title in ["one", "two", "three"] {
            assert!(
                store
                    .create(StudentId::new(), content(AchievementType::Other, title), created_at)
                    .await
                    .is_ok()
            );
        }
        let (from, to) = (created_at - Duration::minutes(1), Utc::now());

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let batch = store
                .list_created_between(from, to, cursor.as_ref(), 2)
                .await
                .unwrap_or_default();
            let Some(last) = batch.last() else {
                break;
            };
            cursor = Some(ScanCursor::after(last));
            seen.extend(batch.into_iter().map(|achievement| achievement.id));
        }

        assert_eq!(seen.len(), 3);
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }
}
