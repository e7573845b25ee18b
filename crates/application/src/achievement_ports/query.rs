use laurel_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use laurel_domain::{Achievement, AchievementId, AchievementType, StudentId};

/// Validated page window for achievement listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Page used when the caller does not supply one.
    pub const DEFAULT_PAGE: u32 = 1;
    /// Page size used when the caller does not supply one.
    pub const DEFAULT_LIMIT: u32 = 10;
    /// Largest accepted page size.
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a page request; `page` starts at 1 and `limit` is 1..=100.
    pub fn new(page: u32, limit: u32) -> AppResult<Self> {
        if page == 0 {
            return Err(AppError::Validation(
                "page must be greater than zero".to_owned(),
            ));
        }

        if limit == 0 || limit > Self::MAX_LIMIT {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }

        Ok(Self { page, limit })
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns how many items precede this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Filters for achievement listings. Soft-deleted documents are always excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementListQuery {
    /// Restricts results to one owner.
    pub student_id: Option<StudentId>,
    /// Restricts results to one achievement type.
    pub achievement_type: Option<AchievementType>,
    /// Case-insensitive substring matched against title and description.
    pub search: Option<String>,
}

impl AchievementListQuery {
    /// Returns the trimmed search text, if any.
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// One page of achievements, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementPage {
    /// Achievements on this page.
    pub items: Vec<Achievement>,
    /// Total matching achievements across all pages.
    pub total: u64,
    /// Page that was requested.
    pub page: u32,
    /// Page size that was requested.
    pub limit: u32,
}

impl AchievementPage {
    /// Returns the number of pages needed to show every matching item.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

/// Resume point for scans ordered by `(created_at, id)`.
///
/// A scan continued from a cursor returns only documents that sort strictly
/// after it, so ties on `created_at` are broken by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor {
    /// Creation time of the last document already seen.
    pub created_at: DateTime<Utc>,
    /// Id of the last document already seen.
    pub achievement_id: AchievementId,
}

impl ScanCursor {
    /// Returns the cursor positioned on the given achievement.
    #[must_use]
    pub fn after(achievement: &Achievement) -> Self {
        Self {
            created_at: achievement.created_at,
            achievement_id: achievement.id.clone(),
        }
    }

    /// Returns whether an achievement sorts strictly after this cursor.
    #[must_use]
    pub fn precedes(&self, achievement: &Achievement) -> bool {
        (achievement.created_at, achievement.id.as_str())
            > (self.created_at, self.achievement_id.as_str())
    }
}
