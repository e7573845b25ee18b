use super::*;

impl AchievementService {
    /// Creates draft references for documents that have none.
    ///
    /// Only documents created in `[now - lookback, now - grace]` are scanned so
    /// in-flight creations are left alone. The window is read in pages of
    /// `batch_size` until a short page comes back.
    pub async fn reconcile_orphans(
        &self,
        now: DateTime<Utc>,
        grace: Duration,
        lookback: Duration,
        batch_size: u32,
    ) -> AppResult<ReconciliationReport> {
        if grace < Duration::zero() || lookback <= grace {
            return Err(AppError::Validation(
                "reconciliation lookback must exceed a non-negative grace period".to_owned(),
            ));
        }

        if batch_size == 0 {
            return Err(AppError::Validation(
                "reconciliation batch size must be greater than zero".to_owned(),
            ));
        }

        let (from, to) = (now - lookback, now - grace);
        let mut report = ReconciliationReport::default();
        let mut cursor: Option<ScanCursor> = None;

        loop {
            let batch = self
                .store
                .list_created_between(from, to, cursor.as_ref(), batch_size)
                .await?;
            let exhausted = batch.len() < usize::try_from(batch_size).unwrap_or(usize::MAX);
            let Some(last) = batch.last() else {
                break;
            };
            cursor = Some(ScanCursor::after(last));

            report.scanned += batch.len();
            report.repaired += self.repair_batch(batch, now).await?;

            if exhausted {
                break;
            }
        }

        Ok(report)
    }

    async fn repair_batch(
        &self,
        achievements: Vec<Achievement>,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let achievement_ids: Vec<AchievementId> = achievements
            .iter()
            .map(|achievement| achievement.id.clone())
            .collect();
        let referenced: HashSet<AchievementId> = self
            .ledger
            .list_by_achievement_ids(&achievement_ids)
            .await?
            .into_iter()
            .map(|reference| reference.achievement_id().clone())
            .collect();

        let mut repaired = 0;
        for achievement in achievements {
            if referenced.contains(&achievement.id) {
                continue;
            }

            let reference =
                AchievementReference::new_draft(achievement.student_id, achievement.id, now);
            self.ledger.create(&reference).await?;
            warn!(
                achievement_id = %reference.achievement_id(),
                student_id = %reference.student_id(),
                "created missing draft reference for orphaned achievement"
            );
            repaired += 1;
        }

        Ok(repaired)
    }
}
