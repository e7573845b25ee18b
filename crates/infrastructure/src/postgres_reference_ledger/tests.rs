use chrono::Utc;
use laurel_application::ReferenceLedger;
use laurel_core::AppError;
use laurel_domain::{
    AchievementId, AchievementReference, ReferenceStatus, ReferenceTransition, StudentId, UserId,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresReferenceLedger;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for reference ledger tests: {error}");
    }

    Some(pool)
}

async fn ensure_student(pool: &PgPool) -> (StudentId, UserId) {
    let user_id = UserId::new();
    let student_id = StudentId::new();

    let user = sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, full_name)
        VALUES ($1, $2, $3, 'x', 'Test Student')
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(format!("student-{user_id}"))
    .bind(format!("{user_id}@example.edu"))
    .execute(pool)
    .await;
    assert!(user.is_ok());

    let student = sqlx::query(
        r#"
        INSERT INTO students (id, user_id, student_number, program_study, academic_year)
        VALUES ($1, $2, $3, 'Informatics', '2024/2025')
        "#,
    )
    .bind(student_id.as_uuid())
    .bind(user_id.as_uuid())
    .bind(student_id.to_string())
    .execute(pool)
    .await;
    assert!(student.is_ok());

    (student_id, user_id)
}

#[tokio::test]
async fn transition_is_persisted_only_from_expected_status() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let (student_id, verifier) = ensure_student(&pool).await;
    let ledger = PostgresReferenceLedger::new(pool);
    let achievement_id = AchievementId::new(format!("doc-{student_id}"))
        .unwrap_or_else(|_| unreachable!());

    let mut reference =
        AchievementReference::new_draft(student_id, achievement_id.clone(), Utc::now());
    assert!(ledger.create(&reference).await.is_ok());

    assert!(
        reference
            .apply(ReferenceTransition::Submit, Utc::now())
            .is_ok()
    );
    assert!(
        ledger
            .update_status(ReferenceStatus::Draft, &reference)
            .await
            .is_ok()
    );

    let stale = ledger
        .update_status(ReferenceStatus::Draft, &reference)
        .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    assert!(
        reference
            .apply(ReferenceTransition::Verify { verifier }, Utc::now())
            .is_ok()
    );
    assert!(
        ledger
            .update_status(ReferenceStatus::Submitted, &reference)
            .await
            .is_ok()
    );

    let stored = ledger
        .find_by_achievement_id(&achievement_id)
        .await
        .ok()
        .flatten();
    assert_eq!(
        stored.as_ref().map(AchievementReference::status),
        Some(ReferenceStatus::Verified)
    );
    assert_eq!(
        stored.and_then(|stored| stored.verified_by()),
        Some(verifier)
    );
}

#[tokio::test]
async fn override_touches_only_status() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let (student_id, _) = ensure_student(&pool).await;
    let ledger = PostgresReferenceLedger::new(pool);
    let achievement_id = AchievementId::new(format!("override-{student_id}"))
        .unwrap_or_else(|_| unreachable!());

    let reference =
        AchievementReference::new_submitted(student_id, achievement_id.clone(), Utc::now());
    assert!(ledger.create(&reference).await.is_ok());
    assert!(
        ledger
            .override_status(reference.id(), ReferenceStatus::Deleted, Utc::now())
            .await
            .is_ok()
    );

    let stored = ledger
        .find_by_achievement_id(&achievement_id)
        .await
        .ok()
        .flatten();
    assert_eq!(
        stored.as_ref().map(AchievementReference::status),
        Some(ReferenceStatus::Deleted)
    );
    assert!(stored.and_then(|stored| stored.submitted_at()).is_some());
}

#[tokio::test]
async fn batch_lookup_and_student_listing() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let (student_id, _) = ensure_student(&pool).await;
    let ledger = PostgresReferenceLedger::new(pool);

    let mut ids = Vec::new();
    for index in 0..3 {
        let achievement_id = AchievementId::new(format!("batch-{student_id}-{index}"))
            .unwrap_or_else(|_| unreachable!());
        let reference =
            AchievementReference::new_draft(student_id, achievement_id.clone(), Utc::now());
        assert!(ledger.create(&reference).await.is_ok());
        ids.push(achievement_id);
    }
    let unknown =
        AchievementId::new(format!("unknown-{student_id}")).unwrap_or_else(|_| unreachable!());
    ids.push(unknown);

    let found = ledger.list_by_achievement_ids(&ids).await;
    assert_eq!(found.map(|rows| rows.len()).ok(), Some(3));

    let listed = ledger.list_by_student(student_id).await;
    assert_eq!(listed.map(|rows| rows.len()).ok(), Some(3));

    let history = ledger.history(&ids[0]).await;
    assert_eq!(history.map(|rows| rows.len()).ok(), Some(1));
}
