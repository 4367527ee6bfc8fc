use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{CategoryKind, CategoryNew, Engine, EngineError, Frequency, RuleNew, RuleUpdate};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn expense_category(engine: &Engine, name: &str) -> Uuid {
    let model = engine
        .create_category(
            "alice",
            CategoryNew {
                name: name.to_string(),
                kind: CategoryKind::Expense,
            },
        )
        .await
        .unwrap();
    Uuid::parse_str(&model.id).unwrap()
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn monthly_rule(category_id: Uuid, start: DateTime<Utc>) -> RuleNew {
    RuleNew {
        amount_minor: 50_00,
        description: "Gym membership".to_string(),
        category_id,
        frequency: Frequency::Monthly,
        start_date: start,
        end_date: None,
    }
}

#[tokio::test]
async fn monthly_rule_materializes_on_schedule() {
    let (engine, _db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Sport").await;

    let rule = engine
        .create_rule("alice", monthly_rule(category_id, date(2024, 1, 1)))
        .await
        .unwrap();

    let processed = engine.process_due_rules(date(2024, 2, 1)).await.unwrap();
    assert_eq!(processed, 1);

    let transactions = engine.list_transactions("alice").await.unwrap();
    assert_eq!(transactions.len(), 1);
    let tx = &transactions[0];
    assert_eq!(tx.date, date(2024, 1, 1));
    assert_eq!(tx.amount_minor, 50_00);
    assert!(tx.is_recurring);
    assert_eq!(tx.recurring_rule_id, Some(rule.id));

    let rule = engine.rule("alice", rule.id).await.unwrap();
    assert_eq!(rule.next_execute_date, date(2024, 2, 1));
    assert!(rule.is_active);
}

#[tokio::test]
async fn processed_rule_is_not_due_again_until_next_occurrence() {
    let (engine, _db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Sport").await;
    engine
        .create_rule("alice", monthly_rule(category_id, date(2024, 1, 1)))
        .await
        .unwrap();

    assert_eq!(engine.process_due_rules(date(2024, 2, 1)).await.unwrap(), 1);
    assert_eq!(engine.process_due_rules(date(2024, 2, 1)).await.unwrap(), 0);

    let transactions = engine.list_transactions("alice").await.unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn late_pass_advances_from_schedule_not_clock() {
    let (engine, _db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Coffee").await;
    let rule = engine
        .create_rule(
            "alice",
            RuleNew {
                amount_minor: 3_50,
                description: "Morning espresso".to_string(),
                category_id,
                frequency: Frequency::Daily,
                start_date: date(2024, 1, 1),
                end_date: None,
            },
        )
        .await
        .unwrap();

    // The clock is days ahead of the schedule; each pass produces the next
    // scheduled occurrence, dated by the schedule.
    let now = date(2024, 1, 5);
    assert_eq!(engine.process_due_rules(now).await.unwrap(), 1);
    assert_eq!(engine.process_due_rules(now).await.unwrap(), 1);

    let transactions = engine.list_transactions("alice").await.unwrap();
    let mut dates: Vec<_> = transactions.iter().map(|tx| tx.date).collect();
    dates.sort();
    assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 2)]);

    let rule = engine.rule("alice", rule.id).await.unwrap();
    assert_eq!(rule.next_execute_date, date(2024, 1, 3));
}

#[tokio::test]
async fn rule_deactivates_once_schedule_passes_end_date() {
    let (engine, _db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Lessons").await;
    let rule = engine
        .create_rule(
            "alice",
            RuleNew {
                amount_minor: 20_00,
                description: "Guitar lesson".to_string(),
                category_id,
                frequency: Frequency::Weekly,
                start_date: date(2024, 1, 1),
                end_date: Some(date(2024, 1, 20)),
            },
        )
        .await
        .unwrap();

    assert_eq!(engine.process_due_rules(date(2024, 1, 2)).await.unwrap(), 1);
    assert_eq!(engine.process_due_rules(date(2024, 1, 9)).await.unwrap(), 1);
    // The 2024-01-15 occurrence is the last one inside the end date; after it
    // the schedule moves to 2024-01-22 and the rule switches off.
    assert_eq!(engine.process_due_rules(date(2024, 1, 16)).await.unwrap(), 1);
    assert_eq!(engine.process_due_rules(date(2024, 1, 23)).await.unwrap(), 0);

    let transactions = engine.list_transactions("alice").await.unwrap();
    assert_eq!(transactions.len(), 3);

    let rule = engine.rule("alice", rule.id).await.unwrap();
    assert!(!rule.is_active);
    assert_eq!(rule.next_execute_date, date(2024, 1, 22));
}

#[tokio::test]
async fn paused_rule_is_skipped_until_resumed() {
    let (engine, _db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Sport").await;
    let rule = engine
        .create_rule("alice", monthly_rule(category_id, date(2024, 1, 1)))
        .await
        .unwrap();

    let paused = engine.toggle_rule("alice", rule.id).await.unwrap();
    assert!(!paused.is_active);
    assert_eq!(engine.process_due_rules(date(2024, 2, 1)).await.unwrap(), 0);

    let resumed = engine.toggle_rule("alice", rule.id).await.unwrap();
    assert!(resumed.is_active);
    assert_eq!(engine.process_due_rules(date(2024, 2, 1)).await.unwrap(), 1);
}

#[tokio::test]
async fn editing_a_rule_preserves_its_schedule() {
    let (engine, _db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Sport").await;
    let rule = engine
        .create_rule("alice", monthly_rule(category_id, date(2024, 1, 1)))
        .await
        .unwrap();
    engine.process_due_rules(date(2024, 2, 1)).await.unwrap();

    engine
        .update_rule(
            "alice",
            rule.id,
            RuleUpdate {
                amount_minor: 60_00,
                description: "Gym membership".to_string(),
                category_id,
                frequency: Frequency::Monthly,
                start_date: date(2024, 1, 1),
                end_date: None,
            },
        )
        .await
        .unwrap();

    let rule = engine.rule("alice", rule.id).await.unwrap();
    assert_eq!(rule.amount_minor, 60_00);
    assert_eq!(rule.next_execute_date, date(2024, 2, 1));
    assert!(rule.is_active);
}

#[tokio::test]
async fn rule_rejects_end_date_before_start() {
    let (engine, _db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Sport").await;

    let result = engine
        .create_rule(
            "alice",
            RuleNew {
                amount_minor: 50_00,
                description: "Gym membership".to_string(),
                category_id,
                frequency: Frequency::Monthly,
                start_date: date(2024, 2, 1),
                end_date: Some(date(2024, 1, 1)),
            },
        )
        .await;
    assert!(matches!(result, Err(EngineError::InvalidValue(_))));
}

#[tokio::test]
async fn concurrent_passes_materialize_exactly_once() {
    let (engine, _db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Sport").await;
    engine
        .create_rule("alice", monthly_rule(category_id, date(2024, 1, 1)))
        .await
        .unwrap();

    // Two passes racing over the same occurrence: the conditional advance
    // lets only one of them keep its ledger row.
    let now = date(2024, 2, 1);
    let (first, second) = tokio::join!(engine.process_due_rules(now), engine.process_due_rules(now));
    assert_eq!(first.unwrap() + second.unwrap(), 1);

    let transactions = engine.list_transactions("alice").await.unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn reconcile_failure_does_not_undo_materialization() {
    let (engine, db) = engine_with_db().await;
    let category_id = expense_category(&engine, "Sport").await;
    engine
        .create_rule("alice", monthly_rule(category_id, date(2024, 1, 1)))
        .await
        .unwrap();

    // Breaking the budgets table makes the post-commit recompute fail; the
    // committed occurrence still counts and stays in the ledger.
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "DROP TABLE budgets",
        vec![],
    ))
    .await
    .unwrap();

    assert_eq!(engine.process_due_rules(date(2024, 2, 1)).await.unwrap(), 1);

    let transactions = engine.list_transactions("alice").await.unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn rule_requires_owned_category() {
    let (engine, _db) = engine_with_db().await;

    let result = engine
        .create_rule("alice", monthly_rule(Uuid::new_v4(), date(2024, 1, 1)))
        .await;
    assert!(matches!(result, Err(EngineError::KeyNotFound(_))));
}
