//! Startup content, daily quotes and cleanup against SQLite

mod common;

use common::{drain, harness, scripted_llm};
use solace_core::application::tasks::BACKGROUND_PRIORITY;
use solace_core::domain::{Language, TaskKind};
use solace_core::port::{Cache, Maintenance, MaintenanceConfig};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[tokio::test]
async fn test_initial_content_is_generated_on_first_request() {
    let h = harness(scripted_llm()).await;

    let first = h.services.content.initial_content(Language::En).await.unwrap();
    assert!(first.generation_triggered);
    assert!(first.random_articles.is_empty());
    assert!(first.daily_quote.is_none());
    let task_id = first.task_id.unwrap();

    assert_eq!(drain(&h).await, 1);
    assert_eq!(
        h.services.tasks.status(&task_id).await.unwrap().status,
        "completed"
    );

    let second = h.services.content.initial_content(Language::En).await.unwrap();
    assert!(!second.generation_triggered);
    assert!(second.task_id.is_none());
    assert!(!second.random_articles.is_empty());
    assert!(second
        .random_articles
        .iter()
        .all(|a| a.language == Language::En && a.id.is_some()));
    assert!(second.daily_quote.is_some());

    // Each language has its own snapshot
    let russian = h.services.content.initial_content(Language::Ru).await.unwrap();
    assert!(russian.generation_triggered);

    println!("✅ Initial content: trigger, generate, serve");
}

#[tokio::test]
async fn test_daily_quote_is_stable_within_a_day() {
    let h = harness(scripted_llm()).await;

    let morning = h.services.content.daily_quote(Language::En, None).await.unwrap();
    h.time.advance(60 * 60 * 1000);
    let evening = h.services.content.daily_quote(Language::En, None).await.unwrap();

    assert_eq!(morning.text, evening.text);
    assert_eq!(morning.date.as_deref(), Some("2024-03-01"));
    assert_eq!(morning.language, Language::En);

    let topical = h
        .services
        .content
        .daily_quote(Language::En, Some("sleep"))
        .await
        .unwrap();
    assert_eq!(topical.text, "Rest is productive.");
    assert_eq!(topical.topic, "sleep");

    println!("✅ Daily quote rotates per day, topic quotes are generated");
}

#[tokio::test]
async fn test_cleanup_task_collects_old_jobs_and_cache() {
    let h = harness(scripted_llm()).await;

    h.services.content.initial_content(Language::En).await.unwrap();
    assert_eq!(drain(&h).await, 1);
    h.cache.set("marker", "1", 60).await.unwrap();

    let before = h.maintenance.get_stats().await.unwrap();
    assert_eq!(before.job_count, 1);
    assert!(before.article_count > 0);
    assert!(before.quote_count > 0);

    h.time.advance(8 * DAY_MS);

    let cleanup = h
        .services
        .tasks
        .submit(
            TaskKind::CleanupOldContent,
            "cleanup",
            &serde_json::json!({}),
            BACKGROUND_PRIORITY,
            None,
        )
        .await
        .unwrap();
    assert_eq!(drain(&h).await, 1);

    let result = h.services.tasks.status(&cleanup).await.unwrap().result.unwrap();
    assert_eq!(result["deleted_jobs"], 1);
    assert!(result["purged_cache_entries"].as_u64().unwrap() >= 1);
    assert_eq!(result["vacuum_run"], false);

    assert!(h.cache.get("marker").await.unwrap().is_none());
    let after = h.maintenance.get_stats().await.unwrap();
    assert_eq!(after.job_count, 1);
    assert_eq!(after.article_count, before.article_count);

    println!("✅ Cleanup removes finished jobs past retention and expired cache rows");
}

#[tokio::test]
async fn test_forced_vacuum_runs_on_small_database() {
    let h = harness(scripted_llm()).await;

    let config = MaintenanceConfig {
        max_db_size_mb: f64::NEG_INFINITY,
        ..MaintenanceConfig::default()
    };
    let report = h.maintenance.run_full_maintenance(&config).await.unwrap();

    assert!(report.vacuum_run);
    assert_eq!(report.deleted_jobs, 0);

    println!("✅ Forced vacuum");
}
