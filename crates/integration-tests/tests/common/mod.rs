//! Shared harness: every service on one in-memory SQLite database

#![allow(dead_code)]

use std::sync::Arc;

use solace_core::application::{
    Ports, RetryPolicy, ServiceSettings, Services, Worker, DEFAULT_QUEUE,
};
use solace_core::port::id_provider::SequentialIdProvider;
use solace_core::port::llm::mocks::ScriptedLlm;
use solace_core::port::time_provider::FixedTimeProvider;
use solace_core::port::video_search::mocks::{video, FixedVideoSearch};
use solace_infra_sqlite::{
    create_pool, run_migrations, SqliteCache, SqliteContentStore, SqliteConversationStore,
    SqliteJobRepository, SqliteMaintenance, SqliteTopicStore,
};

// 2024-03-01T12:00:00Z
pub const NOW: i64 = 1_709_294_400_000;

pub const CHAT_REPLY: &str = "That sounds exhausting. What usually keeps you awake?";
pub const TOPIC_REPLY: &str = "TOPIC: sleep";
pub const ARTICLE_REPLY: &str = "TITLE: Calm Evenings\nCONTENT: Breathe slowly before bed.";
pub const QUOTE_REPLY: &str = "QUOTE: Rest is productive.\nAUTHOR: Night Owl";

pub struct Harness {
    pub services: Services,
    pub time: Arc<FixedTimeProvider>,
    pub jobs: Arc<SqliteJobRepository>,
    pub topics: Arc<SqliteTopicStore>,
    pub content: Arc<SqliteContentStore>,
    pub cache: Arc<SqliteCache>,
    pub maintenance: Arc<SqliteMaintenance>,
    pub videos: Arc<FixedVideoSearch>,
}

/// LLM that answers chat, topic, article and quote prompts
pub fn scripted_llm() -> ScriptedLlm {
    ScriptedLlm::new(CHAT_REPLY)
        .reply_when("identify ONE main topic", TOPIC_REPLY)
        .reply_when("motivational quote", QUOTE_REPLY)
        .reply_when("Create an article", ARTICLE_REPLY)
}

pub async fn harness(llm: ScriptedLlm) -> Harness {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let time = Arc::new(FixedTimeProvider::new(NOW));
    let jobs = Arc::new(SqliteJobRepository::new(pool.clone(), time.clone()));
    let topics = Arc::new(SqliteTopicStore::new(pool.clone(), time.clone()));
    let content = Arc::new(SqliteContentStore::new(pool.clone(), time.clone()));
    let cache = Arc::new(SqliteCache::new(pool.clone(), time.clone()));
    let maintenance = Arc::new(SqliteMaintenance::new(pool.clone(), time.clone()));
    let videos = Arc::new(FixedVideoSearch::new(vec![video("a1", 900), video("b2", 100)]));

    let ports = Ports {
        job_repo: jobs.clone(),
        tx_repo: jobs.clone(),
        id_provider: Arc::new(SequentialIdProvider::default()),
        time_provider: time.clone(),
        llm: Arc::new(llm),
        video_search: videos.clone(),
        conversations: Arc::new(SqliteConversationStore::new(pool.clone(), time.clone())),
        topics: topics.clone(),
        content: content.clone(),
        cache: cache.clone(),
        maintenance: maintenance.clone(),
    };
    let settings = ServiceSettings {
        quote_generation_chance: 0.0,
        ..ServiceSettings::default()
    };

    Harness {
        services: Services::build(ports, settings),
        time,
        jobs,
        topics,
        content,
        cache,
        maintenance,
        videos,
    }
}

pub fn worker(h: &Harness) -> Worker {
    Worker::new(
        DEFAULT_QUEUE,
        h.jobs.clone(),
        h.services.executor.clone(),
        Arc::new(RetryPolicy::new(h.time.clone(), 1000)),
        h.time.clone(),
    )
    .with_name("test-worker")
}

/// Run queued jobs until the queue is empty; returns how many were taken
pub async fn drain(h: &Harness) -> usize {
    let worker = worker(h);
    let mut processed = 0;
    while worker.process_next_job().await.unwrap() {
        processed += 1;
        assert!(processed < 100, "queue never drained");
    }
    processed
}
