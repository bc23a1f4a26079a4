//! Unit tests for the content task executor

use super::*;
use crate::application::content::InitialSnapshot;
use crate::application::recommendations::Recommendations;
use crate::application::services::{ServiceSettings, Services};
use crate::application::tasks::BACKGROUND_PRIORITY;
use crate::domain::{ChatMode, JobPayload, JobType, TopicStat};
use crate::port::content_repository::mocks::InMemoryContent;
use crate::port::conversation_repository::mocks::InMemoryConversations;
use crate::port::id_provider::SequentialIdProvider;
use crate::port::job_repository::mocks::InMemoryJobs;
use crate::port::llm::mocks::ScriptedLlm;
use crate::port::maintenance::mocks::NoopMaintenance;
use crate::port::time_provider::FixedTimeProvider;
use crate::port::topic_repository::mocks::InMemoryTopics;
use crate::port::video_search::mocks::FixedVideoSearch;
use crate::port::{get_json, Cache, ContentRepository, InMemoryCache, JobRepository, TopicRepository};

// 2024-03-01T12:00:00Z
const NOW: i64 = 1_709_294_400_000;

const ARTICLE_REPLY: &str = "TITLE: Calm Evenings\nCONTENT: Breathe slowly before bed.";
const QUOTE_REPLY: &str = "QUOTE: Rest is productive.\nAUTHOR: Night Owl";

struct Fixture {
    services: Services,
    jobs: Arc<InMemoryJobs>,
    topics: Arc<InMemoryTopics>,
    content: Arc<InMemoryContent>,
    cache: Arc<InMemoryCache>,
    maintenance: Arc<NoopMaintenance>,
}

fn fixture(llm: ScriptedLlm) -> Fixture {
    let time = Arc::new(FixedTimeProvider::new(NOW));
    let jobs = Arc::new(InMemoryJobs::new(time.clone()));
    let topics = Arc::new(InMemoryTopics::default());
    let content = Arc::new(InMemoryContent::default());
    let cache = Arc::new(InMemoryCache::new(time.clone()));
    let maintenance = Arc::new(NoopMaintenance::default());
    let ports = Ports {
        job_repo: jobs.clone(),
        tx_repo: jobs.clone(),
        id_provider: Arc::new(SequentialIdProvider::default()),
        time_provider: time,
        llm: Arc::new(llm),
        video_search: Arc::new(FixedVideoSearch::unconfigured()),
        conversations: Arc::new(InMemoryConversations::default()),
        topics: topics.clone(),
        content: content.clone(),
        cache: cache.clone(),
        maintenance: maintenance.clone(),
    };
    let settings = ServiceSettings {
        quote_generation_chance: 0.0,
        ..ServiceSettings::default()
    };
    Fixture {
        services: Services::build(ports, settings),
        jobs,
        topics,
        content,
        cache,
        maintenance,
    }
}

/// Enqueue through the task service and read the stored job back
async fn job<P: Serialize + Sync>(f: &Fixture, kind: TaskKind, subject: &str, payload: &P) -> Job {
    let id = f
        .services
        .tasks
        .submit(kind, subject, payload, BACKGROUND_PRIORITY, None)
        .await
        .unwrap();
    f.jobs.find_by_id(&id).await.unwrap().unwrap()
}

async fn run(f: &Fixture, job: &Job) -> Value {
    f.services.executor.execute(job).await.unwrap().output.unwrap()
}

fn extract_payload(message: &str) -> ExtractTopicPayload {
    ExtractTopicPayload {
        message: message.to_string(),
        user_id: "u1".to_string(),
        language: Language::En,
        mode: ChatMode::Support,
    }
}

#[tokio::test]
async fn test_topic_change_starts_child_tasks() {
    let f = fixture(ScriptedLlm::new("TOPIC: sleep"));
    let parent = job(&f, TaskKind::ExtractTopic, "topic:u1", &extract_payload("I can't sleep")).await;

    let output = run(&f, &parent).await;

    assert_eq!(output["topic"], "sleep");
    assert_eq!(output["topic_changed"], true);
    assert_eq!(output["auto_generation_started"], true);
    assert!(output["content_task_ids"]["article"].is_string());
    assert!(output["content_task_ids"]["quote"].is_string());

    let children: Vec<Job> = f
        .jobs
        .all()
        .into_iter()
        .filter(|j| j.parent_job_id.as_deref() == Some(parent.id.as_str()))
        .collect();
    assert_eq!(children.len(), 3);

    let subjects: Vec<&str> = children.iter().map(|j| j.subject_key.as_str()).collect();
    assert!(subjects.contains(&"content:sleep:article:en"));
    assert!(subjects.contains(&"content:sleep:quote:en"));
    assert!(subjects.contains(&"recommendations:u1:en"));

    assert_eq!(f.topics.user_topic("u1").await.unwrap().as_deref(), Some("sleep"));
    assert_eq!(f.cache.get("user_topic:u1").await.unwrap().as_deref(), Some("sleep"));
}

#[tokio::test]
async fn test_same_topic_starts_nothing() {
    let f = fixture(ScriptedLlm::new("TOPIC: sleep"));
    f.topics.set_user_topic("u1", Some("sleep")).await.unwrap();
    let parent = job(&f, TaskKind::ExtractTopic, "topic:u1", &extract_payload("still tired")).await;

    let output = run(&f, &parent).await;

    assert_eq!(output["topic_changed"], false);
    assert_eq!(output["auto_generation_started"], false);
    assert_eq!(f.jobs.all().len(), 1);
}

#[tokio::test]
async fn test_failed_extraction_keeps_stored_topic() {
    let f = fixture(ScriptedLlm::new("x").fail_when("identify ONE main topic"));
    f.topics.set_user_topic("u1", Some("sleep")).await.unwrap();
    let parent = job(&f, TaskKind::ExtractTopic, "topic:u1", &extract_payload("so tired")).await;

    let err = f.services.executor.execute(&parent).await.unwrap_err();

    assert!(matches!(err, ExecutionError::Failed(_)));
    assert_eq!(f.topics.user_topic("u1").await.unwrap().as_deref(), Some("sleep"));
    assert_eq!(f.cache.get("user_topic:u1").await.unwrap(), None);
    assert_eq!(f.jobs.all().len(), 1);
}

#[tokio::test]
async fn test_failed_article_is_neither_stored_nor_cached() {
    let f = fixture(ScriptedLlm::failing());
    let payload = GenerateContentPayload {
        topic: "sleep".to_string(),
        content_type: ContentType::Article,
        language: Language::En,
    };
    let job = job(&f, TaskKind::GenerateContent, "content:sleep:article:en", &payload).await;

    let err = f.services.executor.execute(&job).await.unwrap_err();

    assert!(matches!(err, ExecutionError::Failed(_)));
    assert_eq!(f.content.article_count(), 0);
    assert_eq!(f.cache.get("article:sleep:en:20240301").await.unwrap(), None);
}

#[tokio::test]
async fn test_daily_content_does_not_cache_template_article() {
    let f = fixture(ScriptedLlm::new(QUOTE_REPLY).fail_when("Create an article"));
    f.topics
        .record_mentions(&["sleep".to_string()], ChatMode::Support)
        .await
        .unwrap();
    let job = job(&f, TaskKind::GenerateDailyContent, "beat:generate_daily_content", &json!({"language": "en"})).await;

    let output = run(&f, &job).await;

    assert_eq!(output["articles"], 3);
    assert!(f.cache.get("article:sleep:en:20240301").await.unwrap().is_none());
}

#[tokio::test]
async fn test_generate_article_is_stored_and_cached() {
    let f = fixture(ScriptedLlm::new(ARTICLE_REPLY));
    let payload = GenerateContentPayload {
        topic: "sleep".to_string(),
        content_type: ContentType::Article,
        language: Language::En,
    };
    let job = job(&f, TaskKind::GenerateContent, "content:sleep:article:en", &payload).await;

    let output = run(&f, &job).await;

    assert_eq!(output["article"]["title"], "Calm Evenings");
    assert_eq!(f.content.article_count(), 1);
    let cached: Option<Article> = get_json(f.cache.as_ref(), "article:sleep:en:20240301").await.unwrap();
    assert_eq!(cached.unwrap().approach, Approach::Practical);
}

#[tokio::test]
async fn test_generate_quote_is_cached() {
    let f = fixture(ScriptedLlm::new(QUOTE_REPLY));
    let payload = GenerateContentPayload {
        topic: "sleep".to_string(),
        content_type: ContentType::Quote,
        language: Language::En,
    };
    let job = job(&f, TaskKind::GenerateContent, "content:sleep:quote:en", &payload).await;

    let output = run(&f, &job).await;

    assert_eq!(output["quote"]["author"], "Night Owl");
    let cached: Option<Quote> = get_json(f.cache.as_ref(), "quote:sleep:en:20240301").await.unwrap();
    assert_eq!(cached.unwrap().text, "Rest is productive.");
}

#[tokio::test]
async fn test_unknown_task_type() {
    let f = fixture(ScriptedLlm::failing());
    let job = Job::new(
        "x-1",
        NOW,
        "default",
        JobType::new("BUILD_ROCKET"),
        "rocket",
        1,
        JobPayload::new(json!({})),
    );

    let err = f.services.executor.execute(&job).await.unwrap_err();
    assert!(matches!(err, ExecutionError::UnknownTask(t) if t == "BUILD_ROCKET"));
}

#[tokio::test]
async fn test_bad_content_type_is_invalid_payload() {
    let f = fixture(ScriptedLlm::failing());
    let job = Job::new(
        "x-2",
        NOW,
        "default",
        JobType::new("GENERATE_CONTENT"),
        "content:sleep:podcast:en",
        1,
        JobPayload::new(json!({"topic": "sleep", "content_type": "podcast"})),
    );

    let err = f.services.executor.execute(&job).await.unwrap_err();
    assert!(matches!(err, ExecutionError::InvalidPayload(_)));
}

#[tokio::test]
async fn test_recommendations_without_topic() {
    let f = fixture(ScriptedLlm::failing());
    let payload = UpdateRecommendationsPayload {
        user_id: "u1".to_string(),
        language: Language::En,
    };
    let job = job(&f, TaskKind::UpdateRecommendations, "recommendations:u1:en", &payload).await;

    let output = run(&f, &job).await;

    assert_eq!(output["message"], "No topic found for user");
    assert_eq!(f.cache.get("recommendations:u1:en").await.unwrap(), None);
}

#[tokio::test]
async fn test_recommendations_are_cached() {
    let f = fixture(ScriptedLlm::failing());
    f.topics.set_user_topic("u1", Some("stress")).await.unwrap();
    let mut article = Article::new("stress", Approach::Practical, Language::En, "Unwind", "Walk it off.");
    article.created_at = Some(NOW);
    f.content.save_article(&article).await.unwrap();
    let payload = UpdateRecommendationsPayload {
        user_id: "u1".to_string(),
        language: Language::En,
    };
    let job = job(&f, TaskKind::UpdateRecommendations, "recommendations:u1:en", &payload).await;

    let output = run(&f, &job).await;

    assert_eq!(output["topic"], "stress");
    assert_eq!(output["articles"], 1);
    let cached: Recommendations = get_json(f.cache.as_ref(), "recommendations:u1:en")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.topic, "stress");
    assert!(!cached.videos.is_empty());
    assert_eq!(cached.quote, None);
}

#[tokio::test]
async fn test_daily_content_covers_popular_topics() {
    let f = fixture(
        ScriptedLlm::new(ARTICLE_REPLY).reply_when("motivational quote", QUOTE_REPLY),
    );
    f.topics
        .record_mentions(&["sleep".to_string(), "work".to_string()], ChatMode::Support)
        .await
        .unwrap();
    let job = job(&f, TaskKind::GenerateDailyContent, "beat:generate_daily_content", &json!({"language": "en"})).await;

    let output = run(&f, &job).await;

    assert_eq!(output["topics"], 2);
    assert_eq!(output["articles"], 6);
    assert_eq!(f.content.article_count(), 6);
    let batch: BatchContent = get_json(f.cache.as_ref(), "daily_content:20240301")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.topics.len(), 2);
    assert!(f.cache.get("article:sleep:en:20240301").await.unwrap().is_some());
    assert!(f.cache.get("quote:work:en:20240301").await.unwrap().is_some());
}

#[tokio::test]
async fn test_all_topics_content() {
    let f = fixture(
        ScriptedLlm::new(ARTICLE_REPLY).reply_when("motivational quote", QUOTE_REPLY),
    );
    f.topics
        .record_mentions(&["anger".to_string()], ChatMode::Analysis)
        .await
        .unwrap();
    let job = job(&f, TaskKind::GenerateAllTopicsContent, "beat:generate_all_topics_content", &json!({"language": "en"})).await;

    let output = run(&f, &job).await;

    assert_eq!(output["topics"], 1);
    assert_eq!(f.content.article_count(), 1);
    assert!(f.cache.get("all_topics_content:20240301").await.unwrap().is_some());
}

#[tokio::test]
async fn test_startup_content_uses_fallbacks() {
    let f = fixture(ScriptedLlm::failing());
    let job = job(&f, TaskKind::InitializeStartupContent, "initial_content:en", &LanguagePayload { language: Language::En }).await;

    let output = run(&f, &job).await;

    assert_eq!(output["articles"], 6);
    assert_eq!(output["seeded_quotes"], 20);
    let snapshot: InitialSnapshot = get_json(f.cache.as_ref(), "initial_content:en")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.articles.len(), 6);
    assert!(snapshot.articles.iter().all(|a| a.is_fallback && a.id.is_some()));
    assert_eq!(snapshot.articles[0].topic, "stress");
}

#[tokio::test]
async fn test_popular_topics_are_cached() {
    let f = fixture(ScriptedLlm::failing());
    f.topics
        .record_mentions(&["sleep".to_string(), "sleep".to_string(), "fear".to_string()], ChatMode::Support)
        .await
        .unwrap();
    let job = job(&f, TaskKind::UpdatePopularTopics, "beat:update_popular_topics", &json!({})).await;

    let output = run(&f, &job).await;

    assert_eq!(output["topics"], 2);
    let cached: Vec<TopicStat> = get_json(f.cache.as_ref(), "popular_topics").await.unwrap().unwrap();
    assert_eq!(cached[0].topic, "sleep");
    assert_eq!(cached[0].frequency, 2);
}

#[tokio::test]
async fn test_cleanup_runs_maintenance_and_hides_blank_articles() {
    let f = fixture(ScriptedLlm::failing());
    f.content
        .save_article(&Article::new("sleep", Approach::Practical, Language::En, "Empty", "  "))
        .await
        .unwrap();
    f.content
        .save_article(&Article::new("sleep", Approach::Practical, Language::En, "Full", "Text"))
        .await
        .unwrap();
    let job = job(&f, TaskKind::CleanupOldContent, "beat:cleanup_old_content", &json!({})).await;

    let output = run(&f, &job).await;

    assert_eq!(output["deactivated_articles"], 1);
    assert_eq!(f.maintenance.runs(), 1);
    assert_eq!(f.content.articles(None, Language::En).await.unwrap().len(), 1);
}
