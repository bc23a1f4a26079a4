//! Chat to recommendations, end to end
//!
//! A chat turn stores the conversation and queues topic extraction; running
//! the queue then generates topic content and the user's recommendation bundle.

mod common;

use common::{drain, harness, scripted_llm, Harness, CHAT_REPLY, QUOTE_REPLY, TOPIC_REPLY};
use solace_core::application::{ChatRequest, RecommendationsView, DEFAULT_QUEUE};
use solace_core::domain::{ChatMode, ContentType, Language};
use solace_core::port::llm::mocks::ScriptedLlm;
use solace_core::port::{Cache, ContentRepository, TopicRepository};
use solace_core::AppError;

fn english(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        mode: ChatMode::Support,
        user_id: "u1".to_string(),
        language: Language::En,
    }
}

#[tokio::test]
async fn test_chat_turn_drives_topic_content_and_recommendations() {
    let h = harness(scripted_llm()).await;

    let reply = h
        .services
        .chat
        .chat(english("I can't sleep at night and I'm exhausted"))
        .await
        .unwrap();

    assert_eq!(reply.response, CHAT_REPLY);
    assert_eq!(reply.language, Language::En);
    assert!(reply.is_first_message);
    assert!(reply.topic.is_none());
    let topic_task = reply.topic_task_id.clone().unwrap();
    assert!(reply.recommendations_task_id.is_some());

    // extract topic, two content tasks and the latest recommendations build
    assert_eq!(drain(&h).await, 4);

    let status = h.services.tasks.status(&topic_task).await.unwrap();
    assert_eq!(status.status, "completed");
    let result = status.result.unwrap();
    assert_eq!(result["topic"], "sleep");
    assert_eq!(result["topic_changed"], true);

    assert_eq!(h.topics.user_topic("u1").await.unwrap().as_deref(), Some("sleep"));
    assert_eq!(h.cache.get("user_topic:u1").await.unwrap().as_deref(), Some("sleep"));

    let articles = h.content.articles(Some("sleep"), Language::En).await.unwrap();
    assert!(articles.iter().any(|a| a.title == "Calm Evenings"));

    let quote = h.services.content.topic_quote("sleep", Language::En).await.unwrap();
    assert_eq!(quote.text, "Rest is productive.");

    match h.services.recommendations.get_or_request("u1", Language::En).await.unwrap() {
        RecommendationsView::Ready(bundle) => {
            assert_eq!(bundle.topic, "sleep");
            assert_eq!(bundle.videos.len(), 2);
        }
        other => panic!("expected cached recommendations, got {:?}", other),
    }

    println!("✅ Chat turn produces topic, content and recommendations");
}

#[tokio::test]
async fn test_second_turn_sees_history_and_topic() {
    let h = harness(scripted_llm()).await;

    h.services.chat.chat(english("I can't sleep")).await.unwrap();
    drain(&h).await;

    let reply = h.services.chat.chat(english("Still awake at 3am")).await.unwrap();
    assert!(!reply.is_first_message);
    assert_eq!(reply.topic.as_deref(), Some("sleep"));
    // The bundle is cached, so no rebuild is queued
    assert!(reply.recommendations_task_id.is_none());

    let processed = drain(&h).await;
    assert_eq!(processed, 1, "same topic must not start content generation");

    println!("✅ Unchanged topic starts no new content");
}

#[tokio::test]
async fn test_clear_history_and_delete_user() {
    let h = harness(scripted_llm()).await;

    h.services.chat.chat(english("I can't sleep")).await.unwrap();
    drain(&h).await;

    let deleted = h
        .services
        .chat
        .clear_history("u1", Some(ChatMode::Support))
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let reply = h.services.chat.chat(english("Hello again")).await.unwrap();
    assert!(reply.is_first_message);

    h.services.chat.delete_user("u1").await.unwrap();
    assert!(h.topics.user_topic("u1").await.unwrap().is_none());
    assert!(h.cache.get("user_topic:u1").await.unwrap().is_none());

    println!("✅ History clearing and user deletion");
}

#[tokio::test]
async fn test_llm_outage_returns_apology() {
    let h = harness(ScriptedLlm::failing()).await;

    let reply = h.services.chat.chat(english("I feel anxious")).await.unwrap();
    assert!(reply.response.starts_with("Sorry"));
    assert!(reply.topic_task_id.is_none());

    let empty = h.services.chat.chat(english("   ")).await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    println!("✅ LLM outage degrades to an apology");
}

/// Run the queue three times, far enough apart for every retry to be due
async fn drain_through_retries(h: &Harness) {
    for _ in 0..3 {
        drain(h).await;
        h.time.advance(60_000);
    }
}

#[tokio::test]
async fn test_topic_extraction_outage_keeps_previous_topic() {
    let h = harness(ScriptedLlm::new(CHAT_REPLY).fail_when("identify ONE main topic")).await;
    h.topics.set_user_topic("u1", Some("sleep")).await.unwrap();

    let reply = h.services.chat.chat(english("Still awake at 3am")).await.unwrap();
    assert_eq!(reply.topic.as_deref(), Some("sleep"));
    let topic_task = reply.topic_task_id.unwrap();

    drain_through_retries(&h).await;

    let status = h.services.tasks.status(&topic_task).await.unwrap();
    assert_eq!(status.status, "failed");
    assert_eq!(status.attempts, 2);
    assert!(status.error.unwrap().contains("LLM"));

    assert_eq!(h.topics.user_topic("u1").await.unwrap().as_deref(), Some("sleep"));
    let counts = h.services.tasks.queue_counts(DEFAULT_QUEUE).await.unwrap();
    assert_eq!(counts.queued, 0);
    assert!(h
        .content
        .articles(Some("communication"), Language::En)
        .await
        .unwrap()
        .is_empty());

    println!("✅ A failed extraction leaves the user's topic alone");
}

#[tokio::test]
async fn test_article_outage_is_retried_and_never_cached() {
    let llm = ScriptedLlm::new(CHAT_REPLY)
        .reply_when("identify ONE main topic", TOPIC_REPLY)
        .reply_when("motivational quote", QUOTE_REPLY)
        .fail_when("Create an article");
    let h = harness(llm).await;

    let reply = h.services.chat.chat(english("I can't sleep")).await.unwrap();
    let topic_task = reply.topic_task_id.unwrap();

    drain_through_retries(&h).await;

    let extracted = h.services.tasks.status(&topic_task).await.unwrap().result.unwrap();
    let article_task = extracted["content_task_ids"]["article"].as_str().unwrap().to_string();
    let status = h.services.tasks.status(&article_task).await.unwrap();
    assert_eq!(status.status, "failed");
    assert_eq!(status.attempts, 2);

    assert!(h.cache.get("article:sleep:en:20240301").await.unwrap().is_none());
    let stored = h.content.articles(Some("sleep"), Language::En).await.unwrap();
    assert!(stored.iter().all(|a| !a.is_fallback));

    // The quote for the same topic is unaffected
    let quote = h.services.content.topic_quote("sleep", Language::En).await.unwrap();
    assert_eq!(quote.text, "Rest is productive.");

    println!("✅ A failed article is retried and no template is cached");
}

#[tokio::test]
async fn test_on_demand_quote_generation() {
    let h = harness(scripted_llm()).await;

    h.services.chat.chat(english("I can't sleep")).await.unwrap();
    drain(&h).await;

    let generated = h
        .services
        .content
        .generate_on_demand("quote", Some("sleep"), Language::En)
        .await
        .unwrap();
    assert_eq!(generated.content_type, ContentType::Quote);
    assert_eq!(generated.quote.unwrap().author, "Night Owl");

    let invalid = h
        .services
        .content
        .generate_on_demand("podcast", None, Language::En)
        .await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));

    println!("✅ On-demand quote generation");
}
