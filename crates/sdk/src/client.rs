//! Solace Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    ArticleList, CacheClearResult, ClearHistoryResult, DeleteUserResult, Health,
    MaintenanceResult, MessageResult, Stats, TopicRefresh, UserTopic, VideoList,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use solace_core::application::{
    ChatRequest, ChatResponse, GeneratedContent, InitialContent, PersonalizedContent,
    RecommendationsView, TaskStatus, VideoCacheStatus,
};
use solace_core::domain::{ChatMode, ContentType, Language, Quote};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Turn a JSON object into named params; nulls are dropped so server defaults apply
pub(crate) fn object_params(value: Value) -> Result<ObjectParams> {
    let Value::Object(map) = value else {
        return Err(SdkError::Other("params must be a JSON object".to_string()));
    };
    let mut params = ObjectParams::new();
    for (key, value) in map.into_iter().filter(|(_, v)| !v.is_null()) {
        params.insert(&key, value)?;
    }
    Ok(params)
}

/// Solace server client
///
/// # Example
///
/// ```no_run
/// use solace_sdk::SolaceClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SolaceClient::connect("http://127.0.0.1:9527").await?;
/// let health = client.health().await?;
/// assert!(health.is_healthy());
/// # Ok(())
/// # }
/// ```
pub struct SolaceClient {
    client: HttpClient,
}

impl SolaceClient {
    /// Connect to the Solace server
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9527`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        Ok(self.client.request(method, object_params(params)?).await?)
    }

    pub async fn health(&self) -> Result<Health> {
        self.call("system.health.v1", json!({})).await
    }

    /// Send one chat turn
    ///
    /// ```no_run
    /// # use solace_sdk::SolaceClient;
    /// # use solace_core::application::ChatRequest;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = SolaceClient::connect("http://127.0.0.1:9527").await?;
    /// let reply = client.chat(ChatRequest::new("I can't focus today")).await?;
    /// println!("{}", reply.response);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.call("chat.send.v1", serde_json::to_value(request)?).await
    }

    pub async fn clear_history(
        &self,
        user_id: &str,
        mode: Option<ChatMode>,
    ) -> Result<ClearHistoryResult> {
        self.call(
            "chat.clear_history.v1",
            json!({"user_id": user_id, "mode": mode}),
        )
        .await
    }

    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatus> {
        self.call("task.status.v1", json!({ "task_id": task_id })).await
    }

    /// Cancel a task that has not finished; finished tasks give a conflict error
    pub async fn cancel_task(&self, task_id: &str) -> Result<TaskStatus> {
        self.call("task.cancel.v1", json!({ "task_id": task_id })).await
    }

    /// Poll a task until it leaves `pending` or the attempts run out
    pub async fn wait_for_task(
        &self,
        task_id: &str,
        interval: Duration,
        max_polls: u32,
    ) -> Result<TaskStatus> {
        let mut status = self.task_status(task_id).await?;
        for _ in 0..max_polls {
            if status.status != "pending" {
                break;
            }
            tokio::time::sleep(interval).await;
            status = self.task_status(task_id).await?;
        }
        Ok(status)
    }

    pub async fn user_topic(&self, user_id: &str) -> Result<UserTopic> {
        self.call("user.topic.v1", json!({ "user_id": user_id })).await
    }

    pub async fn refresh_topic(&self, user_id: &str) -> Result<TopicRefresh> {
        self.call("user.topic.refresh.v1", json!({ "user_id": user_id }))
            .await
    }

    pub async fn recommendations(
        &self,
        user_id: &str,
        language: Language,
    ) -> Result<RecommendationsView> {
        self.call(
            "user.recommendations.v1",
            json!({"user_id": user_id, "language": language}),
        )
        .await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<DeleteUserResult> {
        self.call("user.delete.v1", json!({ "user_id": user_id })).await
    }

    pub async fn daily_quote(&self, language: Language, topic: Option<&str>) -> Result<Quote> {
        self.call(
            "content.daily_quote.v1",
            json!({"language": language, "topic": topic}),
        )
        .await
    }

    pub async fn articles(
        &self,
        topic: Option<&str>,
        language: Language,
        limit: usize,
    ) -> Result<ArticleList> {
        self.call(
            "content.articles.v1",
            json!({"topic": topic, "language": language, "limit": limit}),
        )
        .await
    }

    pub async fn videos(&self, topic: Option<&str>, language: Language, limit: u32) -> Result<VideoList> {
        self.call(
            "content.videos.v1",
            json!({"topic": topic, "language": language, "limit": limit}),
        )
        .await
    }

    pub async fn generate(
        &self,
        content_type: ContentType,
        topic: Option<&str>,
        language: Language,
    ) -> Result<GeneratedContent> {
        self.call(
            "content.generate.v1",
            json!({"content_type": content_type, "topic": topic, "language": language}),
        )
        .await
    }

    pub async fn initial_content(&self, language: Language) -> Result<InitialContent> {
        self.call("content.initial.v1", json!({ "language": language }))
            .await
    }

    pub async fn personalized_content(
        &self,
        user_id: &str,
        language: Language,
    ) -> Result<PersonalizedContent> {
        self.call(
            "content.personalized.v1",
            json!({"user_id": user_id, "language": language}),
        )
        .await
    }

    pub async fn video_cache_status(&self) -> Result<VideoCacheStatus> {
        self.call("video.cache_status.v1", json!({})).await
    }

    pub async fn clear_video_cache(&self) -> Result<CacheClearResult> {
        self.call("video.cache_clear.v1", json!({})).await
    }

    pub async fn reset_video_quota(&self) -> Result<MessageResult> {
        self.call("video.force_retry.v1", json!({})).await
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.call("admin.stats.v1", json!({})).await
    }

    pub async fn maintenance(&self, force_vacuum: bool) -> Result<MaintenanceResult> {
        self.call(
            "admin.maintenance.v1",
            json!({ "force_vacuum": force_vacuum }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::core::traits::ToRpcParams;

    #[test]
    fn test_nulls_are_dropped() {
        let params = object_params(json!({"topic": null, "limit": 3})).unwrap();
        let raw = params.to_rpc_params().unwrap().unwrap();
        let value: Value = serde_json::from_str(raw.get()).unwrap();
        assert_eq!(value, json!({"limit": 3}));
    }

    #[test]
    fn test_non_object_params_are_rejected() {
        tokio_test::assert_err!(object_params(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = SolaceClient::connect("not a url").await;
        assert!(matches!(result, Err(SdkError::Connection(_))));
    }
}
