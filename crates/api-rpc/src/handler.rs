//! RPC Method Handlers
//!
//! One method per JSON-RPC call. Handlers translate params into service
//! calls and map `AppError` into RPC error objects.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ArticlesRequest, ArticlesResponse, CacheClearResponse, ClearHistoryRequest,
    ClearHistoryResponse, DailyQuoteRequest, DeleteUserResponse, GenerateRequest, HealthResponse,
    LanguageRequest, MaintenanceRequest, MaintenanceResponse, MessageResponse, StatsResponse,
    TaskRequest, TopicRefreshResponse, UserLanguageRequest, UserRequest, UserTopicResponse,
    VideosRequest, VideosResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use solace_core::application::{
    ChatRequest, ChatResponse, GeneratedContent, InitialContent, PersonalizedContent,
    RecommendationsView, Services, TaskStatus, VideoCacheStatus, DEFAULT_QUEUE,
};
use solace_core::domain::Quote;
use solace_core::port::MaintenanceConfig;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

type RpcResult<T> = Result<T, ErrorObjectOwned>;

const HEALTH_PROBE_KEY: &str = "health_check";

/// RPC Handler with injected services
pub struct RpcHandler {
    services: Services,
    rate_limiter: Arc<RateLimiter>,
    maintenance_config: MaintenanceConfig,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(
        services: Services,
        rate_limiter: Arc<RateLimiter>,
        maintenance_config: MaintenanceConfig,
    ) -> Self {
        Self {
            services,
            rate_limiter,
            maintenance_config,
            start_time: Instant::now(),
        }
    }

    fn throttle(&self, method: &str) -> RpcResult<()> {
        if self.rate_limiter.try_acquire() {
            return Ok(());
        }
        warn!(method = method, "Request throttled");
        Err(throttled())
    }

    fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// system.health.v1
    pub async fn health(&self) -> RpcResult<HealthResponse> {
        let cache = self.services.ports.cache.as_ref();
        let cache_ok = match cache.set(HEALTH_PROBE_KEY, "ok", 10).await {
            Ok(()) => matches!(cache.get(HEALTH_PROBE_KEY).await, Ok(Some(v)) if v == "ok"),
            Err(e) => {
                warn!(error = %e, "Cache health probe failed");
                false
            }
        };

        let queue = self
            .services
            .tasks
            .queue_counts(DEFAULT_QUEUE)
            .await
            .map_err(to_rpc_error)?;

        Ok(HealthResponse {
            status: if cache_ok { "healthy" } else { "degraded" }.to_string(),
            version: solace_core::VERSION.to_string(),
            uptime_secs: self.uptime_secs(),
            cache_ok,
            llm_configured: self.services.ports.llm.is_configured(),
            video_api_configured: self.services.ports.video_search.is_configured(),
            queue,
        })
    }

    /// chat.send.v1
    pub async fn chat(&self, req: ChatRequest) -> RpcResult<ChatResponse> {
        self.throttle("chat.send.v1")?;
        self.services.chat.chat(req).await.map_err(to_rpc_error)
    }

    /// chat.clear_history.v1
    pub async fn clear_history(&self, req: ClearHistoryRequest) -> RpcResult<ClearHistoryResponse> {
        let deleted = self
            .services
            .chat
            .clear_history(&req.user_id, req.mode)
            .await
            .map_err(to_rpc_error)?;

        let message = match req.mode {
            Some(mode) => format!("History cleared for mode '{}'", mode),
            None => "History cleared for all modes".to_string(),
        };
        Ok(ClearHistoryResponse { message, deleted })
    }

    /// task.status.v1
    pub async fn task_status(&self, req: TaskRequest) -> RpcResult<TaskStatus> {
        self.services
            .tasks
            .status(&req.task_id)
            .await
            .map_err(to_rpc_error)
    }

    /// task.cancel.v1
    pub async fn task_cancel(&self, req: TaskRequest) -> RpcResult<TaskStatus> {
        self.services
            .tasks
            .cancel(&req.task_id)
            .await
            .map_err(to_rpc_error)
    }

    /// user.topic.v1
    pub async fn user_topic(&self, req: UserRequest) -> RpcResult<UserTopicResponse> {
        let topic = self
            .services
            .topics
            .current_topic(&req.user_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(UserTopicResponse {
            user_id: req.user_id,
            topic,
        })
    }

    /// user.topic.refresh.v1
    pub async fn refresh_topic(&self, req: UserRequest) -> RpcResult<TopicRefreshResponse> {
        let previous_topic = self
            .services
            .topics
            .refresh(&req.user_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(TopicRefreshResponse {
            message: format!("Topic reset for user {}", req.user_id),
            user_id: req.user_id,
            previous_topic,
        })
    }

    /// user.recommendations.v1
    pub async fn recommendations(&self, req: UserLanguageRequest) -> RpcResult<RecommendationsView> {
        self.services
            .recommendations
            .get_or_request(&req.user_id, req.language)
            .await
            .map_err(to_rpc_error)
    }

    /// user.delete.v1
    pub async fn delete_user(&self, req: UserRequest) -> RpcResult<DeleteUserResponse> {
        self.services
            .chat
            .delete_user(&req.user_id)
            .await
            .map_err(to_rpc_error)?;
        info!(user_id = %req.user_id, "User data deleted");
        Ok(DeleteUserResponse {
            message: format!("All data for user {} deleted", req.user_id),
            user_id: req.user_id,
            deleted: true,
        })
    }

    /// content.daily_quote.v1
    pub async fn daily_quote(&self, req: DailyQuoteRequest) -> RpcResult<Quote> {
        self.services
            .content
            .daily_quote(req.language, req.topic.as_deref())
            .await
            .map_err(to_rpc_error)
    }

    /// content.articles.v1
    pub async fn articles(&self, req: ArticlesRequest) -> RpcResult<ArticlesResponse> {
        let articles = self
            .services
            .content
            .articles(req.topic.as_deref(), req.language, req.limit)
            .await
            .map_err(to_rpc_error)?;
        Ok(ArticlesResponse {
            count: articles.len(),
            articles,
        })
    }

    /// content.videos.v1
    pub async fn videos(&self, req: VideosRequest) -> RpcResult<VideosResponse> {
        let videos = self
            .services
            .videos
            .videos(req.topic.as_deref(), req.limit, req.language)
            .await
            .map_err(to_rpc_error)?;
        Ok(VideosResponse {
            count: videos.len(),
            videos,
        })
    }

    /// content.generate.v1
    pub async fn generate(&self, req: GenerateRequest) -> RpcResult<GeneratedContent> {
        self.throttle("content.generate.v1")?;
        self.services
            .content
            .generate_on_demand(&req.content_type, req.topic.as_deref(), req.language)
            .await
            .map_err(to_rpc_error)
    }

    /// content.initial.v1
    pub async fn initial_content(&self, req: LanguageRequest) -> RpcResult<InitialContent> {
        self.services
            .content
            .initial_content(req.language)
            .await
            .map_err(to_rpc_error)
    }

    /// content.personalized.v1
    pub async fn personalized_content(
        &self,
        req: UserLanguageRequest,
    ) -> RpcResult<PersonalizedContent> {
        self.services
            .content
            .personalized_content(&req.user_id, req.language)
            .await
            .map_err(to_rpc_error)
    }

    /// video.cache_status.v1
    pub async fn video_cache_status(&self) -> RpcResult<VideoCacheStatus> {
        Ok(self.services.videos.cache_status())
    }

    /// video.cache_clear.v1
    pub async fn video_cache_clear(&self) -> RpcResult<CacheClearResponse> {
        let cleared = self.services.videos.clear_cache();
        Ok(CacheClearResponse { cleared })
    }

    /// video.force_retry.v1
    pub async fn video_force_retry(&self) -> RpcResult<MessageResponse> {
        self.services.videos.force_retry();
        Ok(MessageResponse {
            message: "Video API quota flag reset".to_string(),
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> RpcResult<StatsResponse> {
        let queue = self
            .services
            .tasks
            .queue_counts(DEFAULT_QUEUE)
            .await
            .map_err(to_rpc_error)?;
        let db = self
            .services
            .ports
            .maintenance
            .get_stats()
            .await
            .map_err(to_rpc_error)?;

        Ok(StatsResponse {
            queue,
            db_size_mb: db.db_size_mb,
            job_count: db.job_count,
            conversation_count: db.conversation_count,
            article_count: db.article_count,
            quote_count: db.quote_count,
            cache_entry_count: db.cache_entry_count,
            fragmentation_percent: db.fragmentation_percent,
            uptime_secs: self.uptime_secs(),
        })
    }

    /// admin.maintenance.v1
    pub async fn maintenance(&self, req: MaintenanceRequest) -> RpcResult<MaintenanceResponse> {
        let maintenance = self.services.ports.maintenance.as_ref();
        let before = maintenance.get_stats().await.map_err(to_rpc_error)?;

        let mut config = self.maintenance_config.clone();
        if req.force_vacuum {
            config.max_db_size_mb = f64::NEG_INFINITY;
        }

        let report = maintenance
            .run_full_maintenance(&config)
            .await
            .map_err(to_rpc_error)?;

        Ok(MaintenanceResponse {
            vacuum_run: report.vacuum_run,
            deleted_jobs: report.deleted_jobs,
            purged_cache_entries: report.purged_cache_entries,
            reclaimed_mb: report.reclaimed_mb,
            db_size_before_mb: before.db_size_mb,
            db_size_after_mb: report.stats.db_size_mb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use solace_core::application::{Ports, ServiceSettings, TaskService};
    use solace_core::domain::{ChatMode, Language};
    use solace_core::port::content_repository::mocks::InMemoryContent;
    use solace_core::port::conversation_repository::mocks::InMemoryConversations;
    use solace_core::port::id_provider::SequentialIdProvider;
    use solace_core::port::job_repository::mocks::InMemoryJobs;
    use solace_core::port::llm::mocks::ScriptedLlm;
    use solace_core::port::maintenance::mocks::NoopMaintenance;
    use solace_core::port::time_provider::FixedTimeProvider;
    use solace_core::port::topic_repository::mocks::InMemoryTopics;
    use solace_core::port::video_search::mocks::FixedVideoSearch;
    use solace_core::port::InMemoryCache;

    // 2024-03-01T12:00:00Z
    const NOW: i64 = 1_709_294_400_000;

    fn handler_with(llm: ScriptedLlm, limiter: RateLimiter) -> (RpcHandler, Arc<NoopMaintenance>) {
        let time = Arc::new(FixedTimeProvider::new(NOW));
        let jobs = Arc::new(InMemoryJobs::new(time.clone()));
        let maintenance = Arc::new(NoopMaintenance::default());
        let ports = Ports {
            job_repo: jobs.clone(),
            tx_repo: jobs,
            id_provider: Arc::new(SequentialIdProvider::default()),
            time_provider: time.clone(),
            llm: Arc::new(llm),
            video_search: Arc::new(FixedVideoSearch::unconfigured()),
            conversations: Arc::new(InMemoryConversations::default()),
            topics: Arc::new(InMemoryTopics::default()),
            content: Arc::new(InMemoryContent::default()),
            cache: Arc::new(InMemoryCache::new(time)),
            maintenance: maintenance.clone(),
        };
        let settings = ServiceSettings {
            quote_generation_chance: 0.0,
            ..ServiceSettings::default()
        };
        let handler = RpcHandler::new(
            Services::build(ports, settings),
            Arc::new(limiter),
            MaintenanceConfig::default(),
        );
        (handler, maintenance)
    }

    fn handler() -> RpcHandler {
        handler_with(ScriptedLlm::new("I hear you."), RateLimiter::new(100, 0)).0
    }

    fn tasks(handler: &RpcHandler) -> &TaskService {
        handler.services.tasks.as_ref()
    }

    #[tokio::test]
    async fn test_health_reports_configuration() {
        let handler = handler();

        let health = handler.health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert!(health.cache_ok);
        assert!(health.llm_configured);
        assert!(!health.video_api_configured);
        assert_eq!(health.queue.queued, 0);
    }

    #[tokio::test]
    async fn test_chat_returns_reply_and_task_ids() {
        let handler = handler();

        let mut req = ChatRequest::new("I can't sleep before exams");
        req.user_id = "u1".to_string();
        req.language = Language::En;
        let response = handler.chat(req).await.unwrap();

        assert_eq!(response.response, "I hear you.");
        assert!(response.is_first_message);
        let topic_task = response.topic_task_id.unwrap();
        let status = handler
            .task_status(TaskRequest { task_id: topic_task })
            .await
            .unwrap();
        assert_eq!(status.status, "pending");
        assert_eq!(tasks(&handler).queue_counts(DEFAULT_QUEUE).await.unwrap().queued, 2);
    }

    #[tokio::test]
    async fn test_empty_message_is_a_validation_error() {
        let handler = handler();

        let err = handler.chat(ChatRequest::new("   ")).await.unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[tokio::test]
    async fn test_chat_is_rate_limited() {
        let (handler, _) = handler_with(ScriptedLlm::new("ok"), RateLimiter::new(1, 0));

        tokio_test::assert_ok!(handler.chat(ChatRequest::new("hello")).await);
        let err = handler.chat(ChatRequest::new("hello again")).await.unwrap_err();
        assert_eq!(err.code(), code::THROTTLED);
    }

    #[tokio::test]
    async fn test_clear_history_counts_deleted_messages() {
        let handler = handler();
        let mut req = ChatRequest::new("hello");
        req.mode = ChatMode::Analysis;
        handler.chat(req).await.unwrap();

        let cleared = handler
            .clear_history(ClearHistoryRequest {
                user_id: "default".to_string(),
                mode: Some(ChatMode::Analysis),
            })
            .await
            .unwrap();
        assert_eq!(cleared.deleted, 2);
        assert_eq!(cleared.message, "History cleared for mode 'analysis'");
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let handler = handler();

        let err = handler
            .task_status(TaskRequest {
                task_id: "missing".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_pending_task() {
        let handler = handler();
        let response = handler.chat(ChatRequest::new("hello")).await.unwrap();
        let task_id = response.topic_task_id.unwrap();

        let status = handler
            .task_cancel(TaskRequest {
                task_id: task_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(status.status, "failed");

        let err = handler.task_cancel(TaskRequest { task_id }).await.unwrap_err();
        assert_eq!(err.code(), code::CONFLICT);
    }

    #[tokio::test]
    async fn test_recommendations_start_processing_without_cache() {
        let handler = handler();

        let view = handler
            .recommendations(UserLanguageRequest {
                user_id: "u1".to_string(),
                language: Language::En,
            })
            .await
            .unwrap();
        assert!(matches!(view, RecommendationsView::Processing { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() {
        let handler = handler();

        let err = handler
            .delete_user(UserRequest {
                user_id: "ghost".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_rejects_unknown_content_type() {
        let handler = handler();

        let err = handler
            .generate(GenerateRequest {
                content_type: "poem".to_string(),
                topic: None,
                language: Language::En,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[tokio::test]
    async fn test_videos_fall_back_when_api_is_unconfigured() {
        let handler = handler();

        let response = handler
            .videos(VideosRequest {
                topic: Some("stress".to_string()),
                ..VideosRequest::default()
            })
            .await
            .unwrap();
        assert!(response.count > 0);
        assert_eq!(response.count, response.videos.len());
    }

    #[tokio::test]
    async fn test_maintenance_runs_full_pass() {
        let (handler, maintenance) = handler_with(ScriptedLlm::new("ok"), RateLimiter::new(10, 0));

        let response = handler
            .maintenance(MaintenanceRequest { force_vacuum: true })
            .await
            .unwrap();
        assert!(response.vacuum_run);
        assert_eq!(maintenance.runs(), 1);

        let stats = handler.stats().await.unwrap();
        assert_eq!(stats.job_count, 0);
    }
}
