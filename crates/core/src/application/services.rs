// Service graph - wires the use cases on top of the ports

use crate::application::chat::ChatService;
use crate::application::content::{ContentGenerator, ContentService, DEFAULT_QUOTE_GENERATION_CHANCE};
use crate::application::executor::ContentTaskExecutor;
use crate::application::recommendations::RecommendationService;
use crate::application::tasks::TaskService;
use crate::application::topic::TopicService;
use crate::application::videos::{VideoService, DEFAULT_VIDEO_CACHE_TTL_SECS};
use crate::port::{
    Cache, ContentRepository, ConversationRepository, IdProvider, JobRepository, LlmClient,
    Maintenance, MaintenanceConfig, TimeProvider, TopicRepository, TransactionalJobRepository,
    VideoSearch,
};
use std::sync::Arc;

/// Adapters the services run on
#[derive(Clone)]
pub struct Ports {
    pub job_repo: Arc<dyn JobRepository>,
    pub tx_repo: Arc<dyn TransactionalJobRepository>,
    pub id_provider: Arc<dyn IdProvider>,
    pub time_provider: Arc<dyn TimeProvider>,
    pub llm: Arc<dyn LlmClient>,
    pub video_search: Arc<dyn VideoSearch>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub content: Arc<dyn ContentRepository>,
    pub cache: Arc<dyn Cache>,
    pub maintenance: Arc<dyn Maintenance>,
}

/// Tunables that are not adapters
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub video_cache_ttl_secs: u64,
    pub quote_generation_chance: f64,
    pub maintenance: MaintenanceConfig,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            video_cache_ttl_secs: DEFAULT_VIDEO_CACHE_TTL_SECS,
            quote_generation_chance: DEFAULT_QUOTE_GENERATION_CHANCE,
            maintenance: MaintenanceConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct Services {
    pub ports: Ports,
    pub tasks: Arc<TaskService>,
    pub topics: Arc<TopicService>,
    pub videos: Arc<VideoService>,
    pub content: Arc<ContentService>,
    pub recommendations: Arc<RecommendationService>,
    pub chat: Arc<ChatService>,
    pub executor: Arc<ContentTaskExecutor>,
}

impl Services {
    pub fn build(ports: Ports, settings: ServiceSettings) -> Self {
        let tasks = Arc::new(TaskService::new(
            ports.job_repo.clone(),
            ports.tx_repo.clone(),
            ports.id_provider.clone(),
            ports.time_provider.clone(),
        ));
        let topics = Arc::new(TopicService::new(
            ports.llm.clone(),
            ports.topics.clone(),
            ports.cache.clone(),
        ));
        let videos = Arc::new(VideoService::new(
            ports.video_search.clone(),
            ports.topics.clone(),
            ports.time_provider.clone(),
            settings.video_cache_ttl_secs,
        ));
        let generator = Arc::new(ContentGenerator::new(
            ports.llm.clone(),
            ports.content.clone(),
            ports.topics.clone(),
            ports.time_provider.clone(),
            settings.quote_generation_chance,
        ));
        let content = Arc::new(ContentService::new(
            generator,
            ports.content.clone(),
            ports.topics.clone(),
            ports.conversations.clone(),
            ports.cache.clone(),
            videos.clone(),
            tasks.clone(),
            ports.time_provider.clone(),
        ));
        let recommendations = Arc::new(RecommendationService::new(
            topics.clone(),
            videos.clone(),
            ports.content.clone(),
            ports.cache.clone(),
            tasks.clone(),
            ports.time_provider.clone(),
        ));
        let chat = Arc::new(ChatService::new(
            ports.llm.clone(),
            ports.conversations.clone(),
            ports.topics.clone(),
            topics.clone(),
            recommendations.clone(),
            ports.cache.clone(),
            tasks.clone(),
            ports.time_provider.clone(),
        ));
        let executor = Arc::new(ContentTaskExecutor::new(
            topics.clone(),
            content.clone(),
            recommendations.clone(),
            tasks.clone(),
            ports.clone(),
            settings.maintenance,
        ));

        Self {
            ports,
            tasks,
            topics,
            videos,
            content,
            recommendations,
            chat,
            executor,
        }
    }
}
