// Video Service - search with result caching, quota tracking and fallbacks

use crate::domain::{topic::default_topic, Language, Video};
use crate::error::Result;
use crate::port::{TimeProvider, TopicRepository, VideoSearch, VideoSearchError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Default lifetime of cached search results (6 hours)
pub const DEFAULT_VIDEO_CACHE_TTL_SECS: u64 = 6 * 3600;

const QUERY_ENHANCEMENTS: &[(&str, &str)] = &[
    ("стресс", "как справиться со стрессом техники релаксации"),
    ("тревога", "как избавиться от тревоги техники успокоения"),
    ("депрессия", "как бороться с депрессией самопомощь"),
    ("медитация", "медитация для начинающих техники медитации"),
    ("сон", "как улучшить сон техники засыпания"),
    ("мотивация", "мотивация самосовершенствование личностный рост"),
    ("stress", "how to deal with stress relaxation techniques"),
    ("anxiety", "how to overcome anxiety calming techniques"),
    ("depression", "how to fight depression self help"),
    ("meditation", "meditation for beginners meditation techniques"),
    ("sleep", "how to improve sleep sleep techniques"),
    ("motivation", "motivation self improvement personal growth"),
];

/// Map common topics to richer search phrases and add a self-help suffix
pub fn enhance_query(query: &str, language: Language) -> String {
    let lower = query.to_lowercase();
    let base = QUERY_ENHANCEMENTS
        .iter()
        .find(|(topic, _)| *topic == lower)
        .map(|(_, phrase)| *phrase)
        .unwrap_or(query);
    match language {
        Language::Ru => format!("{} самопомощь психология", base),
        Language::En => format!("{} self help psychology", base),
    }
}

// (match, id, title, description, channel, duration, views)
type Curated = (&'static str, &'static str, &'static str, &'static str, &'static str, &'static str, u64);

const FALLBACK_EN: &[Curated] = &[
    ("stress", "dQw4w9WgXcQ", "How to Deal with Stress: 5 Effective Techniques", "Practical advice for managing stress in daily life", "Psychology and Self-Help", "PT8M30S", 150_000),
    ("meditation", "example2", "Meditation for Beginners: Step-by-Step Guide", "Simple meditation technique for those just starting out", "Meditation and Mindfulness", "PT10M15S", 89_000),
    ("motivation", "example3", "How to Find Motivation and Achieve Goals", "Practical tips for increasing motivation", "Personal Growth", "PT12M45S", 234_000),
];
const DEFAULT_EN: Curated = ("", "default1", "How to Improve Quality of Life: Practical Tips", "Simple steps to a happier and healthier life", "Psychology and Self-Help", "PT9M20S", 125_000);

const FALLBACK_RU: &[Curated] = &[
    ("стресс", "dQw4w9WgXcQ", "Как справиться со стрессом: 5 эффективных техник", "Практические советы для управления стрессом в повседневной жизни", "Психология и самопомощь", "PT8M30S", 150_000),
    ("медитация", "example2", "Медитация для начинающих: пошаговое руководство", "Простая техника медитации для тех, кто только начинает", "Медитация и осознанность", "PT10M15S", 89_000),
    ("мотивация", "example3", "Как найти мотивацию и достичь целей", "Практические советы для повышения мотивации", "Личностный рост", "PT12M45S", 234_000),
];
const DEFAULT_RU: Curated = ("", "default1", "Как улучшить качество жизни: практические советы", "Простые шаги к более счастливой и здоровой жизни", "Психология и самопомощь", "PT9M20S", 125_000);

fn curated_video(entry: &Curated) -> Video {
    let (_, id, title, description, channel, duration, views) = *entry;
    Video {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        thumbnail: format!("https://img.youtube.com/vi/{}/mqdefault.jpg", id),
        channel: channel.to_string(),
        published_at: None,
        duration: duration.to_string(),
        view_count: views,
        like_count: 0,
        url: Video::watch_url(id),
        formatted_duration: None,
    }
}

/// Curated video for a query: the first entry whose topic occurs in the query, else a default
pub fn fallback_videos(query: &str, language: Language) -> Vec<Video> {
    let (entries, default) = match language {
        Language::En => (FALLBACK_EN, &DEFAULT_EN),
        Language::Ru => (FALLBACK_RU, &DEFAULT_RU),
    };
    let lower = query.to_lowercase();
    let entry = entries
        .iter()
        .find(|(topic, ..)| lower.contains(topic))
        .unwrap_or(default);
    vec![curated_video(entry)]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoCacheStatus {
    pub cached_queries: usize,
    pub quota_exceeded: bool,
    pub api_configured: bool,
    pub cache_ttl_secs: u64,
}

type CacheKey = (String, u32, Language);

pub struct VideoService {
    search: Arc<dyn VideoSearch>,
    topics: Arc<dyn TopicRepository>,
    time_provider: Arc<dyn TimeProvider>,
    cache_ttl_secs: u64,
    cache: Mutex<HashMap<CacheKey, (Vec<Video>, i64)>>,
    quota_exceeded: AtomicBool,
}

impl VideoService {
    pub fn new(
        search: Arc<dyn VideoSearch>,
        topics: Arc<dyn TopicRepository>,
        time_provider: Arc<dyn TimeProvider>,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            search,
            topics,
            time_provider,
            cache_ttl_secs,
            cache: Mutex::new(HashMap::new()),
            quota_exceeded: AtomicBool::new(false),
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<Vec<Video>> {
        let now = self.time_provider.now_millis();
        let cache = self.cache.lock().ok()?;
        cache
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(videos, _)| videos.clone())
    }

    /// Insert a result and drop every entry that has expired
    fn store(&self, key: CacheKey, videos: &[Video]) {
        let now = self.time_provider.now_millis();
        let expires_at = now + (self.cache_ttl_secs as i64) * 1000;
        if let Ok(mut cache) = self.cache.lock() {
            cache.retain(|_, (_, expires)| *expires > now);
            cache.insert(key, (videos.to_vec(), expires_at));
        }
    }

    /// Search videos for a topic. Never fails, falls back to curated videos.
    pub async fn search(&self, topic: &str, limit: u32, language: Language) -> Vec<Video> {
        if !self.search.is_configured() {
            return fallback_videos(topic, language);
        }
        if self.quota_exceeded.load(Ordering::SeqCst) {
            info!(topic = %topic, "Video quota exceeded, serving fallback videos");
            return fallback_videos(topic, language);
        }

        let query = enhance_query(topic, language);
        let key = (query.clone(), limit, language);
        if let Some(videos) = self.cached(&key) {
            return videos;
        }

        match self.search.search(&query, limit, language).await {
            Ok(videos) => {
                info!(topic = %topic, count = videos.len(), "Video search completed");
                self.store(key, &videos);
                videos
            }
            Err(VideoSearchError::QuotaExceeded) => {
                warn!("Video search quota exceeded, switching to fallback videos");
                self.quota_exceeded.store(true, Ordering::SeqCst);
                fallback_videos(topic, language)
            }
            Err(e) => {
                warn!(topic = %topic, error = %e, "Video search failed");
                fallback_videos(topic, language)
            }
        }
    }

    /// Search every topic, most viewed first, without duplicates
    pub async fn recommend(&self, topics: &[String], per_topic: u32, language: Language) -> Vec<Video> {
        let searches = topics
            .iter()
            .map(|topic| self.search(topic, per_topic, language));
        let mut videos: Vec<Video> = futures::future::join_all(searches)
            .await
            .into_iter()
            .flatten()
            .collect();

        videos.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        let mut seen = HashSet::new();
        videos.retain(|v| seen.insert(v.id.clone()));
        videos.truncate(per_topic as usize * topics.len());
        videos
    }

    /// Videos for a topic, else for the popular topics, else a default
    pub async fn videos(&self, topic: Option<&str>, limit: u32, language: Language) -> Result<Vec<Video>> {
        let mut videos = match topic {
            Some(topic) => self.search(topic, limit, language).await,
            None => {
                let popular: Vec<String> = self
                    .topics
                    .popular(None, 3)
                    .await?
                    .into_iter()
                    .map(|t| t.topic)
                    .collect();
                if popular.is_empty() {
                    Vec::new()
                } else {
                    let mut videos = self.recommend(&popular, limit, language).await;
                    videos.truncate(limit as usize);
                    videos
                }
            }
        };
        if videos.is_empty() {
            videos = fallback_videos(default_topic(Language::En), language);
        }
        Ok(videos
            .into_iter()
            .map(Video::with_formatted_duration)
            .collect())
    }

    pub fn cache_status(&self) -> VideoCacheStatus {
        VideoCacheStatus {
            cached_queries: self.cache.lock().map(|c| c.len()).unwrap_or(0),
            quota_exceeded: self.quota_exceeded.load(Ordering::SeqCst),
            api_configured: self.search.is_configured(),
            cache_ttl_secs: self.cache_ttl_secs,
        }
    }

    pub fn clear_cache(&self) -> usize {
        self.cache
            .lock()
            .map(|mut c| {
                let n = c.len();
                c.clear();
                n
            })
            .unwrap_or(0)
    }

    /// Clear the quota flag so the next search calls the API again
    pub fn force_retry(&self) {
        self.quota_exceeded.store(false, Ordering::SeqCst);
        info!("Video quota flag cleared");
    }
}
