// Video Search Port

use crate::domain::{Language, Video};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum VideoSearchError {
    #[error("Video search is not configured")]
    NotConfigured,

    #[error("Video search quota exceeded")]
    QuotaExceeded,

    #[error("Video search HTTP error: {0}")]
    Http(String),

    #[error("Video search response could not be decoded: {0}")]
    Decode(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Search videos for an already enhanced query
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        language: Language,
    ) -> Result<Vec<Video>, VideoSearchError>;

    /// Whether an API key is present
    fn is_configured(&self) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns the same videos for every query
    pub struct FixedVideoSearch {
        videos: Vec<Video>,
        configured: bool,
        calls: AtomicUsize,
    }

    impl FixedVideoSearch {
        pub fn new(videos: Vec<Video>) -> Self {
            Self {
                videos,
                configured: true,
                calls: AtomicUsize::new(0),
            }
        }

        /// Behaves like a deployment without an API key
        pub fn unconfigured() -> Self {
            Self {
                videos: Vec::new(),
                configured: false,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VideoSearch for FixedVideoSearch {
        async fn search(
            &self,
            _query: &str,
            max_results: u32,
            _language: Language,
        ) -> Result<Vec<Video>, VideoSearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.configured {
                return Err(VideoSearchError::NotConfigured);
            }
            Ok(self
                .videos
                .iter()
                .take(max_results as usize)
                .cloned()
                .collect())
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    /// Minimal video for tests
    pub fn video(id: &str, view_count: u64) -> Video {
        Video {
            id: id.to_string(),
            title: format!("Video {}", id),
            description: String::new(),
            thumbnail: format!("https://img.youtube.com/vi/{}/mqdefault.jpg", id),
            channel: "Test Channel".to_string(),
            published_at: None,
            duration: "PT5M0S".to_string(),
            view_count,
            like_count: 0,
            url: Video::watch_url(id),
            formatted_duration: None,
        }
    }
}
