//! Solace SDK - Rust Client Library
//!
//! Typed client for the Solace server's JSON-RPC API.
//!
//! # Example
//!
//! ```no_run
//! use solace_sdk::SolaceClient;
//! use solace_core::application::ChatRequest;
//! use solace_core::domain::Language;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SolaceClient::connect("http://127.0.0.1:9527").await?;
//!
//!     let mut request = ChatRequest::new("I worry about exams");
//!     request.language = Language::En;
//!     let reply = client.chat(request).await?;
//!     println!("{}", reply.response);
//!
//!     // Topic extraction runs in the background
//!     if let Some(task_id) = reply.topic_task_id {
//!         let status = client
//!             .wait_for_task(&task_id, Duration::from_millis(500), 20)
//!             .await?;
//!         println!("topic task: {}", status.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::SolaceClient;
pub use error::{code, Result, SdkError};
pub use types::{
    ArticleList, CacheClearResult, ClearHistoryResult, DeleteUserResult, Health,
    MaintenanceResult, MessageResult, Stats, TopicRefresh, UserTopic, VideoList,
};
