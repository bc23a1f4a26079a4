//! JSON-RPC API Layer
//!
//! Exposes chat, task, user, content and admin operations of the Solace
//! backend as versioned JSON-RPC 2.0 methods over HTTP.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use rate_limiter::RateLimiter;
pub use server::{RpcServer, RpcServerConfig};
