//! JSON-RPC Server
//!
//! Serves the versioned JSON-RPC 2.0 methods over HTTP.

use crate::handler::RpcHandler;
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ArticlesRequest, ClearHistoryRequest, DailyQuoteRequest, GenerateRequest, LanguageRequest,
    MaintenanceRequest, TaskRequest, UserLanguageRequest, UserRequest, VideosRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use solace_core::application::{ChatRequest, Services};
use solace_core::port::MaintenanceConfig;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9527;

/// Every method the server registers
pub const METHODS: &[&str] = &[
    "system.health.v1",
    "chat.send.v1",
    "chat.clear_history.v1",
    "task.status.v1",
    "task.cancel.v1",
    "user.topic.v1",
    "user.topic.refresh.v1",
    "user.recommendations.v1",
    "user.delete.v1",
    "content.daily_quote.v1",
    "content.articles.v1",
    "content.videos.v1",
    "content.generate.v1",
    "content.initial.v1",
    "content.personalized.v1",
    "video.cache_status.v1",
    "video.cache_clear.v1",
    "video.force_retry.v1",
    "admin.stats.v1",
    "admin.maintenance.v1",
];

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

impl RpcServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Params are required
macro_rules! register {
    ($module:expr, $name:literal, $req:ty, $method:ident) => {
        $module
            .register_async_method($name, |params, handler, _| async move {
                let req: $req = params.parse()?;
                handler.$method(req).await
            })
            .map_err(|e| e.to_string())?;
    };
}

// Params may be omitted; missing fields take their defaults
macro_rules! register_optional {
    ($module:expr, $name:literal, $req:ty, $method:ident) => {
        $module
            .register_async_method($name, |params, handler, _| async move {
                let req: Option<$req> = params.parse()?;
                handler.$method(req.unwrap_or_default()).await
            })
            .map_err(|e| e.to_string())?;
    };
}

macro_rules! register_no_params {
    ($module:expr, $name:literal, $method:ident) => {
        $module
            .register_async_method($name, |_, handler, _| async move {
                handler.$method().await
            })
            .map_err(|e| e.to_string())?;
    };
}

/// Build the module with every method bound to the handler
pub fn build_module(handler: RpcHandler) -> Result<RpcModule<RpcHandler>, String> {
    let mut module = RpcModule::new(handler);

    register_no_params!(module, "system.health.v1", health);

    register!(module, "chat.send.v1", ChatRequest, chat);
    register_optional!(module, "chat.clear_history.v1", ClearHistoryRequest, clear_history);

    register!(module, "task.status.v1", TaskRequest, task_status);
    register!(module, "task.cancel.v1", TaskRequest, task_cancel);

    register!(module, "user.topic.v1", UserRequest, user_topic);
    register!(module, "user.topic.refresh.v1", UserRequest, refresh_topic);
    register!(module, "user.recommendations.v1", UserLanguageRequest, recommendations);
    register!(module, "user.delete.v1", UserRequest, delete_user);

    register_optional!(module, "content.daily_quote.v1", DailyQuoteRequest, daily_quote);
    register_optional!(module, "content.articles.v1", ArticlesRequest, articles);
    register_optional!(module, "content.videos.v1", VideosRequest, videos);
    register!(module, "content.generate.v1", GenerateRequest, generate);
    register_optional!(module, "content.initial.v1", LanguageRequest, initial_content);
    register!(module, "content.personalized.v1", UserLanguageRequest, personalized_content);

    register_no_params!(module, "video.cache_status.v1", video_cache_status);
    register_no_params!(module, "video.cache_clear.v1", video_cache_clear);
    register_no_params!(module, "video.force_retry.v1", video_force_retry);

    register_no_params!(module, "admin.stats.v1", stats);
    register_optional!(module, "admin.maintenance.v1", MaintenanceRequest, maintenance);

    Ok(module)
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: RpcHandler,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        services: Services,
        rate_limiter: Arc<RateLimiter>,
        maintenance_config: MaintenanceConfig,
    ) -> Self {
        Self {
            config,
            handler: RpcHandler::new(services, rate_limiter, maintenance_config),
        }
    }

    /// Bind and start serving; the returned handle stops the server
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = self.config.addr();

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let module = build_module(self.handler)?;
        info!(methods = module.method_names().count(), "JSON-RPC server started");

        Ok(server.start(module))
    }
}
