//! Solace server - composition root
//!
//! Wires SQLite, Azure OpenAI and YouTube adapters into the application
//! services, then runs workers, the beat schedule and the JSON-RPC server
//! until Ctrl+C.

mod settings;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use settings::Settings;
use solace_api_rpc::{RateLimiter, RpcServer, RpcServerConfig};
use solace_core::application::tasks::BACKGROUND_PRIORITY;
use solace_core::application::{
    shutdown_channel, Beat, Ports, RecoveryService, RetryPolicy, ServiceSettings, Services, Worker,
    DEFAULT_QUEUE,
};
use solace_core::domain::{Language, LanguagePayload, TaskKind};
use solace_core::port::id_provider::UuidProvider;
use solace_core::port::time_provider::SystemTimeProvider;
use solace_infra_ai::{AzureOpenAiClient, YouTubeClient};
use solace_infra_sqlite::{
    create_pool, run_migrations, SqliteCache, SqliteContentStore, SqliteConversationStore,
    SqliteJobRepository, SqliteMaintenance, SqliteTopicStore,
};

const WORKER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;
    let telemetry = telemetry::init()?;

    info!("Solace server v{} starting...", solace_core::VERSION);

    // 1. Database
    if let Some(dir) = settings.database.parent_dir() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let db_url = settings.database.url();
    info!(db_url = %db_url, "Initializing database...");
    let pool = create_pool(&db_url)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 2. Adapters
    let time_provider = Arc::new(SystemTimeProvider);
    let job_repo = Arc::new(SqliteJobRepository::new(pool.clone(), time_provider.clone()));
    let video_search = YouTubeClient::new(
        settings.video.api_key.clone(),
        Duration::from_secs(settings.video.timeout_secs),
    )
    .map_err(|e| anyhow::anyhow!("YouTube client setup failed: {}", e))?;

    let ports = Ports {
        job_repo: job_repo.clone(),
        tx_repo: job_repo.clone(),
        id_provider: Arc::new(UuidProvider),
        time_provider: time_provider.clone(),
        llm: Arc::new(AzureOpenAiClient::new(settings.azure_settings())),
        video_search: Arc::new(video_search),
        conversations: Arc::new(SqliteConversationStore::new(pool.clone(), time_provider.clone())),
        topics: Arc::new(SqliteTopicStore::new(pool.clone(), time_provider.clone())),
        content: Arc::new(SqliteContentStore::new(pool.clone(), time_provider.clone())),
        cache: Arc::new(SqliteCache::new(pool.clone(), time_provider.clone())),
        maintenance: Arc::new(SqliteMaintenance::new(pool.clone(), time_provider.clone())),
    };

    let services = Services::build(
        ports,
        ServiceSettings {
            video_cache_ttl_secs: settings.video.cache_ttl_secs,
            quote_generation_chance: settings.content.quote_generation_chance,
            maintenance: settings.maintenance_config(),
        },
    );

    // 3. Crash recovery
    info!("Running crash recovery...");
    let recovery = RecoveryService::new(job_repo.clone(), time_provider.clone(), None);
    match recovery.recover_orphaned_jobs().await {
        Ok(count) => info!(recovered_jobs = count, "Crash recovery completed"),
        Err(e) => error!(error = ?e, "Crash recovery failed"),
    }

    // 4. JSON-RPC server
    let rpc_config = RpcServerConfig {
        host: settings.rpc.host.clone(),
        port: settings.rpc.port,
    };
    let rate_limiter = Arc::new(RateLimiter::new(
        settings.rate_limit.burst,
        settings.rate_limit.rate_per_sec,
    ));
    let rpc_handle = RpcServer::new(
        rpc_config,
        services.clone(),
        rate_limiter,
        settings.maintenance_config(),
    )
    .start()
    .await
    .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 5. Workers
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let retry_policy = Arc::new(RetryPolicy::new(
        time_provider.clone(),
        settings.worker.retry_base_delay_ms,
    ));

    info!(count = settings.worker.count, "Starting workers...");
    let mut worker_handles = Vec::with_capacity(settings.worker.count);
    for index in 0..settings.worker.count {
        let worker = Worker::new(
            DEFAULT_QUEUE,
            job_repo.clone(),
            services.executor.clone(),
            retry_policy.clone(),
            time_provider.clone(),
        )
        .with_name(format!("worker-{}", index));
        let shutdown = shutdown_rx.clone();
        worker_handles.push(tokio::spawn(async move {
            if let Err(e) = worker.run(shutdown).await {
                error!(error = ?e, "Worker failed");
            }
        }));
    }

    // 6. Beat schedule
    let beat_handles = if settings.beat.enabled {
        Beat::new(services.tasks.clone(), settings.beat.to_beat_config().entries())
            .spawn(shutdown_rx.clone())
    } else {
        warn!("Beat schedule disabled");
        Vec::new()
    };

    // 7. Startup content for the default language
    match services
        .tasks
        .submit(
            TaskKind::InitializeStartupContent,
            format!("initial_content:{}", Language::default()),
            &LanguagePayload::default(),
            BACKGROUND_PRIORITY,
            None,
        )
        .await
    {
        Ok(task_id) => info!(task_id = %task_id, "Startup content generation queued"),
        Err(e) => warn!(error = %e, "Failed to queue startup content generation"),
    }

    info!(
        llm_configured = services.ports.llm.is_configured(),
        video_api_configured = services.ports.video_search.is_configured(),
        "System ready"
    );

    // 8. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    for handle in worker_handles.into_iter().chain(beat_handles) {
        if tokio::time::timeout(WORKER_STOP_TIMEOUT, handle).await.is_err() {
            warn!("Background task did not stop in time");
        }
    }
    pool.close().await;

    info!("Shutdown complete.");
    telemetry.shutdown();
    Ok(())
}
