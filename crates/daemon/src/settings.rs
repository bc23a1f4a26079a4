//! Server configuration
//!
//! Layers, lowest first: built-in defaults, `solace.toml` (or the file named
//! by `SOLACE_CONFIG`), `SOLACE__SECTION__KEY` environment variables. A
//! `.env` file is loaded before reading the environment. The provider
//! variables (`AZURE_OPENAI_*`, `YOUTUBE_API_KEY`) override everything.

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use solace_core::application::BeatConfig;
use solace_core::port::MaintenanceConfig;
use solace_infra_ai::AzureOpenAiSettings;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "solace.toml";
const DEFAULT_DB_PATH: &str = "~/.solace/solace.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// File path (`~` allowed) or a full `sqlite:` URL
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
        }
    }
}

impl DatabaseSettings {
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            return self.path.clone();
        }
        format!("sqlite://{}", shellexpand::tilde(&self.path))
    }

    /// Directory that must exist before the database file can be created
    pub fn parent_dir(&self) -> Option<PathBuf> {
        if self.path.starts_with("sqlite:") {
            return None;
        }
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcSettings {
    pub host: String,
    pub port: u16,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9527,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub count: usize,
    pub retry_base_delay_ms: i64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            count: 2,
            retry_base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatSettings {
    pub enabled: bool,
    pub daily_content_secs: u64,
    pub all_topics_content_secs: u64,
    pub popular_topics_secs: u64,
    pub cleanup_secs: u64,
}

impl Default for BeatSettings {
    fn default() -> Self {
        let beat = BeatConfig::default();
        Self {
            enabled: true,
            daily_content_secs: beat.daily_content_secs,
            all_topics_content_secs: beat.all_topics_content_secs,
            popular_topics_secs: beat.popular_topics_secs,
            cleanup_secs: beat.cleanup_secs,
        }
    }
}

impl BeatSettings {
    pub fn to_beat_config(&self) -> BeatConfig {
        BeatConfig {
            daily_content_secs: self.daily_content_secs,
            all_topics_content_secs: self.all_topics_content_secs,
            popular_topics_secs: self.popular_topics_secs,
            cleanup_secs: self.cleanup_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub api_key: Option<String>,
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            cache_ttl_secs: 6 * 3600,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    pub quote_generation_chance: f64,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            quote_generation_chance: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub burst: u32,
    pub rate_per_sec: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            burst: 20,
            rate_per_sec: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceSettings {
    pub finished_job_retention_days: i64,
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        let defaults = MaintenanceConfig::default();
        Self {
            finished_job_retention_days: defaults.finished_job_retention_days,
            max_db_size_mb: defaults.max_db_size_mb,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub rpc: RpcSettings,
    pub worker: WorkerSettings,
    pub beat: BeatSettings,
    pub video: VideoSettings,
    pub content: ContentSettings,
    pub rate_limit: RateLimitSettings,
    pub azure_openai: AzureSettings,
    pub maintenance: MaintenanceSettings,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    let defaults = Config::try_from(&Settings::default()).context("Invalid default settings")?;
    Ok(Config::builder().add_source(defaults))
}

impl Settings {
    /// Load every layer from the process environment
    pub fn load() -> Result<Self> {
        // A missing .env is normal
        let _ = dotenvy::dotenv();

        let path = std::env::var("SOLACE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let path = shellexpand::tilde(&path).into_owned();

        let mut settings: Settings = defaults()?
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("SOLACE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration ({})", path))?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.apply_provider_overrides(|name| std::env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Apply the provider variables; blank values are ignored
    pub fn apply_provider_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let azure = &mut self.azure_openai;
        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            azure.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            azure.api_key = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_DEPLOYMENT_NAME") {
            azure.deployment = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            azure.api_version = Some(v);
        }
        if let Some(v) = get("YOUTUBE_API_KEY") {
            self.video.api_key = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.worker.count > 0, "worker.count must be at least 1");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.content.quote_generation_chance),
            "content.quote_generation_chance must be within 0..=1"
        );
        anyhow::ensure!(self.rate_limit.burst > 0, "rate_limit.burst must be at least 1");
        Ok(())
    }

    pub fn azure_settings(&self) -> AzureOpenAiSettings {
        AzureOpenAiSettings {
            endpoint: self.azure_openai.endpoint.clone(),
            api_key: self.azure_openai.api_key.clone(),
            deployment: self.azure_openai.deployment.clone(),
            api_version: self.azure_openai.api_version.clone(),
            timeout_secs: self.azure_openai.timeout_secs,
        }
    }

    pub fn maintenance_config(&self) -> MaintenanceConfig {
        MaintenanceConfig {
            finished_job_retention_days: self.maintenance.finished_job_retention_days,
            max_db_size_mb: self.maintenance.max_db_size_mb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::collections::HashMap;

    fn from_toml(toml: &str) -> Settings {
        defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.rpc.port, 9527);
        assert_eq!(settings.worker.count, 2);
        assert_eq!(settings.beat.popular_topics_secs, 900);
        assert_eq!(settings.video.cache_ttl_secs, 21_600);
        assert_eq!(settings.maintenance.finished_job_retention_days, 7);
        assert!(settings.azure_openai.endpoint.is_none());
        tokio_test::assert_ok!(settings.validate());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let settings = from_toml(
            r#"
            [worker]
            count = 4

            [database]
            path = "sqlite::memory:"

            [content]
            quote_generation_chance = 0.5
            "#,
        );
        assert_eq!(settings.worker.count, 4);
        assert_eq!(settings.worker.retry_base_delay_ms, 1000);
        assert_eq!(settings.database.url(), "sqlite::memory:");
        assert!(settings.database.parent_dir().is_none());
        assert_eq!(settings.content.quote_generation_chance, 0.5);
    }

    #[test]
    fn test_provider_variables_override() {
        let env: HashMap<&str, &str> = [
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "secret"),
            ("AZURE_OPENAI_DEPLOYMENT_NAME", "  "),
            ("YOUTUBE_API_KEY", "yt-key"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.azure_openai.deployment = Some("from-file".to_string());
        settings.apply_provider_overrides(|name| env.get(name).map(|v| v.to_string()));

        let azure = settings.azure_settings();
        assert_eq!(azure.endpoint.as_deref(), Some("https://example.openai.azure.com"));
        assert_eq!(azure.deployment.as_deref(), Some("from-file"));
        assert_eq!(settings.video.api_key.as_deref(), Some("yt-key"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut settings = Settings::default();
        settings.worker.count = 0;
        tokio_test::assert_err!(settings.validate());

        let mut settings = Settings::default();
        settings.content.quote_generation_chance = 1.5;
        tokio_test::assert_err!(settings.validate());
    }

    #[test]
    fn test_plain_path_becomes_url() {
        let db = DatabaseSettings {
            path: "/var/lib/solace/solace.db".to_string(),
        };
        assert_eq!(db.url(), "sqlite:///var/lib/solace/solace.db");
        assert_eq!(db.parent_dir(), Some(PathBuf::from("/var/lib/solace")));
    }
}
