//! Logging and tracing setup
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `solace=info`)
//! - `SOLACE_LOG_FORMAT`: `pretty` (default) or `json`
//! - `SOLACE_LOG_DIR`: also write JSON logs to a daily rolling file there
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint, used with the `telemetry` feature
//! - `OTEL_SERVICE_NAME`: service name (default: solace-server)

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const DEFAULT_FILTER: &str = "solace=info";
const LOG_FILE_PREFIX: &str = "solace.log";

/// Keeps background writers alive; flushes them on drop
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl TelemetryGuard {
    pub fn shutdown(self) {
        #[cfg(feature = "telemetry")]
        {
            if let Some(provider) = &self.tracer_provider {
                if let Err(e) = provider.shutdown() {
                    eprintln!("OpenTelemetry shutdown failed: {}", e);
                }
            }
        }
        drop(self);
    }
}

/// Install the global subscriber
pub fn init() -> Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Invalid log filter")?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let format = std::env::var("SOLACE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    layers.push(match format.as_str() {
        "json" => fmt::layer().json().boxed(),
        _ => fmt::layer().pretty().boxed(),
    });

    let file_guard = match std::env::var("SOLACE_LOG_DIR") {
        Ok(dir) => {
            let dir = shellexpand::tilde(&dir).into_owned();
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().json().with_ansi(false).with_writer(writer).boxed());
            Some(guard)
        }
        Err(_) => None,
    };

    #[cfg(feature = "telemetry")]
    let tracer_provider = match otel_layer()? {
        Some((layer, provider)) => {
            layers.push(layer);
            Some(provider)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    #[cfg(not(feature = "telemetry"))]
    {
        if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
            tracing::warn!("OTLP endpoint set but feature 'telemetry' not enabled");
        }
    }

    Ok(TelemetryGuard {
        _file_guard: file_guard,
        #[cfg(feature = "telemetry")]
        tracer_provider,
    })
}

#[cfg(feature = "telemetry")]
fn otel_layer() -> Result<Option<(BoxedLayer, opentelemetry_sdk::trace::TracerProvider)>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};

    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok(None);
    };
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "solace-server".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to build OTLP exporter")?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();
    let tracer = provider.tracer(service_name);
    opentelemetry::global::set_tracer_provider(provider.clone());

    let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();
    Ok(Some((layer, provider)))
}
