use std::time::Duration;

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::Config;

const SERVICE_NAME: &str = "timescar_harvester";

/// Keeps the log file writer and the span exporter alive until shutdown
pub struct Telemetry {
    _file_guard: WorkerGuard,
    provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Flushes spans still buffered for the collector
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("error shutting down the tracer provider: {e}");
            }
        }
    }
}

pub fn init_tracing(config: &Config) -> anyhow::Result<Telemetry> {
    let provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_timeout(Duration::from_millis(1000))
                .build()
                .context("couldn't build the OTLP span exporter")?;

            Some(
                SdkTracerProvider::builder()
                    .with_batch_exporter(exporter)
                    .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
                    .build(),
            )
        }
        None => None,
    };

    let telemetry_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let appender = tracing_appender::rolling::daily(&config.log_dir, "timescar_harvester.log");
    let (non_blocking_appender, file_guard) = tracing_appender::non_blocking(appender);

    // A layer that logs events to rolling files.
    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false)
        .pretty();

    let stdout_log = tracing_subscriber::fmt::layer().compact();

    Registry::default()
        .with(telemetry_layer)
        .with(file_log)
        .with(stdout_log)
        .with(env_filter)
        .try_init()
        .context("couldn't install the tracing subscriber")?;

    Ok(Telemetry {
        _file_guard: file_guard,
        provider,
    })
}
