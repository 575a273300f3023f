use anyhow::Context;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::TelemetryConfig;

/// Handle on the installed trace pipeline; flush it with [`Telemetry::shutdown`].
pub struct Telemetry {
    provider: Option<SdkTracerProvider>,
}

/// Install the global subscriber: `RUST_LOG` filtered console output, plus an
/// OTLP exporter when `telemetry.otlp_endpoint` is set.
pub fn init_tracing(config: &TelemetryConfig) -> anyhow::Result<Telemetry> {
    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|endpoint| build_provider(&config.service_name, endpoint))
        .transpose()?;

    let otel = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer(config.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(otel)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(p) = &provider {
        global::set_tracer_provider(p.clone());
        info!(
            service = %config.service_name,
            endpoint = ?config.otlp_endpoint,
            "OpenTelemetry export enabled"
        );
    }

    Ok(Telemetry { provider })
}

fn build_provider(service_name: &str, endpoint: &str) -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(collector_url(endpoint))
        .build()
        .context("Failed to create OTLP span exporter")?;

    Ok(SdkTracerProvider::builder()
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_string())
                .build(),
        )
        .with_batch_exporter(exporter)
        .build())
}

/// Collectors are usually configured as bare `host:port`; the exporter needs a URL.
fn collector_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

impl Telemetry {
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }

    /// Flush buffered spans and stop the exporter.
    pub async fn shutdown(self) {
        let Some(provider) = self.provider else {
            return;
        };
        match tokio::task::spawn_blocking(move || provider.shutdown()).await {
            Ok(Ok(())) => info!("Trace exporter shut down"),
            Ok(Err(e)) => warn!(error = %e, "Trace exporter shutdown failed"),
            Err(e) => warn!(error = %e, "Trace exporter shutdown task failed"),
        }
    }
}
