//! Logging and optional OpenTelemetry trace export.
//!
//! Console logging through `tracing-subscriber` is always on, filtered by `RUST_LOG` (default
//! `info`). Setting `enable_otel_export: true` in the config additionally ships spans over OTLP
//! HTTP, configured through the standard environment variables:
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` (default `http://localhost:4318`)
//! - `OTEL_EXPORTER_OTLP_PROTOCOL`: `http/protobuf` (default) or `http/json`
//! - `OTEL_EXPORTER_OTLP_HEADERS`: comma separated `key=value` pairs, `%20` decodes to a space
//! - `OTEL_SERVICE_NAME` (default `kitchen`)
//!
//! ```bash
//! export OTEL_EXPORTER_OTLP_ENDPOINT="https://otlp-gateway.example.com/otlp"
//! export OTEL_EXPORTER_OTLP_HEADERS="Authorization=Basic%20<token>"
//! ```
//!
//! `tracing-opentelemetry` holds a clone of the tracer rather than the provider, so the provider
//! is kept in [`TRACER_PROVIDER`] for [`shutdown_telemetry`] to flush.

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{Protocol, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_SERVICE_NAME: &str = "kitchen";
const DEFAULT_ENDPOINT: &str = "http://localhost:4318";

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Install the global subscriber. Falls back to console-only logging when the exporter cannot
/// be built.
pub fn init_telemetry(enable_otel_export: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if !enable_otel_export {
        registry.try_init()?;
        info!("Telemetry initialized (OTLP export disabled)");
        return Ok(());
    }

    match create_otlp_tracer() {
        Ok(tracer) => {
            registry.with(tracing_opentelemetry::layer().with_tracer(tracer)).try_init()?;
            info!("Telemetry initialized with OTLP export enabled");
        }
        Err(e) => {
            registry.try_init()?;
            info!("Telemetry initialized without OTLP export: {}", e);
        }
    }
    Ok(())
}

/// Parse `OTEL_EXPORTER_OTLP_HEADERS`.
fn parse_headers(raw: &str) -> HashMap<String, String> {
    raw.replace("%20", " ")
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn parse_protocol(raw: Option<&str>) -> Protocol {
    match raw {
        Some("http/json") => Protocol::HttpJson,
        _ => Protocol::HttpBinary,
    }
}

fn create_otlp_tracer() -> anyhow::Result<opentelemetry_sdk::trace::Tracer> {
    let service_name = std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let headers = std::env::var("OTEL_EXPORTER_OTLP_HEADERS")
        .map(|raw| parse_headers(&raw))
        .unwrap_or_default();
    let protocol = parse_protocol(std::env::var("OTEL_EXPORTER_OTLP_PROTOCOL").ok().as_deref());

    // The subscriber is not installed yet
    eprintln!(
        "[OTLP] service={service_name} endpoint={endpoint} headers={}",
        headers.len()
    );

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(&endpoint)
        .with_protocol(protocol)
        .with_headers(headers)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            opentelemetry_sdk::Resource::builder()
                .with_attribute(KeyValue::new("service.name", service_name.clone()))
                .build(),
        )
        .build();

    let tracer = tracer_provider.tracer(service_name);
    let _ = TRACER_PROVIDER.set(tracer_provider);

    Ok(tracer)
}

/// Flush pending spans. Call before the process exits.
pub fn shutdown_telemetry() {
    if let Some(provider) = TRACER_PROVIDER.get()
        && let Err(e) = provider.shutdown()
    {
        tracing::error!("Failed to shutdown tracer provider: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers("Authorization=Basic%20abc123, x-team = kitchen,broken,=nokey");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Authorization"], "Basic abc123");
        assert_eq!(headers["x-team"], "kitchen");
    }

    #[test]
    fn test_parse_protocol() {
        assert!(matches!(parse_protocol(Some("http/json")), Protocol::HttpJson));
        assert!(matches!(parse_protocol(Some("http/protobuf")), Protocol::HttpBinary));
        assert!(matches!(parse_protocol(Some("grpc")), Protocol::HttpBinary));
        assert!(matches!(parse_protocol(None), Protocol::HttpBinary));
    }

    #[test]
    fn test_shutdown_without_exporter_is_noop() {
        shutdown_telemetry();
    }
}
