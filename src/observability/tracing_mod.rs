//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - OpenTelemetry distributed tracing
//! - Tracing span creation utilities

use anyhow::Result;
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::Sampler;
use tracing_subscriber::prelude::*;

use crate::observability_config::ObservabilityConfig;

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("cure_freedom_bot={}", config.log_level).parse()?)
        .add_directive("teloxide=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    if config.use_pretty_logs() {
        // Pretty formatting for development
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        // JSON formatting for production (default)
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Initialize OpenTelemetry distributed tracing with configuration
pub fn init_opentelemetry_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    // Only initialize if OTLP endpoint is configured
    let Some(endpoint) = &config.otlp_endpoint else {
        tracing::info!("OpenTelemetry tracing disabled (no OTLP endpoint configured)");
        return Ok(());
    };

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()?;

    let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_sampler(Sampler::TraceIdRatioBased(config.trace_sampling_ratio))
        .with_batch_exporter(otlp_exporter)
        .build();

    global::set_tracer_provider(tracer_provider);

    tracing::info!(
        otlp_endpoint = %endpoint,
        trace_sampling_ratio = %config.trace_sampling_ratio,
        "OpenTelemetry tracing initialized with OTLP export"
    );

    Ok(())
}

/// Create a span for Telegram bot operations
pub fn telegram_span(operation: &str, chat_id: Option<i64>) -> tracing::Span {
    tracing::info_span!(
        "telegram_operation",
        operation = operation,
        chat_id = chat_id,
        component = "telegram"
    )
}

/// Create a span for a unit conversion request
pub fn conversion_span(input: &str) -> tracing::Span {
    tracing::debug_span!(
        "unit_conversion",
        input_length = input.len(),
        component = "conversion"
    )
}
