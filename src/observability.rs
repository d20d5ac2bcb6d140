//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Distributed tracing with OpenTelemetry
//! - Metrics collection and Prometheus export
//! - Liveness and readiness endpoints next to `/metrics`

mod metrics;
mod tracing_mod;

use anyhow::Result;

use crate::observability_config::ObservabilityConfig;

pub use self::metrics::{
    init_metrics_with_config, record_conversion_metrics, record_moderation_action,
    record_state_save, record_telegram_message, record_tracked_chats, route_request,
    start_metrics_server_with_config,
};
pub use self::tracing_mod::{
    conversion_span, init_opentelemetry_tracing_with_config, init_tracing_with_config,
    telegram_span,
};

/// Initialize the complete observability stack with custom configuration
pub async fn init_observability_with_config(config: ObservabilityConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    // Tracing first so the rest of the setup is logged
    init_tracing_with_config(&config)?;

    init_opentelemetry_tracing_with_config(&config)?;
    if config.is_production() && config.otlp_endpoint.is_none() {
        tracing::warn!("Running in production without an OTLP endpoint, traces are not exported");
    }

    if config.enable_metrics_export {
        let metrics_handle = init_metrics_with_config(&config)?;
        start_metrics_server_with_config(metrics_handle, &config).await?;
    } else {
        tracing::info!("Metrics export disabled");
    }

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_port = %config.metrics_port,
        "Observability stack initialized successfully"
    );
    Ok(())
}
