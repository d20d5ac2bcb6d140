//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Prometheus recorder setup
//! - A minimal HTTP server for `/metrics` and health probes
//! - Metrics recording functions used by the bot

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::observability_config::ObservabilityConfig;

/// Initialize metrics collection with Prometheus exporter and configuration
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        "Metrics collection initialized"
    );
    Ok(handle)
}

/// Build the response for one HTTP request to the metrics server
pub fn route_request(
    method: &hyper::Method,
    path: &str,
    render_metrics: impl FnOnce() -> String,
) -> hyper::Response<String> {
    match (method, path) {
        (&hyper::Method::GET, "/metrics") => hyper::Response::new(render_metrics()),
        (&hyper::Method::GET, "/health/live") | (&hyper::Method::GET, "/health/ready") => {
            hyper::Response::new("OK".to_string())
        }
        _ => {
            let mut response = hyper::Response::new("Not Found".to_string());
            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
            response
        }
    }
}

/// Address the metrics server listens on
///
/// Localhost only unless all interfaces were asked for.
pub fn metrics_bind_addr(config: &ObservabilityConfig) -> SocketAddr {
    if config.metrics_bind_all_interfaces {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), config.metrics_port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), config.metrics_port)
    }
}

/// Start the metrics server with basic health checks
pub async fn start_metrics_server_with_config(
    metrics_handle: PrometheusHandle,
    config: &ObservabilityConfig,
) -> Result<()> {
    let addr = metrics_bind_addr(config);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on {}", addr);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let metrics_handle = metrics_handle.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let metrics_handle = metrics_handle.clone();
                                async move {
                                    Ok::<_, std::convert::Infallible>(route_request(
                                        req.method(),
                                        req.uri().path(),
                                        || metrics_handle.render(),
                                    ))
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            tracing::error!("Error serving connection: {:?}", err);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                }
            }
        }
    });

    Ok(())
}

/// Record a unit conversion request
pub fn record_conversion_metrics(unit: &str, outcome: &str, duration: Duration) {
    let unit = unit.to_string();
    let outcome = outcome.to_string();
    metrics::counter!("unit_conversions_total", "unit" => unit, "outcome" => outcome).increment(1);
    metrics::histogram!("unit_conversion_duration_seconds").record(duration.as_secs_f64());
}

/// Record Telegram message processing metrics
pub fn record_telegram_message(message_type: &str) {
    let message_type = message_type.to_string();
    metrics::counter!("telegram_messages_total", "type" => message_type).increment(1);
}

/// Record a mute/unmute/kick attempt
pub fn record_moderation_action(action: &str, success: bool) {
    let action = action.to_string();
    metrics::counter!(
        "moderation_actions_total",
        "action" => action,
        "outcome" => if success { "success" } else { "failure" }
    )
    .increment(1);
}

/// Record a chat state save
pub fn record_state_save(success: bool, duration: Duration) {
    metrics::counter!("state_saves_total", "outcome" => if success { "success" } else { "failure" })
        .increment(1);
    metrics::histogram!("state_save_duration_seconds").record(duration.as_secs_f64());
}

/// Update the number of tracked chats
pub fn record_tracked_chats(count: usize) {
    metrics::gauge!("tracked_chats").set(count as f64);
}
