// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize telemetry (logs + metrics)
///
/// Safe to call more than once; later calls leave the first installation in place.
pub fn init_telemetry() {
    // 1. Initialize Tracing (Logs)
    let installed = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "quintet_node=info,quintet_kernel=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }

    // 2. Initialize Metrics (Prometheus)
    if PROM_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROM_HANDLE.set(handle).is_err() {
                tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "metrics recorder not installed");
            return;
        }
    }

    metrics::describe_counter!("quintet_transitions_committed_total", "Transitions committed");
    metrics::describe_counter!("quintet_transitions_rejected_total", "Transitions rejected");
    metrics::describe_counter!("quintet_transitions_halted_total", "Transitions that halted the engine");
    metrics::describe_counter!("quintet_incidents_total", "Incident records by decision");
    metrics::describe_histogram!("quintet_commit_duration_seconds", "Time to evaluate and persist one submission");
    metrics::describe_histogram!("quintet_replay_duration_seconds", "Time to replay an event log");
    metrics::describe_gauge!("quintet_sequence_id", "Sequence id of the canonical state");
    metrics::describe_gauge!("quintet_snapshot_size_bytes", "Size of the last saved snapshot in bytes");

    // Ensure at least one metric exists on startup
    metrics::gauge!("quintet_node_up", 1.0);
}

/// Prometheus text exposition of every recorded metric.
pub fn render_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_after_init() {
        init_telemetry();
        init_telemetry();
        metrics::increment_counter!("quintet_transitions_committed_total");
        let text = render_metrics();
        assert!(text.contains("quintet_transitions_committed_total"));
    }
}
