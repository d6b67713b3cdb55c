//! # Observability
//!
//! Tracing, Prometheus metrics and the stage log channel.
//!
//! ## Features
//!
//! - Tracing initialization (JSON/Pretty/Compact)
//! - Prometheus metrics export
//! - Per-stage log handles drained by a single aggregator task
//! - Running statistics for the end-of-run summary
//!
//! ## Example
//!
//! ```ignore
//! use contracts::StageName;
//! use observability::{LogChannel, ObservabilityConfig};
//!
//! observability::init_with_config(ObservabilityConfig::default())?;
//!
//! let (channel, rx) = LogChannel::new(1024);
//! let aggregator = observability::LogAggregator::spawn(rx);
//! let logger = channel.logger(StageName::Source);
//! logger.info("streamer started");
//! drop((channel, logger));
//! aggregator.await?;
//! ```

pub mod log_channel;
pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::log_channel::{LogAggregator, LogChannel, StageLogger};
pub use crate::metrics::{
    record_frame_captured, record_frame_detected, record_frame_rendered, record_log_dropped,
    record_protocol_violation, record_region_pixelated, record_reorder_depth, RunningStats,
    StatsSummary,
};

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Level used when `RUST_LOG` is unset or ignored
    pub default_log_level: String,
    /// Read `RUST_LOG` before falling back to `default_log_level`
    pub respect_env: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            default_log_level: "info".to_string(),
            respect_env: true,
        }
    }
}

impl ObservabilityConfig {
    /// Filter for this configuration
    pub fn env_filter(&self) -> EnvFilter {
        if self.respect_env {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
        } else {
            EnvFilter::new(&self.default_log_level)
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable
    #[default]
    Pretty,
    /// Compact single line
    Compact,
}

/// Install the global tracing subscriber
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(log_format = ?config.log_format, "Tracing initialized");
    Ok(())
}

/// Install only the Prometheus exporter (tracing already set up elsewhere)
pub fn init_metrics_only(port: u16) -> Result<()> {
    let builder = PrometheusBuilder::new();
    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.default_log_level, "info");
        assert!(config.respect_env);
    }

    #[test]
    fn test_filter_ignores_env_when_asked() {
        let config = ObservabilityConfig {
            default_log_level: "warn".to_string(),
            respect_env: false,
            ..ObservabilityConfig::default()
        };
        assert_eq!(config.env_filter().to_string(), "warn");
    }
}
