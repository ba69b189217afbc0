//! Telemetry primitives shared across the Rackmap workspace.
//!
//! Centralises logging setup and the Prometheus metrics registry so the
//! application and delivery surfaces adopt a consistent observability
//! story.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for
/// example, because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    BUILD_SHA
        .set(config.build_sha.to_string())
        .ok()
        .or(Some(()));

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init()
            .map_err(|err| anyhow!("failed to install tracing subscriber: {err}")),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .try_init()
            .map_err(|err| anyhow!("failed to install tracing subscriber: {err}")),
    }
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Log level string (e.g., `info`, `debug`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Build identifier recorded in structured logs.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable, pretty-printed logs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    events_emitted_total: IntCounterVec,
    contexts_rendered_total: IntCounterVec,
    search_queries_total: IntCounterVec,
    active_contexts: IntGauge,
    active_devices: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Active config contexts known to the store.
    pub active_contexts: i64,
    /// Device records known to the store.
    pub active_devices: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )?;
        let events_emitted_total = IntCounterVec::new(
            Opts::new("events_emitted_total", "Change-log events emitted by type"),
            &["type"],
        )?;
        let contexts_rendered_total = IntCounterVec::new(
            Opts::new(
                "contexts_rendered_total",
                "Rendered context computations by target model",
            ),
            &["model"],
        )?;
        let search_queries_total = IntCounterVec::new(
            Opts::new("search_queries_total", "Global search queries by outcome"),
            &["outcome"],
        )?;
        let active_contexts = IntGauge::with_opts(Opts::new(
            "active_contexts",
            "Config contexts currently active",
        ))?;
        let active_devices =
            IntGauge::with_opts(Opts::new("active_devices", "Device records in the store"))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(events_emitted_total.clone()))?;
        registry.register(Box::new(contexts_rendered_total.clone()))?;
        registry.register(Box::new(search_queries_total.clone()))?;
        registry.register(Box::new(active_contexts.clone()))?;
        registry.register(Box::new(active_devices.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                events_emitted_total,
                contexts_rendered_total,
                search_queries_total,
                active_contexts,
                active_devices,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Increment the emitted event counter for the specific event type.
    pub fn inc_event(&self, event_type: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[event_type])
            .inc();
    }

    /// Increment the rendered-context counter for a target model.
    pub fn inc_context_rendered(&self, model: &str) {
        self.inner
            .contexts_rendered_total
            .with_label_values(&[model])
            .inc();
    }

    /// Increment the search query counter.
    pub fn inc_search_query(&self, outcome: &str) {
        self.inner
            .search_queries_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Set the active context gauge.
    pub fn set_active_contexts(&self, count: i64) {
        self.inner.active_contexts.set(count);
    }

    /// Set the device gauge.
    pub fn set_active_devices(&self, count: i64) {
        self.inner.active_devices.set(count);
    }

    /// Render the metrics registry using the Prometheus text exposition
    /// format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the
    /// encoded buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("failed to encode Prometheus metrics")?;
        String::from_utf8(buffer).context("metrics output was not valid UTF-8")
    }

    /// Take a point-in-time snapshot of the most relevant gauges.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_contexts: self.inner.active_contexts.get(),
            active_devices: self.inner.active_devices.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_render() {
        let metrics = Metrics::new().expect("metrics");
        metrics.inc_http_request("/api/search", 200);
        metrics.inc_event("object_created");
        metrics.inc_context_rendered("device");
        metrics.inc_search_query("hit");
        metrics.set_active_contexts(3);
        metrics.set_active_devices(12);

        let rendered = metrics.render().expect("render");
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("contexts_rendered_total"));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_contexts, 3);
        assert_eq!(snapshot.active_devices, 12);
    }

    #[test]
    fn init_logging_installs_subscriber_once() {
        let config = LoggingConfig {
            level: "info",
            format: LogFormat::Pretty,
            build_sha: "dev",
        };
        let _ = init_logging(&config);
    }
}
