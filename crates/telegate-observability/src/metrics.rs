//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for Telegate:
//! - Telemetry requests by verb and feature
//! - Responses by verb and status code
//! - Store call latency by operation
//! - Subscription notifications by kind

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector for Telegate
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Telemetry requests received
    pub requests_total: CounterVec,
    /// Responses sent, by status code
    pub responses_total: CounterVec,
    /// Store call duration
    pub store_duration_seconds: HistogramVec,
    /// Subscription notifications emitted after successful writes
    pub notifications_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("telegate_requests_total", "Total number of telemetry requests"),
            &["verb", "feature"],
        )?;

        let responses_total = CounterVec::new(
            Opts::new("telegate_responses_total", "Total number of telemetry responses"),
            &["verb", "status"],
        )?;

        let store_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "telegate_store_duration_seconds",
                "Telemetry store call duration in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;

        let notifications_total = CounterVec::new(
            Opts::new(
                "telegate_notifications_total",
                "Total number of subscription notifications",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(responses_total.clone()))?;
        registry.register(Box::new(store_duration_seconds.clone()))?;
        registry.register(Box::new(notifications_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            responses_total,
            store_duration_seconds,
            notifications_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_request(&self, verb: &str, feature: &str) {
        self.requests_total.with_label_values(&[verb, feature]).inc();
    }

    pub fn record_response(&self, verb: &str, status: u16) {
        self.responses_total
            .with_label_values(&[verb, &status.to_string()])
            .inc();
    }

    pub fn record_store_call(&self, operation: &str, duration_secs: f64) {
        self.store_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_notification(&self, kind: &str) {
        self.notifications_total.with_label_values(&[kind]).inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
