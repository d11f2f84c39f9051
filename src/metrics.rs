//! Prometheus metrics collection for ticketd.
//!
//! Exposed on `GET /metrics` of the interactions server when enabled.
//!
//! - `ticketd_interactions_total{kind}` - Interactions handled by kind
//! - `ticketd_interaction_duration_seconds{kind}` - Handling latency histogram
//! - `ticketd_transitions_total{action,outcome}` - Lifecycle transitions
//! - `ticketd_pending_actions` - Deferred actions waiting to fire

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Interactions handled, by kind (command, button, select).
pub static INTERACTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Interaction errors by kind and error code.
pub static INTERACTION_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Lifecycle transitions by action and outcome.
pub static TRANSITIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Requests rejected because a transition was in flight.
pub static BUSY_REJECTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Best-effort platform mutations that failed, by operation.
pub static EXTERNAL_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Ticket channels created.
pub static TICKETS_OPENED: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges / histograms
// ========================================================================

/// Deferred actions scheduled and not yet fired or canceled.
pub static PENDING_ACTIONS: OnceLock<IntGauge> = OnceLock::new();

/// Interaction handling latency by kind.
pub static INTERACTION_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded. Recording
/// before `init` is a no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(INTERACTIONS, IntCounterVec::new(Opts::new("ticketd_interactions_total", "Interactions handled by kind"), &["kind"]));
    register!(INTERACTION_ERRORS, IntCounterVec::new(Opts::new("ticketd_interaction_errors_total", "Interaction errors by kind and code"), &["kind", "error"]));
    register!(TRANSITIONS, IntCounterVec::new(Opts::new("ticketd_transitions_total", "Ticket lifecycle transitions"), &["action", "outcome"]));
    register!(BUSY_REJECTIONS, IntCounterVec::new(Opts::new("ticketd_busy_rejections_total", "Requests rejected while a transition was in flight"), &["action"]));
    register!(EXTERNAL_FAILURES, IntCounterVec::new(Opts::new("ticketd_external_failures_total", "Failed best-effort platform mutations"), &["op"]));
    register!(TICKETS_OPENED, IntCounter::new("ticketd_tickets_opened_total", "Ticket channels created"));
    register!(PENDING_ACTIONS, IntGauge::new("ticketd_pending_actions", "Deferred actions waiting to fire"));
    register!(INTERACTION_LATENCY, HistogramVec::new(
        HistogramOpts::new("ticketd_interaction_duration_seconds", "Interaction handling latency by kind")
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["kind"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

fn counter_vec(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

/// Record a handled interaction with latency.
#[inline]
pub fn record_interaction(kind: &str, duration_secs: f64) {
    counter_vec(&INTERACTIONS, &[kind]);
    if let Some(h) = INTERACTION_LATENCY.get() {
        h.with_label_values(&[kind]).observe(duration_secs);
    }
}

/// Record an interaction that ended in an error.
#[inline]
pub fn record_interaction_error(kind: &str, error: &str) {
    counter_vec(&INTERACTION_ERRORS, &[kind, error]);
}

/// Record a transition outcome.
#[inline]
pub fn record_transition(action: &str, outcome: &str) {
    counter_vec(&TRANSITIONS, &[action, outcome]);
}

#[inline]
pub fn record_busy(action: &str) {
    counter_vec(&BUSY_REJECTIONS, &[action]);
}

#[inline]
pub fn record_external_failure(op: &str) {
    counter_vec(&EXTERNAL_FAILURES, &[op]);
}

#[inline]
pub fn record_ticket_opened() {
    if let Some(c) = TICKETS_OPENED.get() {
        c.inc();
    }
}

/// Adjust the pending deferred action gauge.
#[inline]
pub fn pending_actions_add(delta: i64) {
    if let Some(g) = PENDING_ACTIONS.get() {
        g.add(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_interaction("button", 0.001);
        record_transition("close", "scheduled");

        let output = gather_metrics();
        assert!(output.contains("ticketd_interactions_total"));
        assert!(output.contains("ticketd_transitions_total"));
    }
}
