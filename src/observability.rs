use std::net::SocketAddr;

use crate::engine::Intent;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: candidate searches run. Labels: outcome (matched/empty).
pub const CANDIDATE_SEARCHES_TOTAL: &str = "tutorbook_candidate_searches_total";

/// Histogram: candidates returned per search.
pub const CANDIDATES_RETURNED: &str = "tutorbook_candidates_returned";

/// Counter: intents published to the hub. Labels: intent.
pub const INTENTS_PUBLISHED_TOTAL: &str = "tutorbook_intents_published_total";

/// Counter: intent deliveries that failed at the sink.
pub const INTENT_DELIVERY_FAILURES_TOTAL: &str = "tutorbook_intent_delivery_failures_total";

/// Counter: follow-up alerts emitted for overdue confirmations.
pub const FOLLOW_UPS_EMITTED_TOTAL: &str = "tutorbook_follow_ups_emitted_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map an Intent variant to a short label for metrics.
pub fn intent_label(intent: &Intent) -> &'static str {
    match intent {
        Intent::NotifyParent { .. } => "notify_parent",
        Intent::NotifyTutor { .. } => "notify_tutor",
        Intent::NotifyAdmin { .. } => "notify_admin",
    }
}
