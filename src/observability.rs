use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: reservations committed.
pub const RESERVATIONS_CONFIRMED_TOTAL: &str = "innkeep_reservations_confirmed_total";

/// Counter: reservations refused at the capacity check.
pub const CAPACITY_CONFLICTS_TOTAL: &str = "innkeep_capacity_conflicts_total";

/// Counter: bookings cancelled.
pub const CANCELLATIONS_TOTAL: &str = "innkeep_cancellations_total";

/// Histogram: reserve path latency in seconds (lock + price + persist).
pub const RESERVE_DURATION_SECONDS: &str = "innkeep_reserve_duration_seconds";

// ── USE metrics (collaborator health) ───────────────────────────

/// Counter: transient store reads retried.
pub const STORE_RETRIES_TOTAL: &str = "innkeep_store_retries_total";

/// Counter: store writes that failed and aborted a mutation.
pub const STORE_WRITE_FAILURES_TOTAL: &str = "innkeep_store_write_failures_total";

/// Gauge: property types held by the ledger.
pub const PROPERTY_TYPES_ACTIVE: &str = "innkeep_property_types_active";

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
