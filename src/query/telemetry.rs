use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::Filter;
use crate::errors::ActionError;

pub const METRICS_TARGET: &str = "actionlite::metrics";
pub const AUDIT_TARGET: &str = "actionlite::audit";

#[derive(Default)]
pub struct Metrics {
    pub queries_total: AtomicU64,
    pub queries_slow_total: AtomicU64,
    pub query_errors_total: AtomicU64,
    pub denied_total: AtomicU64,
    pub multi_match_total: AtomicU64,
}

#[derive(Default)]
pub struct Telemetry {
    pub metrics: Metrics,
    // For tests we can capture audit lines in-memory
    audit_sink: RwLock<Option<Arc<RwLock<Vec<String>>>>>,
}

pub(crate) static TELEMETRY: std::sync::LazyLock<Telemetry> =
    std::sync::LazyLock::new(Telemetry::default);

pub fn set_audit_sink_for_tests(sink: Arc<RwLock<Vec<String>>>) {
    *TELEMETRY.audit_sink.write() = Some(sink);
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut h = Sha256::new();
    h.update(input.as_bytes());
    hex::encode(h.finalize())
}

/// Stable digest of a compiled filter. Logs carry this instead of the filter's values.
#[must_use]
pub fn filter_hash(filter: &Filter) -> String {
    sha256_hex(&format!("{filter:?}"))
}

/// Records one executed query and returns the filter hash for correlation with audit lines.
pub fn log_query(
    op: &str,
    filter: &Filter,
    duration_ms: u128,
    result_count: usize,
    slow_query_ms: u64,
) -> String {
    TELEMETRY.metrics.queries_total.fetch_add(1, Ordering::Relaxed);
    let hash = filter_hash(filter);
    let duration_ms = u64::try_from(duration_ms).unwrap_or(u64::MAX);
    let slow = duration_ms >= slow_query_ms;
    let line = serde_json::json!({
        "ts": now_ts(),
        "op": op,
        "filter_type": filter.type_name(),
        "filter_hash": hash,
        "duration_ms": duration_ms,
        "result_count": result_count,
        "slow": slow
    })
    .to_string();
    if slow {
        TELEMETRY.metrics.queries_slow_total.fetch_add(1, Ordering::Relaxed);
        log::warn!(target: METRICS_TARGET, "{line}");
    } else {
        log::info!(target: METRICS_TARGET, "{line}");
    }
    hash
}

pub fn log_access(op: &str, filter_hash: &str, result_count: usize, denied: bool) {
    if denied {
        TELEMETRY.metrics.denied_total.fetch_add(1, Ordering::Relaxed);
    }
    let line = serde_json::json!({
        "ts": now_ts(),
        "op": op,
        "filter_hash": filter_hash,
        "result_count": result_count,
        "denied": denied
    })
    .to_string();
    let sink = TELEMETRY.audit_sink.read().clone();
    if let Some(sink) = sink {
        sink.write().push(line.clone());
    }
    log::info!(target: AUDIT_TARGET, "{line}");
}

pub fn log_error(op: &str, err: &ActionError) {
    TELEMETRY.metrics.query_errors_total.fetch_add(1, Ordering::Relaxed);
    log::error!(target: METRICS_TARGET, "{op} failed ({:?}): {err}", err.kind());
}

pub fn log_multi_match(op: &str, found: usize) {
    TELEMETRY.metrics.multi_match_total.fetch_add(1, Ordering::Relaxed);
    log::warn!("{op}: {found} actions matched a single-result lookup; returning the lowest id");
}

#[must_use]
pub fn metrics_text() -> String {
    // OpenMetrics/Prometheus exposition format (no types/HELP for brevity)
    let m = &TELEMETRY.metrics;
    format!(
        "actionlite_queries_total {}\n\
         actionlite_queries_slow_total {}\n\
         actionlite_query_errors_total {}\n\
         actionlite_denied_total {}\n\
         actionlite_multi_match_total {}\n",
        m.queries_total.load(Ordering::Relaxed),
        m.queries_slow_total.load(Ordering::Relaxed),
        m.query_errors_total.load(Ordering::Relaxed),
        m.denied_total.load(Ordering::Relaxed),
        m.multi_match_total.load(Ordering::Relaxed),
    )
}

/// Reads one counter from [`metrics_text`] output; handy in tests.
#[must_use]
pub fn counter(name: &str) -> u64 {
    metrics_text()
        .lines()
        .find_map(|l| l.strip_prefix(name).and_then(|rest| rest.trim().parse().ok()))
        .unwrap_or(0)
}
