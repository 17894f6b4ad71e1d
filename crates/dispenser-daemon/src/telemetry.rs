use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

use dispenser_core::Stats;

#[derive(Debug, Default)]
struct TelemetryState {
    requests_total: HashMap<(String, u16), u64>,
    request_latency_ms_bucket: BTreeMap<u64, u64>,
    assignments_total: HashMap<String, u64>,
    toggles_total: u64,
    resets_total: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    state: Arc<Mutex<TelemetryState>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, route: &str, status: u16) {
        let mut guard = self.state.lock();
        let entry = guard
            .requests_total
            .entry((route.to_string(), status))
            .or_insert(0);
        *entry = entry.saturating_add(1);
    }

    pub fn record_latency_ms(&self, latency_ms: u64) {
        let mut guard = self.state.lock();
        let bucket = [1_u64, 5, 10, 25, 50, 100, 250]
            .into_iter()
            .find(|bound| latency_ms <= *bound)
            .unwrap_or(u64::MAX);
        let entry = guard.request_latency_ms_bucket.entry(bucket).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    /// `outcome` is one of `assigned`, `exhausted`, `failed`, `manual`.
    pub fn record_assignment(&self, outcome: &str) {
        let mut guard = self.state.lock();
        let entry = guard
            .assignments_total
            .entry(outcome.to_string())
            .or_insert(0);
        *entry = entry.saturating_add(1);
    }

    pub fn record_toggle(&self) {
        let mut guard = self.state.lock();
        guard.toggles_total = guard.toggles_total.saturating_add(1);
    }

    pub fn record_reset(&self) {
        let mut guard = self.state.lock();
        guard.resets_total = guard.resets_total.saturating_add(1);
    }

    /// Prometheus text exposition; the gauges come from the allocator.
    pub fn render(&self, stats: &Stats) -> String {
        let guard = self.state.lock();
        let mut out = String::new();

        out.push_str("# TYPE dispenser_requests_total counter\n");
        let mut requests: Vec<_> = guard.requests_total.iter().collect();
        requests.sort();
        for ((route, status), value) in requests {
            let _ = writeln!(
                out,
                "dispenser_requests_total{{route=\"{}\",status=\"{}\"}} {}",
                route, status, value
            );
        }
        out.push_str("# TYPE dispenser_request_latency_ms_bucket counter\n");
        for (bucket, value) in &guard.request_latency_ms_bucket {
            let bucket_label = if *bucket == u64::MAX {
                "+Inf".to_string()
            } else {
                bucket.to_string()
            };
            let _ = writeln!(
                out,
                "dispenser_request_latency_ms_bucket{{le=\"{}\"}} {}",
                bucket_label, value
            );
        }
        out.push_str("# TYPE dispenser_assignments_total counter\n");
        let mut assignments: Vec<_> = guard.assignments_total.iter().collect();
        assignments.sort();
        for (outcome, value) in assignments {
            let _ = writeln!(
                out,
                "dispenser_assignments_total{{outcome=\"{}\"}} {}",
                outcome, value
            );
        }
        out.push_str("# TYPE dispenser_toggles_total counter\n");
        let _ = writeln!(out, "dispenser_toggles_total {}", guard.toggles_total);
        out.push_str("# TYPE dispenser_resets_total counter\n");
        let _ = writeln!(out, "dispenser_resets_total {}", guard.resets_total);

        out.push_str("# TYPE dispenser_territories_active gauge\n");
        let _ = writeln!(out, "dispenser_territories_active {}", stats.total);
        out.push_str("# TYPE dispenser_territories_assigned gauge\n");
        let _ = writeln!(out, "dispenser_territories_assigned {}", stats.assigned);
        out.push_str("# TYPE dispenser_territories_remaining gauge\n");
        let _ = writeln!(out, "dispenser_territories_remaining {}", stats.remaining);
        out
    }
}
