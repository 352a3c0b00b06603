//! Observability for the costing engine
//!
//! Provides:
//! - Prometheus metrics (resources evaluated, uncosted, matches per profile,
//!   degraded line items, aggregation latency)
//! - Structured logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::models::{CostBreakdown, CostProfile, PortfolioTotals, ProfileStatus};

/// Histogram buckets for aggregation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    resources_evaluated: IntCounter,
    resources_uncosted: IntCounter,
    profile_matches: IntCounterVec,
    degraded_line_items: IntCounter,
    aggregation_duration_seconds: Histogram,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            resources_evaluated: register_int_counter!(
                "vmcost_resources_evaluated_total",
                "Resources run through profile matching"
            )
            .expect("Failed to register resources_evaluated"),

            resources_uncosted: register_int_counter!(
                "vmcost_resources_uncosted_total",
                "Resources no published profile matched"
            )
            .expect("Failed to register resources_uncosted"),

            profile_matches: register_int_counter_vec!(
                "vmcost_profile_matches_total",
                "Resources priced by each cost profile",
                &["profile"]
            )
            .expect("Failed to register profile_matches"),

            degraded_line_items: register_int_counter!(
                "vmcost_degraded_line_items_total",
                "Line items priced with a fallback for unusable component data"
            )
            .expect("Failed to register degraded_line_items"),

            aggregation_duration_seconds: register_histogram!(
                "vmcost_aggregation_duration_seconds",
                "Time spent pricing and aggregating a portfolio",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register aggregation_duration_seconds"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a handle, registering the global metrics on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    /// Count one priced (or unpriced) resource
    pub fn record_breakdown(&self, breakdown: &CostBreakdown) {
        let inner = self.inner();
        inner.resources_evaluated.inc();

        match breakdown.matched_profile() {
            Some(profile) => inner.profile_matches.with_label_values(&[profile]).inc(),
            None => inner.resources_uncosted.inc(),
        }

        let degraded = breakdown.degraded_items() as u64;
        if degraded > 0 {
            inner.degraded_line_items.inc_by(degraded);
        }
    }

    pub fn observe_aggregation_latency(&self, duration_secs: f64) {
        self.inner().aggregation_duration_seconds.observe(duration_secs);
    }

    /// Render the default registry in the Prometheus text format
    pub fn render(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(err) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(event = "metrics_encode_failed", error = %err, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for engine events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    /// `source` names the inventory or caller the events belong to
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Log a resource priced by a profile
    pub fn log_match(&self, breakdown: &CostBreakdown) {
        if let Some(profile) = breakdown.matched_profile() {
            debug!(
                event = "resource_costed",
                source = %self.source,
                resource_id = %breakdown.resource_id,
                resource_name = %breakdown.resource_name,
                profile = %profile,
                monthly_total = breakdown.monthly_total,
                line_items = breakdown.line_items.len(),
                "Resource priced"
            );
        }
    }

    /// Log a resource no published profile matched
    pub fn log_uncosted(&self, breakdown: &CostBreakdown) {
        debug!(
            event = "resource_uncosted",
            source = %self.source,
            resource_id = %breakdown.resource_id,
            resource_name = %breakdown.resource_name,
            "No cost profile matched"
        );
    }

    /// Log portfolio totals
    pub fn log_portfolio(&self, totals: &PortfolioTotals) {
        info!(
            event = "portfolio_aggregated",
            source = %self.source,
            resources = totals.resource_count,
            costed = totals.costed_count,
            uncosted = totals.uncosted_count,
            monthly_total = totals.monthly_total,
            capex_total = totals.capex_total,
            opex_total = totals.opex_total,
            "Portfolio totals computed"
        );

        if totals.resource_count > 0 && totals.costed_count == 0 {
            warn!(
                event = "portfolio_uncosted",
                source = %self.source,
                resources = totals.resource_count,
                "No resource matched a published cost profile"
            );
        }
    }

    /// Log a profile lifecycle change
    pub fn log_profile_transition(&self, profile: &str, from: ProfileStatus, to: ProfileStatus) {
        info!(
            event = "profile_transition",
            source = %self.source,
            profile = %profile,
            from = %from,
            to = %to,
            "Cost profile status changed"
        );
    }

    /// Log a profile written to the store; `action` is "created" or "updated"
    pub fn log_profile_saved(&self, profile: &CostProfile, action: &str) {
        info!(
            event = "profile_saved",
            source = %self.source,
            profile = %profile.name,
            profile_id = %profile.id,
            status = %profile.status,
            action = %action,
            "Cost profile saved"
        );
    }

    /// Log a profile that failed validation
    pub fn log_profile_rejected(&self, profile: &str, problems: &[String]) {
        warn!(
            event = "profile_rejected",
            source = %self.source,
            profile = %profile,
            problems = %problems.join("; "),
            "Cost profile failed validation"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, Resource};

    #[test]
    fn test_engine_metrics_record() {
        let metrics = EngineMetrics::new();
        let vm = Resource::new("vm-1", "web");

        let mut priced = CostBreakdown::uncosted(&vm);
        priced.applied_profiles.push("Basic Infrastructure".into());
        priced.line_items.push(LineItem {
            name: "GPU".into(),
            component_type: "unknown".into(),
            category: "other".into(),
            cost_class: None,
            value: 1.0,
            pool_total: None,
            share: None,
            calculation: String::new(),
            degraded: true,
        });

        metrics.record_breakdown(&priced);
        metrics.record_breakdown(&CostBreakdown::uncosted(&vm));
        metrics.observe_aggregation_latency(0.002);

        let text = metrics.render();
        assert!(text.contains("vmcost_resources_evaluated_total"));
        assert!(text.contains("vmcost_profile_matches_total{profile=\"Basic Infrastructure\"}"));
        assert!(text.contains("vmcost_degraded_line_items_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("inventory.json");
        assert_eq!(logger.source(), "inventory.json");
    }
}
