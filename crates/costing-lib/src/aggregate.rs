//! Portfolio aggregation
//!
//! Each resource is matched and priced independently; above a size
//! threshold the per-resource work runs on the rayon pool. Reduction is
//! always sequential in input order, so repeated runs over the same
//! inputs produce identical totals.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::{AllocationCalculator, AllocationConfig, PoolBasis};
use crate::matcher::{published_in_priority_order, ProfileMatcher};
use crate::models::{CostBreakdown, CostModel, CostProfile, PortfolioTotals, Resource};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::rules::{RuleEvaluator, RuleTree};

/// Resource count at which allocation switches to parallel iteration
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub allocation: AllocationConfig,
    /// Minimum resource count for parallel allocation; 0 disables it
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allocation: AllocationConfig::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Matcher and calculator bound to a shared rule evaluator
pub struct CostEngine<E = RuleTree> {
    matcher: ProfileMatcher<E>,
    calculator: AllocationCalculator<E>,
    parallel_threshold: usize,
    metrics: Option<EngineMetrics>,
    logger: StructuredLogger,
}

impl CostEngine<RuleTree> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_evaluator(RuleTree, config)
    }
}

impl Default for CostEngine<RuleTree> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RuleEvaluator + Clone> CostEngine<E> {
    pub fn with_evaluator(evaluator: E, config: EngineConfig) -> Self {
        Self {
            matcher: ProfileMatcher::with_evaluator(evaluator.clone()),
            calculator: AllocationCalculator::with_evaluator(evaluator, config.allocation),
            parallel_threshold: config.parallel_threshold,
            metrics: None,
            logger: StructuredLogger::new("engine"),
        }
    }
}

impl<E: RuleEvaluator> CostEngine<E> {
    /// Record Prometheus metrics for every run
    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Label structured log events with the inventory they describe
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn matcher(&self) -> &ProfileMatcher<E> {
        &self.matcher
    }

    pub fn calculator(&self) -> &AllocationCalculator<E> {
        &self.calculator
    }

    /// Match and price a single resource
    pub fn allocate(
        &self,
        resource: &Resource,
        profiles: &[CostProfile],
        population: &[Resource],
    ) -> CostBreakdown {
        match self.matcher.match_profile(resource, profiles) {
            Some(profile) => self.calculator.calculate(resource, profile, population),
            None => CostBreakdown::uncosted(resource),
        }
    }

    /// Match and price every resource; output order follows `resources`
    ///
    /// `resources` is also the population advanced profiles allocate over.
    pub fn allocate_all(&self, resources: &[Resource], profiles: &[CostProfile]) -> Vec<CostBreakdown> {
        let ordered = published_in_priority_order(profiles);

        // pool bases depend only on the profile, so compute each once
        let bases: Vec<Option<PoolBasis>> = ordered
            .iter()
            .map(|profile| match profile.cost_model {
                CostModel::Advanced => Some(self.calculator.pool_basis(profile, resources)),
                CostModel::Simple => None,
            })
            .collect();

        let price = |resource: &Resource| -> CostBreakdown {
            match self.matcher.match_position(resource, &ordered) {
                Some(idx) => {
                    let basis = bases[idx].unwrap_or_default();
                    self.calculator.calculate_with_basis(resource, ordered[idx], &basis)
                }
                None => CostBreakdown::uncosted(resource),
            }
        };

        let parallel = self.parallel_threshold > 0 && resources.len() >= self.parallel_threshold;
        let breakdowns: Vec<CostBreakdown> = if parallel {
            resources.par_iter().map(price).collect()
        } else {
            resources.iter().map(price).collect()
        };

        for breakdown in &breakdowns {
            if let Some(metrics) = &self.metrics {
                metrics.record_breakdown(breakdown);
            }
            if breakdown.matched_profile().is_some() {
                self.logger.log_match(breakdown);
            } else {
                self.logger.log_uncosted(breakdown);
            }
        }

        breakdowns
    }

    /// Per-resource breakdowns and their portfolio totals in one pass
    pub fn price_portfolio(
        &self,
        resources: &[Resource],
        profiles: &[CostProfile],
    ) -> (Vec<CostBreakdown>, PortfolioTotals) {
        let started = Instant::now();
        let breakdowns = self.allocate_all(resources, profiles);
        let totals = PortfolioTotals::from_breakdowns(resources, &breakdowns);

        if let Some(metrics) = &self.metrics {
            metrics.observe_aggregation_latency(started.elapsed().as_secs_f64());
        }
        self.logger.log_portfolio(&totals);

        (breakdowns, totals)
    }

    /// Portfolio totals across a resource set
    pub fn aggregate(&self, resources: &[Resource], profiles: &[CostProfile]) -> PortfolioTotals {
        self.price_portfolio(resources, profiles).1
    }
}

/// Price every resource with the default engine
pub fn allocate_all(resources: &[Resource], profiles: &[CostProfile]) -> Vec<CostBreakdown> {
    CostEngine::new().allocate_all(resources, profiles)
}

/// Portfolio totals with the default engine
pub fn aggregate(resources: &[Resource], profiles: &[CostProfile]) -> PortfolioTotals {
    CostEngine::new().aggregate(resources, profiles)
}

/// The `n` most expensive breakdowns by monthly total; ties keep input order
pub fn top_by_cost(breakdowns: &[CostBreakdown], n: usize) -> Vec<&CostBreakdown> {
    let mut ranked: Vec<&CostBreakdown> = breakdowns.iter().collect();
    ranked.sort_by(|a, b| {
        b.monthly_total
            .partial_cmp(&a.monthly_total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AllocationMethod, ComponentType, Condition, ConditionOperator, CostComponent,
        HardwareComponent, OperationsComponent, RuleGroup,
    };

    fn env(value: &str) -> RuleGroup {
        RuleGroup::all(vec![Condition::new("tag.environment", ConditionOperator::Equals, value)])
    }

    fn inventory() -> Vec<Resource> {
        vec![
            Resource::new("1", "web")
                .with_capacity(8.0, 32.0, 500.0)
                .with_tag("environment", "production"),
            Resource::new("2", "kube")
                .with_capacity(16.0, 64.0, 1000.0)
                .with_tag("environment", "production"),
            Resource::new("3", "legacy")
                .with_capacity(2.0, 8.0, 100.0)
                .with_tag("environment", "development"),
            Resource::new("4", "desktop")
                .with_capacity(4.0, 16.0, 250.0)
                .with_tag("environment", "test"),
        ]
    }

    fn profiles() -> Vec<CostProfile> {
        vec![
            CostProfile::new("prod", "Production")
                .published()
                .with_priority(1)
                .with_rules(env("production"))
                .with_hardware(HardwareComponent::new("Hosts", 12000.0, 5.0, AllocationMethod::PerVm))
                .with_operations(OperationsComponent::new("Power", 240.0, AllocationMethod::PerCpu)),
            CostProfile::new("dev", "Development")
                .published()
                .with_priority(2)
                .with_rules(env("development"))
                .with_component(CostComponent::new("CPU Cost", ComponentType::PerCpu, 10.0))
                .with_component(CostComponent::new("Setup", ComponentType::OneTime, 120.0)),
            CostProfile::new("test", "Test (draft)")
                .with_priority(1)
                .with_rules(env("test"))
                .with_component(CostComponent::new("Flat", ComponentType::FixedMonthly, 5.0)),
        ]
    }

    #[test]
    fn test_aggregate_portfolio() {
        let totals = aggregate(&inventory(), &profiles());

        assert_eq!(totals.resource_count, 4);
        assert_eq!(totals.costed_count, 3);
        assert_eq!(totals.uncosted_count, 1);
        // production: 200 CapEx pool, 240 OpEx pool; development: 20 + 10 amortized
        assert!((totals.capex_total - 200.0).abs() < 1e-9);
        assert!((totals.opex_total - 240.0).abs() < 1e-9);
        assert!((totals.monthly_total - 470.0).abs() < 1e-9);
        assert_eq!(totals.one_time_total, 120.0);
        assert_eq!(totals.by_profile["Production"].resources, 2);
        assert_eq!(totals.by_profile["Development"].monthly_total, 30.0);
        assert!(!totals.by_profile.contains_key("Test (draft)"));
    }

    #[test]
    fn test_allocate_all_keeps_order_and_shares() {
        let breakdowns = allocate_all(&inventory(), &profiles());

        assert_eq!(breakdowns.len(), 4);
        assert_eq!(breakdowns[0].resource_id, "1");
        assert_eq!(breakdowns[0].capex_total, 100.0);
        // per-cpu power: 8 of 24 and 16 of 24
        assert!((breakdowns[0].opex_total - 80.0).abs() < 1e-9);
        assert!((breakdowns[1].opex_total - 160.0).abs() < 1e-9);
        assert_eq!(breakdowns[3].matched_profile(), None);
    }

    #[test]
    fn test_allocate_all_matches_single_allocation() {
        let engine = CostEngine::new();
        let resources = inventory();
        let profiles = profiles();
        let batch = engine.allocate_all(&resources, &profiles);

        for (resource, expected) in resources.iter().zip(&batch) {
            assert_eq!(&engine.allocate(resource, &profiles, &resources), expected);
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let resources: Vec<Resource> = (0..64)
            .map(|i| {
                Resource::new(format!("vm-{i}"), format!("vm-{i}"))
                    .with_capacity((i % 7 + 1) as f64, (i % 5) as f64 * 8.0, 100.0 * i as f64)
                    .with_tag("environment", if i % 3 == 0 { "development" } else { "production" })
            })
            .collect();

        let sequential = CostEngine::with_config(EngineConfig {
            parallel_threshold: 0,
            ..EngineConfig::default()
        });
        let parallel = CostEngine::with_config(EngineConfig {
            parallel_threshold: 1,
            ..EngineConfig::default()
        });

        assert_eq!(
            sequential.aggregate(&resources, &profiles()),
            parallel.aggregate(&resources, &profiles())
        );
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let resources = inventory();
        let profiles = profiles();
        let engine = CostEngine::new();
        assert_eq!(
            engine.aggregate(&resources, &profiles),
            engine.aggregate(&resources, &profiles)
        );
    }

    #[test]
    fn test_empty_inputs() {
        let totals = aggregate(&[], &profiles());
        assert_eq!(totals, PortfolioTotals::default());

        let totals = aggregate(&inventory(), &[]);
        assert_eq!(totals.uncosted_count, 4);
        assert_eq!(totals.monthly_total, 0.0);
    }

    #[test]
    fn test_top_by_cost() {
        let breakdowns = allocate_all(&inventory(), &profiles());
        let top = top_by_cost(&breakdowns, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].resource_name, "kube");
        assert_eq!(top[1].resource_name, "web");
        assert_eq!(top_by_cost(&breakdowns, 10).len(), 4);
    }
}
