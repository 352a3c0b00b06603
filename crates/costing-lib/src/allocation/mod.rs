//! Cost allocation for a matched profile
//!
//! This module provides:
//! - Simple-model pricing (per CPU / memory / storage, fixed, amortized one-time)
//! - Advanced-model CapEx depreciation and OpEx pools
//! - Pool shares across the population matching the same profile

mod advanced;
mod share;
mod simple;

pub use share::{
    PoolBasis, Share, WeightedScore, DEFAULT_CPU_WEIGHT, DEFAULT_MEMORY_WEIGHT,
    DEFAULT_STORAGE_DIVISOR, DEFAULT_STORAGE_WEIGHT,
};

use serde::{Deserialize, Serialize};

use crate::models::{CostBreakdown, CostModel, CostProfile, Resource};
use crate::rules::{RuleEvaluator, RuleTree};

/// Number of months a one-time charge is spread over
pub const DEFAULT_AMORTIZATION_PERIODS: u32 = 12;

/// Configuration for cost allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Periods one-time simple-model charges are amortized over
    pub amortization_periods: u32,
    /// Weights of the `weighted` allocation method
    pub weights: WeightedScore,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            amortization_periods: DEFAULT_AMORTIZATION_PERIODS,
            weights: WeightedScore::default(),
        }
    }
}

/// Computes a resource's breakdown under its matched profile
#[derive(Debug, Clone, Default)]
pub struct AllocationCalculator<E = RuleTree> {
    evaluator: E,
    config: AllocationConfig,
}

impl AllocationCalculator<RuleTree> {
    pub fn new() -> Self {
        Self::with_config(AllocationConfig::default())
    }

    pub fn with_config(config: AllocationConfig) -> Self {
        Self {
            evaluator: RuleTree,
            config,
        }
    }
}

impl<E: RuleEvaluator> AllocationCalculator<E> {
    pub fn with_evaluator(evaluator: E, config: AllocationConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Totals over the population members sharing the profile's pools
    pub fn pool_basis(&self, profile: &CostProfile, population: &[Resource]) -> PoolBasis {
        PoolBasis::compute(
            &profile.rules,
            population,
            &self.evaluator,
            &self.config.weights,
        )
    }

    /// Price a resource under its matched profile
    ///
    /// `population` is only scanned for advanced profiles.
    pub fn calculate(
        &self,
        resource: &Resource,
        profile: &CostProfile,
        population: &[Resource],
    ) -> CostBreakdown {
        match profile.cost_model {
            CostModel::Simple => self.calculate_with_basis(resource, profile, &PoolBasis::default()),
            CostModel::Advanced => {
                let basis = self.pool_basis(profile, population);
                self.calculate_with_basis(resource, profile, &basis)
            }
        }
    }

    /// Price a resource with a precomputed pool basis
    pub fn calculate_with_basis(
        &self,
        resource: &Resource,
        profile: &CostProfile,
        basis: &PoolBasis,
    ) -> CostBreakdown {
        match profile.cost_model {
            CostModel::Simple => {
                simple::simple_breakdown(resource, profile, self.config.amortization_periods)
            }
            CostModel::Advanced => {
                advanced::advanced_breakdown(resource, profile, basis, &self.config.weights)
            }
        }
    }
}

/// Price a resource with the default configuration
pub fn calculate(resource: &Resource, profile: &CostProfile, population: &[Resource]) -> CostBreakdown {
    AllocationCalculator::new().calculate(resource, profile, population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AllocationMethod, ComponentType, Condition, ConditionOperator, CostComponent,
        HardwareComponent, OperationsComponent, RuleGroup,
    };
    use proptest::prelude::*;

    fn everything() -> RuleGroup {
        RuleGroup::all(vec![Condition::new("CPU", ConditionOperator::GreaterOrEqual, "0")])
    }

    #[test]
    fn test_simple_profile_ignores_population() {
        let vm = Resource::new("vm", "vm").with_capacity(8.0, 0.0, 0.0);
        let profile = CostProfile::new("p", "CPU only")
            .published()
            .with_rules(everything())
            .with_component(CostComponent::new("CPU Cost", ComponentType::PerCpu, 10.0));

        let breakdown = calculate(&vm, &profile, &[]);
        assert_eq!(breakdown.monthly_total, 80.0);
        assert_eq!(breakdown.cost_model, Some(CostModel::Simple));
    }

    #[test]
    fn test_advanced_two_vm_pool() {
        let pop = vec![
            Resource::new("a", "a").with_capacity(2.0, 4.0, 50.0),
            Resource::new("b", "b").with_capacity(6.0, 12.0, 150.0),
        ];
        let profile = CostProfile::new("p", "Shared")
            .published()
            .with_rules(everything())
            .with_hardware(HardwareComponent::new("Host", 12000.0, 5.0, AllocationMethod::PerVm));

        let shares: Vec<f64> = pop
            .iter()
            .map(|vm| calculate(vm, &profile, &pop).capex_total)
            .collect();
        assert_eq!(shares, vec![100.0, 100.0]);
    }

    #[test]
    fn test_per_cpu_with_all_zero_cpu() {
        let pop = vec![Resource::new("a", "a"), Resource::new("b", "b")];
        let profile = CostProfile::new("p", "Idle")
            .published()
            .with_rules(everything())
            .with_operations(OperationsComponent::new("Power", 100.0, AllocationMethod::PerCpu));

        let breakdown = calculate(&pop[0], &profile, &pop);
        assert!(breakdown.opex_total.is_finite());
        assert_eq!(breakdown.opex_total, 0.0);
        assert_eq!(breakdown.line_items[0].share, Some(0.0));
    }

    #[test]
    fn test_custom_weights() {
        let config = AllocationConfig {
            weights: WeightedScore {
                cpu: 1.0,
                memory: 0.0,
                storage: 0.0,
                storage_divisor: 100.0,
            },
            ..AllocationConfig::default()
        };
        let calculator = AllocationCalculator::with_config(config);
        let pop = vec![
            Resource::new("a", "a").with_capacity(1.0, 1000.0, 0.0),
            Resource::new("b", "b").with_capacity(3.0, 0.0, 0.0),
        ];
        let profile = CostProfile::new("p", "Weighted")
            .published()
            .with_rules(everything())
            .with_operations(OperationsComponent::new("Ops", 40.0, AllocationMethod::Weighted));

        assert_eq!(calculator.calculate(&pop[0], &profile, &pop).opex_total, 10.0);
        assert_eq!(calculator.calculate(&pop[1], &profile, &pop).opex_total, 30.0);
    }

    proptest! {
        #[test]
        fn test_weighted_shares_sum_to_pool(
            capacities in prop::collection::vec((1.0f64..128.0, 0.0f64..1024.0, 0.0f64..20000.0), 1..24),
            monthly_cost in 1.0f64..100_000.0,
        ) {
            let pop: Vec<Resource> = capacities
                .iter()
                .enumerate()
                .map(|(i, (cpu, mem, storage))| {
                    Resource::new(format!("vm-{i}"), format!("vm-{i}")).with_capacity(*cpu, *mem, *storage)
                })
                .collect();
            let profile = CostProfile::new("p", "Weighted")
                .published()
                .with_rules(everything())
                .with_operations(OperationsComponent::new("Ops", monthly_cost, AllocationMethod::Weighted));

            let calculator = AllocationCalculator::new();
            let basis = calculator.pool_basis(&profile, &pop);
            let allocated: f64 = pop
                .iter()
                .map(|vm| calculator.calculate_with_basis(vm, &profile, &basis).opex_total)
                .sum();

            prop_assert!((allocated - monthly_cost).abs() <= 1e-6 * monthly_cost.max(1.0));
        }
    }
}
