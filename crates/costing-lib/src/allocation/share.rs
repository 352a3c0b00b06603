//! Shares of a pooled cost
//!
//! A pool is divided over the population members that satisfy the same
//! profile's rules. Any zero denominator is replaced by 1 so the share
//! stays defined.

use serde::{Deserialize, Serialize};

use crate::models::{display_number, AllocationMethod, Resource, RuleGroup};
use crate::rules::RuleEvaluator;

/// Default weight of CPU count in the weighted score
pub const DEFAULT_CPU_WEIGHT: f64 = 0.4;

/// Default weight of memory GB in the weighted score
pub const DEFAULT_MEMORY_WEIGHT: f64 = 0.4;

/// Default weight of scaled storage in the weighted score
pub const DEFAULT_STORAGE_WEIGHT: f64 = 0.2;

/// Storage GB are divided by this before weighting
pub const DEFAULT_STORAGE_DIVISOR: f64 = 100.0;

/// Composite score used by the `weighted` allocation method
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedScore {
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
    pub storage_divisor: f64,
}

impl Default for WeightedScore {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_WEIGHT,
            memory: DEFAULT_MEMORY_WEIGHT,
            storage: DEFAULT_STORAGE_WEIGHT,
            storage_divisor: DEFAULT_STORAGE_DIVISOR,
        }
    }
}

impl WeightedScore {
    pub fn score(&self, resource: &Resource) -> f64 {
        self.cpu * resource.cpu_count
            + self.memory * resource.memory_gb
            + self.storage * (resource.storage_gb / denominator(self.storage_divisor))
    }
}

/// Totals over the resources sharing a profile's pools
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolBasis {
    pub matching_count: usize,
    pub cpu_total: f64,
    pub memory_total: f64,
    pub storage_total: f64,
    pub score_total: f64,
}

/// A resource's fraction of one pool
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    /// Method actually applied (unknown methods fall back to per-vm)
    pub method: AllocationMethod,
    pub fraction: f64,
    /// e.g. "8 of 32 CPUs"
    pub basis: String,
    pub degraded: bool,
}

impl PoolBasis {
    /// Scan the population for resources matching `rules`
    pub fn compute<E: RuleEvaluator>(
        rules: &RuleGroup,
        population: &[Resource],
        evaluator: &E,
        weights: &WeightedScore,
    ) -> Self {
        population
            .iter()
            .filter(|member| evaluator.evaluate(member, rules))
            .fold(Self::default(), |mut acc, member| {
                acc.matching_count += 1;
                acc.cpu_total += member.cpu_count;
                acc.memory_total += member.memory_gb;
                acc.storage_total += member.storage_gb;
                acc.score_total += weights.score(member);
                acc
            })
    }

    pub fn share(
        &self,
        method: AllocationMethod,
        resource: &Resource,
        weights: &WeightedScore,
    ) -> Share {
        let (method, degraded) = match method {
            AllocationMethod::Unknown => (AllocationMethod::PerVm, true),
            known => (known, false),
        };

        let (numerator, total, unit) = match method {
            AllocationMethod::PerCpu => (resource.cpu_count, self.cpu_total, "CPUs"),
            AllocationMethod::PerMemory => (resource.memory_gb, self.memory_total, "GB memory"),
            AllocationMethod::PerStorage => (resource.storage_gb, self.storage_total, "GB storage"),
            AllocationMethod::Weighted => (weights.score(resource), self.score_total, "score"),
            AllocationMethod::PerVm | AllocationMethod::Unknown => {
                (1.0, self.matching_count as f64, "VMs")
            }
        };

        let total = denominator(total);
        let basis = match method {
            AllocationMethod::Weighted => format!("score {:.2} of {:.2}", numerator, total),
            _ => format!("{} of {} {}", display_number(numerator), display_number(total), unit),
        };

        Share {
            method,
            fraction: numerator / total,
            basis,
            degraded,
        }
    }
}

/// Zero (or unusable) denominators become 1
fn denominator(value: f64) -> f64 {
    if !value.is_finite() || value.abs() < f64::EPSILON {
        1.0
    } else {
        value
    }
}
