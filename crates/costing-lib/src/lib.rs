//! Cost allocation engine for virtual machine inventories
//!
//! This crate provides the core functionality for:
//! - Evaluating profile rules against VM attributes and tags
//! - Selecting the single highest-priority published profile per VM
//! - Computing simple and advanced (CapEx/OpEx) cost breakdowns
//! - Aggregating per-VM breakdowns into portfolio totals
//! - Profile lifecycle transitions, validation and CSV export

pub mod aggregate;
pub mod allocation;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod matcher;
pub mod models;
pub mod observability;
pub mod rules;

pub use aggregate::{aggregate, allocate_all, top_by_cost, CostEngine, EngineConfig};
pub use allocation::{calculate, AllocationCalculator, PoolBasis};
pub use error::{EngineError, Result};
pub use export::{to_csv_string, write_csv};
pub use lifecycle::{
    create_profile, transition, update_profile, validate, validation_problems, StatusCounts,
};
pub use matcher::{match_profile, ProfileMatcher};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use rules::{evaluate_condition, evaluate_rules, RuleEvaluator, RuleTree};
