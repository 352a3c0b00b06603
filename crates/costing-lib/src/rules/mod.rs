//! Rule evaluation over resource attributes and tags

mod condition;
mod group;

pub use condition::{evaluate_condition, FieldValue};
pub use group::evaluate_rules;

use crate::models::{Resource, RuleGroup};

/// Trait for rule tree evaluation
///
/// The matcher and the allocation calculator evaluate rules through this
/// seam so callers can substitute an instrumented implementation.
pub trait RuleEvaluator: Send + Sync {
    /// Returns true when the resource satisfies the rule tree
    fn evaluate(&self, resource: &Resource, rules: &RuleGroup) -> bool;
}

/// Default evaluator over recursive AND/OR rule trees
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTree;

impl RuleEvaluator for RuleTree {
    fn evaluate(&self, resource: &Resource, rules: &RuleGroup) -> bool {
        evaluate_rules(resource, rules)
    }
}

impl<E: RuleEvaluator + ?Sized> RuleEvaluator for &E {
    fn evaluate(&self, resource: &Resource, rules: &RuleGroup) -> bool {
        (**self).evaluate(resource, rules)
    }
}
