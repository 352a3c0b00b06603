//! Rule tree evaluation

use crate::models::{LogicalOperator, Resource, RuleGroup};

use super::condition::evaluate_condition;

/// Evaluate a rule node and its descendants against a resource
///
/// A node with no conditions and no child groups never matches, at any
/// depth, so an empty or half-configured profile cannot capture every
/// resource.
pub fn evaluate_rules(resource: &Resource, group: &RuleGroup) -> bool {
    if group.is_empty() {
        return false;
    }

    let mut results = group
        .conditions
        .iter()
        .map(|condition| evaluate_condition(resource, condition))
        .chain(group.groups.iter().map(|child| evaluate_rules(resource, child)));

    match group.operator {
        LogicalOperator::And => results.all(|matched| matched),
        LogicalOperator::Or => results.any(|matched| matched),
        LogicalOperator::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, ConditionOperator};

    fn always_true() -> Condition {
        Condition::new("CPU", ConditionOperator::GreaterOrEqual, "0")
    }

    fn always_false() -> Condition {
        Condition::new("CPU", ConditionOperator::LessThan, "0")
    }

    fn vm() -> Resource {
        Resource::new("vm-1", "kube-a-01")
            .with_capacity(16.0, 64.0, 1000.0)
            .with_tag("environment", "production")
            .with_tag("cluster", "primary")
    }

    #[test]
    fn test_empty_group_never_matches() {
        let empty = RuleGroup::default();
        assert!(!evaluate_rules(&vm(), &empty));
        assert!(!evaluate_rules(&vm(), &RuleGroup::any(vec![])));
        assert!(!evaluate_rules(&Resource::new("x", "x"), &empty));
    }

    #[test]
    fn test_and_or() {
        let or = RuleGroup::any(vec![always_false(), always_true()]);
        let and = RuleGroup::all(vec![always_false(), always_true()]);
        assert!(evaluate_rules(&vm(), &or));
        assert!(!evaluate_rules(&vm(), &and));
        assert!(evaluate_rules(&vm(), &RuleGroup::all(vec![always_true(), always_true()])));
    }

    #[test]
    fn test_nested_groups() {
        // production AND (cluster=primary OR cpu > 32)
        let rules = RuleGroup::all(vec![Condition::new(
            "tags",
            ConditionOperator::Equals,
            "environment=production",
        )])
        .with_group(RuleGroup::any(vec![
            Condition::new("tag.cluster", ConditionOperator::Equals, "primary"),
            Condition::new("CPU", ConditionOperator::GreaterThan, "32"),
        ]));

        assert!(evaluate_rules(&vm(), &rules));

        let secondary = vm().with_tag("cluster", "secondary");
        assert!(!evaluate_rules(&secondary, &rules));
    }

    #[test]
    fn test_groups_only_node() {
        let rules = RuleGroup {
            operator: LogicalOperator::Or,
            conditions: vec![],
            groups: vec![RuleGroup::all(vec![always_true()])],
        };
        assert!(evaluate_rules(&vm(), &rules));
    }

    #[test]
    fn test_empty_child_group_fails_and() {
        let rules = RuleGroup::all(vec![always_true()]).with_group(RuleGroup::default());
        assert!(!evaluate_rules(&vm(), &rules));
    }

    #[test]
    fn test_unknown_logical_operator() {
        let rules = RuleGroup {
            operator: LogicalOperator::Unknown,
            conditions: vec![always_true()],
            groups: vec![],
        };
        assert!(!evaluate_rules(&vm(), &rules));
    }
}
