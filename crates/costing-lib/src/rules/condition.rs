//! Single-condition evaluation
//!
//! Coercion rules:
//! - equals: a numeric field matches a value that parses to the same
//!   number (`"8"` equals 8); a text field matches identical text, or a
//!   value that parses to the same number as the text. No value never
//!   equals anything, so not-equals against a missing field is true.
//! - ordering operators parse both sides as finite numbers; empty,
//!   missing or non-numeric input makes the comparison false.
//! - contains / not-contains compare lowercased text; a missing field
//!   contains nothing.
//! - the `tags` key=value shortcut only supports equals / not-equals;
//!   any other operator is false. A value without `=` tests whether the
//!   tag key is present.

use crate::models::{display_number, Attribute, Condition, ConditionOperator, FieldRef, Resource};

/// A resolved field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
    Absent,
}

impl FieldValue<'_> {
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_number(s),
            Self::Absent => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(display_number(*n)),
            Self::Text(s) => Some((*s).to_string()),
            Self::Absent => None,
        }
    }
}

impl FieldRef {
    /// Look the field up on a resource
    ///
    /// The `tags` shortcut needs the condition value to know which tag it
    /// reads, so on its own it resolves to no value.
    pub fn resolve<'a>(&self, resource: &'a Resource) -> FieldValue<'a> {
        match self {
            Self::Attribute(attribute) => resolve_attribute(*attribute, resource),
            Self::Tag(key) => resource
                .tag(key)
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Absent),
            Self::TagPair | Self::Unknown(_) => FieldValue::Absent,
        }
    }
}

fn resolve_attribute(attribute: Attribute, resource: &Resource) -> FieldValue<'_> {
    match attribute {
        Attribute::Id => FieldValue::Text(&resource.id),
        Attribute::Name => FieldValue::Text(&resource.name),
        Attribute::ResourceType => resource
            .resource_type
            .as_deref()
            .map(FieldValue::Text)
            .unwrap_or(FieldValue::Absent),
        Attribute::Owner => FieldValue::Text(&resource.owner),
        Attribute::Region => FieldValue::Text(&resource.region),
        Attribute::CpuCount => FieldValue::Number(resource.cpu_count),
        Attribute::MemoryGb => FieldValue::Number(resource.memory_gb),
        Attribute::StorageGb => FieldValue::Number(resource.storage_gb),
    }
}

/// Evaluate one condition against a resource. Total: never panics.
pub fn evaluate_condition(resource: &Resource, condition: &Condition) -> bool {
    match &condition.field {
        FieldRef::TagPair => evaluate_tag_pair(resource, condition.operator, &condition.value),
        field => compare(&field.resolve(resource), condition.operator, &condition.value),
    }
}

fn compare(lhs: &FieldValue<'_>, operator: ConditionOperator, rhs: &str) -> bool {
    match operator {
        ConditionOperator::Equals => loose_eq(lhs, rhs),
        ConditionOperator::NotEquals => !loose_eq(lhs, rhs),
        ConditionOperator::GreaterThan => numeric(lhs, rhs, |a, b| a > b),
        ConditionOperator::LessThan => numeric(lhs, rhs, |a, b| a < b),
        ConditionOperator::GreaterOrEqual => numeric(lhs, rhs, |a, b| a >= b),
        ConditionOperator::LessOrEqual => numeric(lhs, rhs, |a, b| a <= b),
        ConditionOperator::Contains => contains(lhs, rhs) == Some(true),
        ConditionOperator::NotContains => contains(lhs, rhs) != Some(true),
        ConditionOperator::Unknown => false,
    }
}

fn loose_eq(lhs: &FieldValue<'_>, rhs: &str) -> bool {
    match lhs {
        FieldValue::Absent => false,
        FieldValue::Number(n) => parse_number(rhs) == Some(*n),
        FieldValue::Text(s) => {
            *s == rhs
                || matches!((parse_number(s), parse_number(rhs)), (Some(a), Some(b)) if a == b)
        }
    }
}

fn numeric(lhs: &FieldValue<'_>, rhs: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (lhs.as_number(), parse_number(rhs)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn contains(lhs: &FieldValue<'_>, rhs: &str) -> Option<bool> {
    lhs.as_text()
        .map(|text| text.to_lowercase().contains(&rhs.to_lowercase()))
}

fn evaluate_tag_pair(resource: &Resource, operator: ConditionOperator, raw: &str) -> bool {
    let matched = match raw.split_once('=') {
        Some((key, expected)) => resource.tag(key.trim()) == Some(expected.trim()),
        None => resource.tag(raw.trim()).is_some(),
    };

    match operator {
        ConditionOperator::Equals => matched,
        ConditionOperator::NotEquals => !matched,
        _ => false,
    }
}

/// Parse a finite number; blank input is not a number
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConditionOperator::*;

    fn vm() -> Resource {
        Resource::new("4200b9e0", "cerau023adh00")
            .with_capacity(8.0, 32.0, 500.0)
            .with_owner("Greg Winfield")
            .with_region("Werribee")
            .with_tag("environment", "production")
            .with_tag("app", "web-server")
            .with_tag("replicas", "3")
    }

    fn eval(field: &str, operator: ConditionOperator, value: &str) -> bool {
        evaluate_condition(&vm(), &Condition::new(field, operator, value))
    }

    #[test]
    fn test_loose_equality() {
        assert!(eval("CPU", Equals, "8"));
        assert!(eval("CPU", Equals, "8.0"));
        assert!(!eval("CPU", Equals, "eight"));
        assert!(eval("tag.replicas", Equals, "3.0"));
        assert!(eval("RegionName", Equals, "Werribee"));
        assert!(!eval("RegionName", Equals, "werribee"));
        assert!(eval("CPU", NotEquals, "4"));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(eval("CPU", GreaterThan, "4"));
        assert!(!eval("CPU", GreaterThan, "8"));
        assert!(eval("CPU", GreaterOrEqual, "8"));
        assert!(eval("MemoryGB", LessThan, "64"));
        assert!(eval("StorageGB", LessOrEqual, " 500 "));
        assert!(eval("tag.replicas", GreaterThan, "2"));
    }

    #[test]
    fn test_non_numeric_comparison_is_false() {
        assert!(!eval("CPU", GreaterThan, "lots"));
        assert!(!eval("CPU", LessThan, ""));
        assert!(!eval("ResourceName", GreaterThan, "0"));
        assert!(!eval("tag.missing", LessThan, "100"));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        assert!(eval("ResourceName", Contains, "ADH"));
        assert!(eval("OwnerID", NotContains, "alice"));
        assert!(eval("CPU", Contains, "8"));
        assert!(eval("tag.app", Contains, "Web"));
    }

    #[test]
    fn test_missing_tag_is_absent() {
        assert!(!eval("tag.team", Equals, ""));
        assert!(eval("tag.team", NotEquals, "platform"));
        assert!(!eval("tag.team", Contains, ""));
        assert!(eval("tag.team", NotContains, "platform"));
    }

    #[test]
    fn test_tag_pair_shortcut() {
        assert!(eval("tags", Equals, "environment=production"));
        assert!(!eval("tags", Equals, "environment=development"));
        assert!(eval("tags", NotEquals, "environment=development"));
        assert!(eval("tags", Equals, "app = web-server"));
        assert!(eval("tags", Equals, "environment"));
        assert!(!eval("tags", Equals, "team"));
        assert!(!eval("tags", Contains, "environment=production"));
        assert!(!eval("tags", GreaterThan, "environment=production"));
    }

    #[test]
    fn test_unknown_field_and_operator() {
        assert!(!eval("Colour", Equals, "blue"));
        assert!(eval("Colour", NotEquals, "blue"));
        assert!(!eval("CPU", Unknown, "8"));
    }

    #[test]
    fn test_absent_resource_type() {
        assert!(!eval("ResourceType", Equals, "Vmware Virtual Machine"));
        let typed = Resource {
            resource_type: Some("Vmware Virtual Machine".into()),
            ..vm()
        };
        let condition = Condition::new("ResourceType", Contains, "vmware");
        assert!(evaluate_condition(&typed, &condition));
    }
}
