use serde::{Deserialize, Serialize};
use std::fmt;

use super::lenient_string;
use super::resource::Attribute;

/// How a condition locates the value it compares against
///
/// Parsed once when the profile is loaded so evaluation dispatches on the
/// variant instead of re-inspecting the field string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldRef {
    /// A fixed resource attribute such as `CPU` or `OwnerID`
    Attribute(Attribute),
    /// `tag.<key>` or `Tags.<key>`: the tag's value, absent when missing
    Tag(String),
    /// `tags` shortcut: the condition value carries `key=value`
    TagPair,
    /// Unrecognized field name; always resolves to no value
    Unknown(String),
}

impl From<&str> for FieldRef {
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();

        if trimmed.eq_ignore_ascii_case("tags") {
            return Self::TagPair;
        }

        if let Some((prefix, key)) = trimmed.split_once('.') {
            if (prefix.eq_ignore_ascii_case("tag") || prefix.eq_ignore_ascii_case("tags"))
                && !key.is_empty()
            {
                return Self::Tag(key.to_string());
            }
        }

        match Attribute::parse(trimmed) {
            Some(attribute) => Self::Attribute(attribute),
            None => Self::Unknown(trimmed.to_string()),
        }
    }
}

impl From<String> for FieldRef {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<FieldRef> for String {
    fn from(field: FieldRef) -> Self {
        field.to_string()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(attribute) => f.write_str(attribute.as_str()),
            Self::Tag(key) => write!(f, "tag.{}", key),
            Self::TagPair => f.write_str("tags"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Comparison applied by a condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionOperator {
    Equals,
    #[serde(alias = "not_equals")]
    NotEquals,
    #[serde(alias = "greater_than")]
    GreaterThan,
    #[serde(alias = "less_than")]
    LessThan,
    #[serde(alias = "greater_equal", alias = "greater_or_equal")]
    GreaterOrEqual,
    #[serde(alias = "less_equal", alias = "less_or_equal")]
    LessOrEqual,
    Contains,
    #[serde(alias = "not_contains")]
    NotContains,
    /// Anything unrecognized; never matches
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single attribute comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: FieldRef,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
}

impl Condition {
    pub fn new(field: &str, operator: ConditionOperator, value: impl Into<String>) -> Self {
        Self {
            field: FieldRef::from(field),
            operator,
            value: value.into(),
        }
    }
}

/// How the results inside a rule group combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
    #[serde(other)]
    Unknown,
}

/// A node of a profile's rule tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    #[serde(default)]
    pub operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<RuleGroup>,
}

impl RuleGroup {
    /// Group whose conditions must all hold
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            operator: LogicalOperator::And,
            conditions,
            groups: Vec::new(),
        }
    }

    /// Group where any one condition suffices
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            operator: LogicalOperator::Or,
            conditions,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: RuleGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// True when the node has neither conditions nor child groups
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Number of conditions in this node and every descendant
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
            + self
                .groups
                .iter()
                .map(RuleGroup::condition_count)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ref_parsing() {
        assert_eq!(FieldRef::from("CPU"), FieldRef::Attribute(Attribute::CpuCount));
        assert_eq!(FieldRef::from("tags"), FieldRef::TagPair);
        assert_eq!(FieldRef::from("Tags.environment"), FieldRef::Tag("environment".into()));
        assert_eq!(FieldRef::from("tag.app"), FieldRef::Tag("app".into()));
        assert_eq!(FieldRef::from("tag."), FieldRef::Unknown("tag.".into()));
        assert_eq!(FieldRef::from("Colour"), FieldRef::Unknown("Colour".into()));
    }

    #[test]
    fn test_condition_accepts_both_operator_spellings() {
        let original: Condition =
            serde_json::from_str(r#"{"field": "CPU", "operator": "greater_equal", "value": "4"}"#)
                .unwrap();
        let kebab: Condition =
            serde_json::from_str(r#"{"field": "CPU", "operator": "greater-or-equal", "value": 4}"#)
                .unwrap();

        assert_eq!(original.operator, ConditionOperator::GreaterOrEqual);
        assert_eq!(original, kebab);
    }

    #[test]
    fn test_unknown_operator_deserializes() {
        let condition: Condition =
            serde_json::from_str(r#"{"field": "CPU", "operator": "between", "value": "4"}"#)
                .unwrap();
        assert_eq!(condition.operator, ConditionOperator::Unknown);
    }

    #[test]
    fn test_rule_group_defaults() {
        let group: RuleGroup = serde_json::from_str(r#"{"operator": "OR"}"#).unwrap();
        assert_eq!(group.operator, LogicalOperator::Or);
        assert!(group.is_empty());

        let group: RuleGroup = serde_json::from_str(r#"{"operator": "XOR"}"#).unwrap();
        assert_eq!(group.operator, LogicalOperator::Unknown);

        let nested = RuleGroup::all(vec![Condition::new("CPU", ConditionOperator::Equals, "2")])
            .with_group(RuleGroup::any(vec![
                Condition::new("tag.env", ConditionOperator::Equals, "prod"),
                Condition::new("tag.env", ConditionOperator::Equals, "test"),
            ]));
        assert_eq!(nested.condition_count(), 3);
    }

    #[test]
    fn test_field_serializes_canonically() {
        let condition = Condition::new("memory", ConditionOperator::LessThan, "64");
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["field"], "MemoryGB");
        assert_eq!(json["operator"], "less-than");
    }
}
