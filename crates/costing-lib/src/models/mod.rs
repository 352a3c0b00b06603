//! Core data models for the costing engine
//!
//! Resources and cost profiles are read-only inputs supplied by the
//! inventory and the profile store. Breakdowns and portfolio totals are
//! the engine's outputs.

mod breakdown;
mod profile;
mod resource;
mod rule;

pub use breakdown::{
    CostBreakdown, CostClass, InventorySummary, LineItem, PortfolioTotals, ProfileTotals,
};
pub use profile::{
    AdvancedComponents, AllocationMethod, ComponentType, CostComponent, CostModel, CostProfile,
    HardwareComponent, OperationsComponent, ProfileStatus, DEFAULT_PRIORITY,
};
pub use resource::{Attribute, Resource};
pub use rule::{Condition, ConditionOperator, FieldRef, LogicalOperator, RuleGroup};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Deserialize a numeric field leniently.
///
/// Numbers and numeric strings are accepted; null, missing or non-numeric
/// input becomes 0 so a malformed component degrades instead of failing
/// the whole profile document.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(number_from_json).unwrap_or(0.0))
}

/// Deserialize a scalar as text; numbers and booleans are stringified.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Deserialize a tag map leniently; see [`tags_from_json`].
pub(crate) fn lenient_tags<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(tags_from_json).unwrap_or_default())
}

/// Convert a JSON tag object into text tags.
///
/// Numbers and booleans are stringified, nested values keep their JSON
/// text and null values are dropped. Anything other than an object yields
/// no tags.
pub fn tags_from_json(value: Value) -> BTreeMap<String, String> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };

    map.into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect()
}

fn number_from_json(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Render a number the way a person would type it: `8` rather than `8.0`.
pub fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_f64")]
        amount: f64,
        #[serde(default, deserialize_with = "lenient_string")]
        label: String,
    }

    #[test]
    fn test_lenient_number_forms() {
        let p: Sample = serde_json::from_str(r#"{"amount": 12.5}"#).unwrap();
        assert_eq!(p.amount, 12.5);

        let p: Sample = serde_json::from_str(r#"{"amount": " 40 "}"#).unwrap();
        assert_eq!(p.amount, 40.0);

        let p: Sample = serde_json::from_str(r#"{"amount": "lots"}"#).unwrap();
        assert_eq!(p.amount, 0.0);

        let p: Sample = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert_eq!(p.amount, 0.0);

        let p: Sample = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.amount, 0.0);
    }

    #[test]
    fn test_lenient_string_forms() {
        let p: Sample = serde_json::from_str(r#"{"label": 8}"#).unwrap();
        assert_eq!(p.label, "8");

        let p: Sample = serde_json::from_str(r#"{"label": true}"#).unwrap();
        assert_eq!(p.label, "true");

        let p: Sample = serde_json::from_str(r#"{"label": null}"#).unwrap();
        assert_eq!(p.label, "");
    }

    #[test]
    fn test_tags_from_json_stringifies_scalars() {
        let tags = tags_from_json(serde_json::json!({
            "replicas": 3,
            "managed": true,
            "owner": null,
            "env": "prod"
        }));

        assert_eq!(tags.get("replicas").map(String::as_str), Some("3"));
        assert_eq!(tags.get("managed").map(String::as_str), Some("true"));
        assert_eq!(tags.get("env").map(String::as_str), Some("prod"));
        assert!(!tags.contains_key("owner"));

        assert!(tags_from_json(serde_json::json!(["a", "b"])).is_empty());
        assert!(tags_from_json(Value::Null).is_empty());
    }

    #[test]
    fn test_display_number() {
        assert_eq!(display_number(8.0), "8");
        assert_eq!(display_number(0.5), "0.5");
        assert_eq!(display_number(-3.0), "-3");
    }
}
