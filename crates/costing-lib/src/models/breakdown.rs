use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::profile::CostModel;
use super::resource::Resource;

/// Accounting class of an advanced-model line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostClass {
    #[serde(rename = "capex")]
    CapEx,
    #[serde(rename = "opex")]
    OpEx,
}

/// One priced component of a resource's breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    /// Component type (simple model) or component list (advanced model)
    pub component_type: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_class: Option<CostClass>,
    /// Monthly amount charged to the resource
    pub value: f64,
    /// Shared pool before allocation (advanced model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_total: Option<f64>,
    /// Fraction of the pool charged to the resource (advanced model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<f64>,
    /// Human-readable derivation for audit and export
    pub calculation: String,
    /// Set when the component fell back to a default because its data was unusable
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

/// Per-resource engine output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub resource_id: String,
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_model: Option<CostModel>,
    /// Matched profile name; never more than one entry
    pub applied_profiles: Vec<String>,
    /// Total monthly cost; CapEx + OpEx for advanced profiles
    pub monthly_total: f64,
    /// Raw one-time charges, already amortized into `monthly_total`
    pub one_time_total: f64,
    pub capex_total: f64,
    pub opex_total: f64,
    pub line_items: Vec<LineItem>,
}

impl CostBreakdown {
    /// Breakdown of a resource no published profile matched
    pub fn uncosted(resource: &Resource) -> Self {
        Self {
            resource_id: resource.id.clone(),
            resource_name: resource.name.clone(),
            cost_model: None,
            applied_profiles: Vec::new(),
            monthly_total: 0.0,
            one_time_total: 0.0,
            capex_total: 0.0,
            opex_total: 0.0,
            line_items: Vec::new(),
        }
    }

    pub fn matched_profile(&self) -> Option<&str> {
        self.applied_profiles.first().map(String::as_str)
    }

    /// A resource counts as costed when any of its totals is nonzero
    pub fn is_costed(&self) -> bool {
        self.monthly_total != 0.0 || self.one_time_total != 0.0
    }

    pub fn degraded_items(&self) -> usize {
        self.line_items.iter().filter(|item| item.degraded).count()
    }
}

/// Aggregate for a single profile across the portfolio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileTotals {
    pub resources: usize,
    pub monthly_total: f64,
}

/// Capacity summed over the whole inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub cpu_total: f64,
    pub memory_gb_total: f64,
    pub storage_gb_total: f64,
}

impl InventorySummary {
    pub fn from_resources<'a>(resources: impl IntoIterator<Item = &'a Resource>) -> Self {
        resources.into_iter().fold(Self::default(), |mut acc, r| {
            acc.cpu_total += r.cpu_count;
            acc.memory_gb_total += r.memory_gb;
            acc.storage_gb_total += r.storage_gb;
            acc
        })
    }
}

/// Portfolio-wide totals across a resource set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub resource_count: usize,
    pub costed_count: usize,
    pub uncosted_count: usize,
    pub monthly_total: f64,
    pub one_time_total: f64,
    pub capex_total: f64,
    pub opex_total: f64,
    pub by_profile: BTreeMap<String, ProfileTotals>,
    pub by_component: BTreeMap<String, f64>,
    pub inventory: InventorySummary,
}

impl PortfolioTotals {
    /// Sum breakdowns in order
    pub fn from_breakdowns(resources: &[Resource], breakdowns: &[CostBreakdown]) -> Self {
        let mut totals = Self {
            resource_count: breakdowns.len(),
            inventory: InventorySummary::from_resources(resources),
            ..Self::default()
        };

        for breakdown in breakdowns {
            totals.monthly_total += breakdown.monthly_total;
            totals.one_time_total += breakdown.one_time_total;
            totals.capex_total += breakdown.capex_total;
            totals.opex_total += breakdown.opex_total;

            if breakdown.is_costed() {
                totals.costed_count += 1;
            } else {
                totals.uncosted_count += 1;
            }

            if let Some(profile) = breakdown.matched_profile() {
                let entry = totals.by_profile.entry(profile.to_string()).or_default();
                entry.resources += 1;
                entry.monthly_total += breakdown.monthly_total;
            }

            for item in &breakdown.line_items {
                *totals.by_component.entry(item.name.clone()).or_insert(0.0) += item.value;
            }
        }

        totals
    }

    /// Share of resources with a nonzero cost, as a percentage
    pub fn coverage_percent(&self) -> f64 {
        if self.resource_count == 0 {
            return 0.0;
        }
        self.costed_count as f64 / self.resource_count as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(name: &str, profile: Option<&str>, monthly: f64) -> CostBreakdown {
        CostBreakdown {
            applied_profiles: profile.map(|p| vec![p.to_string()]).unwrap_or_default(),
            monthly_total: monthly,
            line_items: vec![LineItem {
                name: "CPU Cost".into(),
                component_type: "per-cpu".into(),
                category: "hardware".into(),
                cost_class: None,
                value: monthly,
                pool_total: None,
                share: None,
                calculation: String::new(),
                degraded: false,
            }],
            ..CostBreakdown::uncosted(&Resource::new(name, name))
        }
    }

    #[test]
    fn test_totals_from_breakdowns() {
        let resources = vec![
            Resource::new("a", "a").with_capacity(2.0, 8.0, 100.0),
            Resource::new("b", "b").with_capacity(4.0, 16.0, 200.0),
            Resource::new("c", "c"),
        ];
        let breakdowns = vec![
            breakdown("a", Some("Basic"), 20.0),
            breakdown("b", Some("Basic"), 40.0),
            CostBreakdown::uncosted(&resources[2]),
        ];

        let totals = PortfolioTotals::from_breakdowns(&resources, &breakdowns);
        assert_eq!(totals.resource_count, 3);
        assert_eq!(totals.costed_count, 2);
        assert_eq!(totals.uncosted_count, 1);
        assert_eq!(totals.monthly_total, 60.0);
        assert_eq!(totals.by_profile["Basic"].resources, 2);
        assert_eq!(totals.by_component["CPU Cost"], 60.0);
        assert_eq!(totals.inventory.cpu_total, 6.0);
        assert_eq!(totals.inventory.storage_gb_total, 300.0);
        assert!((totals.coverage_percent() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_uncosted_breakdown() {
        let vm = Resource::new("vm-1", "pihole");
        let breakdown = CostBreakdown::uncosted(&vm);
        assert!(!breakdown.is_costed());
        assert_eq!(breakdown.matched_profile(), None);
        assert_eq!(breakdown.resource_name, "pihole");
    }
}
