use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::lenient_f64;
use super::rule::RuleGroup;

/// Priority given to profiles that do not declare one
pub const DEFAULT_PRIORITY: u32 = 999;

/// Review workflow state; only published profiles allocate cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    #[default]
    Draft,
    #[serde(alias = "in-review")]
    InReview,
    Published,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InReview => "in_review",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostModel {
    /// Per-resource unit prices
    #[default]
    Simple,
    /// CapEx depreciation and OpEx pools shared across matching resources
    Advanced,
}

impl CostModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Advanced => "advanced",
        }
    }
}

/// Pricing basis of a simple-model component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    #[serde(alias = "cpu", alias = "per_cpu")]
    PerCpu,
    #[serde(alias = "memory", alias = "per_memory")]
    PerMemory,
    #[serde(alias = "storage", alias = "per_storage")]
    PerStorage,
    #[serde(alias = "fixed", alias = "fixed_monthly")]
    FixedMonthly,
    #[serde(alias = "one_time")]
    OneTime,
    /// Unrecognized type; priced as a flat monthly value
    #[default]
    #[serde(other)]
    Unknown,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerCpu => "per-cpu",
            Self::PerMemory => "per-memory",
            Self::PerStorage => "per-storage",
            Self::FixedMonthly => "fixed-monthly",
            Self::OneTime => "one-time",
            Self::Unknown => "unknown",
        }
    }

    /// Category used when a component does not name one
    pub fn default_category(&self) -> &'static str {
        match self {
            Self::PerCpu | Self::PerMemory | Self::PerStorage => "hardware",
            Self::FixedMonthly => "operations",
            Self::OneTime | Self::Unknown => "other",
        }
    }
}

/// Simple-model cost component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComponent {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub component_type: ComponentType,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: f64,
    #[serde(default, alias = "unit")]
    pub frequency: String,
    #[serde(default)]
    pub category: String,
}

impl CostComponent {
    pub fn new(name: impl Into<String>, component_type: ComponentType, value: f64) -> Self {
        Self {
            name: name.into(),
            component_type,
            value,
            frequency: String::new(),
            category: String::new(),
        }
    }
}

/// How a shared pool is divided among the resources matching a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationMethod {
    #[default]
    #[serde(alias = "per_vm")]
    PerVm,
    #[serde(alias = "per_cpu")]
    PerCpu,
    #[serde(alias = "per_memory")]
    PerMemory,
    #[serde(alias = "per_storage")]
    PerStorage,
    Weighted,
    /// Unrecognized method; allocated per VM
    #[serde(other)]
    Unknown,
}

impl AllocationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerVm => "per-vm",
            Self::PerCpu => "per-cpu",
            Self::PerMemory => "per-memory",
            Self::PerStorage => "per-storage",
            Self::Weighted => "weighted",
            Self::Unknown => "unknown",
        }
    }
}

/// Depreciating hardware purchase (CapEx)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareComponent {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub purchase_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub depreciation_years: f64,
    #[serde(default)]
    pub allocation_method: AllocationMethod,
    #[serde(default)]
    pub category: String,
}

impl HardwareComponent {
    pub fn new(
        name: impl Into<String>,
        purchase_price: f64,
        depreciation_years: f64,
        allocation_method: AllocationMethod,
    ) -> Self {
        Self {
            name: name.into(),
            purchase_price,
            depreciation_years,
            allocation_method,
            category: String::new(),
        }
    }
}

/// Flat recurring cost (OpEx); also the shape of facilities and software items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationsComponent {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub monthly_cost: f64,
    #[serde(default)]
    pub allocation_method: AllocationMethod,
    #[serde(default)]
    pub category: String,
}

impl OperationsComponent {
    pub fn new(
        name: impl Into<String>,
        monthly_cost: f64,
        allocation_method: AllocationMethod,
    ) -> Self {
        Self {
            name: name.into(),
            monthly_cost,
            allocation_method,
            category: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedComponents {
    #[serde(default)]
    pub hardware: Vec<HardwareComponent>,
    #[serde(default)]
    pub operations: Vec<OperationsComponent>,
    #[serde(default)]
    pub facilities: Vec<OperationsComponent>,
    #[serde(default)]
    pub software: Vec<OperationsComponent>,
}

impl AdvancedComponents {
    pub fn len(&self) -> usize {
        self.hardware.len() + self.operations.len() + self.facilities.len() + self.software.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// OpEx lists paired with the category they default to
    pub fn opex_lists(&self) -> [(&'static str, &[OperationsComponent]); 3] {
        [
            ("operations", self.operations.as_slice()),
            ("facilities", self.facilities.as_slice()),
            ("software", self.software.as_slice()),
        ]
    }
}

/// A named, prioritized rule set with pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostProfile {
    /// Empty until the store assigns one
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProfileStatus,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub cost_model: CostModel,
    #[serde(default)]
    pub rules: RuleGroup,
    #[serde(default)]
    pub cost_components: Vec<CostComponent>,
    #[serde(default)]
    pub advanced_cost_components: AdvancedComponents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
}

fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

impl CostProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            status: ProfileStatus::Draft,
            priority: DEFAULT_PRIORITY,
            cost_model: CostModel::Simple,
            rules: RuleGroup::default(),
            cost_components: Vec::new(),
            advanced_cost_components: AdvancedComponents::default(),
            created_date: None,
            modified_date: None,
        }
    }

    pub fn published(mut self) -> Self {
        self.status = ProfileStatus::Published;
        self
    }

    pub fn with_status(mut self, status: ProfileStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_rules(mut self, rules: RuleGroup) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_component(mut self, component: CostComponent) -> Self {
        self.cost_model = CostModel::Simple;
        self.cost_components.push(component);
        self
    }

    pub fn with_hardware(mut self, component: HardwareComponent) -> Self {
        self.cost_model = CostModel::Advanced;
        self.advanced_cost_components.hardware.push(component);
        self
    }

    pub fn with_operations(mut self, component: OperationsComponent) -> Self {
        self.cost_model = CostModel::Advanced;
        self.advanced_cost_components.operations.push(component);
        self
    }

    pub fn is_published(&self) -> bool {
        self.status == ProfileStatus::Published
    }

    /// Number of cost components for the profile's model
    pub fn component_count(&self) -> usize {
        match self.cost_model {
            CostModel::Simple => self.cost_components.len(),
            CostModel::Advanced => self.advanced_cost_components.len(),
        }
    }
}
