use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{lenient_f64, lenient_tags};

/// A virtual machine from the resource inventory
///
/// Field names follow the FOCUS-style inventory export; snake_case aliases
/// are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "ResourceId", alias = "id")]
    pub id: String,
    #[serde(rename = "ResourceName", alias = "name")]
    pub name: String,
    #[serde(
        rename = "ResourceType",
        alias = "resource_type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_type: Option<String>,
    #[serde(rename = "OwnerID", alias = "owner", default)]
    pub owner: String,
    #[serde(rename = "RegionName", alias = "region", default)]
    pub region: String,
    #[serde(rename = "CPU", alias = "cpu_count", default, deserialize_with = "lenient_f64")]
    pub cpu_count: f64,
    #[serde(
        rename = "MemoryGB",
        alias = "memory_gb",
        default,
        deserialize_with = "lenient_f64"
    )]
    pub memory_gb: f64,
    #[serde(
        rename = "StorageGB",
        alias = "storage_gb",
        default,
        deserialize_with = "lenient_f64"
    )]
    pub storage_gb: f64,
    #[serde(rename = "Tags", alias = "tags", default, deserialize_with = "lenient_tags")]
    pub tags: BTreeMap<String, String>,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type: None,
            owner: String::new(),
            region: String::new(),
            cpu_count: 0.0,
            memory_gb: 0.0,
            storage_gb: 0.0,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_capacity(mut self, cpu_count: f64, memory_gb: f64, storage_gb: f64) -> Self {
        self.cpu_count = cpu_count;
        self.memory_gb = memory_gb;
        self.storage_gb = storage_gb;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Directly addressable resource attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Id,
    Name,
    ResourceType,
    Owner,
    Region,
    CpuCount,
    MemoryGb,
    StorageGb,
}

impl Attribute {
    /// Parse an attribute name, ignoring case, `_` and `-`.
    ///
    /// Both inventory column names (`MemoryGB`, `OwnerID`) and short names
    /// (`memory`, `owner`) are recognized.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "resourceid" | "id" => Some(Self::Id),
            "resourcename" | "name" => Some(Self::Name),
            "resourcetype" | "type" => Some(Self::ResourceType),
            "ownerid" | "owner" => Some(Self::Owner),
            "regionname" | "region" => Some(Self::Region),
            "cpu" | "cpucount" | "vcpu" | "vcpucount" => Some(Self::CpuCount),
            "memorygb" | "memory" => Some(Self::MemoryGb),
            "storagegb" | "storage" => Some(Self::StorageGb),
            _ => None,
        }
    }

    /// Canonical inventory column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "ResourceId",
            Self::Name => "ResourceName",
            Self::ResourceType => "ResourceType",
            Self::Owner => "OwnerID",
            Self::Region => "RegionName",
            Self::CpuCount => "CPU",
            Self::MemoryGb => "MemoryGB",
            Self::StorageGb => "StorageGB",
        }
    }
}
