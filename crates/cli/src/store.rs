//! On-disk profile store and resource inventory

use anyhow::{Context, Result};
use costing_lib::{tags_from_json, CostProfile, Resource};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no cost profile with id or name '{0}'")]
    ProfileNotFound(String),

    #[error("no resource with id or name '{0}'")]
    ResourceNotFound(String),

    #[error("a cost profile named '{0}' already exists")]
    DuplicateName(String),
}

/// Cost profiles kept as a JSON array on disk
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<CostProfile>,
}

impl ProfileStore {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile store {}", path.display()))?;
        let profiles = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse profile store {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            profiles,
        })
    }

    pub fn save(&self) -> Result<()> {
        let mut content =
            serde_json::to_string_pretty(&self.profiles).context("Failed to serialize profiles")?;
        content.push('\n');
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write profile store {}", self.path.display()))
    }

    pub fn profiles(&self) -> &[CostProfile] {
        &self.profiles
    }

    /// Position of a profile by exact id, falling back to a case-insensitive name
    pub fn position(&self, key: &str) -> Result<usize, StoreError> {
        self.profiles
            .iter()
            .position(|p| p.id == key)
            .or_else(|| {
                self.profiles
                    .iter()
                    .position(|p| p.name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| StoreError::ProfileNotFound(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Result<&CostProfile, StoreError> {
        self.position(key).map(|idx| &self.profiles[idx])
    }

    pub fn replace(&mut self, idx: usize, profile: CostProfile) {
        self.profiles[idx] = profile;
    }

    /// Names are lookup keys, so two profiles may not share one (ignoring case).
    /// `except` skips the profile being edited.
    pub fn check_name_free(&self, name: &str, except: Option<usize>) -> Result<(), StoreError> {
        let taken = self
            .profiles
            .iter()
            .enumerate()
            .any(|(idx, p)| Some(idx) != except && p.name.trim().eq_ignore_ascii_case(name.trim()));
        if taken {
            Err(StoreError::DuplicateName(name.trim().to_string()))
        } else {
            Ok(())
        }
    }

    pub fn add(&mut self, profile: CostProfile) -> Result<(), StoreError> {
        self.check_name_free(&profile.name, None)?;
        self.profiles.push(profile);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<CostProfile, StoreError> {
        let idx = self.position(key)?;
        Ok(self.profiles.remove(idx))
    }
}

/// Load the inventory; `.csv` files are read as a FOCUS export, anything else as JSON
pub fn load_inventory(path: &Path) -> Result<Vec<Resource>> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        return load_focus_csv(path);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read inventory {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse inventory {}", path.display()))
}

/// Find a resource by exact id, falling back to a case-insensitive name
pub fn find_resource<'a>(resources: &'a [Resource], key: &str) -> Result<&'a Resource, StoreError> {
    resources
        .iter()
        .find(|r| r.id == key)
        .or_else(|| resources.iter().find(|r| r.name.eq_ignore_ascii_case(key)))
        .ok_or_else(|| StoreError::ResourceNotFound(key.to_string()))
}

/// One row of a FOCUS inventory export; `Tags` holds a JSON object
#[derive(Debug, Deserialize)]
struct FocusRow {
    #[serde(rename = "ResourceId")]
    id: String,
    #[serde(rename = "ResourceName")]
    name: String,
    #[serde(rename = "ResourceType", default)]
    resource_type: String,
    #[serde(rename = "RegionName", default)]
    region: String,
    #[serde(rename = "OwnerID", default)]
    owner: String,
    #[serde(rename = "CPU", default)]
    cpu: String,
    #[serde(rename = "MemoryGB", default)]
    memory_gb: String,
    #[serde(rename = "StorageGB", default)]
    storage_gb: String,
    #[serde(rename = "Tags", default)]
    tags: String,
}

impl FocusRow {
    fn into_resource(self) -> Resource {
        let number = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        };

        let mut resource = Resource::new(self.id, self.name)
            .with_owner(self.owner)
            .with_region(self.region)
            .with_capacity(number(&self.cpu), number(&self.memory_gb), number(&self.storage_gb));

        if !self.resource_type.is_empty() {
            resource.resource_type = Some(self.resource_type);
        }

        if !self.tags.trim().is_empty() {
            match serde_json::from_str::<serde_json::Value>(&self.tags) {
                Ok(value @ serde_json::Value::Object(_)) => resource.tags = tags_from_json(value),
                Ok(_) => tracing::warn!(
                    event = "inventory_tags_unreadable",
                    resource_id = %resource.id,
                    "Ignoring tags that are not a JSON object"
                ),
                Err(err) => tracing::warn!(
                    event = "inventory_tags_unreadable",
                    resource_id = %resource.id,
                    error = %err,
                    "Ignoring tags that are not a JSON object"
                ),
            }
        }

        resource
    }
}

fn load_focus_csv(path: &Path) -> Result<Vec<Resource>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open inventory {}", path.display()))?;

    reader
        .deserialize::<FocusRow>()
        .enumerate()
        .map(|(idx, row)| {
            row.map(FocusRow::into_resource)
                .with_context(|| format!("Invalid inventory row {} in {}", idx + 2, path.display()))
        })
        .collect()
}
