//! CLI command implementations

pub mod allocations;
pub mod profiles;
pub mod resources;
pub mod totals;

use anyhow::Result;
use costing_lib::{CostEngine, EngineConfig, EngineMetrics, Resource, StructuredLogger};
use std::path::PathBuf;

use crate::store::{self, ProfileStore};

/// Resolved inputs shared by every command
pub struct Workspace {
    pub resources_path: PathBuf,
    pub profiles_path: PathBuf,
    pub currency: String,
    pub engine: EngineConfig,
    pub metrics: Option<EngineMetrics>,
}

impl Workspace {
    pub fn resources(&self) -> Result<Vec<Resource>> {
        store::load_inventory(&self.resources_path)
    }

    pub fn profile_store(&self) -> Result<ProfileStore> {
        ProfileStore::load(&self.profiles_path)
    }

    pub fn engine(&self) -> CostEngine {
        let engine = CostEngine::with_config(self.engine.clone()).with_logger(StructuredLogger::new(
            self.resources_path.display().to_string(),
        ));
        match &self.metrics {
            Some(metrics) => engine.with_metrics(metrics.clone()),
            None => engine,
        }
    }

    /// Logger for profile store events
    pub fn store_logger(&self) -> StructuredLogger {
        StructuredLogger::new(self.profiles_path.display().to_string())
    }
}
