//! Resource inventory command

use anyhow::Result;
use colored::Colorize;
use costing_lib::{display_number, InventorySummary, Resource};
use serde::Serialize;
use tabled::Tabled;

use super::Workspace;
use crate::output::{print_heading, print_json, print_table, OutputFormat};

/// Row for resources table
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "VM Name")]
    name: String,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory (GB)")]
    memory: String,
    #[tabled(rename = "Storage (GB)")]
    storage: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

#[derive(Serialize)]
struct InventoryReport<'a> {
    resources: Vec<&'a Resource>,
    summary: InventorySummary,
}

/// List the inventory
pub fn list_resources(
    workspace: &Workspace,
    search: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let resources = workspace.resources()?;
    let needle = search.map(|s| s.to_lowercase());
    let selected: Vec<&Resource> = resources
        .iter()
        .filter(|r| needle.as_deref().map(|n| matches_search(r, n)).unwrap_or(true))
        .collect();

    let summary = InventorySummary::from_resources(selected.iter().copied());

    match format {
        OutputFormat::Json => print_json(&InventoryReport {
            resources: selected,
            summary,
        })?,
        OutputFormat::Table => {
            let rows: Vec<ResourceRow> = selected
                .iter()
                .map(|r| ResourceRow {
                    name: r.name.clone(),
                    resource_type: r.resource_type.clone().unwrap_or_default(),
                    region: r.region.clone(),
                    owner: r.owner.clone(),
                    cpu: display_number(r.cpu_count),
                    memory: display_number(r.memory_gb),
                    storage: display_number(r.storage_gb),
                    tags: r
                        .tags
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect();
            print_table(&rows);
            println!();

            print_heading("Inventory Summary", 40);
            println!("Virtual machines:       {}", selected.len().to_string().cyan());
            println!("Total CPU:              {}", display_number(summary.cpu_total));
            println!("Total memory:           {} GB", display_number(summary.memory_gb_total));
            println!(
                "Total storage:          {:.1} TB",
                summary.storage_gb_total / 1000.0
            );
        }
    }

    Ok(())
}

/// Case-insensitive match on name, owner or region
fn matches_search(resource: &Resource, needle: &str) -> bool {
    resource.name.to_lowercase().contains(needle)
        || resource.owner.to_lowercase().contains(needle)
        || resource.region.to_lowercase().contains(needle)
}
