//! Per-resource allocation commands

use anyhow::{Context, Result};
use colored::Colorize;
use costing_lib::matcher::published_in_priority_order;
use costing_lib::{display_number, write_csv, CostBreakdown, Resource, RuleEvaluator};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tabled::Tabled;

use super::Workspace;
use crate::output::{
    format_currency, format_percent, print_heading, print_info, print_json, print_success,
    print_table, print_warning, OutputFormat,
};
use crate::store::find_resource;

const NO_PROFILE: &str = "None";

/// Row for the allocations table
#[derive(Tabled)]
struct AllocationRow {
    #[tabled(rename = "VM Name")]
    name: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory (GB)")]
    memory: String,
    #[tabled(rename = "Storage (GB)")]
    storage: String,
    #[tabled(rename = "Matched Profile")]
    profile: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "One-Time")]
    one_time: String,
}

/// Row for the line item table
#[derive(Tabled)]
struct LineItemRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Type")]
    component_type: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Cost")]
    value: String,
    #[tabled(rename = "Calculation")]
    calculation: String,
}

/// One published profile as seen by the matcher
#[derive(Tabled, Serialize)]
struct Candidate {
    #[tabled(rename = "Priority")]
    priority: u32,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Outcome")]
    outcome: &'static str,
}

#[derive(Serialize)]
struct Explanation<'a> {
    resource: &'a Resource,
    candidates: Vec<Candidate>,
    breakdown: &'a CostBreakdown,
}

/// List allocations with optional filters
pub fn list_allocations(
    workspace: &Workspace,
    search: Option<String>,
    uncosted_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let resources = workspace.resources()?;
    let store = workspace.profile_store()?;
    let breakdowns = workspace.engine().allocate_all(&resources, store.profiles());

    let needle = search.map(|s| s.to_lowercase());
    let selected: Vec<(&Resource, &CostBreakdown)> = resources
        .iter()
        .zip(&breakdowns)
        .filter(|(resource, breakdown)| {
            needle
                .as_deref()
                .map(|n| matches_search(resource, breakdown, n))
                .unwrap_or(true)
        })
        .filter(|(_, breakdown)| !uncosted_only || !breakdown.is_costed())
        .collect();

    match format {
        OutputFormat::Json => {
            let items: Vec<&CostBreakdown> = selected.iter().map(|(_, b)| *b).collect();
            print_json(&items)?;
        }
        OutputFormat::Table => {
            let currency = &workspace.currency;
            let rows: Vec<AllocationRow> = selected
                .iter()
                .map(|(resource, breakdown)| AllocationRow {
                    name: resource.name.clone(),
                    owner: resource.owner.clone(),
                    cpu: display_number(resource.cpu_count),
                    memory: display_number(resource.memory_gb),
                    storage: display_number(resource.storage_gb),
                    profile: breakdown.matched_profile().unwrap_or(NO_PROFILE).to_string(),
                    monthly: format_currency(breakdown.monthly_total, currency),
                    one_time: format_currency(breakdown.one_time_total, currency),
                })
                .collect();
            print_table(&rows);

            let monthly: f64 = selected.iter().map(|(_, b)| b.monthly_total).sum();
            let uncosted = selected.iter().filter(|(_, b)| !b.is_costed()).count();
            println!();
            println!(
                "{} resources, monthly total {}",
                selected.len(),
                format_currency(monthly, currency).green().bold()
            );
            if uncosted > 0 && !uncosted_only {
                print_warning(&format!(
                    "{} resource(s) matched no published cost profile",
                    uncosted
                ));
            }
        }
    }

    Ok(())
}

/// Explain how one resource was priced
pub fn explain(workspace: &Workspace, key: &str, format: OutputFormat) -> Result<()> {
    let resources = workspace.resources()?;
    let store = workspace.profile_store()?;
    let resource = find_resource(&resources, key)?;

    let engine = workspace.engine();
    let breakdown = engine.allocate(resource, store.profiles(), &resources);

    let mut selected = false;
    let candidates: Vec<Candidate> = published_in_priority_order(store.profiles())
        .into_iter()
        .map(|profile| {
            let outcome = if selected {
                "not evaluated"
            } else if engine.matcher().evaluator().evaluate(resource, &profile.rules) {
                selected = true;
                "selected"
            } else {
                "no match"
            };
            Candidate {
                priority: profile.priority,
                profile: profile.name.clone(),
                outcome,
            }
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&Explanation {
            resource,
            candidates,
            breakdown: &breakdown,
        })?,
        OutputFormat::Table => print_explanation(workspace, resource, &candidates, &breakdown),
    }

    Ok(())
}

fn print_explanation(
    workspace: &Workspace,
    resource: &Resource,
    candidates: &[Candidate],
    breakdown: &CostBreakdown,
) {
    let currency = &workspace.currency;

    print_heading("Cost Explanation", 60);
    println!("Resource:               {} ({})", resource.name.cyan(), resource.id);
    println!("Owner:                  {}", resource.owner);
    println!(
        "Capacity:               {} CPU, {} GB memory, {} GB storage",
        display_number(resource.cpu_count),
        display_number(resource.memory_gb),
        display_number(resource.storage_gb)
    );
    let tags: Vec<String> = resource.tags.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    println!("Tags:                   {}", tags.join(", "));
    println!();

    println!("{}", "Published Profiles".bold());
    println!("{}", "-".repeat(60));
    print_table(candidates);
    println!();

    let Some(profile) = breakdown.matched_profile() else {
        print_warning("No published cost profile matched this resource");
        return;
    };

    let model = breakdown.cost_model.map(|m| m.as_str()).unwrap_or_default();
    println!("{} {} ({} model)", "Matched Profile:".bold(), profile.green(), model);
    println!();

    let rows: Vec<LineItemRow> = breakdown
        .line_items
        .iter()
        .map(|item| LineItemRow {
            name: if item.degraded {
                format!("{} (fallback)", item.name)
            } else {
                item.name.clone()
            },
            component_type: item.component_type.clone(),
            category: item.category.clone(),
            value: format_currency(item.value, currency),
            calculation: item.calculation.clone(),
        })
        .collect();
    print_table(&rows);
    println!();

    println!(
        "{}  {}",
        "Monthly Total:".bold(),
        format_currency(breakdown.monthly_total, currency).green().bold()
    );
    if breakdown.capex_total != 0.0 || breakdown.opex_total != 0.0 {
        let share = |part: f64| {
            if breakdown.monthly_total > 0.0 {
                format_percent(part / breakdown.monthly_total)
            } else {
                format_percent(0.0)
            }
        };
        println!(
            "  CapEx:                {} ({})",
            format_currency(breakdown.capex_total, currency),
            share(breakdown.capex_total)
        );
        println!(
            "  OpEx:                 {} ({})",
            format_currency(breakdown.opex_total, currency),
            share(breakdown.opex_total)
        );
    }
    if breakdown.one_time_total != 0.0 {
        print_info(&format!(
            "One-time charges of {} are amortized into the monthly total",
            format_currency(breakdown.one_time_total, currency)
        ));
    }
    if breakdown.degraded_items() > 0 {
        print_warning(&format!(
            "{} line item(s) used a fallback because the component data was unusable",
            breakdown.degraded_items()
        ));
    }
}

/// Export allocations as CSV to a file or stdout
pub fn export(workspace: &Workspace, output: Option<PathBuf>) -> Result<()> {
    let resources = workspace.resources()?;
    let store = workspace.profile_store()?;
    let breakdowns = workspace.engine().allocate_all(&resources, store.profiles());

    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_csv(BufWriter::new(file), &resources, &breakdowns)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!(
                "Exported {} resources to {}",
                breakdowns.len(),
                path.display()
            ));
        }
        None => {
            let stdout = io::stdout();
            write_csv(stdout.lock(), &resources, &breakdowns)
                .context("Failed to write CSV to stdout")?;
        }
    }

    Ok(())
}

/// Case-insensitive match on name, owner or matched profile
fn matches_search(resource: &Resource, breakdown: &CostBreakdown, needle: &str) -> bool {
    resource.name.to_lowercase().contains(needle)
        || resource.owner.to_lowercase().contains(needle)
        || breakdown
            .matched_profile()
            .map(|p| p.to_lowercase().contains(needle))
            .unwrap_or(false)
}
