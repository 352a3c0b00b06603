//! Portfolio totals command

use anyhow::Result;
use colored::Colorize;
use costing_lib::aggregate::top_by_cost;
use costing_lib::{display_number, PortfolioTotals, StatusCounts};
use serde::Serialize;
use tabled::Tabled;

use super::Workspace;
use crate::output::{
    format_currency, format_percent, print_heading, print_json, print_table, print_warning,
    OutputFormat,
};

/// Row for cost by profile table
#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Resources")]
    resources: usize,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Share")]
    share: String,
}

/// Row for cost by component table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
}

/// Row for most expensive resources table
#[derive(Tabled)]
struct TopRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "VM Name")]
    name: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
}

#[derive(Serialize)]
struct TotalsReport<'a> {
    totals: &'a PortfolioTotals,
    profiles: StatusCounts,
    top: Vec<TopEntry<'a>>,
}

#[derive(Serialize)]
struct TopEntry<'a> {
    resource_id: &'a str,
    resource_name: &'a str,
    profile: Option<&'a str>,
    monthly_total: f64,
}

/// Show portfolio totals
pub fn show_totals(workspace: &Workspace, top: usize, format: OutputFormat) -> Result<()> {
    let resources = workspace.resources()?;
    let store = workspace.profile_store()?;
    let (breakdowns, totals) = workspace.engine().price_portfolio(&resources, store.profiles());
    let counts = StatusCounts::from_profiles(store.profiles());
    let ranked = top_by_cost(&breakdowns, top);

    match format {
        OutputFormat::Json => {
            let top = ranked
                .iter()
                .map(|b| TopEntry {
                    resource_id: &b.resource_id,
                    resource_name: &b.resource_name,
                    profile: b.matched_profile(),
                    monthly_total: b.monthly_total,
                })
                .collect();
            print_json(&TotalsReport {
                totals: &totals,
                profiles: counts,
                top,
            })?;
        }
        OutputFormat::Table => {
            let currency = &workspace.currency;

            print_heading("Portfolio Totals", 60);
            println!(
                "Resources:              {} ({} costed, {} uncosted, {} coverage)",
                totals.resource_count,
                totals.costed_count,
                totals.uncosted_count,
                format_percent(totals.coverage_percent() / 100.0)
            );
            println!(
                "Profiles:               {} published, {} in review, {} draft",
                counts.published, counts.in_review, counts.draft
            );
            println!(
                "Inventory:              {} CPU, {} GB memory, {:.1} TB storage",
                display_number(totals.inventory.cpu_total),
                display_number(totals.inventory.memory_gb_total),
                totals.inventory.storage_gb_total / 1000.0
            );
            println!();

            println!("{}", "Monthly Costs".bold());
            println!("{}", "-".repeat(60));
            println!(
                "Total:                  {}",
                format_currency(totals.monthly_total, currency).green().bold()
            );
            println!(
                "  CapEx:                {}",
                format_currency(totals.capex_total, currency)
            );
            println!(
                "  OpEx:                 {}",
                format_currency(totals.opex_total, currency)
            );
            println!(
                "One-time charges:       {} (raw, amortized into the total)",
                format_currency(totals.one_time_total, currency)
            );
            println!();

            if !totals.by_profile.is_empty() {
                println!("{}", "Cost by Profile".bold());
                println!("{}", "-".repeat(60));
                let rows: Vec<ProfileRow> = totals
                    .by_profile
                    .iter()
                    .map(|(name, entry)| ProfileRow {
                        profile: name.clone(),
                        resources: entry.resources,
                        monthly: format_currency(entry.monthly_total, currency),
                        share: if totals.monthly_total > 0.0 {
                            format_percent(entry.monthly_total / totals.monthly_total)
                        } else {
                            format_percent(0.0)
                        },
                    })
                    .collect();
                print_table(&rows);
                println!();
            }

            if !totals.by_component.is_empty() {
                println!("{}", "Cost by Component".bold());
                println!("{}", "-".repeat(60));
                let rows: Vec<ComponentRow> = totals
                    .by_component
                    .iter()
                    .map(|(name, value)| ComponentRow {
                        component: name.clone(),
                        monthly: format_currency(*value, currency),
                    })
                    .collect();
                print_table(&rows);
                println!();
            }

            if !ranked.is_empty() {
                println!("{}", format!("Top {} Resources", ranked.len()).bold());
                println!("{}", "-".repeat(60));
                let rows: Vec<TopRow> = ranked
                    .iter()
                    .enumerate()
                    .map(|(idx, b)| TopRow {
                        rank: idx + 1,
                        name: b.resource_name.clone(),
                        profile: b.matched_profile().unwrap_or("None").to_string(),
                        monthly: format_currency(b.monthly_total, currency),
                    })
                    .collect();
                print_table(&rows);
            }

            if totals.uncosted_count > 0 {
                println!();
                print_warning(&format!(
                    "{} resource(s) matched no published cost profile",
                    totals.uncosted_count
                ));
            }
        }
    }

    Ok(())
}
