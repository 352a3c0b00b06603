//! Cost profile commands

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use costing_lib::{
    lifecycle, validation_problems, CostProfile, EngineError, ProfileStatus, StatusCounts,
    StructuredLogger,
};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use super::Workspace;
use crate::output::{color_status, print_info, print_json, print_success, print_table, OutputFormat};

/// Profile status accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Draft,
    #[value(name = "in_review", alias = "in-review")]
    InReview,
    Published,
}

impl From<StatusFilter> for ProfileStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Draft => ProfileStatus::Draft,
            StatusFilter::InReview => ProfileStatus::InReview,
            StatusFilter::Published => ProfileStatus::Published,
        }
    }
}

/// Row for profiles table
#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: u32,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Conditions")]
    conditions: usize,
    #[tabled(rename = "Components")]
    components: usize,
    #[tabled(rename = "Modified")]
    modified: String,
}

/// Row for validation results
#[derive(Tabled)]
struct ValidationRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Result")]
    result: String,
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    id: &'a str,
    name: &'a str,
    valid: bool,
    problems: Vec<String>,
}

/// List profiles, optionally by status
pub fn list_profiles(
    workspace: &Workspace,
    status: Option<StatusFilter>,
    format: OutputFormat,
) -> Result<()> {
    let store = workspace.profile_store()?;
    let status = status.map(ProfileStatus::from);
    let profiles: Vec<_> = store
        .profiles()
        .iter()
        .filter(|p| status.map(|s| p.status == s).unwrap_or(true))
        .collect();

    match format {
        OutputFormat::Json => print_json(&profiles)?,
        OutputFormat::Table => {
            let rows: Vec<ProfileRow> = profiles
                .iter()
                .map(|p| ProfileRow {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    status: color_status(p.status.as_str()),
                    priority: p.priority,
                    model: p.cost_model.as_str().to_string(),
                    conditions: p.rules.condition_count(),
                    components: p.component_count(),
                    modified: p
                        .modified_date
                        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            print_table(&rows);

            let counts = StatusCounts::from_profiles(store.profiles());
            println!();
            println!(
                "{} profiles: {} published, {} in review, {} draft",
                counts.total(),
                counts.published,
                counts.in_review,
                counts.draft
            );
        }
    }

    Ok(())
}

/// Validate one profile, or every profile in the store
pub fn validate_profiles(
    workspace: &Workspace,
    key: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let store = workspace.profile_store()?;
    let profiles = match &key {
        Some(key) => vec![store.get(key)?],
        None => store.profiles().iter().collect(),
    };

    let reports: Vec<ValidationReport> = profiles
        .iter()
        .map(|p| {
            let problems = validation_problems(p);
            ValidationReport {
                id: &p.id,
                name: &p.name,
                valid: problems.is_empty(),
                problems,
            }
        })
        .collect();
    let invalid = reports.iter().filter(|r| !r.valid).count();

    match format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Table => {
            let rows: Vec<ValidationRow> = profiles
                .iter()
                .zip(&reports)
                .flat_map(|(profile, report)| {
                    let status = color_status(profile.status.as_str());
                    if report.valid {
                        vec![ValidationRow {
                            profile: report.name.to_string(),
                            status,
                            result: "ok".to_string(),
                        }]
                    } else {
                        report
                            .problems
                            .iter()
                            .map(|problem| ValidationRow {
                                profile: report.name.to_string(),
                                status: status.clone(),
                                result: problem.clone(),
                            })
                            .collect()
                    }
                })
                .collect();
            print_table(&rows);
        }
    }

    if invalid > 0 {
        bail!("{} of {} profile(s) failed validation", invalid, reports.len());
    }
    Ok(())
}

/// Move a profile through the review workflow and save the store
pub fn transition_profile(
    workspace: &Workspace,
    key: &str,
    target: ProfileStatus,
    format: OutputFormat,
) -> Result<()> {
    let mut store = workspace.profile_store()?;
    let logger = workspace.store_logger();
    let idx = store.position(key)?;
    let current = store.profiles()[idx].clone();

    let updated = match lifecycle::transition(&current, target, Utc::now()) {
        Ok(updated) => updated,
        Err(err) => {
            log_rejection(&logger, &current, &err);
            return Err(err.into());
        }
    };

    logger.log_profile_transition(&updated.name, current.status, updated.status);
    store.replace(idx, updated.clone());
    store.save()?;

    match format {
        OutputFormat::Json => print_json(&updated)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Profile '{}' moved from {} to {}",
                updated.name,
                color_status(current.status.as_str()),
                color_status(updated.status.as_str())
            ));
            if target == ProfileStatus::Published {
                print_info("The profile now takes part in cost allocation");
            }
        }
    }

    Ok(())
}

/// Read a profile definition written by hand or exported from another store
fn read_profile_file(path: &Path) -> Result<CostProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse profile {}", path.display()))
}

fn log_rejection(logger: &StructuredLogger, profile: &CostProfile, err: &EngineError) {
    if let EngineError::InvalidProfile { problems, .. } = err {
        logger.log_profile_rejected(&profile.name, problems);
    }
}

/// Add a new draft profile from a JSON file
pub fn create_profile(workspace: &Workspace, file: &Path, format: OutputFormat) -> Result<()> {
    let mut store = workspace.profile_store()?;
    let logger = workspace.store_logger();
    let edited = read_profile_file(file)?;

    let created = lifecycle::create_profile(&edited, uuid::Uuid::new_v4().to_string(), Utc::now())
        .inspect_err(|err| log_rejection(&logger, &edited, err))?;
    store.add(created.clone())?;
    store.save()?;
    logger.log_profile_saved(&created, "created");

    match format {
        OutputFormat::Json => print_json(&created)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Created profile '{}' ({}) as {}",
                created.name,
                created.id,
                color_status(created.status.as_str())
            ));
            print_info("Submit it for review before it can be published");
        }
    }

    Ok(())
}

/// Replace a stored profile's definition with the contents of a JSON file
pub fn update_profile(
    workspace: &Workspace,
    key: &str,
    file: &Path,
    format: OutputFormat,
) -> Result<()> {
    let mut store = workspace.profile_store()?;
    let logger = workspace.store_logger();
    let idx = store.position(key)?;
    let edited = read_profile_file(file)?;

    let updated = lifecycle::update_profile(&store.profiles()[idx], &edited, Utc::now())
        .inspect_err(|err| log_rejection(&logger, &edited, err))?;
    store.check_name_free(&updated.name, Some(idx))?;
    store.replace(idx, updated.clone());
    store.save()?;
    logger.log_profile_saved(&updated, "updated");

    match format {
        OutputFormat::Json => print_json(&updated)?,
        OutputFormat::Table => print_success(&format!(
            "Updated profile '{}' ({})",
            updated.name, updated.id
        )),
    }

    Ok(())
}

/// Remove a profile from the store
pub fn delete_profile(workspace: &Workspace, key: &str) -> Result<()> {
    let mut store = workspace.profile_store()?;
    let removed = store.remove(key)?;
    store.save()?;

    print_success(&format!("Deleted profile '{}' ({})", removed.name, removed.id));
    Ok(())
}
