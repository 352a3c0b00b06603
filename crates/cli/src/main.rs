//! VM cost allocation CLI
//!
//! A command-line tool for pricing a VM inventory against published cost
//! profiles, explaining allocations, and managing the profile store.

mod commands;
mod config;
mod output;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{allocations, profiles, resources, totals, Workspace};
use costing_lib::{EngineMetrics, ProfileStatus};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// VM cost allocation CLI
#[derive(Parser)]
#[command(name = "vmc")]
#[command(author, version, about = "CLI for VM cost allocation", long_about = None)]
pub struct Cli {
    /// Resource inventory, JSON or FOCUS CSV (can also be set via VMC_RESOURCES env var)
    #[arg(long, env = "VMC_RESOURCES")]
    pub resources: Option<PathBuf>,

    /// Cost profile store (can also be set via VMC_PROFILES env var)
    #[arg(long, env = "VMC_PROFILES")]
    pub profiles: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Currency code for printed amounts
    #[arg(long)]
    pub currency: Option<String>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Print Prometheus metrics to stderr when the command finishes
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show per-resource cost allocations
    Allocations {
        /// Filter by VM name, owner or matched profile
        #[arg(long, short)]
        search: Option<String>,

        /// Show only resources with no cost
        #[arg(long)]
        uncosted_only: bool,
    },

    /// Explain how a resource was priced
    Explain {
        /// Resource ID or name
        resource: String,
    },

    /// Show portfolio totals
    Totals {
        /// Number of most expensive resources to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// Export allocations as CSV
    Export {
        /// Output file path (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Manage cost profiles
    #[command(subcommand)]
    Profiles(ProfileCommands),

    /// Show the resource inventory
    Resources {
        /// Filter by VM name, owner or region
        #[arg(long, short)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List cost profiles
    List {
        /// Filter by status (draft, in_review, published)
        #[arg(long)]
        status: Option<profiles::StatusFilter>,
    },

    /// Validate profiles (all if no profile is given)
    Validate {
        /// Profile ID or name
        profile: Option<String>,
    },

    /// Create a draft profile from a JSON definition
    Create {
        /// Profile definition file
        #[arg(long)]
        from: PathBuf,
    },

    /// Replace a profile's definition (id, status and creation date are kept)
    Update {
        /// Profile ID or name
        profile: String,

        /// Profile definition file
        #[arg(long)]
        from: PathBuf,
    },

    /// Submit a draft profile for review
    Submit {
        /// Profile ID or name
        profile: String,
    },

    /// Publish a reviewed profile
    Publish {
        /// Profile ID or name
        profile: String,
    },

    /// Return a published profile to draft
    Unpublish {
        /// Profile ID or name
        profile: String,
    },

    /// Delete a profile from the store
    Delete {
        /// Profile ID or name
        profile: String,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    // Flags win over the config file and environment
    let config = config::Config::load()?;
    let workspace = Workspace {
        resources_path: cli.resources.unwrap_or(config.resources_path),
        profiles_path: cli.profiles.unwrap_or(config.profiles_path),
        currency: cli.currency.unwrap_or(config.currency),
        engine: config.engine,
        metrics: cli.metrics.then(EngineMetrics::new),
    };

    let result = match cli.command {
        Commands::Allocations {
            search,
            uncosted_only,
        } => allocations::list_allocations(&workspace, search, uncosted_only, cli.format),
        Commands::Explain { resource } => allocations::explain(&workspace, &resource, cli.format),
        Commands::Totals { top } => totals::show_totals(&workspace, top, cli.format),
        Commands::Export { output } => allocations::export(&workspace, output),
        Commands::Profiles(profile_cmd) => match profile_cmd {
            ProfileCommands::List { status } => {
                profiles::list_profiles(&workspace, status, cli.format)
            }
            ProfileCommands::Validate { profile } => {
                profiles::validate_profiles(&workspace, profile, cli.format)
            }
            ProfileCommands::Create { from } => {
                profiles::create_profile(&workspace, &from, cli.format)
            }
            ProfileCommands::Update { profile, from } => {
                profiles::update_profile(&workspace, &profile, &from, cli.format)
            }
            ProfileCommands::Submit { profile } => profiles::transition_profile(
                &workspace,
                &profile,
                ProfileStatus::InReview,
                cli.format,
            ),
            ProfileCommands::Publish { profile } => profiles::transition_profile(
                &workspace,
                &profile,
                ProfileStatus::Published,
                cli.format,
            ),
            ProfileCommands::Unpublish { profile } => profiles::transition_profile(
                &workspace,
                &profile,
                ProfileStatus::Draft,
                cli.format,
            ),
            ProfileCommands::Delete { profile } => profiles::delete_profile(&workspace, &profile),
        },
        Commands::Resources { search } => {
            resources::list_resources(&workspace, search, cli.format)
        }
    };

    if let Some(metrics) = &workspace.metrics {
        eprint!("{}", metrics.render());
    }

    if let Err(err) = &result {
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
    Ok(())
}
