use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::manifest::DEFAULT_MANIFEST;

#[derive(Parser)]
#[command(name = "hashicups")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative HashiCups orders: plan, apply, refresh and destroy", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Desired-state manifest
    #[arg(short, long, global = true, default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Use an in-memory HashiCups instead of the API
    #[arg(long, global = true)]
    pub offline: bool,

    /// HashiCups API address
    #[arg(long, global = true, env = "HASHICUPS_HOST")]
    pub host: Option<String>,

    /// HashiCups username
    #[arg(long, global = true, env = "HASHICUPS_USERNAME")]
    pub username: Option<String>,

    /// HashiCups password
    #[arg(long, global = true, env = "HASHICUPS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the schemas of all resource and data source types
    Schema,

    /// Show what apply would change
    Plan(TargetArgs),

    /// Create, update and delete orders to match the manifest
    Apply(ApplyArgs),

    /// Re-read every managed order and record drift
    Refresh(TargetArgs),

    /// Delete every managed order
    Destroy(DestroyArgs),

    /// Adopt an existing order into state
    Import {
        /// Resource address (e.g., hashicups_order.edu)
        address: String,

        /// Remote id of the order
        id: String,
    },

    /// List the coffee menu
    Coffees,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, clap::Args)]
pub struct TargetArgs {
    /// Limit to a type or address (e.g., order, hashicups_order.edu)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct ApplyArgs {
    /// Limit to a type or address (e.g., order, hashicups_order.edu)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show the plan without applying it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Debug, clap::Args)]
pub struct DestroyArgs {
    /// Limit to a type or address (e.g., order, hashicups_order.edu)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
