use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jcgroup")]
#[command(author = "jcgroup contributors")]
#[command(version)]
#[command(about = "Declaratively manage JumpCloud user groups", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to <config dir>/jcgroup.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// State file (defaults to <state dir>/state.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the provider schema as JSON
    Schema,

    /// Show what apply would change
    Plan(PlanArgs),

    /// Make the remote groups match the config
    Apply(ApplyArgs),

    /// Read every managed group and record drift
    Refresh(RefreshArgs),

    /// Bring an existing group under management
    Import {
        /// Address to import into, e.g. user_group.eng
        address: String,

        /// Remote id of the group
        id: String,
    },

    /// Look up a group by name
    Lookup {
        /// Exact group name
        name: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every managed group
    Destroy(DestroyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Only plan a kind or a single address (e.g. user_group.eng)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Plan against recorded state without reading the remote
    #[arg(long)]
    pub no_refresh: bool,

    /// Seconds before remote calls are abandoned
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only apply a kind or a single address (e.g. user_group.eng)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Seconds before remote calls are abandoned
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Dry run - show what would be done
    #[arg(short, long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct RefreshArgs {
    /// Only refresh a kind or a single address
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Seconds before remote calls are abandoned
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Only destroy a kind or a single address
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Seconds before remote calls are abandoned
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
