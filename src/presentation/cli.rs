use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default parameters file for the draw backend blueprint
pub const DEFAULT_PARAMS_FILE: &str = "drawstack.params.toml";

/// drawstack - Declarative provisioning for the diagram rendering backend
#[derive(Parser, Debug)]
#[command(name = "drawstack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit NDJSON events instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Engine configuration file (defaults to ./drawstack.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check parameters and declarations without contacting the backend
    Validate {
        /// Blueprint parameters file (TOML or YAML)
        #[arg(short, long, default_value = DEFAULT_PARAMS_FILE)]
        params: PathBuf,
    },

    /// Print the build order and dependency edges
    Graph {
        /// Blueprint parameters file (TOML or YAML)
        #[arg(short, long, default_value = DEFAULT_PARAMS_FILE)]
        params: PathBuf,
    },

    /// Show what apply would change, using read operations only
    Plan {
        /// Blueprint parameters file (TOML or YAML)
        #[arg(short, long, default_value = DEFAULT_PARAMS_FILE)]
        params: PathBuf,
    },

    /// Converge the backend to the declared blueprint
    Apply {
        /// Blueprint parameters file (TOML or YAML)
        #[arg(short, long, default_value = DEFAULT_PARAMS_FILE)]
        params: PathBuf,

        /// Apply up to N independent steps at once
        #[arg(long)]
        parallelism: Option<usize>,
    },

    /// Print outputs recorded by the last successful apply
    Outputs,
}

impl Commands {
    /// Name used in JSON events
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Validate { .. } => "validate",
            Commands::Graph { .. } => "graph",
            Commands::Plan { .. } => "plan",
            Commands::Apply { .. } => "apply",
            Commands::Outputs => "outputs",
        }
    }
}
