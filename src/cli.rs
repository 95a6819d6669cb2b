use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::geometry::GeometryPolicy;
use crate::scenario::ReassignPolicy;

#[derive(Parser, Debug)]
#[command(name = "carbon-dashboard")]
#[command(version, about = "Estimate building emissions and green-zone absorption for a carbon dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that loads input data
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Config file (default: per-user config.toml, if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory that relative input paths are resolved against
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Override the handling of non-polygon geometries
    #[arg(short, long, value_enum)]
    pub geometry_policy: Option<GeometryPolicy>,

    /// Show a full-screen progress display
    #[arg(long)]
    pub tui: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load inputs, compute estimates and write a SQLite database
    Estimate {
        /// Output SQLite database path
        output_db: PathBuf,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Load inputs, compute estimates and write the dashboard JSON
    ExportJson {
        /// Output JSON path
        output: PathBuf,

        /// Indent the output
        #[arg(short, long)]
        pretty: bool,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Apply a script of reassignment / green-roof edits and report totals
    Simulate {
        /// JSON array of edits
        edits: PathBuf,

        /// How reassignment recomputes emissions
        #[arg(short, long, value_enum, default_value_t = ReassignPolicy::OmitAgeAdjustment)]
        reassign_policy: ReassignPolicy,

        #[command(flatten)]
        input: InputArgs,
    },

    /// List the emission coefficient of every usage category
    Categories,

    /// List all output table names
    ListTables,

    /// Print the effective configuration as TOML
    ShowConfig {
        #[command(flatten)]
        input: InputArgs,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
