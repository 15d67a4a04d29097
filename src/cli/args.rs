use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roster-splitter")]
#[command(about = "Split NHL rosters by country and position, adding metric height and weight")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Hide progress bars")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split the player dataset into one dataset per (position, country)
    Run {
        #[arg(short, long, help = "Configuration file (TOML, JSON or YAML)")]
        config: Option<PathBuf>,

        #[arg(long, help = "Country polygon dataset (.shp or .geojson)")]
        countries_file: Option<PathBuf>,

        #[arg(long, help = "Player point dataset (.shp, .geojson or .csv)")]
        players_file: Option<PathBuf>,

        #[arg(short, long, help = "Output workspace directory")]
        workspace: Option<PathBuf>,

        #[arg(long = "country", help = "Country to process (repeatable)")]
        countries: Vec<String>,

        #[arg(long = "position", help = "Position to extract (repeatable)")]
        positions: Vec<String>,

        #[arg(long, help = "Fail instead of replacing existing datasets")]
        no_overwrite: bool,

        #[arg(long, help = "Run against an in-memory workspace and write nothing")]
        dry_run: bool,

        #[arg(long, help = "Write the run report as JSON to this path")]
        report: Option<PathBuf>,
    },

    /// Check every player's height and weight without writing anything
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        players_file: Option<PathBuf>,

        #[arg(long, default_value = "20", help = "Maximum problems to list")]
        limit: usize,
    },

    /// Display schema and sample rows of a workspace dataset
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        workspace: Option<PathBuf>,

        #[arg(help = "Dataset name, e.g. CFromCanada (lists datasets when omitted)")]
        dataset: Option<String>,

        #[arg(short, long, default_value = "5")]
        sample: usize,
    },

    /// List the country names in the polygon dataset
    Countries {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        countries_file: Option<PathBuf>,
    },
}
