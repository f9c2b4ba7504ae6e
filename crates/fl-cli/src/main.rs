//! flatlep CLI
//!
//! Extracts the 4-lepton dataset from the ATLAS Open Data samples: unzips
//! the sample archive, locates `DataMuons.root`, inspects the `mini` tree,
//! pads every lepton branch to four slots per event, and writes one CSV.

mod archive;
mod discover;
mod flatten;
mod inspect;
mod pipeline;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pipeline::{ExtractConfig, LEP_SLOTS, REQUESTED_FIELDS};

#[derive(Parser)]
#[command(name = "flatlep")]
#[command(about = "flatlep - ATLAS open-data 4-lepton CSV extraction")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: unzip, locate, inspect, flatten, write CSV
    Extract {
        /// Zip archive holding the open-data samples
        #[arg(
            long,
            default_value = "atlas_data/complete_set_of_ATLAS_open_data_samples_July_2016.zip"
        )]
        archive: PathBuf,

        /// Directory the archive is extracted into
        #[arg(long, default_value = "atlas_data/extracted")]
        data_dir: PathBuf,

        /// ROOT file to locate under the data directory
        #[arg(long, default_value = "DataMuons.root")]
        file_name: String,

        /// TTree to read (bare name or `name;cycle`)
        #[arg(long, default_value = "mini;1")]
        tree: String,

        /// Output CSV path
        #[arg(short, long, default_value = "extracted_4lep_data.csv")]
        output: PathBuf,
    },

    /// Inspect only: keys, branch types, lepton multiplicities (no CSV)
    Inspect {
        /// Zip archive holding the open-data samples
        #[arg(
            long,
            default_value = "atlas_data/complete_set_of_ATLAS_open_data_samples_July_2016.zip"
        )]
        archive: PathBuf,

        /// Directory the archive is extracted into
        #[arg(long, default_value = "atlas_data/extracted")]
        data_dir: PathBuf,

        /// ROOT file to locate under the data directory
        #[arg(long, default_value = "DataMuons.root")]
        file_name: String,

        /// TTree to read (bare name or `name;cycle`)
        #[arg(long, default_value = "mini;1")]
        tree: String,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Extract { archive, data_dir, file_name, tree, output } => {
            let cfg = config(archive, data_dir, file_name, tree, output);
            pipeline::run_extract(&cfg)
        }
        Commands::Inspect { archive, data_dir, file_name, tree } => {
            let cfg = config(
                archive,
                data_dir,
                file_name,
                tree,
                PathBuf::from("extracted_4lep_data.csv"),
            );
            pipeline::run_inspect(&cfg)
        }
        Commands::Version => {
            println!("flatlep {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn config(
    archive: PathBuf,
    data_dir: PathBuf,
    file_name: String,
    tree: String,
    output: PathBuf,
) -> ExtractConfig {
    ExtractConfig {
        archive,
        data_dir,
        file_name,
        tree_name: tree,
        fields: REQUESTED_FIELDS.iter().map(|s| s.to_string()).collect(),
        slots: LEP_SLOTS,
        output,
    }
}
