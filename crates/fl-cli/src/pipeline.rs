//! Pipeline orchestration: provision, locate, inspect, flatten, save.

use std::path::PathBuf;

use anyhow::{Context, Result};
use fl_root::{RootFile, Tree};

use crate::{archive, discover, flatten, inspect, table};

/// Branches written to the output table, in column order.
pub(crate) const REQUESTED_FIELDS: [&str; 20] = [
    "lep_pt",
    "lep_n",
    "lep_type",
    "lep_charge",
    "lep_eta",
    "lep_phi",
    "lep_E",
    "lep_z0",
    "lep_ptcone30",
    "lep_etcone20",
    "lep_tracksigd0pvunbiased",
    "trigE",
    "trigM",
    "scaleFactor_PILEUP",
    "scaleFactor_ELE",
    "scaleFactor_MUON",
    "scaleFactor_TRIGGER",
    "mcWeight",
    "runNumber",
    "eventNumber",
];

/// Number of lepton slots every field is padded or truncated to.
pub(crate) const LEP_SLOTS: usize = 4;

/// Branch whose per-event length is the lepton multiplicity.
pub(crate) const LEPTON_COUNT_FIELD: &str = "lep_type";

/// Everything one pipeline run needs, resolved once in `main`.
pub(crate) struct ExtractConfig {
    pub archive: PathBuf,
    pub data_dir: PathBuf,
    pub file_name: String,
    pub tree_name: String,
    pub fields: Vec<String>,
    pub slots: usize,
    pub output: PathBuf,
}

/// Stages 1-3: provision the data, report the schema and multiplicities.
pub(crate) fn run_inspect(cfg: &ExtractConfig) -> Result<()> {
    let file = open_dataset(cfg)?;
    let _tree = inspect_stage(&file, cfg)?;
    Ok(())
}

/// The full pipeline, ending in the flattened CSV.
pub(crate) fn run_extract(cfg: &ExtractConfig) -> Result<()> {
    let file = open_dataset(cfg)?;
    let tree = inspect_stage(&file, cfg)?;

    let padded = flatten::flatten_fields(&file, &tree, &cfg.fields, cfg.slots)?;
    flatten::print_preview(&padded, "lep_pt", 10);

    table::write_csv(&cfg.output, &padded)?;
    Ok(())
}

/// Provision, locate, and open the dataset once per run. The schema report
/// and the flattening read through the same handle.
fn open_dataset(cfg: &ExtractConfig) -> Result<RootFile> {
    archive::provision(&cfg.archive, &cfg.data_dir)?;

    let path = discover::find_data_file(&cfg.data_dir, &cfg.file_name)?;
    println!("Found ROOT file: {}", path.display());

    tracing::info!(path = %path.display(), "opening ROOT file");
    RootFile::open(&path).with_context(|| format!("open ROOT file {}", path.display()))
}

/// Key listing, tree lookup, branch types, lepton multiplicities.
///
/// The key listing prints before the tree lookup, so a missing tree still
/// leaves the file contents on the console.
fn inspect_stage(file: &RootFile, cfg: &ExtractConfig) -> Result<Tree> {
    inspect::print_file_keys(file)?;

    let tree = file.get_tree(&cfg.tree_name)?;
    tracing::info!(tree = %cfg.tree_name, entries = tree.entries, "tree loaded");

    inspect::print_branch_types(&tree, &cfg.tree_name);
    inspect::multiplicity_report(file, &tree, LEPTON_COUNT_FIELD)?;
    Ok(tree)
}
