//! Schema and lepton-multiplicity reporting.

use anyhow::Result;
use fl_root::{JaggedCol, RootFile, Tree};

/// Print the top-level key listing of the file, one `name;cycle` per key.
pub(crate) fn print_file_keys(file: &RootFile) -> Result<()> {
    let keys = file.list_keys()?;
    let names: Vec<String> = keys
        .iter()
        .map(|k| format!("{};{}", k.name, k.cycle))
        .collect();

    println!("\nKeys in file:");
    println!("{names:?}");
    Ok(())
}

/// Print every branch of the tree with its element type.
///
/// Branches whose leaf type the reader could not introspect list as
/// `unknown`; they only fail the run if the extraction later reads them.
pub(crate) fn print_branch_types(tree: &Tree, tree_name: &str) {
    println!("\nBranches in TTree '{tree_name}':\n");
    for branch in &tree.branches {
        println!(" - {}: {}", branch.name, branch.type_name());
    }
}

/// Read the lepton-count branch and print the multiplicity distribution
/// plus the first ten four-lepton event indices.
pub(crate) fn multiplicity_report(file: &RootFile, tree: &Tree, count_field: &str) -> Result<()> {
    let col = file.branch_data_jagged(tree, count_field)?;

    let counts = multiplicity_counts(&col);
    println!("\nLepton counts:");
    for (i, count) in counts.iter().enumerate() {
        println!("{} lep: {}", i + 1, count);
    }

    let four_leps = first_indices_with_len(&col, 4, 10);
    println!("\nIndices with 4 leptons: {four_leps:?}");
    Ok(())
}

/// Frequency of per-event collection lengths 1 through 5 inclusive.
/// Lengths outside that window are not reported.
pub(crate) fn multiplicity_counts(col: &JaggedCol) -> [usize; 5] {
    let mut counts = [0usize; 5];
    for event in 0..col.n_entries() {
        let len = col.row(event).len();
        if (1..=5).contains(&len) {
            counts[len - 1] += 1;
        }
    }
    counts
}

/// Indices of the first `limit` events whose collection length equals `len`,
/// in event order.
pub(crate) fn first_indices_with_len(col: &JaggedCol, len: usize, limit: usize) -> Vec<usize> {
    let mut out = Vec::new();
    for event in 0..col.n_entries() {
        if col.row(event).len() == len {
            out.push(event);
            if out.len() == limit {
                break;
            }
        }
    }
    out
}
