//! CSV assembly and serialization.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::flatten::PaddedField;

/// Expanded header names, in field order. Multi-slot fields fan out to
/// `name_1` through `name_W`; single-slot fields keep their bare name.
pub(crate) fn column_names(fields: &[PaddedField]) -> Vec<String> {
    let mut names = Vec::new();
    for field in fields {
        if field.width == 1 {
            names.push(field.name.clone());
        } else {
            for slot in 1..=field.width {
                names.push(format!("{}_{}", field.name, slot));
            }
        }
    }
    names
}

/// Write the flattened table: one header row, then one row per event in
/// event order, with no index column. Values print in their shortest
/// decimal form, so integral values drop the trailing `.0`.
pub(crate) fn write_csv(path: &Path, fields: &[PaddedField]) -> Result<()> {
    let Some(first) = fields.first() else {
        bail!("no fields to write");
    };
    let n_events = first.n_events();
    for field in fields {
        if field.n_events() != n_events {
            bail!(
                "field '{}' has {} events, expected {}",
                field.name,
                field.n_events(),
                n_events
            );
        }
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("create output file {}", path.display()))?;
    wtr.write_record(column_names(fields))?;

    let row_width: usize = fields.iter().map(|f| f.width).sum();
    let mut record: Vec<String> = Vec::with_capacity(row_width);
    for event in 0..n_events {
        record.clear();
        for field in fields {
            for &v in field.row(event) {
                record.push(v.to_string());
            }
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    eprintln!("Saved: {}", path.display());
    Ok(())
}
