//! Jagged-to-fixed-width flattening.

use anyhow::Result;
use fl_root::{ColumnData, RootFile, Tree};

/// One requested branch flattened to `width` values per event, row-major.
pub(crate) struct PaddedField {
    pub name: String,
    pub width: usize,
    pub values: Vec<f64>,
}

impl PaddedField {
    pub(crate) fn n_events(&self) -> usize {
        self.values.len() / self.width
    }

    pub(crate) fn row(&self, event: usize) -> &[f64] {
        &self.values[event * self.width..(event + 1) * self.width]
    }
}

/// Pad or truncate one column to exactly `width` values per event.
///
/// Jagged branches keep their first `width` values per event and zero-fill
/// the rest. Scalar branches broadcast the event value into every slot, so
/// runNumber lands in runNumber_1 through runNumber_4 unchanged.
pub(crate) fn pad_column(name: &str, col: &ColumnData, width: usize) -> PaddedField {
    let values = match col {
        ColumnData::Jagged(jag) => {
            let mut values = Vec::with_capacity(jag.n_entries() * width);
            for event in 0..jag.n_entries() {
                let row = jag.row(event);
                let take = row.len().min(width);
                values.extend_from_slice(&row[..take]);
                values.resize(values.len() + (width - take), 0.0);
            }
            values
        }
        ColumnData::Scalar(scalars) => {
            let mut values = Vec::with_capacity(scalars.len() * width);
            for &v in scalars {
                values.resize(values.len() + width, v);
            }
            values
        }
    };
    PaddedField {
        name: name.to_string(),
        width,
        values,
    }
}

/// Read and pad every requested branch, in request order. A missing branch
/// aborts the whole extraction; nothing is written.
pub(crate) fn flatten_fields(
    file: &RootFile,
    tree: &Tree,
    fields: &[String],
    width: usize,
) -> Result<Vec<PaddedField>> {
    let mut out = Vec::with_capacity(fields.len());
    for name in fields {
        let col = file.branch_column(tree, name)?;
        out.push(pad_column(name, &col, width));
    }
    Ok(out)
}

/// Print the first `limit` padded rows of the named field.
pub(crate) fn print_preview(fields: &[PaddedField], name: &str, limit: usize) {
    let Some(field) = fields.iter().find(|f| f.name == name) else {
        return;
    };
    println!("\n{name} example:");
    for event in 0..field.n_events().min(limit) {
        println!("{:?}", field.row(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fl_root::JaggedCol;

    fn jagged(rows: &[&[f64]]) -> ColumnData {
        let mut flat = Vec::new();
        let mut offsets = vec![0usize];
        for row in rows {
            flat.extend_from_slice(row);
            offsets.push(flat.len());
        }
        ColumnData::Jagged(JaggedCol { flat, offsets })
    }

    #[test]
    fn short_rows_are_zero_padded() {
        let col = jagged(&[&[10.5, 20.1]]);
        let field = pad_column("lep_pt", &col, 4);
        assert_eq!(field.row(0), &[10.5, 20.1, 0.0, 0.0]);
    }

    #[test]
    fn long_rows_are_truncated() {
        let col = jagged(&[&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]]);
        let field = pad_column("lep_pt", &col, 4);
        assert_eq!(field.row(0), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn exact_width_rows_pass_through() {
        let col = jagged(&[&[1.0, 2.0, 3.0, 4.0]]);
        let field = pad_column("lep_pt", &col, 4);
        assert_eq!(field.row(0), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn empty_rows_become_all_zeros() {
        let col = jagged(&[&[], &[7.0]]);
        let field = pad_column("lep_pt", &col, 4);
        assert_eq!(field.row(0), &[0.0; 4]);
        assert_eq!(field.row(1), &[7.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn scalars_broadcast_into_every_slot() {
        let col = ColumnData::Scalar(vec![284500.0, 7.0]);
        let field = pad_column("runNumber", &col, 4);
        assert_eq!(field.n_events(), 2);
        assert_eq!(field.row(0), &[284500.0; 4]);
        assert_eq!(field.row(1), &[7.0; 4]);
    }

    #[test]
    fn event_count_survives_padding() {
        let col = jagged(&[&[1.0], &[2.0, 3.0], &[], &[4.0; 6]]);
        let field = pad_column("lep_pt", &col, 4);
        assert_eq!(field.n_events(), 4);
        assert_eq!(field.values.len(), 16);
    }
}
