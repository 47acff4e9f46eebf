//! Projection between flat records and rectangular grids.

use tracing::warn;

use crate::header::SpecResolvedHeader;
use crate::spec::{EnumCellValue, FlatRecord, Grid};

/// Project `records` onto `header`, optionally preceded by the header row.
///
/// Paths missing from a record become blank cells; paths absent from the
/// header are dropped.
pub fn project_records(
    records: &[FlatRecord],
    header: &SpecResolvedHeader,
    no_headers: bool,
) -> Grid {
    let mut grid = Grid::with_capacity(records.len() + usize::from(!no_headers));

    if !no_headers {
        grid.push(
            header
                .labels
                .iter()
                .map(|label| EnumCellValue::String(label.clone()))
                .collect(),
        );
    }

    for record in records {
        grid.push(
            header
                .source_keys
                .iter()
                .map(|key| record.get(key).cloned().unwrap_or_default())
                .collect(),
        );
    }

    grid
}

/// Rebuild flat records from `grid`.
///
/// With `no_headers`, columns are keyed `"0"`, `"1"`, ... from the first row
/// width. Otherwise the explicit `header` is used, or the first grid row is
/// consumed as header when none is given. Rows longer than the header are
/// truncated, shorter ones padded with blanks.
pub fn unproject_grid(
    mut grid: Grid,
    header: Option<&[String]>,
    no_headers: bool,
) -> Vec<FlatRecord> {
    let l_header: Vec<String> = if no_headers {
        let n_width = grid.first().map_or(0, Vec::len);
        (0..n_width).map(|n_idx| n_idx.to_string()).collect()
    } else {
        match header {
            Some(l_explicit) if !l_explicit.is_empty() => l_explicit.to_vec(),
            _ if grid.is_empty() => vec![],
            _ => grid
                .remove(0)
                .iter()
                .map(EnumCellValue::to_text)
                .collect(),
        }
    };

    let n_width = l_header.len();
    let mut n_rows_ragged = 0usize;
    let l_records: Vec<FlatRecord> = grid
        .into_iter()
        .map(|mut row| {
            if row.len() != n_width {
                n_rows_ragged += 1;
                row.resize(n_width, EnumCellValue::None);
            }
            l_header.iter().cloned().zip(row).collect()
        })
        .collect();

    if n_rows_ragged > 0 {
        warn!(
            rows = n_rows_ragged,
            width = n_width,
            "normalized ragged rows to header width"
        );
    }

    l_records
}
