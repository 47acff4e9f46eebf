//! Grid reader kernel that parses workbook bytes into a cell grid.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use tracing::debug;

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{EnumCellValue, Grid, XlsxCodecError};
use crate::util::convert_data_cell;

/// Parses a binary grid document into a rectangular grid.
pub trait GridReader {
    fn read_grid(&self, data: &[u8]) -> Result<Grid, XlsxCodecError>;
}

/// XLSX reader over the first worksheet.
///
/// The grid spans the sheet's declared dimension, so trailing blank rows and
/// columns survive even though no value is stored for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxGridReader;

impl GridReader for XlsxGridReader {
    fn read_grid(&self, data: &[u8]) -> Result<Grid, XlsxCodecError> {
        let mut workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(data)).map_err(derive_malformed_error)?;

        let Some(c_sheet_name) = workbook.sheet_names().first().cloned() else {
            debug!("xlsx document has no worksheet");
            return Ok(Grid::new());
        };
        let mut cells_reader = workbook
            .worksheet_cells_reader(&c_sheet_name)
            .map_err(derive_malformed_error)?;

        let dimensions = cells_reader.dimensions();
        let mut n_rows = dimensions.end.0 as usize + 1;
        let mut n_cols = dimensions.end.1 as usize + 1;

        let mut l_cells: Vec<((usize, usize), EnumCellValue)> = Vec::new();
        while let Some(cell) = cells_reader.next_cell().map_err(derive_malformed_error)? {
            let value = convert_data_cell(&Data::from(cell.get_value().clone()));
            if value.is_none() {
                continue;
            }
            let (n_row, n_col) = cell.get_position();
            let tup_pos = (n_row as usize, n_col as usize);
            n_rows = n_rows.max(tup_pos.0 + 1);
            n_cols = n_cols.max(tup_pos.1 + 1);
            l_cells.push((tup_pos, value));
        }

        if n_rows > N_NROWS_EXCEL_MAX || n_cols > N_NCOLS_EXCEL_MAX {
            return Err(XlsxCodecError::MalformedDocument(format!(
                "Sheet spans {n_rows} rows x {n_cols} columns; Excel limit is \
                 {N_NROWS_EXCEL_MAX} x {N_NCOLS_EXCEL_MAX}."
            )));
        }

        let grid = derive_grid_from_cells(n_rows, n_cols, l_cells);
        debug!(rows = grid.len(), cols = n_cols, "xlsx grid read");
        Ok(grid)
    }
}

/// Place `cells` into a blank `n_rows` x `n_cols` grid anchored at A1.
///
/// Cells outside the extent are dropped.
pub fn derive_grid_from_cells(
    n_rows: usize,
    n_cols: usize,
    cells: Vec<((usize, usize), EnumCellValue)>,
) -> Grid {
    let mut grid = vec![vec![EnumCellValue::None; n_cols]; n_rows];
    for ((n_row, n_col), value) in cells {
        if let Some(slot) = grid.get_mut(n_row).and_then(|row| row.get_mut(n_col)) {
            *slot = value;
        }
    }
    grid
}

fn derive_malformed_error(err: calamine::XlsxError) -> XlsxCodecError {
    XlsxCodecError::MalformedDocument(err.to_string())
}
