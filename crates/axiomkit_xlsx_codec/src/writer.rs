//! Grid writer kernel that serializes a cell grid into workbook bytes.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::spec::{EnumCellValue, Grid, XlsxCodecError};
use crate::util::{cast_col_num, cast_row_num, validate_grid_limits};

/// Serializes a grid into a binary grid document.
pub trait GridWriter {
    fn write_grid(&self, grid: &Grid) -> Result<Vec<u8>, XlsxCodecError>;
}

/// In-memory single-sheet XLSX writer.
///
/// Text is always written as text, never as a formula. Blank cells are skipped,
/// except the bottom-right one, which is written as a formatted blank so the
/// sheet dimension keeps trailing blank rows and columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxGridWriter;

impl GridWriter for XlsxGridWriter {
    fn write_grid(&self, grid: &Grid) -> Result<Vec<u8>, XlsxCodecError> {
        validate_grid_limits(grid)?;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let mut n_cells_written = 0usize;
        for (row_idx, row_values) in grid.iter().enumerate() {
            for (col_idx, cell_value) in row_values.iter().enumerate() {
                if write_cell(worksheet, row_idx, col_idx, cell_value)? {
                    n_cells_written += 1;
                }
            }
        }

        let n_width = grid.iter().map(Vec::len).max().unwrap_or(0);
        if let Some(row_values_last) = grid.last()
            && n_width > 0
            && row_values_last.get(n_width - 1).is_none_or(is_blank_cell)
        {
            worksheet
                .write_blank(
                    cast_row_num(grid.len() - 1)?,
                    cast_col_num(n_width - 1)?,
                    &Format::new().set_num_format("@"),
                )
                .map_err(derive_xlsx_error)?;
        }

        let v_bytes = workbook.save_to_buffer().map_err(derive_xlsx_error)?;
        debug!(
            rows = grid.len(),
            cells = n_cells_written,
            bytes = v_bytes.len(),
            "xlsx grid written"
        );
        Ok(v_bytes)
    }
}

/// Write one cell; returns `false` for skipped blank cells.
fn write_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
) -> Result<bool, XlsxCodecError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;

    match value {
        EnumCellValue::None => return Ok(false),
        EnumCellValue::String(val) if val.is_empty() => return Ok(false),
        EnumCellValue::Boolean(val) => {
            worksheet
                .write_boolean(n_row, n_col, *val)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Integer(val) => {
            worksheet
                .write_number(n_row, n_col, *val as f64)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number(n_row, n_col, *val)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string(n_row, n_col, val)
                .map_err(derive_xlsx_error)?;
        }
    }
    Ok(true)
}

/// Cells that leave no value in the sheet; empty text reads back as blank.
fn is_blank_cell(value: &EnumCellValue) -> bool {
    match value {
        EnumCellValue::None => true,
        EnumCellValue::String(val) => val.is_empty(),
        _ => false,
    }
}

fn derive_xlsx_error(err: XlsxError) -> XlsxCodecError {
    XlsxCodecError::Write(err.to_string())
}
