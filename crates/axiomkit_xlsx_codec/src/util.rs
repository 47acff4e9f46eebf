//! Stateless helper utilities shared by the grid reader and writer.

use calamine::Data;

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{EnumCellValue, Grid, XlsxCodecError};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Map a read number to `Integer` when it is integral and fits `i64`.
pub fn convert_number_cell(x: f64) -> EnumCellValue {
    if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        EnumCellValue::Integer(x as i64)
    } else {
        EnumCellValue::Number(x)
    }
}

/// Convert one calamine cell into a grid cell.
///
/// Date/time cells keep their serial number; error and ISO cells keep their text.
pub fn convert_data_cell(data: &Data) -> EnumCellValue {
    match data {
        Data::Empty => EnumCellValue::None,
        Data::Int(val) => EnumCellValue::Integer(*val),
        Data::Float(val) => convert_number_cell(*val),
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Bool(val) => EnumCellValue::Boolean(*val),
        Data::DateTime(val) => convert_number_cell(val.as_f64()),
        other => EnumCellValue::String(other.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridLimits

/// Validate that `grid` fits one Excel worksheet.
pub fn validate_grid_limits(grid: &Grid) -> Result<(), XlsxCodecError> {
    if grid.len() > N_NROWS_EXCEL_MAX {
        return Err(XlsxCodecError::Write(format!(
            "Grid has {} rows; Excel limit is {N_NROWS_EXCEL_MAX}.",
            grid.len()
        )));
    }

    let n_width_max = grid.iter().map(Vec::len).max().unwrap_or(0);
    if n_width_max > N_NCOLS_EXCEL_MAX {
        return Err(XlsxCodecError::Write(format!(
            "Grid has {n_width_max} columns; Excel limit is {N_NCOLS_EXCEL_MAX}."
        )));
    }
    Ok(())
}

pub fn cast_row_num(value: usize) -> Result<u32, XlsxCodecError> {
    u32::try_from(value).map_err(|_| XlsxCodecError::Write(format!("row index overflow: {value}")))
}

pub fn cast_col_num(value: usize) -> Result<u16, XlsxCodecError> {
    u16::try_from(value)
        .map_err(|_| XlsxCodecError::Write(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_become_integers() {
        assert_eq!(convert_number_cell(2.0), EnumCellValue::Integer(2));
        assert_eq!(convert_number_cell(-0.0), EnumCellValue::Integer(0));
        assert_eq!(convert_number_cell(1.5), EnumCellValue::Number(1.5));
        assert_eq!(convert_number_cell(1e20), EnumCellValue::Number(1e20));
        assert!(matches!(convert_number_cell(f64::NAN), EnumCellValue::Number(_)));
    }

    #[test]
    fn calamine_cells_are_mapped() {
        assert_eq!(convert_data_cell(&Data::Empty), EnumCellValue::None);
        assert_eq!(convert_data_cell(&Data::Float(3.0)), EnumCellValue::Integer(3));
        assert_eq!(convert_data_cell(&Data::Bool(true)), EnumCellValue::Boolean(true));
        assert_eq!(
            convert_data_cell(&Data::String("olá".to_string())),
            EnumCellValue::from("olá")
        );
    }

    #[test]
    fn grid_limits_reject_too_wide_rows() {
        let grid = vec![vec![EnumCellValue::None; N_NCOLS_EXCEL_MAX + 1]];
        assert!(matches!(
            validate_grid_limits(&grid),
            Err(XlsxCodecError::Write(_))
        ));
        assert!(validate_grid_limits(&vec![vec![EnumCellValue::None; 3]]).is_ok());
    }

    #[test]
    fn index_casts_report_overflow() {
        assert_eq!(cast_col_num(3).expect("col"), 3);
        assert!(cast_col_num(usize::from(u16::MAX) + 1).is_err());
    }
}
