//! Codec constants.

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;

/// Format identifier accepted by the codec.
pub const FORMAT_XLSX: &str = "xlsx";
/// Default join string for nested key paths.
pub const C_KEY_SEPARATOR_DEFAULT: &str = ".";
/// UTF-8 byte-order marker prepended when `output_utf8_bom` is set.
pub const TUP_UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
/// Leading characters that make spreadsheet applications evaluate a cell as formula.
pub const TUP_FORMULA_START_CHARS: [char; 4] = ['=', '-', '+', '@'];
/// Prefix that neutralizes formula interpretation of an escaped cell.
pub const C_FORMULA_ESCAPE_PREFIX: char = '\t';
/// Record count above which flattening is spread over the rayon pool.
pub const N_RECORDS_PARALLEL_MIN: usize = 2_048;
