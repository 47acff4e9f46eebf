//! `axiomkit_xlsx_codec` v1:
//! Structural XLSX codec between nested value trees and single-sheet grids.
//!
//! Pipeline modules:
//! - `conf`    : constants
//! - `spec`    : value model, options and errors
//! - `shape`   : input shape normalization
//! - `flatten` : nested value -> flat record
//! - `header`  : header reconciliation across records
//! - `project` : flat records <-> grid rows
//! - `util`    : pure helper functions
//! - `writer`  : pure-Rust grid writer kernel
//! - `reader`  : pure-Rust grid reader kernel
//! - `codec`   : encode/decode facade
pub mod codec;
pub mod conf;
pub mod flatten;
pub mod header;
pub mod project;
pub mod reader;
pub mod shape;
pub mod spec;
pub mod util;
pub mod writer;

pub use codec::XlsxCodec;
pub use conf::{
    C_FORMULA_ESCAPE_PREFIX, C_KEY_SEPARATOR_DEFAULT, FORMAT_XLSX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_FORMULA_START_CHARS, TUP_UTF8_BOM,
};
pub use flatten::{SpecFlattenOptions, flatten_record, flatten_records};
pub use header::{HeaderReconciler, SpecResolvedHeader, reconcile_headers, resolve_header};
pub use project::{project_records, unproject_grid};
pub use reader::{GridReader, XlsxGridReader};
pub use shape::{EnumInputShape, classify_shape, denormalize_after_decode, normalize_for_encode};
pub use spec::{
    EnumCellValue, EnumHeaderSpec, FlatRecord, Grid, Key, SpecXlsxCodecContext,
    SpecXlsxCodecOptions, Value, XlsxCodecError,
};
pub use writer::{GridWriter, XlsxGridWriter};
