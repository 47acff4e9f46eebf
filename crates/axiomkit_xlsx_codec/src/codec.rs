//! Codec facade: value tree <-> flat records <-> grid <-> XLSX bytes.

use tracing::debug;

use crate::conf::{FORMAT_XLSX, TUP_UTF8_BOM};
use crate::flatten::{SpecFlattenOptions, flatten_records};
use crate::header::resolve_header;
use crate::project::{project_records, unproject_grid};
use crate::reader::{GridReader, XlsxGridReader};
use crate::shape::{denormalize_after_decode, normalize_for_encode};
use crate::spec::{
    FlatRecord, Grid, SpecXlsxCodecContext, SpecXlsxCodecOptions, Value, XlsxCodecError,
};
use crate::writer::{GridWriter, XlsxGridWriter};

/// Stateless XLSX encoder/decoder bound to default options.
///
/// Every call resolves its own options from the defaults and the per-call
/// context, and owns all intermediate buffers.
#[derive(Debug, Clone)]
pub struct XlsxCodec<W = XlsxGridWriter, R = XlsxGridReader> {
    options: SpecXlsxCodecOptions,
    writer: W,
    reader: R,
}

impl XlsxCodec {
    /// Create codec with XLSX reader/writer and the given defaults.
    pub fn new(options: SpecXlsxCodecOptions) -> Self {
        Self::with_collaborators(options, XlsxGridWriter, XlsxGridReader)
    }
}

impl Default for XlsxCodec {
    fn default() -> Self {
        Self::new(SpecXlsxCodecOptions::default())
    }
}

impl<W: GridWriter, R: GridReader> XlsxCodec<W, R> {
    /// Create codec with custom grid collaborators.
    pub fn with_collaborators(options: SpecXlsxCodecOptions, writer: W, reader: R) -> Self {
        Self {
            options,
            writer,
            reader,
        }
    }

    /// Defaults bound at construction.
    pub fn options(&self) -> &SpecXlsxCodecOptions {
        &self.options
    }

    pub fn supports_encoding(&self, format: &str) -> bool {
        format == FORMAT_XLSX
    }

    pub fn supports_decoding(&self, format: &str) -> bool {
        format == FORMAT_XLSX
    }

    /// Run the encode pipeline up to the grid handed to the writer.
    pub fn encode_grid(&self, data: &Value, context: &SpecXlsxCodecContext) -> Grid {
        derive_grid(data, &self.options.overlay(context))
    }

    /// Encode `data` into XLSX bytes.
    pub fn encode(
        &self,
        data: &Value,
        context: &SpecXlsxCodecContext,
    ) -> Result<Vec<u8>, XlsxCodecError> {
        let options = self.options.overlay(context);
        let grid = derive_grid(data, &options);
        let v_bytes = self.writer.write_grid(&grid)?;

        if !options.output_utf8_bom {
            return Ok(v_bytes);
        }
        if std::str::from_utf8(&v_bytes).is_err() {
            return Err(XlsxCodecError::InvalidTextEncoding);
        }

        let mut v_bytes_bom = Vec::with_capacity(TUP_UTF8_BOM.len() + v_bytes.len());
        v_bytes_bom.extend_from_slice(&TUP_UTF8_BOM);
        v_bytes_bom.extend_from_slice(&v_bytes);
        Ok(v_bytes_bom)
    }

    /// [`Self::encode`] after checking `format`.
    pub fn encode_as(
        &self,
        data: &Value,
        format: &str,
        context: &SpecXlsxCodecContext,
    ) -> Result<Vec<u8>, XlsxCodecError> {
        if !self.supports_encoding(format) {
            return Err(XlsxCodecError::UnsupportedFormat(format.to_string()));
        }
        self.encode(data, context)
    }

    /// Decode XLSX bytes into flat records without shape unwrapping.
    pub fn decode_records(
        &self,
        data: &[u8],
        context: &SpecXlsxCodecContext,
    ) -> Result<Vec<FlatRecord>, XlsxCodecError> {
        self.read_records(data, &self.options.overlay(context))
    }

    /// Decode XLSX bytes into a collection of records, or a single record
    /// when `as_collection` is off and exactly one row was read.
    pub fn decode(
        &self,
        data: &[u8],
        context: &SpecXlsxCodecContext,
    ) -> Result<Value, XlsxCodecError> {
        let options = self.options.overlay(context);
        let l_records = self.read_records(data, &options)?;
        Ok(denormalize_after_decode(l_records, options.as_collection))
    }

    /// [`Self::decode`] after checking `format`.
    pub fn decode_as(
        &self,
        data: &[u8],
        format: &str,
        context: &SpecXlsxCodecContext,
    ) -> Result<Value, XlsxCodecError> {
        if !self.supports_decoding(format) {
            return Err(XlsxCodecError::UnsupportedFormat(format.to_string()));
        }
        self.decode(data, context)
    }

    fn read_records(
        &self,
        data: &[u8],
        options: &SpecXlsxCodecOptions,
    ) -> Result<Vec<FlatRecord>, XlsxCodecError> {
        if data.is_empty() {
            return Ok(vec![]);
        }

        let grid = self.reader.read_grid(data)?;

        let l_header_explicit = options.headers.labels();
        let header = if options.headers.is_auto() {
            None
        } else {
            Some(l_header_explicit.as_slice())
        };

        let l_records = unproject_grid(grid, header, options.no_headers);
        debug!(records = l_records.len(), "xlsx decode unprojected");
        Ok(l_records)
    }
}

fn derive_grid(data: &Value, options: &SpecXlsxCodecOptions) -> Grid {
    let l_records = normalize_for_encode(data);
    let l_flat = flatten_records(
        &l_records,
        SpecFlattenOptions {
            key_separator: &options.key_separator,
            escape_formulas: options.escape_formulas,
        },
    );
    let header = resolve_header(&l_flat, &options.headers);
    debug!(
        records = l_flat.len(),
        cols = header.source_keys.len(),
        explicit_header = !options.headers.is_auto(),
        "xlsx encode projected"
    );

    project_records(&l_flat, &header, options.no_headers)
}
