//! Shared codec models: value tree, grid cells, options and errors.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use thiserror::Error;

use crate::conf::C_KEY_SEPARATOR_DEFAULT;

////////////////////////////////////////////////////////////////////////////////
// #region ValueModel

/// Key of a mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Non-negative positional key.
    Index(u64),
    /// Named key.
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(idx) => write!(f, "{idx}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self::Index(value)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self::Index(value as u64)
    }
}

/// Caller-side nested value.
///
/// Containers are either positional (`Sequence`) or keyed (`Mapping`, insertion
/// ordered). Everything else is a scalar leaf.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(IndexMap<Key, Value>),
}

impl Value {
    /// Build a mapping from `(key, value)` pairs, keeping pair order.
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// `true` for `Sequence` and `Mapping`.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }

    /// Convert into a `serde_json::Value`; non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(val) => serde_json::Value::Bool(*val),
            Self::Integer(val) => serde_json::Value::Number((*val).into()),
            Self::Float(val) => serde_json::Number::from_f64(*val)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(val) => serde_json::Value::String(val.clone()),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Mapping(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, val)| (key.to_string(), val.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(val) => Self::Bool(val),
            serde_json::Value::Number(num) => match num.as_i64() {
                Some(val) => Self::Integer(val),
                None => Self::Float(num.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(val) => Self::String(val),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Mapping(
                entries
                    .into_iter()
                    .map(|(key, val)| (Key::Name(key), Value::from(val)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridModel

/// Scalar cell exchanged with grid readers/writers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Boolean cell (only produced by readers).
    Boolean(bool),
    /// Integral number.
    Integer(i64),
    /// Non-integral or out-of-range number.
    Number(f64),
    /// Text value.
    String(String),
}

impl EnumCellValue {
    /// Render cell as text; blank cells render as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Boolean(val) => val.to_string(),
            Self::Integer(val) => val.to_string(),
            Self::Number(val) => val.to_string(),
            Self::String(val) => val.clone(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<EnumCellValue> for Value {
    fn from(value: EnumCellValue) -> Self {
        match value {
            EnumCellValue::None => Value::Null,
            EnumCellValue::Boolean(val) => Value::Bool(val),
            EnumCellValue::Integer(val) => Value::Integer(val),
            EnumCellValue::Number(val) => Value::Float(val),
            EnumCellValue::String(val) => Value::String(val),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// One row after flattening: path -> scalar, in emission order.
pub type FlatRecord = IndexMap<String, EnumCellValue>;

/// Rectangular rows x columns cell matrix.
pub type Grid = Vec<Vec<EnumCellValue>>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderSpecification

/// Explicit column order/labels, or automatic reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(untagged)]
pub enum EnumHeaderSpec {
    /// Ordered column paths; header row shows the paths.
    Columns(Vec<String>),
    /// Ordered `source path -> output label`; header row shows the labels.
    Mapping(IndexMap<String, String>),
    /// Reconcile the header from the rows.
    #[default]
    Auto,
}

impl EnumHeaderSpec {
    /// `true` when no explicit column is supplied.
    pub fn is_auto(&self) -> bool {
        match self {
            Self::Auto => true,
            Self::Columns(cols) => cols.is_empty(),
            Self::Mapping(dict_labels) => dict_labels.is_empty(),
        }
    }

    /// Text written into the header row.
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Auto => vec![],
            Self::Columns(cols) => derive_unique_columns(cols),
            Self::Mapping(dict_labels) => dict_labels.values().cloned().collect(),
        }
    }

    /// Record paths each column is projected from.
    pub fn source_keys(&self) -> Vec<String> {
        match self {
            Self::Auto => vec![],
            Self::Columns(cols) => derive_unique_columns(cols),
            Self::Mapping(dict_labels) => dict_labels.keys().cloned().collect(),
        }
    }
}

/// Drop repeated column names, keeping first occurrences in order.
fn derive_unique_columns(cols: &[String]) -> Vec<String> {
    cols.iter()
        .cloned()
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CodecOptions

/// Defaults bound to a codec at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecXlsxCodecOptions {
    /// Join string for nested key paths.
    #[serde(alias = "xlsx_key_separator")]
    pub key_separator: String,
    /// Explicit header, or `Auto` to reconcile from the rows.
    #[serde(alias = "xlsx_headers")]
    pub headers: EnumHeaderSpec,
    /// Prefix formula-looking text cells with a tab.
    #[serde(alias = "xlsx_escape_formulas")]
    pub escape_formulas: bool,
    /// Omit header row on encode; treat every row as data on decode.
    pub no_headers: bool,
    /// Prepend a UTF-8 BOM to the encoded payload.
    pub output_utf8_bom: bool,
    /// Always decode into a collection of records.
    pub as_collection: bool,
}

impl Default for SpecXlsxCodecOptions {
    fn default() -> Self {
        Self {
            key_separator: C_KEY_SEPARATOR_DEFAULT.to_string(),
            headers: EnumHeaderSpec::Auto,
            escape_formulas: false,
            no_headers: false,
            output_utf8_bom: false,
            as_collection: true,
        }
    }
}

impl SpecXlsxCodecOptions {
    /// Return a new options value with every field set in `context` overriding `self`.
    pub fn overlay(&self, context: &SpecXlsxCodecContext) -> SpecXlsxCodecOptions {
        SpecXlsxCodecOptions {
            key_separator: context
                .key_separator
                .clone()
                .unwrap_or_else(|| self.key_separator.clone()),
            headers: context
                .headers
                .clone()
                .unwrap_or_else(|| self.headers.clone()),
            escape_formulas: context.escape_formulas.unwrap_or(self.escape_formulas),
            no_headers: context.no_headers.unwrap_or(self.no_headers),
            output_utf8_bom: context.output_utf8_bom.unwrap_or(self.output_utf8_bom),
            as_collection: context.as_collection.unwrap_or(self.as_collection),
        }
    }
}

/// Per-call overrides; `None` keeps the codec default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SpecXlsxCodecContext {
    #[serde(alias = "xlsx_key_separator")]
    pub key_separator: Option<String>,
    #[serde(alias = "xlsx_headers")]
    pub headers: Option<EnumHeaderSpec>,
    #[serde(alias = "xlsx_escape_formulas")]
    pub escape_formulas: Option<bool>,
    pub no_headers: Option<bool>,
    pub output_utf8_bom: Option<bool>,
    pub as_collection: Option<bool>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Codec call failures.
#[derive(Debug, Error)]
pub enum XlsxCodecError {
    /// UTF-8 BOM requested for a payload that is not UTF-8 text.
    #[error("You are trying to add a UTF-8 BOM to a non UTF-8 text.")]
    InvalidTextEncoding,
    /// Grid reader could not parse the document.
    #[error("Malformed xlsx document: {0}")]
    MalformedDocument(String),
    /// Grid writer could not build the document.
    #[error("xlsx write error: {0}")]
    Write(String),
    /// Format other than `xlsx` requested.
    #[error("Unsupported format: {0:?}")]
    UnsupportedFormat(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_keeps_defaults_for_unset_fields() {
        let defaults = SpecXlsxCodecOptions {
            key_separator: "_".to_string(),
            as_collection: false,
            ..Default::default()
        };
        let context = SpecXlsxCodecContext {
            no_headers: Some(true),
            ..Default::default()
        };

        let resolved = defaults.overlay(&context);
        assert_eq!(resolved.key_separator, "_");
        assert!(!resolved.as_collection);
        assert!(resolved.no_headers);
        assert!(!defaults.no_headers);
    }

    #[test]
    fn options_deserialize_with_legacy_keys() {
        let options: SpecXlsxCodecOptions = serde_json::from_str(
            r#"{"xlsx_key_separator": "/", "xlsx_headers": {"foo": "a", "bar": "b"}, "no_headers": true}"#,
        )
        .expect("parse options");

        assert_eq!(options.key_separator, "/");
        assert!(options.no_headers);
        assert!(options.as_collection);
        assert_eq!(options.headers.labels(), vec!["a", "b"]);
        assert_eq!(options.headers.source_keys(), vec!["foo", "bar"]);
    }

    #[test]
    fn header_list_deserializes_as_columns() {
        let context: SpecXlsxCodecContext =
            serde_json::from_str(r#"{"headers": ["b", "c"]}"#).expect("parse context");
        assert_eq!(
            context.headers,
            Some(EnumHeaderSpec::Columns(vec!["b".to_string(), "c".to_string()]))
        );
        assert!(EnumHeaderSpec::Columns(vec![]).is_auto());
    }

    #[test]
    fn repeated_columns_collapse_to_first_occurrence() {
        let header_spec = EnumHeaderSpec::Columns(
            ["b", "a", "b", "c", "a"].map(String::from).to_vec(),
        );
        assert_eq!(header_spec.labels(), vec!["b", "a", "c"]);
        assert_eq!(header_spec.source_keys(), vec!["b", "a", "c"]);
    }

    #[test]
    fn json_conversion_keeps_key_order() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"z": 1, "a": [true, null, 1.5]}"#).expect("parse json");
        let value = Value::from(json.clone());

        let Value::Mapping(entries) = &value else {
            panic!("expected mapping");
        };
        let keys: Vec<String> = entries.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(value.to_json(), json);
    }
}
