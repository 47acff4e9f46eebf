//! Shape normalization between caller values and record collections.

use crate::spec::{FlatRecord, Key, Value};

/// Encode-side classification of a caller value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumInputShape {
    /// Not a container.
    Scalar,
    /// Container without entries.
    Empty,
    /// Positional container whose every entry is a container.
    Collection,
    /// Any other container, handled as one record.
    Record,
}

/// Classify `value` for encoding.
pub fn classify_shape(value: &Value) -> EnumInputShape {
    match value {
        Value::Sequence(items) if items.is_empty() => EnumInputShape::Empty,
        Value::Mapping(entries) if entries.is_empty() => EnumInputShape::Empty,
        Value::Sequence(items) => {
            if items.iter().all(Value::is_container) {
                EnumInputShape::Collection
            } else {
                EnumInputShape::Record
            }
        }
        Value::Mapping(entries) => {
            let if_is_collection = entries.iter().enumerate().all(|(n_idx, (key, val))| {
                *key == Key::Index(n_idx as u64) && val.is_container()
            });
            if if_is_collection {
                EnumInputShape::Collection
            } else {
                EnumInputShape::Record
            }
        }
        _ => EnumInputShape::Scalar,
    }
}

/// Wrap `value` into the canonical collection of records.
///
/// A scalar becomes one single-column row, an empty container one empty row.
pub fn normalize_for_encode(value: &Value) -> Vec<Value> {
    match classify_shape(value) {
        EnumInputShape::Scalar => vec![Value::Sequence(vec![value.clone()])],
        EnumInputShape::Empty => vec![Value::Sequence(vec![])],
        EnumInputShape::Collection => match value {
            Value::Sequence(items) => items.clone(),
            Value::Mapping(entries) => entries.values().cloned().collect(),
            _ => vec![value.clone()],
        },
        EnumInputShape::Record => vec![value.clone()],
    }
}

/// Convert one decoded record into a mapping value.
pub fn convert_record_to_value(record: FlatRecord) -> Value {
    Value::Mapping(
        record
            .into_iter()
            .map(|(path, cell)| (Key::Name(path), Value::from(cell)))
            .collect(),
    )
}

/// Shape decoded records for the caller.
///
/// Unless `as_collection` is set, exactly one record is returned bare; zero or
/// several records always stay a collection.
pub fn denormalize_after_decode(records: Vec<FlatRecord>, as_collection: bool) -> Value {
    if as_collection || records.len() != 1 {
        return Value::Sequence(records.into_iter().map(convert_record_to_value).collect());
    }

    records
        .into_iter()
        .next()
        .map(convert_record_to_value)
        .unwrap_or(Value::Sequence(vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::EnumCellValue;

    fn record(entries: &[(&str, i64)]) -> FlatRecord {
        entries
            .iter()
            .map(|(key, val)| (key.to_string(), EnumCellValue::Integer(*val)))
            .collect()
    }

    #[test]
    fn scalar_is_wrapped_into_single_column_row() {
        let l_rows = normalize_for_encode(&Value::from("foo"));
        assert_eq!(l_rows, vec![Value::Sequence(vec![Value::from("foo")])]);
    }

    #[test]
    fn empty_container_becomes_one_empty_row() {
        assert_eq!(
            normalize_for_encode(&Value::Sequence(vec![])),
            vec![Value::Sequence(vec![])]
        );
        assert_eq!(
            classify_shape(&Value::Mapping(Default::default())),
            EnumInputShape::Empty
        );
    }

    #[test]
    fn list_of_records_is_a_collection() {
        let value = Value::Sequence(vec![
            Value::mapping([("a", Value::Integer(1))]),
            Value::Sequence(vec![Value::Integer(2)]),
        ]);
        assert_eq!(classify_shape(&value), EnumInputShape::Collection);
        assert_eq!(normalize_for_encode(&value).len(), 2);
    }

    #[test]
    fn list_of_scalars_and_mixed_lists_are_one_record() {
        let value = Value::Sequence(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(classify_shape(&value), EnumInputShape::Record);

        let value = Value::Sequence(vec![Value::mapping([("a", Value::Integer(1))]), Value::Null]);
        assert_eq!(normalize_for_encode(&value), vec![value.clone()]);
    }

    #[test]
    fn index_keyed_mapping_counts_as_collection_only_in_order() {
        let row = Value::mapping([("a", Value::Integer(1))]);
        let value = Value::mapping([(0u64, row.clone()), (1u64, row.clone())]);
        assert_eq!(classify_shape(&value), EnumInputShape::Collection);

        let value = Value::mapping([(1u64, row.clone()), (0u64, row)]);
        assert_eq!(classify_shape(&value), EnumInputShape::Record);
    }

    #[test]
    fn decode_unwraps_only_a_single_record() {
        let value = denormalize_after_decode(vec![record(&[("a", 1)])], false);
        assert_eq!(value, Value::mapping([("a", Value::Integer(1))]));

        let value = denormalize_after_decode(vec![], false);
        assert_eq!(value, Value::Sequence(vec![]));

        let value = denormalize_after_decode(vec![record(&[("a", 1)]), record(&[("a", 2)])], false);
        assert!(matches!(value, Value::Sequence(ref items) if items.len() == 2));

        let value = denormalize_after_decode(vec![record(&[("a", 1)])], true);
        assert!(matches!(value, Value::Sequence(ref items) if items.len() == 1));
    }
}
