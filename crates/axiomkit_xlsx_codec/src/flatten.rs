//! Nested value flattening into dotted-path records.

use rayon::prelude::*;

use crate::conf::{C_FORMULA_ESCAPE_PREFIX, N_RECORDS_PARALLEL_MIN, TUP_FORMULA_START_CHARS};
use crate::spec::{EnumCellValue, FlatRecord, Value};

/// Flattening parameters shared by all records of one call.
#[derive(Debug, Clone, Copy)]
pub struct SpecFlattenOptions<'a> {
    /// Join string placed between nested keys.
    pub key_separator: &'a str,
    /// Prefix formula-looking scalars with a tab.
    pub escape_formulas: bool,
}

/// Flatten one record into `path -> scalar` pairs.
///
/// Leaves are emitted in container iteration order. A path produced twice is
/// overwritten by the later leaf but keeps its first position.
pub fn flatten_record(record: &Value, options: SpecFlattenOptions<'_>) -> FlatRecord {
    let mut flattened = FlatRecord::new();
    match record {
        Value::Sequence(_) | Value::Mapping(_) => {
            flatten_into(record, "", options, &mut flattened);
        }
        scalar => {
            flattened.insert("0".to_string(), convert_leaf(scalar, options.escape_formulas));
        }
    }
    flattened
}

/// Flatten every record, preserving order.
///
/// Large batches are spread over the rayon pool; each record owns its output.
pub fn flatten_records(records: &[Value], options: SpecFlattenOptions<'_>) -> Vec<FlatRecord> {
    if records.len() < N_RECORDS_PARALLEL_MIN {
        return records
            .iter()
            .map(|record| flatten_record(record, options))
            .collect();
    }
    records
        .par_iter()
        .map(|record| flatten_record(record, options))
        .collect()
}

fn flatten_into(
    value: &Value,
    parent_path: &str,
    options: SpecFlattenOptions<'_>,
    flattened: &mut FlatRecord,
) {
    let mut visit = |key: String, child: &Value| {
        if child.is_container() {
            let child_parent = format!("{parent_path}{key}{}", options.key_separator);
            flatten_into(child, &child_parent, options, flattened);
        } else {
            flattened.insert(
                format!("{parent_path}{key}"),
                convert_leaf(child, options.escape_formulas),
            );
        }
    };

    match value {
        Value::Sequence(items) => {
            for (n_idx, child) in items.iter().enumerate() {
                visit(n_idx.to_string(), child);
            }
        }
        Value::Mapping(entries) => {
            for (key, child) in entries {
                visit(key.to_string(), child);
            }
        }
        _ => {}
    }
}

/// Convert one scalar leaf into its cell value.
///
/// Booleans become `1`/`0` so that `false` stays visible. With
/// `escape_formulas`, a leaf whose text starts with a formula trigger
/// character is returned as tab-prefixed text.
pub fn convert_leaf(value: &Value, escape_formulas: bool) -> EnumCellValue {
    if escape_formulas {
        let c_text = render_scalar_text(value);
        if c_text
            .chars()
            .next()
            .is_some_and(|chr| TUP_FORMULA_START_CHARS.contains(&chr))
        {
            return EnumCellValue::String(format!("{C_FORMULA_ESCAPE_PREFIX}{c_text}"));
        }
    }

    match value {
        Value::Null => EnumCellValue::None,
        Value::Bool(val) => EnumCellValue::Integer(i64::from(*val)),
        Value::Integer(val) => EnumCellValue::Integer(*val),
        Value::Float(val) => EnumCellValue::Number(*val),
        Value::String(val) => EnumCellValue::String(val.clone()),
        Value::Sequence(_) | Value::Mapping(_) => EnumCellValue::None,
    }
}

fn render_scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(val) => if *val { "1" } else { "" }.to_string(),
        Value::Integer(val) => val.to_string(),
        Value::Float(val) => val.to_string(),
        Value::String(val) => val.clone(),
        Value::Sequence(_) | Value::Mapping(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Key;

    const OPTIONS_DEFAULT: SpecFlattenOptions<'static> = SpecFlattenOptions {
        key_separator: ".",
        escape_formulas: false,
    };

    fn keys(record: &FlatRecord) -> Vec<&str> {
        record.keys().map(String::as_str).collect()
    }

    #[test]
    fn nested_paths_follow_iteration_order() {
        let value = Value::mapping([
            ("foo", Value::from("hello")),
            (
                "bar",
                Value::Sequence(vec![
                    Value::Mapping(
                        [
                            (Key::from("id"), Value::from("yo")),
                            (Key::Index(1), Value::from("wesh")),
                        ]
                        .into_iter()
                        .collect(),
                    ),
                    Value::mapping([("baz", Value::from("Halo")), ("foo", Value::from("olá"))]),
                ]),
            ),
        ]);

        let record = flatten_record(&value, OPTIONS_DEFAULT);
        assert_eq!(
            keys(&record),
            vec!["foo", "bar.0.id", "bar.0.1", "bar.1.baz", "bar.1.foo"]
        );
        assert_eq!(record["bar.0.1"], EnumCellValue::from("wesh"));
    }

    #[test]
    fn custom_separator_is_used_between_keys() {
        let value = Value::mapping([("a", Value::mapping([("b", Value::Integer(1))]))]);
        let record = flatten_record(
            &value,
            SpecFlattenOptions {
                key_separator: "__",
                escape_formulas: false,
            },
        );
        assert_eq!(keys(&record), vec!["a__b"]);
    }

    #[test]
    fn booleans_become_integers() {
        let value = Value::mapping([("t", Value::from(true)), ("f", Value::from(false))]);
        let record = flatten_record(&value, OPTIONS_DEFAULT);
        assert_eq!(record["t"], EnumCellValue::Integer(1));
        assert_eq!(record["f"], EnumCellValue::Integer(0));
    }

    #[test]
    fn empty_containers_emit_nothing() {
        let value = Value::mapping([("a", Value::Sequence(vec![])), ("b", Value::from("x"))]);
        assert_eq!(keys(&flatten_record(&value, OPTIONS_DEFAULT)), vec!["b"]);
    }

    #[test]
    fn formula_triggers_are_escaped_only_when_enabled() {
        let value = Value::mapping([
            ("eq", Value::from("=SUM(A1:A2)")),
            ("minus", Value::Integer(-3)),
            ("at", Value::from("@cmd")),
            ("plain", Value::from("hello")),
        ]);

        let record = flatten_record(&value, OPTIONS_DEFAULT);
        assert_eq!(record["eq"], EnumCellValue::from("=SUM(A1:A2)"));

        let record = flatten_record(
            &value,
            SpecFlattenOptions {
                key_separator: ".",
                escape_formulas: true,
            },
        );
        assert_eq!(record["eq"], EnumCellValue::from("\t=SUM(A1:A2)"));
        assert_eq!(record["minus"], EnumCellValue::from("\t-3"));
        assert_eq!(record["at"], EnumCellValue::from("\t@cmd"));
        assert_eq!(record["plain"], EnumCellValue::from("hello"));
    }

    #[test]
    fn colliding_paths_keep_the_last_value() {
        let value = Value::mapping([
            ("a.b", Value::Integer(1)),
            ("a", Value::mapping([("b", Value::Integer(2))])),
        ]);
        let record = flatten_record(&value, OPTIONS_DEFAULT);
        assert_eq!(record.len(), 1);
        assert_eq!(record["a.b"], EnumCellValue::Integer(2));
    }

    #[test]
    fn parallel_flattening_preserves_order() {
        let l_records: Vec<Value> = (0..(N_RECORDS_PARALLEL_MIN as i64 + 10))
            .map(|n_idx| Value::mapping([("n", Value::from(n_idx))]))
            .collect();
        let l_flat = flatten_records(&l_records, OPTIONS_DEFAULT);
        assert_eq!(l_flat.len(), l_records.len());
        assert!(
            l_flat
                .iter()
                .enumerate()
                .all(|(n_idx, record)| record["n"] == EnumCellValue::Integer(n_idx as i64))
        );
    }
}
