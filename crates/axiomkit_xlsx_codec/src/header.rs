//! Column header reconciliation across heterogeneous records.

use std::collections::HashMap;

use tracing::trace;

use crate::spec::{EnumHeaderSpec, FlatRecord};

/// Resolved header of one encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecResolvedHeader {
    /// Text written into the header row.
    pub labels: Vec<String>,
    /// Record path projected into each column.
    pub source_keys: Vec<String>,
}

/// Incremental order-preserving merge of record key orders.
///
/// A key not seen before is placed right after the last already-placed key of
/// the same record, or appended when the record has placed nothing yet.
#[derive(Debug, Default, Clone)]
pub struct HeaderReconciler {
    l_header: Vec<String>,
    dict_pos_by_key: HashMap<String, usize>,
}

impl HeaderReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the key order of one record.
    pub fn observe(&mut self, record: &FlatRecord) {
        let mut n_pos_previous: Option<usize> = None;

        for key in record.keys() {
            if let Some(n_pos) = self.dict_pos_by_key.get(key) {
                n_pos_previous = Some(*n_pos);
                continue;
            }

            let n_pos_new = match n_pos_previous {
                None => {
                    trace!(key = %key, pos = self.l_header.len(), "append header key");
                    self.l_header.len()
                }
                Some(n_pos) => {
                    trace!(key = %key, pos = n_pos + 1, "insert header key after previous");
                    n_pos + 1
                }
            };

            self.l_header.insert(n_pos_new, key.clone());
            for (n_idx, c_key) in self.l_header.iter().enumerate().skip(n_pos_new) {
                self.dict_pos_by_key.insert(c_key.clone(), n_idx);
            }
            n_pos_previous = Some(n_pos_new);
        }
    }

    pub fn finish(self) -> Vec<String> {
        self.l_header
    }
}

/// Reconcile one ordered, duplicate-free header across all `records`.
pub fn reconcile_headers(records: &[FlatRecord]) -> Vec<String> {
    let mut reconciler = HeaderReconciler::new();
    for record in records {
        reconciler.observe(record);
    }
    reconciler.finish()
}

/// Use the explicit header when given, otherwise reconcile from `records`.
pub fn resolve_header(records: &[FlatRecord], header_spec: &EnumHeaderSpec) -> SpecResolvedHeader {
    if header_spec.is_auto() {
        let l_header = reconcile_headers(records);
        return SpecResolvedHeader {
            labels: l_header.clone(),
            source_keys: l_header,
        };
    }

    SpecResolvedHeader {
        labels: header_spec.labels(),
        source_keys: header_spec.source_keys(),
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::spec::EnumCellValue;

    fn record(keys: &[&str]) -> FlatRecord {
        keys.iter()
            .map(|key| (key.to_string(), EnumCellValue::None))
            .collect()
    }

    #[test]
    fn uniform_records_keep_their_order() {
        let l_records = vec![record(&["foo", "bar"]), record(&["foo", "bar"])];
        assert_eq!(reconcile_headers(&l_records), vec!["foo", "bar"]);
    }

    #[test]
    fn new_key_is_inserted_after_previous_known_key() {
        let l_records = vec![
            record(&["a.0", "a.1"]),
            record(&["b"]),
            record(&["a.0", "a.1", "c"]),
        ];
        assert_eq!(reconcile_headers(&l_records), vec!["a.0", "a.1", "c", "b"]);
    }

    #[test]
    fn consecutive_new_keys_keep_record_order() {
        let l_records = vec![record(&["a", "z"]), record(&["a", "x", "y"])];
        assert_eq!(reconcile_headers(&l_records), vec!["a", "x", "y", "z"]);
    }

    #[test]
    fn new_key_without_known_predecessor_is_appended() {
        let l_records = vec![record(&["a", "b"]), record(&["x", "b", "y"])];
        assert_eq!(reconcile_headers(&l_records), vec!["a", "b", "y", "x"]);
    }

    #[test]
    fn positions_stay_consistent_after_shifts() {
        let mut reconciler = HeaderReconciler::new();
        reconciler.observe(&record(&["a", "b", "c"]));
        reconciler.observe(&record(&["a", "x"]));
        reconciler.observe(&record(&["b", "y"]));
        reconciler.observe(&record(&["x", "z"]));

        for (n_idx, key) in reconciler.l_header.iter().enumerate() {
            assert_eq!(reconciler.dict_pos_by_key[key], n_idx);
        }
        assert_eq!(reconciler.finish(), ["a", "x", "z", "b", "y", "c"]);
    }

    #[test]
    fn explicit_mapping_skips_reconciliation() {
        let l_records = vec![record(&["foo", "bar", "extra"])];
        let header_spec = EnumHeaderSpec::Mapping(IndexMap::from([
            ("foo".to_string(), "a".to_string()),
            ("bar".to_string(), "b".to_string()),
        ]));

        let resolved = resolve_header(&l_records, &header_spec);
        assert_eq!(resolved.labels, vec!["a", "b"]);
        assert_eq!(resolved.source_keys, vec!["foo", "bar"]);

        let resolved = resolve_header(&l_records, &EnumHeaderSpec::Auto);
        assert_eq!(resolved.labels, vec!["foo", "bar", "extra"]);
    }

    #[test]
    fn explicit_columns_are_duplicate_free() {
        let l_records = vec![record(&["a", "b"])];
        let header_spec = EnumHeaderSpec::Columns(
            ["b", "a", "b"].map(String::from).to_vec(),
        );

        let resolved = resolve_header(&l_records, &header_spec);
        assert_eq!(resolved.labels, vec!["b", "a"]);
        assert_eq!(resolved.source_keys, vec!["b", "a"]);
    }
}
