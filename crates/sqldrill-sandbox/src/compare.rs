use crate::model::Record;
use serde_json::Value;
use std::collections::BTreeMap;

/// Decide whether two result sets are equivalent.
///
/// Column-name casing and row order do not matter; values are compared
/// strictly after normalization, with no type coercion (the integer 50000
/// and the string "50000" are not equal). Ordering-sensitive questions are
/// the caller's concern, not this function's.
pub fn compare_result_sets(candidate: &[Record], reference: &[Record]) -> bool {
    if candidate.len() != reference.len() {
        return false;
    }
    match (canonicalize(candidate), canonicalize(reference)) {
        (Some(a), Some(b)) => a == b,
        // A row with columns colliding under lowercasing has no canonical
        // form; never call such sets equivalent.
        _ => false,
    }
}

/// Sorted canonical encodings: one key-sorted, key-lowercased JSON string
/// per row. BTreeMap gives the deterministic key order; sorting the
/// encodings gives the deterministic row order.
fn canonicalize(rows: &[Record]) -> Option<Vec<String>> {
    let mut encoded = rows
        .iter()
        .map(canonical_row)
        .collect::<Option<Vec<String>>>()?;
    encoded.sort();
    Some(encoded)
}

fn canonical_row(row: &Record) -> Option<String> {
    let normalized: BTreeMap<String, &Value> = row
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect();
    if normalized.len() != row.len() {
        return None;
    }
    Some(serde_json::to_string(&normalized).unwrap_or_default())
}
