//! Column projection: rename and reorder row fields per the job's mappings.

use crate::types::{ColumnMapping, FieldValue, Row};

/// Project a source row into ordered `(target, value)` output fields.
///
/// Pure and stateless. Output order equals the mapping list order; a
/// source name the row does not carry projects to null. Values pass
/// through untouched — each encoder applies its own nested-value policy.
pub fn project(row: &Row, mappings: &[ColumnMapping]) -> Vec<(String, FieldValue)> {
    mappings
        .iter()
        .map(|mapping| {
            let value = row
                .get(&mapping.source)
                .cloned()
                .unwrap_or(FieldValue::Null);
            (mapping.target.clone(), value)
        })
        .collect()
}
