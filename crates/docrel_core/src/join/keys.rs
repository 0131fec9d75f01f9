use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use docrel_codec::Value;
use std::collections::HashSet;

/// Key values read from one record's key field.
///
/// Sequence values are flattened; `Null` contributes nothing.
pub(crate) fn record_keys<R: Record>(record: &R, field: &str) -> CoreResult<Vec<Value>> {
    let value = record
        .field(field)
        .ok_or_else(|| CoreError::missing_field(R::descriptor().type_name(), field))?;
    Ok(flatten(value))
}

pub(crate) fn flatten(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
        other => vec![other],
    }
}

/// Key lists for every source record, in source order.
pub(crate) fn collect<R: Record>(records: &[R], field: &str) -> CoreResult<Vec<Vec<Value>>> {
    records.iter().map(|r| record_keys(r, field)).collect()
}

/// Distinct keys across all records, in first-seen order.
pub(crate) fn distinct(per_record: &[Vec<Value>]) -> Vec<Value> {
    let mut seen = HashSet::new();
    per_record
        .iter()
        .flatten()
        .filter(|key| seen.insert(*key))
        .cloned()
        .collect()
}
