use super::keys::record_keys;
use crate::error::CoreResult;
use crate::record::Record;
use docrel_codec::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Fetched joined records grouped by right-key value.
///
/// Each bucket keeps fetch order. A record whose right key is a sequence
/// appears in the bucket of every element.
#[derive(Debug)]
pub(crate) struct MatchIndex<J> {
    buckets: HashMap<Value, Vec<Arc<J>>>,
}

impl<J: Record> MatchIndex<J> {
    pub(crate) fn build(fetched: &[Arc<J>], right: &str) -> CoreResult<Self> {
        let mut buckets: HashMap<Value, Vec<Arc<J>>> = HashMap::new();
        for record in fetched {
            for key in record_keys(record.as_ref(), right)? {
                buckets.entry(key).or_default().push(Arc::clone(record));
            }
        }
        Ok(Self { buckets })
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// The first match, taking keys in order and buckets in fetch order.
    pub(crate) fn first(&self, keys: &[Value]) -> Option<Arc<J>> {
        keys.iter()
            .find_map(|key| self.buckets.get(key).and_then(|bucket| bucket.first()))
            .cloned()
    }

    /// Every match, bucket by bucket in key order.
    pub(crate) fn all(&self, keys: &[Value]) -> Vec<Arc<J>> {
        keys.iter()
            .filter_map(|key| self.buckets.get(key))
            .flatten()
            .cloned()
            .collect()
    }
}
