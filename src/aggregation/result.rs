//! Aggregation result decoding
//!
//! The engine answers with a nested map keyed by aggregation name. Callers
//! pick their own result shape; fields are matched by name, unknown engine
//! fields are ignored and absent ones keep their default (use
//! `#[serde(default)]` on the result type).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Decodes the engine's aggregation map into `R`.
///
/// A missing or null map yields `R::default()`.
pub fn decode_aggregations<R>(aggregations: Option<Value>) -> Result<R, serde_json::Error>
where
    R: DeserializeOwned + Default,
{
    match aggregations {
        None | Some(Value::Null) => Ok(R::default()),
        Some(value) => serde_json::from_value(value),
    }
}

/// Single-value metric (`avg`, `sum`, `min`, `max`, `value_count`, `cardinality`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricValue {
    /// `None` when no document carried the field
    pub value: Option<f64>,
}

/// One `terms` bucket
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Bucket {
    pub key: Value,
    pub doc_count: u64,
}

/// `terms` aggregation result
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TermsBuckets {
    pub buckets: Vec<Bucket>,
}

impl TermsBuckets {
    /// Document count for the bucket whose key equals `key`
    pub fn count_for(&self, key: &Value) -> Option<u64> {
        self.buckets
            .iter()
            .find(|b| &b.key == key)
            .map(|b| b.doc_count)
    }
}
