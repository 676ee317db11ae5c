//! Aggregation specification
//!
//! A named set of engine aggregation clauses. Built either with the typed
//! helpers below or from a pre-built engine fragment.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Named engine aggregations, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationSpec {
    aggs: Map<String, Value>,
}

impl AggregationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a pre-built aggregation fragment. Returns `None` unless the
    /// fragment is a JSON object keyed by aggregation name.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(aggs) => Some(Self { aggs }),
            _ => None,
        }
    }

    /// Adds a raw aggregation clause under `name`
    pub fn insert(mut self, name: impl Into<String>, body: Value) -> Self {
        self.aggs.insert(name.into(), body);
        self
    }

    /// Bucket documents by the distinct values of `field`
    pub fn terms(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.insert(name, json!({ "terms": { "field": field.into() } }))
    }

    /// Like `terms`, bounded to `size` buckets
    pub fn terms_sized(self, name: impl Into<String>, field: impl Into<String>, size: u32) -> Self {
        self.insert(
            name,
            json!({ "terms": { "field": field.into(), "size": size } }),
        )
    }

    pub fn avg(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.metric(name, "avg", field)
    }

    pub fn sum(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.metric(name, "sum", field)
    }

    pub fn min(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.metric(name, "min", field)
    }

    pub fn max(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.metric(name, "max", field)
    }

    pub fn value_count(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.metric(name, "value_count", field)
    }

    pub fn cardinality(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.metric(name, "cardinality", field)
    }

    fn metric(self, name: impl Into<String>, kind: &str, field: impl Into<String>) -> Self {
        self.insert(name, json!({ kind: { "field": field.into() } }))
    }

    pub fn is_empty(&self) -> bool {
        self.aggs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aggs.len()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.aggs.get(name)
    }

    /// Iterates `(name, clause)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.aggs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.aggs.clone())
    }
}

impl Serialize for AggregationSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.aggs.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_json() {
        let spec = AggregationSpec::new()
            .terms("by_status", "status")
            .avg("avg_age", "age");

        assert_eq!(
            spec.to_json(),
            json!({
                "by_status": {"terms": {"field": "status"}},
                "avg_age": {"avg": {"field": "age"}}
            })
        );
        assert_eq!(spec.len(), 2);
    }

    #[test]
    fn test_from_json_requires_object() {
        assert!(AggregationSpec::from_json(json!([1, 2])).is_none());

        let spec = AggregationSpec::from_json(json!({"n": {"max": {"field": "x"}}})).unwrap();
        assert_eq!(spec.get("n"), Some(&json!({"max": {"field": "x"}})));
    }

    #[test]
    fn test_terms_sized() {
        let spec = AggregationSpec::new().terms_sized("top", "tag", 3);
        assert_eq!(spec.get("top").unwrap()["terms"]["size"], 3);
    }
}
