//! Transport-level request and response values
//!
//! Structured values exchanged over the RPC boundary. `SearchRequest`
//! renders to the engine's `_search` body.

use serde_json::{json, Map, Value};

use crate::aggregation::AggregationSpec;
use crate::translate::{CompiledFilter, SortSpec};

/// A search against one index
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchRequest {
    /// Target index
    pub index: String,
    /// `None` matches every document
    pub query: Option<CompiledFilter>,
    pub from: Option<u64>,
    pub size: Option<u64>,
    pub sort: Vec<SortSpec>,
    /// `_source` allow-list; empty returns whole documents
    pub source_includes: Vec<String>,
    pub track_total_hits: bool,
    pub aggregations: Option<AggregationSpec>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Self::default()
        }
    }

    /// Renders the request body in the engine's wire format.
    /// The index travels in the URL and is not part of the body.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();

        if let Some(query) = &self.query {
            body.insert("query".into(), query.to_json());
        }
        if let Some(from) = self.from {
            body.insert("from".into(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".into(), json!(size));
        }
        if !self.sort.is_empty() {
            let sort = self.sort.iter().map(SortSpec::to_json).collect();
            body.insert("sort".into(), Value::Array(sort));
        }
        if !self.source_includes.is_empty() {
            body.insert(
                "_source".into(),
                json!({ "includes": self.source_includes }),
            );
        }
        if self.track_total_hits {
            body.insert("track_total_hits".into(), Value::Bool(true));
        }
        if let Some(aggs) = &self.aggregations {
            body.insert("aggs".into(), aggs.to_json());
        }

        Value::Object(body)
    }

    /// Compact JSON string of [`to_body`](Self::to_body)
    pub fn to_wire_string(&self) -> String {
        self.to_body().to_string()
    }
}

/// Engine answer to a search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    pub is_valid: bool,
    /// Raw `_source` documents, in hit order
    pub documents: Vec<Value>,
    /// Total matching documents, independent of paging
    pub total: i64,
    /// Engine diagnostic text
    pub debug_information: String,
    pub aggregations: Option<Value>,
}

impl SearchResponse {
    pub fn valid(documents: Vec<Value>, total: i64) -> Self {
        Self {
            is_valid: true,
            documents,
            total,
            ..Self::default()
        }
    }

    pub fn invalid(debug_information: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            debug_information: debug_information.into(),
            ..Self::default()
        }
    }

    pub fn with_aggregations(mut self, aggregations: Value) -> Self {
        self.aggregations = Some(aggregations);
        self
    }
}

/// Engine answer to a single-document write
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteResponse {
    pub is_valid: bool,
    pub debug_information: String,
}

impl WriteResponse {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            debug_information: String::new(),
        }
    }

    pub fn invalid(debug_information: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            debug_information: debug_information.into(),
        }
    }
}
