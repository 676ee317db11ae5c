//! Compiled query structures
//!
//! The translator's output. `CompiledFilter` mirrors the engine's query DSL
//! node for node and renders to its JSON form.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::query::SortDirection;

/// Engine-side filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledFilter {
    /// Exact term test
    Term { field: String, value: Value },
    /// Term range test; bounds are compared as strings by the engine
    Range {
        field: String,
        gt: Option<String>,
        gte: Option<String>,
        lt: Option<String>,
        lte: Option<String>,
    },
    /// Full-text match
    Match { field: String, query: String },
    /// Boolean composition
    Bool {
        must: Vec<CompiledFilter>,
        must_not: Vec<CompiledFilter>,
        should: Vec<CompiledFilter>,
        minimum_should_match: Option<u32>,
    },
}

impl CompiledFilter {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        CompiledFilter::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an empty range on `field`; chain the bound setters
    pub fn range(field: impl Into<String>) -> Self {
        CompiledFilter::Range {
            field: field.into(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    pub fn matches(field: impl Into<String>, query: impl Into<String>) -> Self {
        CompiledFilter::Match {
            field: field.into(),
            query: query.into(),
        }
    }

    pub fn must(clauses: Vec<CompiledFilter>) -> Self {
        CompiledFilter::Bool {
            must: clauses,
            must_not: Vec::new(),
            should: Vec::new(),
            minimum_should_match: None,
        }
    }

    pub fn must_not(clause: CompiledFilter) -> Self {
        CompiledFilter::Bool {
            must: Vec::new(),
            must_not: vec![clause],
            should: Vec::new(),
            minimum_should_match: None,
        }
    }

    /// Disjunction: at least one clause must match
    pub fn should(clauses: Vec<CompiledFilter>) -> Self {
        CompiledFilter::Bool {
            must: Vec::new(),
            must_not: Vec::new(),
            should: clauses,
            minimum_should_match: Some(1),
        }
    }

    /// Sets the `gt` bound of a range (no-op on other variants)
    pub fn gt(self, bound: impl Into<String>) -> Self {
        self.with_bound(|gt, _, _, _| *gt = Some(bound.into()))
    }

    pub fn gte(self, bound: impl Into<String>) -> Self {
        self.with_bound(|_, gte, _, _| *gte = Some(bound.into()))
    }

    pub fn lt(self, bound: impl Into<String>) -> Self {
        self.with_bound(|_, _, lt, _| *lt = Some(bound.into()))
    }

    pub fn lte(self, bound: impl Into<String>) -> Self {
        self.with_bound(|_, _, _, lte| *lte = Some(bound.into()))
    }

    fn with_bound<F>(mut self, set: F) -> Self
    where
        F: FnOnce(
            &mut Option<String>,
            &mut Option<String>,
            &mut Option<String>,
            &mut Option<String>,
        ),
    {
        if let CompiledFilter::Range { gt, gte, lt, lte, .. } = &mut self {
            set(gt, gte, lt, lte);
        }
        self
    }

    /// Number of term/range/match leaves
    pub fn leaf_count(&self) -> usize {
        match self {
            CompiledFilter::Term { .. }
            | CompiledFilter::Range { .. }
            | CompiledFilter::Match { .. } => 1,
            CompiledFilter::Bool {
                must,
                must_not,
                should,
                ..
            } => must
                .iter()
                .chain(must_not)
                .chain(should)
                .map(CompiledFilter::leaf_count)
                .sum(),
        }
    }

    /// Renders the engine's JSON query clause
    pub fn to_json(&self) -> Value {
        match self {
            CompiledFilter::Term { field, value } => {
                json!({ "term": { field: { "value": value } } })
            }
            CompiledFilter::Range {
                field,
                gt,
                gte,
                lt,
                lte,
            } => {
                let mut bounds = Map::new();
                for (key, bound) in [("gt", gt), ("gte", gte), ("lt", lt), ("lte", lte)] {
                    if let Some(b) = bound {
                        bounds.insert(key.to_string(), Value::String(b.clone()));
                    }
                }
                json!({ "range": { field: bounds } })
            }
            CompiledFilter::Match { field, query } => {
                json!({ "match": { field: { "query": query } } })
            }
            CompiledFilter::Bool {
                must,
                must_not,
                should,
                minimum_should_match,
            } => {
                let mut body = Map::new();
                for (key, clauses) in [("must", must), ("must_not", must_not), ("should", should)] {
                    if !clauses.is_empty() {
                        let rendered = clauses.iter().map(CompiledFilter::to_json).collect();
                        body.insert(key.to_string(), Value::Array(rendered));
                    }
                }
                if let Some(msm) = minimum_should_match {
                    body.insert("minimum_should_match".to_string(), json!(msm));
                }
                json!({ "bool": body })
            }
        }
    }
}

impl Serialize for CompiledFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ &self.field: { "order": self.direction.as_str() } })
    }
}

/// Translator output consumed by the provider
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    /// `None` matches every document
    pub filter: Option<CompiledFilter>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    /// Source allow-list, in projection order
    pub projected_fields: Vec<String>,
    pub sort: Option<SortSpec>,
    /// Set by a count terminal
    pub track_total: bool,
}

impl CompiledQuery {
    pub fn is_count(&self) -> bool {
        self.track_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_json() {
        let filter = CompiledFilter::term("status", "active");
        assert_eq!(
            filter.to_json(),
            json!({"term": {"status": {"value": "active"}}})
        );
    }

    #[test]
    fn test_range_json_only_set_bounds() {
        let filter = CompiledFilter::range("age").gt("18").lte("65");
        assert_eq!(
            filter.to_json(),
            json!({"range": {"age": {"gt": "18", "lte": "65"}}})
        );
    }

    #[test]
    fn test_bool_json_omits_empty_clauses() {
        let filter = CompiledFilter::should(vec![
            CompiledFilter::term("a", 1),
            CompiledFilter::matches("title", "rust"),
        ]);
        assert_eq!(
            filter.to_json(),
            json!({"bool": {
                "should": [
                    {"term": {"a": {"value": 1}}},
                    {"match": {"title": {"query": "rust"}}}
                ],
                "minimum_should_match": 1
            }})
        );
    }

    #[test]
    fn test_leaf_count_nested() {
        let filter = CompiledFilter::must(vec![
            CompiledFilter::term("a", 1),
            CompiledFilter::must_not(CompiledFilter::term("b", 2)),
            CompiledFilter::should(vec![
                CompiledFilter::range("c").gt("3"),
                CompiledFilter::matches("d", "x"),
            ]),
        ]);
        assert_eq!(filter.leaf_count(), 4);
    }

    #[test]
    fn test_bound_setter_ignores_non_range() {
        let filter = CompiledFilter::term("a", 1).gt("5");
        assert_eq!(filter, CompiledFilter::term("a", 1));
    }

    #[test]
    fn test_sort_json() {
        let sort = SortSpec::new("name", SortDirection::Desc);
        assert_eq!(sort.to_json(), json!({"name": {"order": "desc"}}));
    }
}
