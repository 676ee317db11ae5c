//! Query evaluation for the in-memory engine
//!
//! Mirrors the engine's behavior closely enough for tests and offline runs:
//! - term: exact value equality (numbers compared numerically)
//! - range: bounds compared as strings against the field's text
//! - match: any lower-cased token in common
//! - missing fields never match and sort last

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

use crate::aggregation::AggregationSpec;
use crate::query::SortDirection;
use crate::translate::{CompiledFilter, SortSpec};

/// Default bucket count for `terms` aggregations
const DEFAULT_TERMS_SIZE: usize = 10;

/// Resolves a dotted field path
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
        .filter(|v| !v.is_null())
}

/// Evaluates compiled filters against documents
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Checks a document against an optional filter (`None` matches all)
    pub fn matches(document: &Value, filter: Option<&CompiledFilter>) -> bool {
        filter.map_or(true, |f| Self::matches_filter(document, f))
    }

    fn matches_filter(document: &Value, filter: &CompiledFilter) -> bool {
        match filter {
            CompiledFilter::Term { field, value } => {
                Self::field_values(document, field).any(|actual| Self::term_eq(actual, value))
            }
            CompiledFilter::Range {
                field,
                gt,
                gte,
                lt,
                lte,
            } => Self::field_values(document, field).any(|actual| {
                let text = text_of(actual);
                gt.as_deref().map_or(true, |b| text.as_str() > b)
                    && gte.as_deref().map_or(true, |b| text.as_str() >= b)
                    && lt.as_deref().map_or(true, |b| text.as_str() < b)
                    && lte.as_deref().map_or(true, |b| text.as_str() <= b)
            }),
            CompiledFilter::Match { field, query } => {
                let wanted = tokenize(query);
                Self::field_values(document, field)
                    .any(|actual| tokenize(&text_of(actual)).iter().any(|t| wanted.contains(t)))
            }
            CompiledFilter::Bool {
                must,
                must_not,
                should,
                minimum_should_match,
            } => {
                if !must.iter().all(|f| Self::matches_filter(document, f)) {
                    return false;
                }
                if must_not.iter().any(|f| Self::matches_filter(document, f)) {
                    return false;
                }
                if should.is_empty() {
                    return true;
                }
                let required = minimum_should_match
                    .map(|m| m as usize)
                    .unwrap_or(if must.is_empty() { 1 } else { 0 });
                let hits = should
                    .iter()
                    .filter(|f| Self::matches_filter(document, f))
                    .count();
                hits >= required
            }
        }
    }

    /// A field's values; array fields contribute each element
    fn field_values<'a>(document: &'a Value, field: &str) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
        match lookup(document, field) {
            Some(Value::Array(items)) => Box::new(items.iter().filter(|v| !v.is_null())),
            Some(value) => Box::new(std::iter::once(value)),
            None => Box::new(std::iter::empty()),
        }
    }

    fn term_eq(actual: &Value, expected: &Value) -> bool {
        match (actual, expected) {
            (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(af), Some(bf)) => af == bf,
                _ => a == b,
            },
            _ => actual == expected,
        }
    }
}

/// Sorts raw documents by one key
pub struct DocumentSorter;

impl DocumentSorter {
    /// Stable sort; documents missing the field go last in both directions
    pub fn sort(documents: &mut [Value], spec: &SortSpec) {
        documents.sort_by(|a, b| {
            match (lookup(a, &spec.field), lookup(b, &spec.field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a_val), Some(b_val)) => {
                    let ordering = Self::compare_values(a_val, b_val);
                    match spec.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                }
            }
        });
    }

    /// Ordering rules:
    /// - bool < number < string < array < object
    /// - for same types, natural ordering
    fn compare_values(a: &Value, b: &Value) -> Ordering {
        let type_order = |v: &Value| -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Number(_) => 2,
                Value::String(_) => 3,
                Value::Array(_) => 4,
                Value::Object(_) => 5,
            }
        };

        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let xf = x.as_f64().unwrap_or(0.0);
                let yf = y.as_f64().unwrap_or(0.0);
                xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => type_order(a).cmp(&type_order(b)),
        }
    }
}

/// Keeps only the allow-listed top-level fields
pub fn project(document: Value, includes: &[String]) -> Value {
    if includes.is_empty() {
        return document;
    }
    match document {
        Value::Object(mut map) => {
            let mut projected = Map::new();
            for field in includes {
                if let Some(value) = map.remove(field) {
                    projected.insert(field.clone(), value);
                }
            }
            Value::Object(projected)
        }
        other => other,
    }
}

/// Computes aggregations over the matched documents.
///
/// Errors name the first clause the engine would reject.
pub fn aggregate(documents: &[Value], spec: &AggregationSpec) -> Result<Value, String> {
    let mut out = Map::new();

    for (name, clause) in spec.iter() {
        let (kind, body) = clause
            .as_object()
            .filter(|o| o.len() == 1)
            .and_then(|o| o.iter().next())
            .ok_or_else(|| format!("aggregation '{}' must have exactly one type", name))?;
        let field = body
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("aggregation '{}' requires a field", name))?;

        let values: Vec<&Value> = documents
            .iter()
            .flat_map(|doc| FilterEvaluator::field_values(doc, field))
            .collect();

        let result = match kind.as_str() {
            "terms" => {
                let size = body
                    .get("size")
                    .and_then(Value::as_u64)
                    .map(|s| s as usize)
                    .unwrap_or(DEFAULT_TERMS_SIZE);
                terms_buckets(&values, size)
            }
            "avg" => {
                let nums = numbers(&values);
                let avg = (!nums.is_empty()).then(|| nums.iter().sum::<f64>() / nums.len() as f64);
                json!({ "value": avg })
            }
            "sum" => json!({ "value": numbers(&values).iter().sum::<f64>() }),
            "min" => json!({ "value": numbers(&values).into_iter().reduce(f64::min) }),
            "max" => json!({ "value": numbers(&values).into_iter().reduce(f64::max) }),
            "value_count" => json!({ "value": values.len() }),
            "cardinality" => {
                let distinct: BTreeSet<String> = values.iter().map(|v| v.to_string()).collect();
                json!({ "value": distinct.len() })
            }
            other => return Err(format!("unknown aggregation type [{}] for '{}'", other, name)),
        };

        out.insert(name.to_string(), result);
    }

    Ok(Value::Object(out))
}

fn terms_buckets(values: &[&Value], size: usize) -> Value {
    // Keyed by JSON text so equal values share a bucket
    let mut counts: BTreeMap<String, (Value, u64)> = BTreeMap::new();
    for value in values {
        let entry = counts
            .entry(value.to_string())
            .or_insert_with(|| ((*value).clone(), 0));
        entry.1 += 1;
    }

    let mut buckets: Vec<(Value, u64)> = counts.into_values().collect();
    // Highest count first; ties keep key order from the map
    buckets.sort_by(|a, b| b.1.cmp(&a.1));
    buckets.truncate(size);

    let buckets: Vec<Value> = buckets
        .into_iter()
        .map(|(key, doc_count)| json!({ "key": key, "doc_count": doc_count }))
        .collect();
    json!({ "buckets": buckets })
}

fn numbers(values: &[&Value]) -> Vec<f64> {
    values.iter().filter_map(|v| v.as_f64()).collect()
}

/// Text form of a field value as the engine indexes it
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
