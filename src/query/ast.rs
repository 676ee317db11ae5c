//! Query AST structures
//!
//! A query is an immutable, singly-linked chain of operations. Each node
//! wraps the node it was chained onto, so the outermost node is the last
//! operation the caller applied.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to a document field by name
///
/// Produced by the query-building surface; never discovered by inspecting
/// the element type. A dotted name (`address.city`) is a nested path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRef(String);

impl FieldRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns true if this is a direct member access (no nested path)
    pub fn is_direct(&self) -> bool {
        !self.0.is_empty() && !self.0.contains('.')
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// Member access on the document
    Field(FieldRef),
    /// Value captured when the predicate was built
    Literal(Value),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Returns the operator name for diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }

    /// Returns true for the four ordering operators
    pub fn is_range(&self) -> bool {
        matches!(self, CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte)
    }
}

/// Filter body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// `left op right`; the translatable shape is `Field op Literal`
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    /// Full-text match of `value` against `field`
    Contains { field: FieldRef, value: Value },
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Create a `field op value` comparison
    pub fn compare(field: impl Into<FieldRef>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            left: Operand::Field(field.into()),
            op,
            right: Operand::Literal(value.into()),
        }
    }

    /// Create an equality predicate
    pub fn eq(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Create an inequality predicate
    pub fn ne(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// Create a range predicate (gt)
    pub fn gt(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// Create a range predicate (gte)
    pub fn gte(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    /// Create a range predicate (lt)
    pub fn lt(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// Create a range predicate (lte)
    pub fn lte(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    /// Create a text-match predicate
    pub fn contains(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Predicate::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Number of `Compare` and `Contains` leaves in this tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Predicate::Compare { .. } | Predicate::Contains { .. } => 1,
            Predicate::Not(inner) => inner.leaf_count(),
            Predicate::And(l, r) | Predicate::Or(l, r) => l.leaf_count() + r.leaf_count(),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Shape of a `select` projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// `new { x.a, x.b }`: a flat list of member accesses
    Object(Vec<FieldRef>),
    /// `x => x.a`: a bare member selector
    Member(FieldRef),
}

/// A node in the query chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum QueryExpr {
    /// Root of every chain: the whole collection
    Source,
    Filter {
        source: Arc<QueryExpr>,
        predicate: Predicate,
    },
    Sort {
        source: Arc<QueryExpr>,
        field: FieldRef,
        direction: SortDirection,
    },
    Skip {
        source: Arc<QueryExpr>,
        count: i64,
    },
    Take {
        source: Arc<QueryExpr>,
        count: i64,
    },
    Project {
        source: Arc<QueryExpr>,
        projection: Projection,
    },
    /// Terminal: count matching documents
    Count { source: Arc<QueryExpr> },
    /// Grouping; representable in a chain but not in the target language
    GroupBy {
        source: Arc<QueryExpr>,
        key: FieldRef,
    },
}

impl QueryExpr {
    /// Creates the root of a new chain
    pub fn source() -> Arc<Self> {
        Arc::new(QueryExpr::Source)
    }

    /// Returns the node this one was chained onto
    pub fn inner(&self) -> Option<&Arc<QueryExpr>> {
        match self {
            QueryExpr::Source => None,
            QueryExpr::Filter { source, .. }
            | QueryExpr::Sort { source, .. }
            | QueryExpr::Skip { source, .. }
            | QueryExpr::Take { source, .. }
            | QueryExpr::Project { source, .. }
            | QueryExpr::Count { source }
            | QueryExpr::GroupBy { source, .. } => Some(source),
        }
    }

    /// Returns the operation name for logs and error messages
    pub fn op_name(&self) -> &'static str {
        match self {
            QueryExpr::Source => "source",
            QueryExpr::Filter { .. } => "filter",
            QueryExpr::Sort { .. } => "sort",
            QueryExpr::Skip { .. } => "skip",
            QueryExpr::Take { .. } => "take",
            QueryExpr::Project { .. } => "project",
            QueryExpr::Count { .. } => "count",
            QueryExpr::GroupBy { .. } => "group_by",
        }
    }

    /// Number of nodes in the chain, root included
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut node = self;
        while let Some(inner) = node.inner() {
            depth += 1;
            node = inner;
        }
        depth
    }

    pub fn filter(self: &Arc<Self>, predicate: Predicate) -> Arc<Self> {
        Arc::new(QueryExpr::Filter {
            source: Arc::clone(self),
            predicate,
        })
    }

    pub fn sort(self: &Arc<Self>, field: impl Into<FieldRef>, direction: SortDirection) -> Arc<Self> {
        Arc::new(QueryExpr::Sort {
            source: Arc::clone(self),
            field: field.into(),
            direction,
        })
    }

    pub fn skip(self: &Arc<Self>, count: i64) -> Arc<Self> {
        Arc::new(QueryExpr::Skip {
            source: Arc::clone(self),
            count,
        })
    }

    pub fn take(self: &Arc<Self>, count: i64) -> Arc<Self> {
        Arc::new(QueryExpr::Take {
            source: Arc::clone(self),
            count,
        })
    }

    pub fn project(self: &Arc<Self>, projection: Projection) -> Arc<Self> {
        Arc::new(QueryExpr::Project {
            source: Arc::clone(self),
            projection,
        })
    }

    pub fn count(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(QueryExpr::Count {
            source: Arc::clone(self),
        })
    }

    pub fn group_by(self: &Arc<Self>, key: impl Into<FieldRef>) -> Arc<Self> {
        Arc::new(QueryExpr::GroupBy {
            source: Arc::clone(self),
            key: key.into(),
        })
    }
}
