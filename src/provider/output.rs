//! Materialized query output

use super::errors::{QueryError, QueryResult};

/// What a chain produced: documents, or a single count
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput<T> {
    Documents(Vec<T>),
    Count(i64),
}

impl<T> QueryOutput<T> {
    pub fn into_documents(self) -> QueryResult<Vec<T>> {
        match self {
            QueryOutput::Documents(docs) => Ok(docs),
            QueryOutput::Count(_) => Err(QueryError::UnexpectedShape(
                "expected documents, got a count".to_string(),
            )),
        }
    }

    pub fn into_count(self) -> QueryResult<i64> {
        match self {
            QueryOutput::Count(n) => Ok(n),
            QueryOutput::Documents(_) => Err(QueryError::UnexpectedShape(
                "expected a count, got documents".to_string(),
            )),
        }
    }

    pub fn is_count(&self) -> bool {
        matches!(self, QueryOutput::Count(_))
    }
}
