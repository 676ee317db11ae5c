//! Change replay
//!
//! Applies pending changes one document at a time, in order:
//! - no batching, no rollback
//! - an invalid write response is logged and not counted
//! - a transport fault aborts the remaining changes

use std::sync::Arc;

use serde_json::Value;

use crate::observability::{Event, Logger, MetricsRegistry};
use crate::provider::{QueryError, QueryResult};
use crate::transport::{CancellationToken, SearchTransport, WriteResponse};

use super::mapping::{Document, IndexMapping};

/// What a pending change does to its document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

/// One tracked change, already serialized
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    pub kind: ChangeKind,
    pub entity_kind: String,
    pub id: String,
    /// Full document for creates, changed fields for updates
    pub document: Option<Value>,
}

impl PendingChange {
    pub fn create<T: Document>(entity: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: ChangeKind::Create,
            entity_kind: T::KIND.to_string(),
            id: entity.id(),
            document: Some(serde_json::to_value(entity)?),
        })
    }

    pub fn update<T: Document>(entity: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: ChangeKind::Update,
            ..Self::create(entity)?
        })
    }

    pub fn delete<T: Document>(entity: &T) -> Self {
        Self::delete_by_id::<T>(entity.id())
    }

    pub fn delete_by_id<T: Document>(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            entity_kind: T::KIND.to_string(),
            id: id.into(),
            document: None,
        }
    }
}

/// Ordered batch of pending changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<PendingChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: PendingChange) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn create<T: Document>(&mut self, entity: &T) -> Result<&mut Self, serde_json::Error> {
        Ok(self.push(PendingChange::create(entity)?))
    }

    pub fn update<T: Document>(&mut self, entity: &T) -> Result<&mut Self, serde_json::Error> {
        Ok(self.push(PendingChange::update(entity)?))
    }

    pub fn delete<T: Document>(&mut self, entity: &T) -> &mut Self {
        self.push(PendingChange::delete(entity))
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PendingChange> {
        self.changes.iter()
    }
}

impl FromIterator<PendingChange> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = PendingChange>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a PendingChange;
    type IntoIter = std::slice::Iter<'a, PendingChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Replays changes against the engine. Returns how many were accepted.
///
/// Cancellation is checked before each change and aborts a write still
/// waiting on the engine; changes already written stay written.
pub(crate) async fn replay(
    transport: &Arc<dyn SearchTransport>,
    mapping: &IndexMapping,
    metrics: &MetricsRegistry,
    changes: &ChangeSet,
    cancel: &CancellationToken,
) -> QueryResult<usize> {
    let mut applied = 0;

    for change in changes {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        let index = mapping
            .index_for(&change.entity_kind)
            .ok_or_else(|| QueryError::UnmappedEntity(change.entity_kind.clone()))?;

        let response = submit(transport.as_ref(), index, change, cancel).await?;

        if response.is_valid {
            applied += 1;
            metrics.increment_changes_applied();
            Logger::event(
                Event::ChangeApplied,
                &[
                    ("id", change.id.as_str()),
                    ("index", index),
                    ("kind", change.kind.as_str()),
                ],
            );
        } else {
            metrics.increment_changes_rejected();
            Logger::event(
                Event::ChangeRejected,
                &[
                    ("diagnostic", response.debug_information.as_str()),
                    ("id", change.id.as_str()),
                    ("index", index),
                    ("kind", change.kind.as_str()),
                ],
            );
        }
    }

    Logger::event(
        Event::ReplayComplete,
        &[
            ("applied", applied.to_string().as_str()),
            ("total", changes.len().to_string().as_str()),
        ],
    );
    Ok(applied)
}

async fn submit(
    transport: &dyn SearchTransport,
    index: &str,
    change: &PendingChange,
    cancel: &CancellationToken,
) -> QueryResult<WriteResponse> {
    let empty = Value::Object(Default::default());
    let document = change.document.as_ref().unwrap_or(&empty);

    let write = match change.kind {
        ChangeKind::Create => transport.index_document(index, &change.id, document, cancel),
        ChangeKind::Update => transport.update_document(index, &change.id, document, cancel),
        ChangeKind::Delete => transport.delete_document(index, &change.id, cancel),
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(QueryError::Cancelled),
        result = write => result.map_err(QueryError::from),
    };

    // A transport that noticed the token itself reports a fault; surface it as cancellation
    match outcome {
        Err(QueryError::Transport(_)) if cancel.is_cancelled() => Err(QueryError::Cancelled),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Note {
        id: u32,
        text: String,
    }

    impl Document for Note {
        const KIND: &'static str = "Note";
        fn id(&self) -> String {
            self.id.to_string()
        }
    }

    fn note(id: u32) -> Note {
        Note {
            id,
            text: format!("note {}", id),
        }
    }

    #[test]
    fn test_pending_change_shapes() {
        let created = PendingChange::create(&note(1)).unwrap();
        assert_eq!(created.kind, ChangeKind::Create);
        assert_eq!(created.entity_kind, "Note");
        assert_eq!(created.id, "1");
        assert_eq!(created.document, Some(json!({"id": 1, "text": "note 1"})));

        let updated = PendingChange::update(&note(1)).unwrap();
        assert_eq!(updated.kind, ChangeKind::Update);

        let deleted = PendingChange::delete(&note(2));
        assert_eq!(deleted.kind, ChangeKind::Delete);
        assert!(deleted.document.is_none());
    }

    #[test]
    fn test_change_set_keeps_order() {
        let mut changes = ChangeSet::new();
        changes.create(&note(1)).unwrap();
        changes.delete(&note(2));
        changes.update(&note(3)).unwrap();

        let kinds: Vec<ChangeKind> = changes.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Create, ChangeKind::Delete, ChangeKind::Update]
        );
    }
}
