//! Change Replay Tests
//!
//! Pending changes are applied one document at a time, in order.
//! Invalid responses are not counted; transport faults abort the batch.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use aerosearch::config::SearchConfig;
use aerosearch::context::{ChangeSet, Document, IndexMapping, PendingChange, SearchContext};
use aerosearch::provider::QueryError;
use aerosearch::query::Predicate;
use aerosearch::transport::{CancellationToken, MemoryTransport, SearchTransport, TransportError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Article {
    slug: String,
    title: String,
    published: bool,
}

impl Document for Article {
    const KIND: &'static str = "Article";
    fn id(&self) -> String {
        self.slug.clone()
    }
}

fn article(slug: &str, title: &str) -> Article {
    Article {
        slug: slug.to_string(),
        title: title.to_string(),
        published: false,
    }
}

fn context(transport: &Arc<MemoryTransport>) -> SearchContext {
    SearchContext::new(
        transport.clone() as Arc<dyn SearchTransport>,
        IndexMapping::builder()
            .register_as::<Article>("articles")
            .build(),
    )
}

// =============================================================================
// COUNTING
// =============================================================================

/// Two creates plus one delete the engine rejects → 2
#[tokio::test]
async fn test_invalid_delete_not_counted() {
    let transport = Arc::new(MemoryTransport::new().with_index("articles"));
    let ctx = context(&transport);

    let mut changes = ChangeSet::new();
    changes.create(&article("intro", "Introduction")).unwrap();
    changes.create(&article("setup", "Setup")).unwrap();
    changes.push(PendingChange::delete_by_id::<Article>("never-existed"));

    let applied = ctx
        .save_changes(&changes, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(applied, 2);
    assert_eq!(transport.write_calls(), 3);
    assert_eq!(transport.documents("articles").unwrap().len(), 2);

    let snapshot = ctx.metrics().snapshot();
    assert_eq!(snapshot.changes_applied, 2);
    assert_eq!(snapshot.changes_rejected, 1);
}

#[tokio::test]
async fn test_rejected_write_continues_batch() {
    let transport = Arc::new(MemoryTransport::new());
    transport.reject_id("bad").unwrap();
    let ctx = context(&transport);

    let mut changes = ChangeSet::new();
    changes.create(&article("bad", "Rejected")).unwrap();
    changes.create(&article("good", "Accepted")).unwrap();

    let applied = ctx
        .save_changes(&changes, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(applied, 1);
    assert_eq!(transport.document("articles", "bad").unwrap(), None);
}

#[tokio::test]
async fn test_empty_batch() {
    let transport = Arc::new(MemoryTransport::new());
    let ctx = context(&transport);

    let applied = ctx
        .save_changes(&ChangeSet::new(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(applied, 0);
    assert_eq!(transport.write_calls(), 0);
}

// =============================================================================
// UPDATES ARE VISIBLE TO QUERIES
// =============================================================================

#[tokio::test]
async fn test_update_then_query() {
    let transport = Arc::new(MemoryTransport::new());
    let ctx = context(&transport);

    let mut draft = article("news", "Breaking");
    let mut changes = ChangeSet::new();
    changes.create(&draft).unwrap();
    ctx.save_changes(&changes, &CancellationToken::new())
        .await
        .unwrap();

    draft.published = true;
    let updates: ChangeSet = vec![PendingChange::update(&draft).unwrap()]
        .into_iter()
        .collect();
    let applied = ctx
        .save_changes(&updates, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(applied, 1);

    let published = ctx
        .set::<Article>()
        .unwrap()
        .filter(Predicate::eq("published", true))
        .to_vec()
        .unwrap();
    assert_eq!(published, vec![draft]);
}

// =============================================================================
// ABORTS
// =============================================================================

#[tokio::test]
async fn test_transport_fault_aborts_remaining() {
    let transport = Arc::new(MemoryTransport::new());
    let ctx = context(&transport);

    let mut changes = ChangeSet::new();
    changes.create(&article("one", "One")).unwrap();
    transport
        .fail_next(TransportError::Connection("reset by peer".into()))
        .unwrap();
    changes.create(&article("two", "Two")).unwrap();

    let err = ctx
        .save_changes(&changes, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Transport(TransportError::Connection(_))));
    assert_eq!(transport.write_calls(), 1);
    assert_eq!(transport.document("articles", "two").unwrap(), None);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let transport = Arc::new(MemoryTransport::new());
    let ctx = context(&transport);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut changes = ChangeSet::new();
    changes.create(&article("late", "Late")).unwrap();

    let err = ctx.save_changes(&changes, &cancel).await.unwrap_err();
    assert!(matches!(err, QueryError::Cancelled));
    assert_eq!(transport.write_calls(), 0);
}

/// A write still waiting on a slow engine is abandoned once the token fires
#[tokio::test]
async fn test_cancel_interrupts_in_flight_write() {
    let transport = Arc::new(MemoryTransport::new().with_latency(Duration::from_secs(10)));
    let ctx = context(&transport);

    let mut changes = ChangeSet::new();
    changes.create(&article("slow", "Slow")).unwrap();
    changes.create(&article("never", "Never")).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(2), ctx.save_changes(&changes, &cancel))
        .await
        .expect("replay kept waiting after cancellation")
        .unwrap_err();
    assert!(matches!(err, QueryError::Cancelled));
    assert_eq!(transport.write_calls(), 0);
    assert_eq!(transport.document("articles", "slow").unwrap(), None);
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_prefixed_index_from_config() {
    let transport = Arc::new(MemoryTransport::new());
    let config = SearchConfig::from_json(r#"{"index_prefix": "staging-"}"#).unwrap();
    let ctx = SearchContext::from_config(
        transport.clone() as Arc<dyn SearchTransport>,
        IndexMapping::builder().register::<Article>(),
        &config,
    );

    let mut changes = ChangeSet::new();
    changes.create(&article("hello", "Hello")).unwrap();
    ctx.save_changes(&changes, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        transport.document("staging-article", "hello").unwrap(),
        Some(json!({"slug": "hello", "title": "Hello", "published": false}))
    );
}
