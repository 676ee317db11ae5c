//! Provider Execution Tests
//!
//! End-to-end through `SearchContext` → `Queryable` → `QueryProvider`
//! against the in-memory engine.
//!
//! Test Categories:
//! 1. Counts
//! 2. Sync / async equivalence
//! 3. Lazy async iteration and cancellation
//! 4. Failure surfacing
//! 5. Aggregations and diagnostics

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use aerosearch::aggregation::{MetricValue, TermsBuckets};
use aerosearch::context::{Document, IndexMapping, SearchContext};
use aerosearch::provider::QueryError;
use aerosearch::query::Predicate;
use aerosearch::transport::{CancellationToken, MemoryTransport, SearchTransport, TransportError};
use aerosearch::{AggregationSpec, CompiledFilter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    id: u32,
    owner: String,
    status: String,
    balance: f64,
}

impl Document for Account {
    const KIND: &'static str = "Account";
    fn id(&self) -> String {
        self.id.to_string()
    }
}

/// 7 active and 3 inactive accounts in index "account"
fn seeded() -> (Arc<MemoryTransport>, SearchContext) {
    let documents = (1..=10).map(|i| {
        let status = if i <= 7 { "active" } else { "inactive" };
        (
            i.to_string(),
            json!({
                "id": i,
                "owner": format!("owner-{:02}", i),
                "status": status,
                "balance": (i * 100) as f64,
            }),
        )
    });
    let transport = Arc::new(MemoryTransport::new().with_documents("account", documents));
    let ctx = SearchContext::new(
        transport.clone() as Arc<dyn SearchTransport>,
        IndexMapping::builder().register::<Account>().build(),
    );
    (transport, ctx)
}

// =============================================================================
// COUNTS
// =============================================================================

#[test]
fn test_filtered_count_returns_integer() {
    let (transport, ctx) = seeded();
    let accounts = ctx.set::<Account>().unwrap();

    let active = accounts.filter(Predicate::eq("status", "active")).count().unwrap();
    assert_eq!(active, 7);
    assert_eq!(transport.search_calls(), 1);

    let sent = transport.last_request().unwrap();
    assert!(sent.track_total_hits);
    assert_eq!(sent.query, Some(CompiledFilter::term("status", "active")));
}

#[test]
fn test_count_gated_by_skip_and_take() {
    let (_, ctx) = seeded();
    let accounts = ctx.set::<Account>().unwrap();

    assert_eq!(accounts.skip(8).count().unwrap(), 2);
    assert_eq!(accounts.take(4).count().unwrap(), 4);
    assert_eq!(accounts.skip(20).count().unwrap(), 0);
}

#[tokio::test]
async fn test_count_async_matches_sync() {
    let (_, ctx) = seeded();
    let inactive = ctx
        .set::<Account>()
        .unwrap()
        .filter(Predicate::eq("status", "inactive"));

    let cancel = CancellationToken::new();
    assert_eq!(inactive.count_async(&cancel).await.unwrap(), inactive.count().unwrap());
}

// =============================================================================
// SYNC / ASYNC EQUIVALENCE
// =============================================================================

#[tokio::test]
async fn test_sync_and_async_yield_same_sequence() {
    let (_, ctx) = seeded();
    let page = ctx
        .set::<Account>()
        .unwrap()
        .filter(Predicate::eq("status", "active"))
        .order_by_descending("balance")
        .skip(1)
        .take(3);

    let sync: Vec<Account> = page.iter().unwrap().collect();
    let collected = page.to_vec_async(&CancellationToken::new()).await.unwrap();
    let streamed: Vec<Account> = page
        .stream(CancellationToken::new())
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(sync.len(), 3);
    assert_eq!(sync[0].id, 6);
    assert_eq!(sync, collected);
    assert_eq!(sync, streamed);
}

#[test]
fn test_reiteration_issues_new_calls() {
    let (transport, ctx) = seeded();
    let accounts = ctx.set::<Account>().unwrap().take(2);

    let first = accounts.to_vec().unwrap();
    transport
        .insert_document("account", "0", json!({"id": 0, "owner": "new", "status": "active", "balance": 0.0}))
        .unwrap();
    let second = accounts.to_vec().unwrap();

    assert_eq!(transport.search_calls(), 2);
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
}

// =============================================================================
// LAZY ASYNC ITERATION AND CANCELLATION
// =============================================================================

#[tokio::test]
async fn test_stream_submits_on_first_poll_only() {
    let (transport, ctx) = seeded();
    let mut stream = ctx.set::<Account>().unwrap().stream(CancellationToken::new());

    assert_eq!(transport.search_calls(), 0);
    let mut seen = 0;
    while let Some(item) = stream.next().await {
        item.unwrap();
        seen += 1;
    }
    assert_eq!(seen, 10);
    assert_eq!(transport.search_calls(), 1);
}

#[tokio::test]
async fn test_cancel_interrupts_slow_engine() {
    let transport = Arc::new(
        MemoryTransport::new()
            .with_index("account")
            .with_latency(Duration::from_secs(30)),
    );
    let ctx = SearchContext::new(
        transport as Arc<dyn SearchTransport>,
        IndexMapping::builder().register::<Account>().build(),
    );

    let cancel = CancellationToken::new();
    let mut stream = ctx.set::<Account>().unwrap().stream(cancel.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("stream did not observe cancellation")
        .unwrap();
    assert!(matches!(first, Err(QueryError::Cancelled)));
    assert!(stream.next().await.is_none());
    canceller.await.unwrap();
}

// =============================================================================
// FAILURE SURFACING
// =============================================================================

#[test]
fn test_group_by_never_reaches_engine() {
    let (transport, ctx) = seeded();
    let err = ctx.set::<Account>().unwrap().group_by("status").to_vec().unwrap_err();

    assert!(matches!(err, QueryError::Translate(_)));
    assert_eq!(transport.search_calls(), 0);
}

#[test]
fn test_invalid_response_carries_diagnostic() {
    let (transport, ctx) = seeded();
    transport
        .invalid_next_search("search_phase_execution_exception: failed to parse")
        .unwrap();

    let err = ctx.set::<Account>().unwrap().to_vec().unwrap_err();
    assert_eq!(err.code(), "AERO_REMOTE_QUERY_FAILED");
    assert!(err.to_string().contains("failed to parse"));
}

#[tokio::test]
async fn test_transport_fault_surfaces_unmodified() {
    let (transport, ctx) = seeded();
    transport.fail_next(TransportError::Timeout(250)).unwrap();

    let err = ctx
        .set::<Account>()
        .unwrap()
        .to_vec_async(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Transport(TransportError::Timeout(250))));
}

// =============================================================================
// AGGREGATIONS AND DIAGNOSTICS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BalanceReport {
    by_status: TermsBuckets,
    total_balance: MetricValue,
    richest: MetricValue,
}

#[tokio::test]
async fn test_aggregate_decodes_by_name() {
    let (transport, ctx) = seeded();
    let spec = AggregationSpec::new()
        .terms("by_status", "status")
        .sum("total_balance", "balance")
        .max("richest", "balance");

    let report: BalanceReport = ctx
        .set::<Account>()
        .unwrap()
        .aggregate(&spec, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.by_status.count_for(&json!("active")), Some(7));
    assert_eq!(report.by_status.count_for(&json!("inactive")), Some(3));
    assert_eq!(report.total_balance.value, Some(5500.0));
    assert_eq!(report.richest.value, Some(1000.0));
    assert_eq!(transport.last_request().unwrap().size, Some(0));
}

#[tokio::test]
async fn test_aggregate_respects_filter() {
    let (_, ctx) = seeded();
    let spec = AggregationSpec::new().sum("total_balance", "balance");

    let report: BalanceReport = ctx
        .set::<Account>()
        .unwrap()
        .filter(Predicate::eq("status", "inactive"))
        .aggregate(&spec, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.total_balance.value, Some(2700.0));
    assert!(report.by_status.buckets.is_empty());
}

#[test]
fn test_with_query_replaces_translated_filter() {
    let (transport, ctx) = seeded();
    let found = ctx
        .set::<Account>()
        .unwrap()
        .filter(Predicate::eq("status", "inactive"))
        .with_query(CompiledFilter::term("owner", "owner-03"))
        .to_vec()
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 3);
    assert_eq!(
        transport.last_request().unwrap().query,
        Some(CompiledFilter::term("owner", "owner-03"))
    );
}

#[test]
fn test_query_string_is_offline() {
    let (transport, ctx) = seeded();
    let body = ctx
        .set::<Account>()
        .unwrap()
        .filter(Predicate::gt("balance", 500))
        .order_by("owner")
        .take(2)
        .query_string()
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        parsed,
        json!({
            "query": {"range": {"balance": {"gt": "500"}}},
            "size": 2,
            "sort": [{"owner": {"order": "asc"}}]
        })
    );
    assert_eq!(transport.search_calls(), 0);
}
