use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use ledger_reconciler::{
    events::{EventHandler, EventProducers, TransactionSyncedEvent},
    grouper::GrouperConfig,
    test_utils::{
        entries::{buy, reward, sell},
        prepare_env::{drop_database, prepare_test_env, random_db_path},
        ScriptedLedger,
    },
    LedgerSourceError,
    PageRequest,
    RetryPolicy,
    SqliteDatabase,
    SyncError,
    SyncFlowApi,
    SyncOptions,
    SyncOutcome,
    TransactionStore,
    UpsertResult,
};

fn options(initial_page_size: u32, incremental_page_size: u32) -> SyncOptions {
    SyncOptions {
        initial_page_size,
        incremental_page_size,
        retry: RetryPolicy::new(2, 1, 1, 0.0),
        ..Default::default()
    }
}

async fn setup(ledger: &ScriptedLedger, options: SyncOptions) -> (String, SyncFlowApi<ScriptedLedger, SqliteDatabase>) {
    let _ = env_logger::try_init();
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let api = SyncFlowApi::new(ledger.clone(), db, options, EventProducers::default());
    (url, api)
}

#[tokio::test]
async fn changes_are_published_to_subscribers() {
    let ledger = ScriptedLedger::new(vec![
        reward("r1", "10", "910", 3),
        sell("s1", "100", "900", 2),
        buy("b1", "1000", "1000", 1),
    ]);
    let url = random_db_path();
    let db = prepare_test_env(&url).await;

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let handler = EventHandler::new(
        4,
        Arc::new(move |ev: TransactionSyncedEvent| {
            let counter = counter.clone();
            Box::pin(async move {
                assert_eq!(ev.change, UpsertResult::Inserted);
                counter.fetch_add(1, Ordering::SeqCst);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        }),
    );
    let mut producers = EventProducers::default();
    producers.transaction_synced_producer.push(handler.subscribe());
    let listener = tokio::spawn(handler.start_handler());

    let api = SyncFlowApi::new(ledger.clone(), db.clone(), options(10, 10), producers);
    let report = api.sync().await.unwrap();
    assert_eq!(report.inserted, 2);
    drop(api);
    listener.await.unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    drop_database(&url).await;
}

#[tokio::test]
async fn page_limit_stops_the_sync() {
    let ledger = ScriptedLedger::new(vec![
        buy("b5", "1", "5", 5),
        buy("b4", "1", "4", 4),
        buy("b3", "1", "3", 3),
        buy("b2", "1", "2", 2),
        buy("b1", "1", "1", 1),
    ]);
    let opts = SyncOptions { max_pages: Some(1), ..options(2, 2) };
    let (url, api) = setup(&ledger, opts).await;
    let report = api.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::PageLimit);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.inserted, 2);
    assert_eq!(api.db().ledger_entry_count().await.unwrap(), 2);
    drop_database(&url).await;
}

#[tokio::test]
async fn refused_transactions_do_not_stop_the_sync() {
    let mut orphan_sell = sell("s1", "100", "900", 2);
    orphan_sell.reference.as_mut().unwrap().order_id = None;
    let ledger = ScriptedLedger::new(vec![buy("b2", "1", "2", 3), orphan_sell, buy("b1", "1", "1", 1)]);
    let (url, api) = setup(&ledger, options(10, 10)).await;
    let report = api.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::Exhausted);
    assert_eq!(report.failed, 1);
    assert_eq!(report.inserted, 2);
    assert!(api.db().fetch_transaction("s1").await.unwrap().is_none());
    drop_database(&url).await;
}

#[tokio::test]
async fn a_waiting_sell_marks_the_end_of_an_incremental_sync() {
    let ledger = ScriptedLedger::new(vec![sell("s1", "100", "900", 5), buy("b0", "1000", "1000", 1)]);
    let (url, api) = setup(&ledger, options(3, 1)).await;
    let report = api.sync().await.unwrap();
    assert_eq!(report.unpaired, 1);
    assert_eq!(api.db().latest_transaction_id().await.unwrap().as_deref(), Some("s1"));

    ledger.post(vec![buy("b1", "10", "910", 6)]);
    ledger.clear_requests();
    let report = api.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::ReachedLatest);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(ledger.requests(), vec![PageRequest::new(1, 1), PageRequest::new(1, 1), PageRequest::new(2, 1)]);
    let s1 = api.db().fetch_transaction("s1").await.unwrap().unwrap();
    assert!(s1.unpaired);
    drop_database(&url).await;
}

#[tokio::test]
async fn permanent_source_errors_fail_the_sync_and_release_the_lock() {
    let ledger = ScriptedLedger::new(vec![buy("b1", "1", "1", 1)]);
    let (url, api) = setup(&ledger, options(10, 10)).await;
    ledger.fail_next(1, LedgerSourceError::InvalidResponse("not json".into()));
    let err = api.sync().await.unwrap_err();
    assert!(matches!(err, SyncError::Source { page: 1, source: LedgerSourceError::InvalidResponse(_) }));
    // a single request: invalid responses are not retried
    assert_eq!(ledger.requests().len(), 1);
    assert!(!api.db().is_sync_locked().await.unwrap());
    let report = api.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::Exhausted);
    drop_database(&url).await;
}

#[tokio::test]
async fn deferral_limit_is_honoured_by_the_sync() {
    let ledger = ScriptedLedger::new(vec![
        sell("s1", "100", "900", 9),
        buy("b3", "1", "1000", 8),
        buy("b2", "1", "999", 7),
        reward("r0", "1", "998", 6),
    ]);
    let opts = SyncOptions { grouper: GrouperConfig { max_deferrals: Some(1) }, ..options(1, 1) };
    let (url, api) = setup(&ledger, opts).await;
    let report = api.sync().await.unwrap();
    assert_eq!(report.unpaired, 1);
    assert_eq!(report.orphaned_candidates, vec!["r0".to_string()]);
    assert_eq!(api.db().fetch_unpaired_sells().await.unwrap().len(), 1);
    drop_database(&url).await;
}

#[tokio::test]
async fn a_sell_that_gives_up_on_the_boundary_page_is_still_saved() {
    let ledger = ScriptedLedger::new(vec![buy("b0", "1000", "1000", 1)]);
    let opts = SyncOptions { grouper: GrouperConfig { max_deferrals: Some(1) }, ..options(1, 1) };
    let (url, api) = setup(&ledger, opts).await;
    api.sync().await.unwrap();

    // s1 waits one page, then gives up on the page that also holds b0, the latest stored transaction
    ledger.post(vec![sell("s1", "100", "900", 5)]);
    let report = api.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::ReachedLatest);
    assert_eq!(report.unpaired, 1);
    let s1 = api.db().fetch_transaction("s1").await.unwrap().unwrap();
    assert!(s1.unpaired);
    assert_eq!(api.db().ledger_entry_count().await.unwrap(), 2);
    for _ in 0..2 {
        let report = api.sync().await.unwrap();
        assert_eq!(report.outcome, SyncOutcome::UpToDate);
    }
    drop_database(&url).await;
}

#[tokio::test]
async fn an_interrupted_initial_sync_is_completed_by_the_next_run() {
    let ledger = ScriptedLedger::new(vec![
        reward("r2", "20", "1030", 6),
        sell("s2", "200", "1010", 5),
        buy("b2", "300", "1210", 4),
        reward("r1", "10", "910", 3),
        sell("s1", "100", "900", 2),
        buy("b1", "1000", "1000", 1),
    ]);
    let (url, api) = setup(&ledger, options(2, 2)).await;
    ledger.fail_page(2, LedgerSourceError::InvalidResponse("truncated body".into()));
    let err = api.sync().await.unwrap_err();
    assert!(matches!(err, SyncError::Source { page: 2, .. }));
    // the newest sale made it in before the failure
    assert!(api.db().fetch_transaction("s2").await.unwrap().is_some());
    assert!(api.db().sync_checkpoint().await.unwrap().is_none());

    let report = api.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::Exhausted);
    assert!(report.initial_sync);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(api.db().ledger_entry_count().await.unwrap(), ledger.len() as u64);
    assert_eq!(api.db().sync_checkpoint().await.unwrap().as_deref(), Some("s2"));

    let mut reward_ids = Vec::new();
    for id in ["s2", "b2", "s1", "b1"] {
        let tx = api.db().fetch_transaction(id).await.unwrap().unwrap();
        reward_ids.extend(tx.reward_id);
    }
    let unique = reward_ids.iter().collect::<std::collections::HashSet<_>>();
    assert_eq!(reward_ids.len(), 2);
    assert_eq!(unique.len(), reward_ids.len());

    let report = api.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::UpToDate);
    drop_database(&url).await;
}
