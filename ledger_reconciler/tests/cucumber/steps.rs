use cucumber::{gherkin::Step, then, when};
use ledger_common::LedgerAmount;
use ledger_reconciler::{db_types::ReconciledTransaction, LedgerSourceError, SyncLock, TransactionStore};
use log::*;
use serde_json::Value;

use crate::cucumber::{ledger_world::entries_from_table, LedgerWorld};

//--------------------------------------------   Grouper steps   ------------------------------------------------------

#[when("the grouper receives a page with entries")]
async fn push_page(world: &mut LedgerWorld, step: &Step) {
    let entries = entries_from_table(step);
    let page = world.grouper().push_page(entries);
    debug!("🚀️ Page produced {} transactions", page.transactions.len());
    world.emitted.extend(page.transactions.iter().cloned());
    world.last_page = Some(page);
}

#[when("the ledger stream ends")]
async fn finish_stream(world: &mut LedgerWorld) {
    let grouper = world.grouper.take().expect("Entry grouper not initialised");
    let tail = grouper.finish();
    world.emitted.extend(tail.transactions);
    world.orphaned = tail.orphaned.into_iter().map(|e| e.id).collect();
}

#[then(expr = "{int} transactions have been emitted")]
async fn emitted_count(world: &mut LedgerWorld, count: usize) {
    assert_eq!(world.emitted.len(), count, "Emitted: {:?}", world.emitted);
}

#[then(expr = "the last page emitted nothing")]
async fn last_page_empty(world: &mut LedgerWorld) {
    let page = world.last_page.as_ref().expect("No page has been pushed");
    assert!(page.transactions.is_empty(), "{:?}", page.transactions);
}

#[then(expr = "transaction {word} has {word} of '{word}'")]
async fn emitted_field(world: &mut LedgerWorld, id: String, field: String, expected: String) {
    let tx = world.emitted(&id).clone();
    assert_field(&tx, &field, &expected);
}

#[then(expr = "sell {word} is paired with {word}")]
async fn paired_with(world: &mut LedgerWorld, id: String, partner: String) {
    let tx = world.emitted(&id);
    assert!(tx.is_paired_sell(), "{tx:?}");
    assert_eq!(tx.reward_id.as_deref(), Some(partner.as_str()));
    assert_eq!(tx.posted_amount, -(tx.amount - tx.reward_amount));
}

#[then(expr = "sell {word} is unpaired")]
async fn unpaired(world: &mut LedgerWorld, id: String) {
    let tx = world.emitted(&id);
    assert!(tx.unpaired, "{tx:?}");
    assert!(tx.reward_amount.is_zero());
    assert!(tx.reward_id.is_none());
}

#[then(expr = "sell {word} is waiting for the next page")]
async fn waiting(world: &mut LedgerWorld, id: String) {
    let page = world.last_page.as_ref().expect("No page has been pushed");
    assert!(page.needs_next_page());
    assert!(page.deferred.contains(&id), "Deferred: {:?}", page.deferred);
    assert!(world.emitted.iter().all(|t| t.id != id));
}

#[then(expr = "candidate {word} is still waiting for a sell")]
async fn candidate_waiting(world: &mut LedgerWorld, id: String) {
    assert!(world.grouper().possible_matches().contains(&id));
}

#[then(expr = "candidate {word} was never claimed")]
async fn never_claimed(world: &mut LedgerWorld, id: String) {
    assert!(world.orphaned.contains(&id), "Orphaned: {:?}", world.orphaned);
}

#[then(expr = "{int} malformed entries were skipped")]
async fn skipped(world: &mut LedgerWorld, count: usize) {
    let page = world.last_page.as_ref().expect("No page has been pushed");
    assert_eq!(page.skipped, count);
}

//--------------------------------------------    Sync steps     ------------------------------------------------------

#[when("the ledger receives the entries")]
async fn post_entries(world: &mut LedgerWorld, step: &Step) {
    let entries = entries_from_table(step);
    world.system().ledger.post(entries);
}

#[when("the ledger is synced")]
async fn sync(world: &mut LedgerWorld) {
    let system = world.system();
    system.ledger.clear_requests();
    let report = system.api.sync().await.expect("Sync failed");
    debug!("🚀️ {report}");
    system.last_report = Some(report);
}

#[then(expr = "the sync outcome is {word}")]
async fn sync_outcome(world: &mut LedgerWorld, outcome: String) {
    let report = world.system().report();
    assert_eq!(format!("{:?}", report.outcome), outcome, "{report:?}");
}

#[then(expr = "the sync fetched {int} pages of entries")]
async fn pages_fetched(world: &mut LedgerWorld, pages: u32) {
    let report = world.system().report();
    assert_eq!(report.pages_fetched, pages, "{report:?}");
}

#[then(expr = "the sync inserted {int} and updated {int} transactions")]
async fn sync_changes(world: &mut LedgerWorld, inserted: u64, updated: u64) {
    let report = world.system().report();
    assert_eq!(report.inserted, inserted, "{report:?}");
    assert_eq!(report.updated, updated, "{report:?}");
}

#[then(expr = "the store accounts for {int} ledger entries")]
async fn store_count(world: &mut LedgerWorld, count: u64) {
    let stored = world.system().db.ledger_entry_count().await.expect("Error counting entries");
    assert_eq!(stored, count);
}

#[then(expr = "the stored transaction {word} has {word} of '{word}'")]
async fn stored_field(world: &mut LedgerWorld, id: String, field: String, expected: String) {
    let tx = world
        .system()
        .db
        .fetch_transaction(&id)
        .await
        .expect("Error fetching transaction")
        .unwrap_or_else(|| panic!("Transaction {id} is not in the store"));
    assert_field(&tx, &field, &expected);
}

#[then(expr = "the store has {int} unpaired sells")]
async fn stored_unpaired(world: &mut LedgerWorld, count: usize) {
    let sells = world.system().db.fetch_unpaired_sells().await.expect("Error fetching unpaired sells");
    assert_eq!(sells.len(), count, "{sells:?}");
}

/// Compares a field of the transaction's JSON form with `expected`. Amounts are compared numerically, so `-90` matches
/// `-90.00`. `none` matches a missing value.
fn assert_field(tx: &ReconciledTransaction, field: &str, expected: &str) {
    let json = serde_json::to_value(tx).expect("Transaction is serializable");
    let value = json.get(field).unwrap_or_else(|| panic!("Transaction has no field named {field}"));
    let actual = match value {
        Value::String(s) => s.clone(),
        Value::Null => "none".to_string(),
        other => other.to_string(),
    };
    let amounts = (actual.parse::<LedgerAmount>(), expected.parse::<LedgerAmount>());
    match amounts {
        (Ok(a), Ok(e)) => assert_eq!(a, e, "{field} of {}", tx.id),
        _ => assert_eq!(actual, expected, "{field} of {}", tx.id),
    }
}

#[when("another process holds the sync lock")]
async fn hold_lock(world: &mut LedgerWorld) {
    let acquired = world.system().db.try_acquire_sync_lock().await.expect("Error taking the sync lock");
    assert!(acquired);
}

#[when(expr = "the ledger API throttles the next {int} requests")]
async fn throttle(world: &mut LedgerWorld, count: usize) {
    world.system().ledger.fail_next(count, LedgerSourceError::Throttled);
}
