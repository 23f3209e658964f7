use std::{collections::HashSet, fmt::Debug};

use log::*;

use super::{SyncError, SyncOptions, SyncOutcome, SyncReport};
use crate::{
    db_types::{ReconciledTransaction, SyncCursor},
    events::{EventProducers, SyncCompletedEvent, TransactionSyncedEvent},
    grouper::EntryGrouper,
    traits::{LedgerPage, LedgerSource, LedgerSourceError, PageRequest, SyncLock, TransactionStore, UpsertResult},
};

/// `SyncFlowApi` brings a [`TransactionStore`] up to date with the ledger served by a [`LedgerSource`].
///
/// A run goes through these steps:
/// 1. Take the store's sync lock. If somebody else holds it, the run is skipped.
/// 2. Compare the ledger's entry count with the number of entries the store accounts for. If they match there is
///    nothing to do.
/// 3. Page through the ledger, newest first, grouping entries into transactions and upserting each one.
/// 4. Stop once the sync checkpoint (and every sell stored as unpaired) has been seen again, or when the ledger runs
///    out of pages.
/// 5. Emit any sells still waiting for a partner as unpaired. If the run got all the way through, move the checkpoint
///    to the newest stored transaction.
/// 6. Release the lock and publish a [`SyncCompletedEvent`].
///
/// The checkpoint only moves after a complete run. An interrupted run may have stored newer entries without the older
/// ones beneath them, so the next run keeps paging until it meets the old checkpoint. Every write is an idempotent
/// upsert, so going over the same entries twice is harmless.
pub struct SyncFlowApi<S, B> {
    source: S,
    db: B,
    options: SyncOptions,
    producers: EventProducers,
}

impl<S, B> Debug for SyncFlowApi<S, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SyncFlowApi ({:?})", self.options)
    }
}

impl<S, B> SyncFlowApi<S, B> {
    pub fn new(source: S, db: B, options: SyncOptions, producers: EventProducers) -> Self {
        Self { source, db, options, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }
}

impl<S, B> SyncFlowApi<S, B>
where
    S: LedgerSource,
    B: TransactionStore + SyncLock,
{
    /// Runs a single sync. The lock is always released before this returns, whatever the outcome.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        if !self.db.try_acquire_sync_lock().await? {
            info!("🔄️ Another sync is in progress. Skipping this run.");
            return Ok(SyncReport::new(SyncOutcome::LockHeld));
        }
        let result = self.sync_while_locked().await;
        if let Err(e) = self.db.release_sync_lock().await {
            error!("🔄️ Could not release the sync lock. It will be broken once it goes stale. {e}");
        }
        match &result {
            Ok(report) => {
                info!("🔄️ {report}");
                self.call_sync_completed_hook(report).await;
            },
            Err(e) => error!("🔄️ Sync failed. {e}"),
        }
        result
    }

    async fn sync_while_locked(&self) -> Result<SyncReport, SyncError> {
        let probe = self.fetch_page(PageRequest::new(1, 1)).await?;
        let accounted = self.db.ledger_entry_count().await?;
        if probe.total_count == accounted {
            debug!("🔄️ All {accounted} ledger entries are accounted for. Nothing to do.");
            return Ok(SyncReport::new(SyncOutcome::UpToDate));
        }
        let mut cursor = SyncCursor::new(self.db.sync_checkpoint().await?);
        let mut outstanding =
            self.db.fetch_unpaired_sells().await?.into_iter().map(|t| t.id).collect::<HashSet<String>>();
        let initial_sync = cursor.latest_persisted_id.is_none();
        let per_page = if initial_sync { self.options.initial_page_size } else { self.options.incremental_page_size };
        info!(
            "🔄️ The ledger holds {} entries and {accounted} are accounted for. Starting {} sync with {per_page} entries \
             per page.",
            probe.total_count,
            if initial_sync { "an initial" } else { "an incremental" }
        );
        if !outstanding.is_empty() {
            debug!("🔄️ {} sells are waiting for a partner and will be re-examined", outstanding.len());
        }

        let mut report = SyncReport::new(SyncOutcome::Exhausted);
        report.initial_sync = initial_sync;
        let mut grouper = EntryGrouper::new(self.options.grouper);
        while let Some(page_no) = cursor.next_page {
            if self.options.max_pages.is_some_and(|max| report.pages_fetched >= max) {
                warn!("🔄️ Stopping after {} pages without catching up", report.pages_fetched);
                report.outcome = SyncOutcome::PageLimit;
                break;
            }
            let page = self.fetch_page(PageRequest::new(page_no, per_page)).await?;
            report.pages_fetched += 1;
            report.entries_received += page.entries.len() as u64;
            let grouped = grouper.push_page(page.entries);
            report.skipped_entries += grouped.skipped as u64;
            report.duplicate_entries += grouped.duplicates as u64;
            outstanding.retain(|id| !grouper.has_seen(id));
            let boundary = if outstanding.is_empty() { Some(&cursor) } else { None };
            let reached = self.persist(grouped.transactions, boundary, &mut report).await;
            let boundary_seen =
                boundary.and_then(|c| c.latest_persisted_id.as_deref()).is_some_and(|id| grouper.has_seen(id));
            if reached || boundary_seen {
                debug!("🔄️ Caught up with transaction {:?} on page {page_no}", cursor.latest_persisted_id);
                report.outcome = SyncOutcome::ReachedLatest;
                break;
            }
            cursor.next_page = page.next_page;
        }
        let tail = grouper.finish();
        self.persist(tail.transactions, None, &mut report).await;
        report.orphaned_candidates = tail.orphaned.into_iter().map(|e| e.id).collect();
        if report.outcome.is_complete() {
            self.move_checkpoint().await?;
        }
        Ok(report)
    }

    /// Records the newest stored transaction as the place where the next run may stop.
    async fn move_checkpoint(&self) -> Result<(), SyncError> {
        if let Some(latest) = self.db.latest_transaction_id().await? {
            self.db.save_sync_checkpoint(&latest).await?;
        }
        Ok(())
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<LedgerPage, SyncError> {
        let source = &self.source;
        trace!("🔄️ Fetching {request}");
        self.options
            .retry
            .retry_async_when(LedgerSourceError::is_transient, move |attempt| {
                if attempt > 0 {
                    debug!("🔄️ Fetching {request} again (attempt {})", attempt + 1);
                }
                source.fetch_page(request)
            })
            .await
            .map_err(|source| SyncError::Source { page: request.page, source })
    }

    /// Upserts the transactions in order and returns `true` if the cursor's boundary transaction was among them.
    ///
    /// Past the boundary the store already holds the rest of the page, so only unpaired sells are written from there
    /// on. Those may be sells that gave up waiting for a partner in this very page and exist nowhere else.
    ///
    /// A failure to save one transaction is logged with its full payload and counted, but does not stop the others.
    async fn persist(
        &self,
        transactions: Vec<ReconciledTransaction>,
        boundary: Option<&SyncCursor>,
        report: &mut SyncReport,
    ) -> bool {
        let mut reached = false;
        for tx in transactions {
            if reached && !tx.unpaired {
                trace!("🔄️ Transaction {} is older than the sync checkpoint. Skipping it.", tx.id);
                continue;
            }
            self.persist_one(&tx, report).await;
            if boundary.is_some_and(|c| c.is_boundary(&tx.id)) {
                reached = true;
            }
        }
        reached
    }

    async fn persist_one(&self, tx: &ReconciledTransaction, report: &mut SyncReport) {
        if tx.unpaired && self.is_stored_as_paired(&tx.id).await {
            trace!("🔄️ Sell {} is already paired in the store. Keeping the stored copy.", tx.id);
            report.record(UpsertResult::Unchanged);
            return;
        }
        match self.db.upsert_transaction(tx).await {
            Ok(change) => {
                report.record(change);
                if tx.unpaired {
                    report.unpaired += 1;
                }
                if change.is_change() {
                    trace!("🔄️ Transaction {} {change}", tx.id);
                    self.call_transaction_synced_hook(tx, change).await;
                }
            },
            Err(e) => {
                let payload = serde_json::to_string(tx).unwrap_or_else(|_| format!("{tx:?}"));
                error!("🔄️ Could not save transaction {}. {e}. Payload: {payload}", tx.id);
                report.failed += 1;
            },
        }
    }

    async fn is_stored_as_paired(&self, id: &str) -> bool {
        match self.db.fetch_transaction(id).await {
            Ok(Some(existing)) => existing.is_paired_sell(),
            Ok(None) => false,
            Err(e) => {
                warn!("🔄️ Could not look up transaction {id}. {e}");
                false
            },
        }
    }

    async fn call_transaction_synced_hook(&self, tx: &ReconciledTransaction, change: UpsertResult) {
        for emitter in &self.producers.transaction_synced_producer {
            emitter.publish_event(TransactionSyncedEvent::new(tx.clone(), change)).await;
        }
    }

    async fn call_sync_completed_hook(&self, report: &SyncReport) {
        for emitter in &self.producers.sync_completed_producer {
            debug!("🔄️ Notifying sync completed hook subscribers");
            emitter.publish_event(SyncCompletedEvent::new(report.clone())).await;
        }
    }
}
