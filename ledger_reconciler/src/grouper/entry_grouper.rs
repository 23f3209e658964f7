use std::collections::{HashMap, HashSet};

use log::*;

use super::{classify::validate_entries, pending::PendingMatches, reconcile::reconcile, Reconciliation};
use crate::db_types::{RawEntry, ReconciledTransaction, WireEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrouperConfig {
    /// How many batches a sell may be carried over before it is given up on and emitted as unpaired. `None` keeps
    /// deferred sells until the end of the stream.
    pub max_deferrals: Option<u32>,
}

/// What came out of a single page.
#[derive(Debug, Clone, Default)]
pub struct GroupedPage {
    pub transactions: Vec<ReconciledTransaction>,
    /// Ids of sells that are being carried over to the next page.
    pub deferred: Vec<String>,
    /// Entries that failed validation.
    pub skipped: usize,
    /// Entries already seen earlier in the stream.
    pub duplicates: usize,
    /// The number of unclaimed candidates carried forward.
    pub backlog: usize,
}

impl GroupedPage {
    /// True when some sells in this page are still waiting for a partner that may turn up on the next page.
    pub fn needs_next_page(&self) -> bool {
        !self.deferred.is_empty()
    }
}

/// What is left once the stream has ended.
#[derive(Debug, Clone, Default)]
pub struct GroupedTail {
    /// Every sell still waiting for a partner, emitted as unpaired.
    pub transactions: Vec<ReconciledTransaction>,
    /// Rewards and refunds that no sell ever claimed.
    pub orphaned: Vec<RawEntry>,
}

#[derive(Debug, Clone)]
struct DeferredSell {
    entry: RawEntry,
    deferrals: u32,
}

/// Groups a paginated stream of ledger entries into transactions.
///
/// Feed pages in the order the ledger API serves them with [`EntryGrouper::push_page`] and call
/// [`EntryGrouper::finish`] once the stream ends. Sells that could not be paired within a page are re-offered, ahead of
/// the new page's own sells, every time a page is pushed. Candidates that no sell has claimed are carried along in the
/// same way.
///
/// Entries whose id has already been seen are ignored. This protects against the overlap that appears between pages
/// when new entries are posted while a sync is running.
#[derive(Debug, Clone, Default)]
pub struct EntryGrouper {
    config: GrouperConfig,
    pending: PendingMatches,
    deferred: Vec<DeferredSell>,
    seen: HashSet<String>,
    pages: u64,
}

impl EntryGrouper {
    pub fn new(config: GrouperConfig) -> Self {
        Self { config, ..Default::default() }
    }

    pub fn pages(&self) -> u64 {
        self.pages
    }

    pub fn possible_matches(&self) -> &PendingMatches {
        &self.pending
    }

    pub fn deferred_ids(&self) -> impl Iterator<Item = &str> {
        self.deferred.iter().map(|d| d.entry.id.as_str())
    }

    /// True if an entry with this id has been pushed, whatever became of it.
    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn push_page(&mut self, entries: Vec<WireEntry>) -> GroupedPage {
        self.pages += 1;
        let (valid, skipped) = validate_entries(entries);
        let mut duplicates = 0;
        let fresh = valid
            .into_iter()
            .filter(|e| {
                let is_new = self.seen.insert(e.id.clone());
                if !is_new {
                    debug!("🧾️ Entry {} was already seen earlier in the stream. Ignoring it.", e.id);
                    duplicates += 1;
                }
                is_new
            })
            .collect::<Vec<_>>();
        let carried = std::mem::take(&mut self.deferred);
        let mut counts = HashMap::with_capacity(carried.len());
        let mut batch = Vec::with_capacity(carried.len() + fresh.len());
        for d in carried {
            counts.insert(d.entry.id.clone(), d.deferrals);
            batch.push(d.entry);
        }
        batch.extend(fresh);

        let Reconciliation { transactions: paired, remaining, partials } =
            reconcile(batch, std::mem::take(&mut self.pending));
        self.pending = remaining;
        // Sells that give up waiting are newer than anything on this page, so they go first
        let mut transactions = Vec::with_capacity(paired.len() + partials.len());
        for entry in partials {
            let deferrals = counts.get(&entry.id).copied().unwrap_or_default() + 1;
            match self.config.max_deferrals {
                Some(max) if deferrals > max => {
                    info!("🧾️ Sell {} found no partner after {max} pages. Emitting it as unpaired.", entry.id);
                    transactions.push(ReconciledTransaction::unpaired_sell(entry));
                },
                _ => self.deferred.push(DeferredSell { entry, deferrals }),
            }
        }
        transactions.extend(paired);
        let deferred = self.deferred_ids().map(String::from).collect::<Vec<_>>();
        trace!(
            "🧾️ Page {}: {} transactions, {} deferred sells, {} candidates in backlog, {skipped} skipped",
            self.pages,
            transactions.len(),
            deferred.len(),
            self.pending.len()
        );
        GroupedPage { transactions, deferred, skipped, duplicates, backlog: self.pending.len() }
    }

    /// Ends the stream. Every sell still waiting for a partner is emitted as unpaired.
    pub fn finish(self) -> GroupedTail {
        let transactions =
            self.deferred.into_iter().map(|d| ReconciledTransaction::unpaired_sell(d.entry)).collect::<Vec<_>>();
        let orphaned = self.pending.into_entries();
        if !orphaned.is_empty() {
            let ids = orphaned.iter().map(|e| e.id.as_str()).collect::<Vec<_>>().join(", ");
            warn!("🧾️ {} rewards or refunds were never claimed by a sell order: {ids}", orphaned.len());
        }
        GroupedTail { transactions, orphaned }
    }
}
