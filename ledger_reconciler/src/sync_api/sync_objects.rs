use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::RetryPolicy;
use crate::{grouper::GrouperConfig, traits::UpsertResult};

pub const DEFAULT_INITIAL_PAGE_SIZE: u32 = 100;
pub const DEFAULT_INCREMENTAL_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// Page size used when the store is empty.
    pub initial_page_size: u32,
    /// Page size used once the store holds data. New entries usually fit on the first page or two.
    pub incremental_page_size: u32,
    /// Stop after this many pages, even if the ledger has more.
    pub max_pages: Option<u32>,
    pub grouper: GrouperConfig,
    pub retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            initial_page_size: DEFAULT_INITIAL_PAGE_SIZE,
            incremental_page_size: DEFAULT_INCREMENTAL_PAGE_SIZE,
            max_pages: None,
            grouper: GrouperConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// Another sync held the lock. Nothing was done.
    LockHeld,
    /// Every ledger entry is already accounted for in the store.
    UpToDate,
    /// The sync caught up with the most recent transaction that was already stored.
    ReachedLatest,
    /// Every page of the ledger was read.
    Exhausted,
    /// The page limit was hit before the sync caught up.
    PageLimit,
}

impl SyncOutcome {
    /// True if the run read through to the checkpoint or to the end of the ledger.
    pub fn is_complete(&self) -> bool {
        matches!(self, SyncOutcome::ReachedLatest | SyncOutcome::Exhausted)
    }
}

impl Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::LockHeld => write!(f, "skipped (lock held)"),
            SyncOutcome::UpToDate => write!(f, "up to date"),
            SyncOutcome::ReachedLatest => write!(f, "caught up"),
            SyncOutcome::Exhausted => write!(f, "read every page"),
            SyncOutcome::PageLimit => write!(f, "stopped at the page limit"),
        }
    }
}

/// A summary of a single sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// True if no earlier run had completed, so the whole ledger was read.
    pub initial_sync: bool,
    pub pages_fetched: u32,
    pub entries_received: u64,
    /// Malformed entries that were dropped.
    pub skipped_entries: u64,
    /// Entries served more than once because the ledger moved while it was being paged through.
    pub duplicate_entries: u64,
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
    /// Transactions the store refused or failed to save.
    pub failed: u64,
    /// Sells that were saved without a partner.
    pub unpaired: u64,
    /// Rewards and refunds no sell claimed.
    pub orphaned_candidates: Vec<String>,
}

impl SyncReport {
    pub fn new(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            initial_sync: false,
            pages_fetched: 0,
            entries_received: 0,
            skipped_entries: 0,
            duplicate_entries: 0,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            failed: 0,
            unpaired: 0,
            orphaned_candidates: Vec::new(),
        }
    }

    pub fn record(&mut self, result: UpsertResult) {
        match result {
            UpsertResult::Inserted => self.inserted += 1,
            UpsertResult::Updated => self.updated += 1,
            UpsertResult::Unchanged => self.unchanged += 1,
        }
    }
}

impl Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sync {}. {} pages, {} entries. {} inserted, {} updated, {} unchanged, {} failed. {} unpaired sells, {} \
             orphaned candidates, {} malformed entries.",
            self.outcome,
            self.pages_fetched,
            self.entries_received,
            self.inserted,
            self.updated,
            self.unchanged,
            self.failed,
            self.unpaired,
            self.orphaned_candidates.len(),
            self.skipped_entries
        )
    }
}
