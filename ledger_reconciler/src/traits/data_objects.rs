use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::WireEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

impl Display for PageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {} ({} per page)", self.page, self.per_page)
    }
}

/// One page of ledger entries, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPage {
    pub entries: Vec<WireEntry>,
    /// `None` on the last page.
    pub next_page: Option<u32>,
    /// The total number of entries the ledger holds, across all pages.
    pub total_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertResult {
    Inserted,
    Updated,
    Unchanged,
}

impl UpsertResult {
    pub fn is_change(&self) -> bool {
        !matches!(self, UpsertResult::Unchanged)
    }
}

impl Display for UpsertResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertResult::Inserted => write!(f, "inserted"),
            UpsertResult::Updated => write!(f, "updated"),
            UpsertResult::Unchanged => write!(f, "unchanged"),
        }
    }
}
