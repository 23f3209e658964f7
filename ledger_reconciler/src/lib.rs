//! Ledger Reconciler
//!
//! The ledger API reports a retailer's activity as a flat, paginated list of entries. Business transactions are spread
//! over those entries: a sell order is booked first, and the reward (or refund) that settles it is booked some time
//! later, often on a different page. This library rebuilds the transactions from the entries and keeps a local store
//! of them up to date.
//!
//! The library is divided into these sections:
//! 1. Data types ([`mod@db_types`]). Wire entries as the API serves them, validated entries, and reconciled
//!    transactions.
//! 2. Entry grouping ([`mod@grouper`]). The pure, synchronous core that classifies entries, pairs sells with their
//!    partners and carries incomplete work from one page to the next.
//! 3. Contracts ([`mod@traits`]) for the ledger source, the transaction store and the sync lock, and an SQLite backend
//!    that implements the store and the lock.
//! 4. The sync flow ([`SyncFlowApi`]), which pages through a ledger source and upserts the results into a store.
//!
//! The sync flow publishes events when transactions are saved and when a run completes. See [`mod@events`].
pub mod db_types;
pub mod events;
pub mod grouper;
#[cfg(feature = "sqlite")]
mod sqlite;
mod sync_api;
pub mod test_utils;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use sync_api::{
    RetryPolicy,
    SyncError,
    SyncFlowApi,
    SyncOptions,
    SyncOutcome,
    SyncReport,
    DEFAULT_INCREMENTAL_PAGE_SIZE,
    DEFAULT_INITIAL_PAGE_SIZE,
};
pub use traits::{
    LedgerPage,
    LedgerSource,
    LedgerSourceError,
    PageRequest,
    SyncLock,
    TransactionStore,
    TransactionStoreError,
    UpsertResult,
};
