//! # Backend and data-source contracts
//!
//! The reconciliation engine talks to the outside world through three traits:
//!
//! * [`LedgerSource`] fetches pages of raw entries from the ledger API. The engine never issues HTTP requests itself.
//! * [`TransactionStore`] is the idempotent persistence sink for reconciled transactions.
//! * [`SyncLock`] guarantees that only one sync runs against a store at any time.
//!
//! [`SqliteDatabase`](crate::SqliteDatabase) implements the last two.
mod data_objects;
mod ledger_source;
mod sync_lock;
mod transaction_store;

pub use data_objects::{LedgerPage, PageRequest, UpsertResult};
pub use ledger_source::{LedgerSource, LedgerSourceError};
pub use sync_lock::SyncLock;
pub use transaction_store::{TransactionStore, TransactionStoreError};
