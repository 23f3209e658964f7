//! The sync flow: pull pages from a [`LedgerSource`](crate::traits::LedgerSource), group them into transactions and
//! save those to a [`TransactionStore`](crate::traits::TransactionStore).
mod errors;
mod retry;
mod sync_flow_api;
mod sync_objects;

pub use errors::SyncError;
pub use retry::RetryPolicy;
pub use sync_flow_api::SyncFlowApi;
pub use sync_objects::{
    SyncOptions,
    SyncOutcome,
    SyncReport,
    DEFAULT_INCREMENTAL_PAGE_SIZE,
    DEFAULT_INITIAL_PAGE_SIZE,
};
