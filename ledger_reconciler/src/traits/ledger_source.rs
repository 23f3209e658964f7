use thiserror::Error;

use super::{LedgerPage, PageRequest};

/// A paginated source of ledger entries.
///
/// Pages are served newest first. Implementations only need to fetch and decode; validation of individual entries
/// happens in the grouper.
#[allow(async_fn_in_trait)]
pub trait LedgerSource {
    async fn fetch_page(&self, request: PageRequest) -> Result<LedgerPage, LedgerSourceError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerSourceError {
    #[error("Could not reach the ledger API. {0}")]
    Transport(String),
    #[error("The ledger API is throttling requests. Try again later.")]
    Throttled,
    #[error("The ledger API returned an invalid response. {0}")]
    InvalidResponse(String),
}

impl LedgerSourceError {
    /// Transport failures and throttling are worth retrying. A response we could not understand will not get better.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerSourceError::Transport(_) | LedgerSourceError::Throttled)
    }
}
