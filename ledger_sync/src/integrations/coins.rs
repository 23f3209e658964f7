//! Plugs the ledger API client into the reconciler.
use coins_api::{CoinsApi, CoinsApiError, CryptoPaymentsPage};
use ledger_reconciler::{db_types::WireEntry, LedgerPage, LedgerSource, LedgerSourceError, PageRequest};
use log::*;
use serde_json::Value;

#[derive(Clone)]
pub struct CoinsLedger {
    api: CoinsApi,
}

impl CoinsLedger {
    pub fn new(api: CoinsApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &CoinsApi {
        &self.api
    }
}

impl LedgerSource for CoinsLedger {
    async fn fetch_page(&self, request: PageRequest) -> Result<LedgerPage, LedgerSourceError> {
        let page = self.api.fetch_crypto_payments(request.page, request.per_page).await.map_err(source_error)?;
        Ok(ledger_page_from_response(page))
    }
}

pub fn source_error(e: CoinsApiError) -> LedgerSourceError {
    match e {
        CoinsApiError::Throttled => LedgerSourceError::Throttled,
        CoinsApiError::RestResponseError(s) => LedgerSourceError::Transport(s),
        CoinsApiError::QueryError { status, message } if status >= 500 => {
            LedgerSourceError::Transport(format!("Error {status}. {message}"))
        },
        e => LedgerSourceError::InvalidResponse(e.to_string()),
    }
}

/// Decodes the entries on a page one by one. Entries that do not have the shape of a ledger entry are logged and
/// dropped; the rest of the page is still usable.
pub fn ledger_page_from_response(page: CryptoPaymentsPage) -> LedgerPage {
    let entries = page.entries.into_iter().filter_map(decode_entry).collect();
    LedgerPage { entries, next_page: page.meta.next_page, total_count: page.meta.total_count }
}

fn decode_entry(value: Value) -> Option<WireEntry> {
    match serde_json::from_value::<WireEntry>(value.clone()) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("🔄️ Dropping ledger entry that could not be decoded. {e}. Entry: {value}");
            None
        },
    }
}
