use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use log::*;

use crate::{
    db_types::WireEntry,
    traits::{LedgerPage, LedgerSource, LedgerSourceError, PageRequest},
};

/// An in-memory ledger that serves a fixed list of entries, newest first, and keeps a log of the requests it received.
///
/// Failures can be injected: the next `n` requests fail with the given error before the ledger starts answering, or
/// the first request for a given page fails once.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLedger {
    entries: Arc<Mutex<Vec<WireEntry>>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
    failures: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<LedgerSourceError>>>,
    page_failure: Arc<Mutex<Option<(u32, LedgerSourceError)>>>,
}

impl ScriptedLedger {
    /// `entries` must already be in the order the ledger serves them (newest first).
    pub fn new(entries: Vec<WireEntry>) -> Self {
        Self { entries: Arc::new(Mutex::new(entries)), ..Default::default() }
    }

    /// Posts new entries on top of the ledger, as if they had arrived after everything already there.
    pub fn post(&self, mut newest_first: Vec<WireEntry>) {
        let mut entries = self.entries.lock().expect("ledger lock poisoned");
        newest_first.append(&mut entries);
        *entries = newest_first;
    }

    pub fn fail_next(&self, count: usize, error: LedgerSourceError) {
        *self.failure.lock().expect("ledger lock poisoned") = Some(error);
        self.failures.store(count, Ordering::SeqCst);
    }

    /// The next request for `page` (of any size) fails with `error`. Later requests for it are answered.
    pub fn fail_page(&self, page: u32, error: LedgerSourceError) {
        *self.page_failure.lock().expect("ledger lock poisoned") = Some((page, error));
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().expect("ledger lock poisoned").clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().expect("ledger lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("ledger lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerSource for ScriptedLedger {
    async fn fetch_page(&self, request: PageRequest) -> Result<LedgerPage, LedgerSourceError> {
        self.requests.lock().expect("ledger lock poisoned").push(request);
        let pending_failures = self.failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failures.store(pending_failures - 1, Ordering::SeqCst);
            let error = self.failure.lock().expect("ledger lock poisoned").clone();
            if let Some(e) = error {
                debug!("🚀️ Scripted ledger failing {request}: {e}");
                return Err(e);
            }
        }
        {
            let mut page_failure = self.page_failure.lock().expect("ledger lock poisoned");
            if page_failure.as_ref().is_some_and(|(page, _)| *page == request.page) {
                if let Some((_, e)) = page_failure.take() {
                    debug!("🚀️ Scripted ledger failing {request}: {e}");
                    return Err(e);
                }
            }
        }
        if request.page == 0 || request.per_page == 0 {
            return Err(LedgerSourceError::InvalidResponse(format!("Invalid page request: {request}")));
        }
        let entries = self.entries.lock().expect("ledger lock poisoned");
        let total_count = entries.len() as u64;
        let per_page = request.per_page as usize;
        let start = (request.page as usize - 1) * per_page;
        let page_entries = entries.iter().skip(start).take(per_page).cloned().collect::<Vec<_>>();
        let next_page = if start + per_page < entries.len() { Some(request.page + 1) } else { None };
        Ok(LedgerPage { entries: page_entries, next_page, total_count })
    }
}
