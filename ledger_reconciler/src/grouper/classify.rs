use log::*;

use crate::db_types::{RawEntry, ReasonCode, WireEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    Buy,
    Sell,
    PossibleMatch,
}

/// Sorts an entry into one of the three roles it can play during reconciliation.
///
/// Rewards and anything flagged as a refund are pairing candidates, whatever their reason code. Buys stand alone. Every
/// other sell order is a sell looking for a partner.
pub fn classify(entry: &RawEntry) -> EntryClass {
    if entry.is_possible_match() {
        return EntryClass::PossibleMatch;
    }
    match entry.reference.reason_code {
        ReasonCode::BuyOrder => EntryClass::Buy,
        ReasonCode::SellOrder | ReasonCode::Reward => EntryClass::Sell,
    }
}

/// Converts a page of wire entries, dropping (and logging) the malformed ones. Returns the valid entries in their
/// original order along with the number that were skipped.
pub fn validate_entries(entries: Vec<WireEntry>) -> (Vec<RawEntry>, usize) {
    let mut skipped = 0;
    let valid = entries
        .into_iter()
        .filter_map(|wire| match RawEntry::try_from(wire) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("🧾️ Skipping malformed ledger entry. {e}");
                skipped += 1;
                None
            },
        })
        .collect();
    (valid, skipped)
}
