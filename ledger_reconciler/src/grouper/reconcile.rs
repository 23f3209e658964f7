use log::*;

use super::{
    classify::{classify, EntryClass},
    pairing::{find_partner, PairingOutcome},
    pending::PendingMatches,
};
use crate::db_types::{RawEntry, ReconciledTransaction};

/// The result of reconciling a single batch of entries.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Buys and paired sells, in the order their entries arrived.
    pub transactions: Vec<ReconciledTransaction>,
    /// Candidates that were not claimed by any sell in the batch.
    pub remaining: PendingMatches,
    /// Sells for which no partner was found. They should be offered again with the next batch.
    pub partials: Vec<RawEntry>,
}

/// Reconciles one batch of entries against the candidates carried over from earlier batches.
///
/// Every reward and refund in `entries` joins the working set before any sell is considered, so a sell can be paired
/// with a partner that appears after it in the batch. Buys are emitted as is. Sells that find a partner are emitted as
/// paired sells and the partner is consumed. Sells that don't are returned in `partials`.
///
/// This function never fails and never recurses. Feeding it the same batch and the same candidates always produces the
/// same result.
pub fn reconcile(entries: Vec<RawEntry>, possible_matches: PendingMatches) -> Reconciliation {
    let mut pending = possible_matches;
    let mut others = Vec::with_capacity(entries.len());
    for entry in entries {
        match classify(&entry) {
            EntryClass::PossibleMatch => {
                let id = entry.id.clone();
                if !pending.push(entry) {
                    debug!("🔗️ Candidate {id} is already in the working set");
                }
            },
            class => others.push((class, entry)),
        }
    }
    let mut transactions = Vec::with_capacity(others.len());
    let mut partials = Vec::new();
    for (class, entry) in others {
        if class == EntryClass::Buy {
            transactions.push(ReconciledTransaction::buy(entry));
            continue;
        }
        let paired = match find_partner(&entry, &pending) {
            PairingOutcome::Matched(index) => pair_with(&entry, &mut pending, index),
            PairingOutcome::Ambiguous(_) | PairingOutcome::NoCandidates => None,
        };
        match paired {
            Some(tx) => transactions.push(tx),
            None => {
                trace!("🔗️ No partner for sell {} in this batch", entry.id);
                partials.push(entry);
            },
        }
    }
    Reconciliation { transactions, remaining: pending.carry_forward(), partials }
}

/// Claims the candidate at `index` for `sell`. The candidate stays in the working set if the pair cannot be formed.
fn pair_with(sell: &RawEntry, pending: &mut PendingMatches, index: usize) -> Option<ReconciledTransaction> {
    let partner = pending.get(index)?;
    match ReconciledTransaction::paired_sell(sell, partner) {
        Some(tx) => {
            trace!("🔗️ Sell {} paired with {}", sell.id, partner.id);
            pending.consume(index);
            Some(tx)
        },
        None => {
            warn!("🔗️ Sell {} and {} do not add up to a representable amount. Leaving them unpaired.", sell.id, partner.id);
            None
        },
    }
}
