//! The partner search for a single sell order.
use log::*;

use super::pending::PendingMatches;
use crate::db_types::RawEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingOutcome {
    /// The slot index of the partner.
    Matched(usize),
    /// Several candidates postdate the sell and none of them conserves the balance.
    Ambiguous(usize),
    /// Nothing in the working set postdates the sell.
    NoCandidates,
}

/// True if crediting `candidate` on top of the balance left by `sell` gives the candidate's running balance. A sum
/// that overflows conserves nothing.
pub fn conserves_balance(sell: &RawEntry, candidate: &RawEntry) -> bool {
    sell.running_balance.checked_add(candidate.amount) == Some(candidate.running_balance)
}

/// Looks for the reward or refund that settles `sell`.
///
/// Only candidates created strictly after the sell qualify. A single qualifier is taken as is. With several, the first
/// one (in arrival order) that satisfies [`conserves_balance`] wins.
pub fn find_partner(sell: &RawEntry, pending: &PendingMatches) -> PairingOutcome {
    let later = pending.unconsumed().filter(|(_, c)| c.created_at > sell.created_at).collect::<Vec<_>>();
    match later.as_slice() {
        [] => PairingOutcome::NoCandidates,
        [(index, _)] => PairingOutcome::Matched(*index),
        many => {
            let found = many.iter().find(|(_, c)| conserves_balance(sell, c));
            match found {
                Some((index, _)) => PairingOutcome::Matched(*index),
                None => {
                    debug!("🔗️ {} candidates postdate sell {} but none conserves the balance", many.len(), sell.id);
                    PairingOutcome::Ambiguous(many.len())
                },
            }
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::entries::{raw, refund, reward, sell};

    #[test]
    fn single_later_candidate_is_taken() {
        let s = raw(sell("s1", "100", "900", 0));
        // balance does not line up, but it is the only one
        let pending: PendingMatches = vec![raw(reward("r1", "10", "1234", 1))].into_iter().collect();
        assert_eq!(find_partner(&s, &pending), PairingOutcome::Matched(0));
    }

    #[test]
    fn earlier_candidates_never_qualify() {
        let s = raw(sell("s1", "100", "900", 10));
        let pending: PendingMatches =
            vec![raw(reward("r1", "10", "910", 10)), raw(reward("r2", "10", "910", 3))].into_iter().collect();
        assert_eq!(find_partner(&s, &pending), PairingOutcome::NoCandidates);
    }

    #[test]
    fn balance_conservation_breaks_ties() {
        let s = raw(sell("s1", "100", "900", 0));
        let pending: PendingMatches = vec![
            raw(reward("r1", "5", "1005", 1)),
            raw(reward("r2", "10", "910", 2)),
            raw(refund("f1", "100", "1000", 3)),
        ]
        .into_iter()
        .collect();
        assert_eq!(find_partner(&s, &pending), PairingOutcome::Matched(1));
    }

    #[test]
    fn ties_without_conservation_are_ambiguous() {
        let s = raw(sell("s1", "100", "900", 0));
        let pending: PendingMatches =
            vec![raw(reward("r1", "5", "1005", 1)), raw(reward("r2", "7", "1007", 2))].into_iter().collect();
        assert_eq!(find_partner(&s, &pending), PairingOutcome::Ambiguous(2));
    }

    #[test]
    fn fractional_amounts_are_exact() {
        let s = raw(sell("s1", "0.3", "0.1", 0));
        let pending: PendingMatches =
            vec![raw(reward("r1", "0.2", "0.3", 1)), raw(reward("r2", "0.2", "0.30000001", 2))].into_iter().collect();
        let candidates = pending.iter().collect::<Vec<_>>();
        assert!(conserves_balance(&s, candidates[0]));
        assert!(!conserves_balance(&s, candidates[1]));
        assert_eq!(find_partner(&s, &pending), PairingOutcome::Matched(0));
    }

    #[test]
    fn balances_near_the_limit_do_not_overflow() {
        let s = raw(sell("s1", "100", "90000000000", 0));
        let pending: PendingMatches = vec![
            raw(reward("r1", "90000000000", "90000000000", 1)),
            raw(reward("r2", "10", "90000000010", 2)),
        ]
        .into_iter()
        .collect();
        let candidates = pending.iter().collect::<Vec<_>>();
        assert!(!conserves_balance(&s, candidates[0]));
        assert!(conserves_balance(&s, candidates[1]));
        assert_eq!(find_partner(&s, &pending), PairingOutcome::Matched(1));
    }
}
