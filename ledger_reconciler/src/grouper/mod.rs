//! # Entry grouping
//!
//! The ledger API serves a flat, paginated list of entries, newest first. A single business transaction can be spread
//! over two of them: a sell order is followed by the reward (or refund) that settles it. This module puts those
//! entries back together.
//!
//! * [`classify`](classify::classify) sorts entries into buys, sells and pairing candidates.
//! * [`find_partner`] picks the candidate that settles a given sell.
//! * [`reconcile`] processes one batch of entries against a set of [`PendingMatches`].
//! * [`EntryGrouper`] drives `reconcile` over a whole stream, carrying unpaired sells and unclaimed candidates from
//!   one page to the next.
mod classify;
mod entry_grouper;
mod pairing;
mod pending;
mod reconcile;

pub use classify::{classify, validate_entries, EntryClass};
pub use entry_grouper::{EntryGrouper, GroupedPage, GroupedTail, GrouperConfig};
pub use pairing::{conserves_balance, find_partner, PairingOutcome};
pub use pending::{BacklogState, PendingMatches};
pub use reconcile::{reconcile, Reconciliation};
