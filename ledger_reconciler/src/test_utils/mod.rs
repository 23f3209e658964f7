//! Fixtures for tests: ledger entry builders, a scripted [`LedgerSource`](crate::traits::LedgerSource) and throwaway
//! SQLite databases.
pub mod entries;
#[cfg(feature = "sqlite")]
pub mod prepare_env;
mod scripted_ledger;

pub use scripted_ledger::ScriptedLedger;
