mod amount;

pub mod helpers;
pub mod op;
mod secret;

pub use amount::{AmountConversionError, LedgerAmount, LEDGER_DECIMALS};
pub use secret::Secret;
