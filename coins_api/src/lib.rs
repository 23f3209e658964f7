//! Client for the crypto-payments ledger API.
//!
//! The API serves a retailer's ledger as paginated JSON, newest entries first. Every request is signed with an
//! HMAC-SHA256 of the nonce and the request URL (see [`signing`]).
mod api;
mod config;
mod data_objects;
mod error;
pub mod signing;

pub use api::CoinsApi;
pub use config::CoinsConfig;
pub use data_objects::{CryptoPaymentsPage, PageMeta};
pub use error::CoinsApiError;
