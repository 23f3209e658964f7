//! # Ledger sync
//! This crate hosts the process that keeps the local transaction store in step with the crypto-payments ledger. It is
//! responsible for:
//! * Loading its configuration from the environment.
//! * Wiring the ledger API client into the reconciler as a [`ledger_reconciler::LedgerSource`].
//! * Running a sync on a fixed interval, or once and exiting.
//!
//! ## Configuration
//! The process is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod service;
pub mod sync_worker;
