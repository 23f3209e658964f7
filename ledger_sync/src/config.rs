use std::time::Duration;

use coins_api::CoinsConfig;
use ledger_common::helpers::{env_flag, env_parse_or};
use ledger_reconciler::{
    grouper::GrouperConfig,
    RetryPolicy,
    SyncOptions,
    DEFAULT_INCREMENTAL_PAGE_SIZE,
    DEFAULT_INITIAL_PAGE_SIZE,
};
use log::*;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/ledger_sync.db";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
const DEFAULT_LOCK_TIMEOUT_SECS: i64 = 3600;
const DEFAULT_RETRY_ATTEMPTS: usize = 5;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 250;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;
const RETRY_JITTER: f64 = 0.2;

#[derive(Clone, Debug)]
pub struct SyncServerConfig {
    pub database_url: String,
    /// Time between the start of consecutive sync runs.
    pub sync_interval: Duration,
    /// Run a single sync and exit instead of looping.
    pub run_once: bool,
    /// A sync lock older than this is considered abandoned and may be taken over.
    pub lock_timeout: chrono::Duration,
    pub sync_options: SyncOptions,
    pub coins_config: CoinsConfig,
}

impl Default for SyncServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            run_once: false,
            lock_timeout: chrono::Duration::seconds(DEFAULT_LOCK_TIMEOUT_SECS),
            sync_options: SyncOptions::default(),
            coins_config: CoinsConfig::default(),
        }
    }
}

impl SyncServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = std::env::var("LSYNC_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ LSYNC_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let interval_secs = env_parse_or("LSYNC_SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS);
        let sync_interval = if interval_secs == 0 {
            warn!("🪛️ LSYNC_SYNC_INTERVAL_SECS cannot be zero. Using {DEFAULT_SYNC_INTERVAL_SECS} seconds.");
            Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS)
        } else {
            Duration::from_secs(interval_secs)
        };
        let run_once = env_flag("LSYNC_RUN_ONCE", false);
        let lock_timeout =
            chrono::Duration::seconds(env_parse_or("LSYNC_LOCK_TIMEOUT_SECS", DEFAULT_LOCK_TIMEOUT_SECS).max(1));
        let sync_options = sync_options_from_env();
        let coins_config = CoinsConfig::new_from_env_or_default();
        Self { database_url, sync_interval, run_once, lock_timeout, sync_options, coins_config }
    }
}

fn sync_options_from_env() -> SyncOptions {
    let initial_page_size = page_size("LSYNC_INITIAL_PAGE_SIZE", DEFAULT_INITIAL_PAGE_SIZE);
    let incremental_page_size = page_size("LSYNC_INCREMENTAL_PAGE_SIZE", DEFAULT_INCREMENTAL_PAGE_SIZE);
    let max_pages = non_zero(env_parse_or("LSYNC_MAX_PAGES", 0u32));
    let max_deferrals = non_zero(env_parse_or("LSYNC_MAX_DEFERRALS", 0u32));
    let retry = RetryPolicy::new(
        env_parse_or("LSYNC_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS),
        env_parse_or("LSYNC_RETRY_BASE_DELAY_MS", DEFAULT_RETRY_BASE_DELAY_MS),
        env_parse_or("LSYNC_RETRY_MAX_DELAY_MS", DEFAULT_RETRY_MAX_DELAY_MS),
        RETRY_JITTER,
    );
    SyncOptions {
        initial_page_size,
        incremental_page_size,
        max_pages,
        grouper: GrouperConfig { max_deferrals },
        retry,
    }
}

fn page_size(name: &str, default: u32) -> u32 {
    match env_parse_or(name, default) {
        0 => {
            warn!("🪛️ {name} cannot be zero. Using {default}.");
            default
        },
        n => n,
    }
}

// Zero means "no limit"
fn non_zero(value: u32) -> Option<u32> {
    (value > 0).then_some(value)
}
