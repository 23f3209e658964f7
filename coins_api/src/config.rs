use ledger_common::Secret;
use log::*;

pub const DEFAULT_COINS_API_URL: &str = "https://api.coins.ph";

#[derive(Debug, Clone, Default)]
pub struct CoinsConfig {
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    pub api_key: Secret<String>,
    pub api_secret: Secret<String>,
}

impl CoinsConfig {
    pub fn new(base_url: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: Secret::new(api_key.to_string()),
            api_secret: Secret::new(api_secret.to_string()),
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("COINS_API_URL").unwrap_or_else(|_| {
            warn!("🪛️ COINS_API_URL not set, using {DEFAULT_COINS_API_URL} as default");
            DEFAULT_COINS_API_URL.to_string()
        });
        let api_key = std::env::var("COINS_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ COINS_API_KEY not set. Requests to the ledger API will be rejected.");
            String::default()
        });
        let api_secret = std::env::var("COINS_API_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ COINS_API_SECRET not set. Requests to the ledger API will be rejected.");
            String::default()
        });
        Self::new(&base_url, &api_key, &api_secret)
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.reveal().is_empty() && !self.api_secret.reveal().is_empty()
    }
}
