use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub previous_page: Option<u32>,
}

/// A page of the `crypto-payments` listing.
///
/// Entries are kept as raw JSON so that one malformed entry does not spoil the whole page. Callers decode them
/// individually.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptoPaymentsPage {
    #[serde(rename = "crypto-payments", default)]
    pub entries: Vec<Value>,
    #[serde(default)]
    pub meta: PageMeta,
}
