//! Builders for [`WireEntry`] fixtures.
//!
//! Timestamps are given as a number of minutes after a fixed base time, so that tests can talk about ordering without
//! spelling out full dates. Amounts are decimal strings, as the ledger API serves them.
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::db_types::{RawEntry, WireEntry, WireReference};

pub const TEST_ACCOUNT: &str = "acc-001";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single().expect("base time is valid")
}

pub fn at_minute(minute: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(minute)
}

fn negate(amount: &str) -> String {
    match amount.strip_prefix('-') {
        Some(positive) => positive.to_string(),
        None => format!("-{amount}"),
    }
}

pub fn entry(
    id: &str,
    reason_code: &str,
    purpose: Option<&str>,
    amount: &str,
    posted_amount: &str,
    running_balance: &str,
    minute: i64,
) -> WireEntry {
    let order_id = match reason_code {
        "reward" => None,
        _ => Some(format!("ord-{id}")),
    };
    WireEntry {
        id: id.to_string(),
        account: TEST_ACCOUNT.to_string(),
        amount: amount.to_string(),
        posted_amount: posted_amount.to_string(),
        running_balance: running_balance.to_string(),
        status: "success".to_string(),
        created_at: at_minute(minute).to_rfc3339(),
        reference: Some(WireReference {
            reason_code: Some(reason_code.to_string()),
            purpose: purpose.map(String::from),
            order_id,
        }),
    }
}

/// A sell order. The posted amount is the negated amount.
pub fn sell(id: &str, amount: &str, running_balance: &str, minute: i64) -> WireEntry {
    entry(id, "sell_order", None, amount, &negate(amount), running_balance, minute)
}

pub fn buy(id: &str, amount: &str, running_balance: &str, minute: i64) -> WireEntry {
    entry(id, "buy_order", None, amount, amount, running_balance, minute)
}

pub fn reward(id: &str, amount: &str, running_balance: &str, minute: i64) -> WireEntry {
    entry(id, "reward", None, amount, amount, running_balance, minute)
}

/// A refund of a sell order. The ledger files refunds under the `sell_order` reason code with a `refund` purpose.
pub fn refund(id: &str, amount: &str, running_balance: &str, minute: i64) -> WireEntry {
    entry(id, "sell_order", Some("refund"), amount, amount, running_balance, minute)
}

pub fn raw(entry: WireEntry) -> RawEntry {
    RawEntry::try_from(entry).expect("fixture entry is valid")
}
