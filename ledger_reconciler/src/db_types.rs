//! Data types shared by the grouper, the backend traits and the sync flow.
//!
//! There are two representations of a ledger entry:
//! * [`WireEntry`] mirrors the JSON returned by the ledger API verbatim (amounts are decimal strings, the reference may
//!   be missing).
//! * [`RawEntry`] is the validated form the grouper works with. Converting a `WireEntry` into a `RawEntry` is where
//!   malformed entries are detected.
//!
//! The output of reconciliation is a [`ReconciledTransaction`].
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use ledger_common::{AmountConversionError, LedgerAmount};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------      ReasonCode       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// A retailer sold load; a reward or refund is posted afterwards.
    SellOrder,
    /// A retailer bought funds. Stands on its own.
    BuyOrder,
    /// A rebate posted after a sell order.
    Reward,
}

impl Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasonCode::SellOrder => write!(f, "sell_order"),
            ReasonCode::BuyOrder => write!(f, "buy_order"),
            ReasonCode::Reward => write!(f, "reward"),
        }
    }
}

impl FromStr for ReasonCode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sell_order" => Ok(Self::SellOrder),
            "buy_order" => Ok(Self::BuyOrder),
            "reward" => Ok(Self::Reward),
            s => Err(ConversionError(format!("Invalid reason code: {s}"))),
        }
    }
}

//--------------------------------------        Purpose        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purpose {
    Refund,
    Other(String),
}

impl Purpose {
    pub fn is_refund(&self) -> bool {
        matches!(self, Purpose::Refund)
    }
}

impl From<String> for Purpose {
    fn from(value: String) -> Self {
        match value.as_str() {
            "refund" => Self::Refund,
            _ => Self::Other(value),
        }
    }
}

impl Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Purpose::Refund => write!(f, "refund"),
            Purpose::Other(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------      EntryStatus      ---------------------------------------------------------
/// The status string reported by the ledger API, e.g. `success` or `pending`. Reconciled sells use `success` or
/// `refunded`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct EntryStatus(String);

impl EntryStatus {
    pub const REFUNDED: &'static str = "refunded";
    pub const SUCCESS: &'static str = "success";

    pub fn success() -> Self {
        Self(Self::SUCCESS.to_string())
    }

    pub fn refunded() -> Self {
        Self(Self::REFUNDED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_success(&self) -> bool {
        self.0 == Self::SUCCESS
    }
}

impl From<String> for EntryStatus {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntryStatus {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------       WireEntry       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireReference {
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// A crypto-payment entry exactly as the ledger API serves it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntry {
    pub id: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub posted_amount: String,
    #[serde(default)]
    pub running_balance: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub reference: Option<WireReference>,
}

//--------------------------------------        RawEntry       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReference {
    pub reason_code: ReasonCode,
    pub purpose: Option<Purpose>,
    pub order_id: Option<String>,
}

/// A validated ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub id: String,
    pub account: String,
    pub amount: LedgerAmount,
    pub posted_amount: LedgerAmount,
    pub running_balance: LedgerAmount,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub reference: EntryReference,
}

impl RawEntry {
    /// Rewards and refunds are the entries that settle a sell order.
    pub fn is_possible_match(&self) -> bool {
        self.reference.reason_code == ReasonCode::Reward || self.is_refund()
    }

    pub fn is_refund(&self) -> bool {
        self.reference.purpose.as_ref().map(Purpose::is_refund).unwrap_or(false)
    }

    pub fn order_id(&self) -> Option<&str> {
        self.reference.order_id.as_deref()
    }
}

#[derive(Debug, Clone, Error)]
pub enum EntryConversionError {
    #[error("Ledger entry is missing the '{0}' field")]
    MissingField(&'static str),
    #[error("Ledger entry {0} has no reference")]
    MissingReference(String),
    #[error("Ledger entry {id} has no reason code")]
    MissingReasonCode { id: String },
    #[error("Ledger entry {id} has an unknown reason code. {reason}")]
    UnknownReasonCode { id: String, reason: ConversionError },
    #[error("Ledger entry {id} has an invalid {field}. {reason}")]
    InvalidAmount { id: String, field: &'static str, reason: AmountConversionError },
    #[error("Ledger entry {id} has an invalid timestamp '{value}'. {reason}")]
    InvalidTimestamp { id: String, value: String, reason: String },
}

impl TryFrom<WireEntry> for RawEntry {
    type Error = EntryConversionError;

    fn try_from(wire: WireEntry) -> Result<Self, Self::Error> {
        if wire.id.trim().is_empty() {
            return Err(EntryConversionError::MissingField("id"));
        }
        let id = wire.id;
        let reference = wire.reference.ok_or_else(|| EntryConversionError::MissingReference(id.clone()))?;
        let code = reference.reason_code.ok_or_else(|| EntryConversionError::MissingReasonCode { id: id.clone() })?;
        let reason_code = code
            .parse::<ReasonCode>()
            .map_err(|reason| EntryConversionError::UnknownReasonCode { id: id.clone(), reason })?;
        let parse_amount = |field: &'static str, value: &str| {
            value
                .parse::<LedgerAmount>()
                .map_err(|reason| EntryConversionError::InvalidAmount { id: id.clone(), field, reason })
        };
        let amount = parse_amount("amount", &wire.amount)?;
        let posted_amount = parse_amount("posted_amount", &wire.posted_amount)?;
        let running_balance = parse_amount("running_balance", &wire.running_balance)?;
        let created_at = DateTime::parse_from_rfc3339(wire.created_at.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| EntryConversionError::InvalidTimestamp {
                id: id.clone(),
                value: wire.created_at.clone(),
                reason: e.to_string(),
            })?;
        let purpose = reference.purpose.filter(|p| !p.is_empty()).map(Purpose::from);
        let order_id = reference.order_id.filter(|o| !o.is_empty());
        Ok(Self {
            id,
            account: wire.account,
            amount,
            posted_amount,
            running_balance,
            status: EntryStatus::from(wire.status),
            created_at,
            reference: EntryReference { reason_code, purpose, order_id },
        })
    }
}

//--------------------------------------    TransactionType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "buy"),
            TransactionType::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            s => Err(ConversionError(format!("Invalid transaction type: {s}"))),
        }
    }
}

//--------------------------------------  ReconciledTransaction ---------------------------------------------------------
/// A business transaction rebuilt from one or two ledger entries.
///
/// * A **buy** maps 1:1 from its `buy_order` entry and never carries a reward.
/// * A **paired sell** combines the `sell_order` entry with the reward or refund that settled it. The amount comes from
///   the sell, the reward amount and running balance from the partner, and the posted amount is the net effect
///   `-(amount - reward_amount)`.
/// * An **unpaired sell** is a sell whose partner never showed up. It keeps the raw ledger values and is flagged with
///   `unpaired`. Syncing again once the partner has been posted upgrades the record in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReconciledTransaction {
    pub id: String,
    pub account: String,
    pub transaction_type: TransactionType,
    pub status: EntryStatus,
    pub amount: LedgerAmount,
    pub reward_amount: LedgerAmount,
    pub posted_amount: LedgerAmount,
    pub running_balance: LedgerAmount,
    pub order_id: Option<String>,
    pub reward_id: Option<String>,
    /// When the transaction settled: the partner's timestamp for paired sells, otherwise the entry's own timestamp.
    pub transaction_date: DateTime<Utc>,
    pub sell_transaction_date: Option<DateTime<Utc>>,
    pub balance_before_reward: Option<LedgerAmount>,
    pub unpaired: bool,
}

impl ReconciledTransaction {
    pub fn buy(entry: RawEntry) -> Self {
        Self {
            order_id: entry.reference.order_id,
            id: entry.id,
            account: entry.account,
            transaction_type: TransactionType::Buy,
            status: entry.status,
            amount: entry.amount,
            reward_amount: LedgerAmount::default(),
            posted_amount: entry.posted_amount,
            running_balance: entry.running_balance,
            reward_id: None,
            transaction_date: entry.created_at,
            sell_transaction_date: None,
            balance_before_reward: None,
            unpaired: false,
        }
    }

    /// Settles `sell` with `partner`. Returns `None` if the posted amount cannot be represented.
    pub fn paired_sell(sell: &RawEntry, partner: &RawEntry) -> Option<Self> {
        let status = if partner.is_refund() { EntryStatus::refunded() } else { EntryStatus::success() };
        let posted_amount = partner.amount.checked_sub(sell.amount)?;
        Some(Self {
            order_id: sell.reference.order_id.clone(),
            id: sell.id.clone(),
            account: sell.account.clone(),
            transaction_type: TransactionType::Sell,
            status,
            amount: sell.amount,
            reward_amount: partner.amount,
            posted_amount,
            running_balance: partner.running_balance,
            reward_id: Some(partner.id.clone()),
            transaction_date: partner.created_at,
            sell_transaction_date: Some(sell.created_at),
            balance_before_reward: Some(sell.running_balance),
            unpaired: false,
        })
    }

    pub fn unpaired_sell(sell: RawEntry) -> Self {
        Self {
            order_id: sell.reference.order_id,
            id: sell.id,
            account: sell.account,
            transaction_type: TransactionType::Sell,
            status: sell.status,
            amount: sell.amount,
            reward_amount: LedgerAmount::default(),
            posted_amount: sell.posted_amount,
            running_balance: sell.running_balance,
            reward_id: None,
            transaction_date: sell.created_at,
            sell_transaction_date: Some(sell.created_at),
            balance_before_reward: None,
            unpaired: true,
        }
    }

    pub fn is_paired_sell(&self) -> bool {
        self.transaction_type == TransactionType::Sell && !self.unpaired
    }

    /// The number of raw ledger entries this transaction was built from.
    pub fn ledger_entry_count(&self) -> u64 {
        if self.is_paired_sell() {
            2
        } else {
            1
        }
    }

    /// Checks the record before it is handed to a persistence backend.
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.id.trim().is_empty() {
            return Err(TransactionValidationError("id is empty".into()));
        }
        if self.account.trim().is_empty() {
            return Err(TransactionValidationError("account is empty".into()));
        }
        match self.transaction_type {
            TransactionType::Buy => {
                if !self.reward_amount.is_zero() {
                    return Err(TransactionValidationError(format!(
                        "buy transactions cannot carry a reward ({})",
                        self.reward_amount
                    )));
                }
            },
            TransactionType::Sell => {
                if self.order_id.is_none() {
                    return Err(TransactionValidationError("sell transaction has no order id".into()));
                }
                if self.unpaired && !self.reward_amount.is_zero() {
                    return Err(TransactionValidationError("unpaired sell carries a reward".into()));
                }
                if !self.unpaired && self.posted_amount != -(self.amount - self.reward_amount) {
                    return Err(TransactionValidationError(format!(
                        "posted amount {} does not equal -({} - {})",
                        self.posted_amount, self.amount, self.reward_amount
                    )));
                }
            },
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid transaction: {0}")]
pub struct TransactionValidationError(pub String);

//--------------------------------------       SyncCursor      ---------------------------------------------------------
/// Where a sync run stands. `latest_persisted_id` is the store's sync checkpoint, read when the run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCursor {
    pub latest_persisted_id: Option<String>,
    pub next_page: Option<u32>,
}

impl SyncCursor {
    pub fn new(latest_persisted_id: Option<String>) -> Self {
        Self { latest_persisted_id, next_page: Some(1) }
    }

    pub fn is_boundary(&self, id: &str) -> bool {
        self.latest_persisted_id.as_deref() == Some(id)
    }
}
