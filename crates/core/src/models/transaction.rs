use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{decode, CanonicalRecord, EntityKind};
use super::fields::{optional_datetime, optional_lenient};

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREDIT" => Ok(TransactionKind::Credit),
            "DEBIT" => Ok(TransactionKind::Debit),
            other => Err(format!("unknown transaction type '{other}'")),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Credit => write!(f, "CREDIT"),
            TransactionKind::Debit => write!(f, "DEBIT"),
        }
    }
}

/// A posted (or pending) account transaction.
///
/// `amount` is signed and stored exactly as received, even when its sign
/// disagrees with `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "transaction_id")]
    pub id: String,
    #[serde(default, alias = "accountId")]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "descriptionRaw")]
    pub description_raw: Option<String>,
    pub amount: Decimal,
    #[serde(default, alias = "currencyCode")]
    pub currency_code: Option<String>,
    #[serde(default, rename = "balance", alias = "balanceAfter", alias = "balance_after")]
    pub balance_after: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type", alias = "kind", deserialize_with = "optional_lenient")]
    pub kind: Option<TransactionKind>,
}

impl Transaction {
    /// Kind for display: the upstream value, or the amount's sign when absent.
    pub fn effective_kind(&self) -> TransactionKind {
        self.kind.unwrap_or(if self.amount.is_sign_negative() {
            TransactionKind::Debit
        } else {
            TransactionKind::Credit
        })
    }

    /// Amount with the sign implied by `effective_kind`, for display.
    pub fn display_amount(&self) -> Decimal {
        match self.effective_kind() {
            TransactionKind::Debit => -self.amount.abs(),
            TransactionKind::Credit => self.amount.abs(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("PENDING"))
    }
}

impl CanonicalRecord for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn from_resolved(record: Value) -> Result<Self, serde_json::Error> {
        decode(record)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }
}
