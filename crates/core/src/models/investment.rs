use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{decode, CanonicalRecord, EntityKind};
use super::fields::optional_datetime;

/// A position held in an investment product (fund, fixed income, equity...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    #[serde(rename = "investment_id")]
    pub id: String,
    #[serde(default, alias = "accountId")]
    pub account_id: Option<String>,
    #[serde(default, rename = "item_id", alias = "itemId")]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Unit value.
    #[serde(default)]
    pub value: Option<Decimal>,
    /// Gross amount invested.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Current net position.
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub fees: Option<Decimal>,
    #[serde(default, alias = "currencyCode")]
    pub currency_code: Option<String>,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

impl Investment {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.code.as_deref())
            .unwrap_or(&self.id)
    }
}

impl CanonicalRecord for Investment {
    const KIND: EntityKind = EntityKind::Investment;

    fn from_resolved(record: Value) -> Result<Self, serde_json::Error> {
        decode(record)
    }

    fn id(&self) -> &str {
        &self.id
    }

    /// Some providers only link investments to the connection.
    fn parent_id(&self) -> Option<&str> {
        self.account_id
            .as_deref()
            .or(self.connection_id.as_deref())
    }
}

/// A movement within one investment (buy, sell, dividend, tax...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentTransaction {
    #[serde(rename = "transaction_id")]
    pub id: String,
    #[serde(default, alias = "investmentId")]
    pub investment_id: Option<String>,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub fees: Option<Decimal>,
    #[serde(default, alias = "currencyCode")]
    pub currency_code: Option<String>,
}

impl CanonicalRecord for InvestmentTransaction {
    const KIND: EntityKind = EntityKind::InvestmentTransaction;

    fn from_resolved(record: Value) -> Result<Self, serde_json::Error> {
        decode(record)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.investment_id.as_deref()
    }
}
