use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{decode, CanonicalRecord, EntityKind};
use super::fields::optional_datetime;

/// A loan or financing contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    #[serde(rename = "loan_id")]
    pub id: String,
    #[serde(default, alias = "accountId")]
    pub account_id: Option<String>,
    #[serde(default, rename = "item_id", alias = "itemId")]
    pub connection_id: Option<String>,
    #[serde(default, alias = "productName")]
    pub product_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default, alias = "contractNumber")]
    pub contract_number: Option<String>,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, alias = "currencyCode")]
    pub currency_code: Option<String>,
    #[serde(default, alias = "contractAmount", alias = "contractedAmount")]
    pub contracted_amount: Option<Decimal>,
    #[serde(default, alias = "principalDebt")]
    pub principal_debt: Option<Decimal>,
    #[serde(default, alias = "outstandingBalance")]
    pub outstanding_balance: Option<Decimal>,
    #[serde(default, alias = "currentDebtAmount")]
    pub current_debt_amount: Option<Decimal>,
    /// Percent per period, as received.
    #[serde(default, alias = "interestRate")]
    pub interest_rate: Option<Decimal>,
    /// Total effective cost (CET), percent.
    #[serde(default)]
    pub cet: Option<Decimal>,
    #[serde(default, alias = "installmentFrequency")]
    pub installment_frequency: Option<String>,
    #[serde(default, alias = "installmentsToPay")]
    pub installments_to_pay: Option<u32>,
    #[serde(default, alias = "minimumPayment")]
    pub minimum_payment: Option<Decimal>,
    #[serde(default, alias = "dueDate", deserialize_with = "optional_datetime")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

impl Loan {
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or(&self.id)
    }
}

impl CanonicalRecord for Loan {
    const KIND: EntityKind = EntityKind::Loan;

    fn from_resolved(record: Value) -> Result<Self, serde_json::Error> {
        decode(record)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.account_id
            .as_deref()
            .or(self.connection_id.as_deref())
    }
}
