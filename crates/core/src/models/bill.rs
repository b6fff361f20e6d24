use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{decode, CanonicalRecord, EntityKind};
use super::fields::optional_datetime;

/// A monthly statement of a credit card account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardBill {
    #[serde(rename = "bill_id")]
    pub id: String,
    #[serde(default, alias = "accountId")]
    pub account_id: Option<String>,
    #[serde(default, alias = "dueDate", deserialize_with = "optional_datetime")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "totalAmount")]
    pub total_amount: Option<Decimal>,
    #[serde(default, alias = "minimumPaymentAmount", alias = "minimumPayment")]
    pub minimum_payment: Option<Decimal>,
    #[serde(default, alias = "paidAmount")]
    pub paid_amount: Option<Decimal>,
    #[serde(default, alias = "paymentDate", deserialize_with = "optional_datetime")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "currencyCode", alias = "totalAmountCurrencyCode")]
    pub currency_code: Option<String>,
}

impl CreditCardBill {
    /// What is still owed on the statement, when both figures are known.
    pub fn remaining(&self) -> Option<Decimal> {
        Some(self.total_amount? - self.paid_amount.unwrap_or_default())
    }

    pub fn is_paid(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("PAID"))
            || self.remaining().is_some_and(|r| r <= Decimal::ZERO)
    }
}

impl CanonicalRecord for CreditCardBill {
    const KIND: EntityKind = EntityKind::CreditCardBill;

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
