use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{CanonicalRecord, EntityKind};
use super::fields::optional_lenient;

/// Product family of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Bank,
    Credit,
    PaymentAccount,
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BANK" => Ok(AccountKind::Bank),
            "CREDIT" => Ok(AccountKind::Credit),
            "PAYMENT_ACCOUNT" => Ok(AccountKind::PaymentAccount),
            other => Err(format!("unknown account type '{other}'")),
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountKind::Bank => write!(f, "BANK"),
            AccountKind::Credit => write!(f, "CREDIT"),
            AccountKind::PaymentAccount => write!(f, "PAYMENT_ACCOUNT"),
        }
    }
}

/// Credit card limits (only present on `CREDIT` accounts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditInfo {
    #[serde(default, alias = "creditLimit")]
    pub credit_limit: Option<Decimal>,
    #[serde(default, alias = "availableCreditLimit")]
    pub available_credit_limit: Option<Decimal>,
}

/// An account held under a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "account_id")]
    pub id: String,
    #[serde(rename = "item_id")]
    pub connection_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<AccountKind>,
    pub subtype: Option<String>,
    pub name: Option<String>,
    pub marketing_name: Option<String>,
    pub number: Option<String>,
    pub balance: Option<Decimal>,
    /// As received. Display code may fall back to a default; stored data never does.
    pub currency_code: Option<String>,
    pub owner: Option<String>,
    pub credit_info: Option<CreditInfo>,
}

impl Account {
    pub fn display_name(&self) -> &str {
        self.marketing_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.id)
    }

    pub fn is_credit(&self) -> bool {
        self.kind == Some(AccountKind::Credit)
    }
}

#[derive(Deserialize)]
struct RawAccount {
    account_id: String,
    #[serde(default, alias = "itemId", alias = "connection_id", alias = "connectionId")]
    item_id: Option<String>,
    #[serde(default, rename = "type", alias = "kind", deserialize_with = "optional_lenient")]
    kind: Option<AccountKind>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "marketingName")]
    marketing_name: Option<String>,
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    balance: Option<Decimal>,
    #[serde(default, alias = "currencyCode")]
    currency_code: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default, alias = "creditData", alias = "credit_data", alias = "creditInfo")]
    credit_info: Option<CreditInfo>,
    // Mirror rows flatten the credit data into columns.
    #[serde(default)]
    credit_limit: Option<Decimal>,
    #[serde(default)]
    available_credit_limit: Option<Decimal>,
}

impl From<RawAccount> for Account {
    fn from(raw: RawAccount) -> Self {
        let credit_info = raw.credit_info.or_else(|| {
            if raw.credit_limit.is_some() || raw.available_credit_limit.is_some() {
                Some(CreditInfo {
                    credit_limit: raw.credit_limit,
                    available_credit_limit: raw.available_credit_limit,
                })
            } else {
                None
            }
        });

        Account {
            id: raw.account_id,
            connection_id: raw.item_id.filter(|s| !s.is_empty()),
            kind: raw.kind,
            subtype: raw.subtype,
            name: raw.name,
            marketing_name: raw.marketing_name,
            number: raw.number,
            balance: raw.balance,
            currency_code: raw.currency_code,
            owner: raw.owner,
            credit_info,
        }
    }
}

impl CanonicalRecord for Account {
    const KIND: EntityKind = EntityKind::Account;

    fn from_resolved(record: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<RawAccount>(record).map(Account::from)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }
}
