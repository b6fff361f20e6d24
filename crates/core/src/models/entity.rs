use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every kind of record the aggregator (or its mirror) hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Connection,
    Account,
    Transaction,
    Investment,
    InvestmentTransaction,
    Loan,
    CreditCardBill,
    Identity,
}

/// Field that upstream shapes use when they do not qualify the identifier.
pub const GENERIC_ID_FIELD: &str = "id";

/// Generic wrapper key some endpoints use regardless of kind.
pub const RESULTS_WRAPPER_KEY: &str = "results";

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Connection,
        EntityKind::Account,
        EntityKind::Transaction,
        EntityKind::Investment,
        EntityKind::InvestmentTransaction,
        EntityKind::Loan,
        EntityKind::CreditCardBill,
        EntityKind::Identity,
    ];

    /// Kind-qualified identifier field of the canonical shape.
    pub fn id_field(&self) -> &'static str {
        match self {
            EntityKind::Connection => "item_id",
            EntityKind::Account => "account_id",
            EntityKind::Transaction => "transaction_id",
            EntityKind::Investment => "investment_id",
            EntityKind::InvestmentTransaction => "transaction_id",
            EntityKind::Loan => "loan_id",
            EntityKind::CreditCardBill => "bill_id",
            EntityKind::Identity => "identity_id",
        }
    }

    /// Plural wrapper keys, checked in order before `"results"`.
    pub fn wrapper_keys(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Connection => &["connections", "items"],
            EntityKind::Account => &["accounts"],
            EntityKind::Transaction => &["transactions"],
            EntityKind::Investment => &["investments"],
            EntityKind::InvestmentTransaction => &["transactions"],
            EntityKind::Loan => &["loans"],
            EntityKind::CreditCardBill => &["bills"],
            EntityKind::Identity => &["identities"],
        }
    }

    /// True if `object` carries any field that identifies a record of this kind.
    pub fn has_identifying_field(&self, object: &serde_json::Map<String, Value>) -> bool {
        [self.id_field(), GENERIC_ID_FIELD]
            .iter()
            .any(|field| object.get(*field).and_then(id_text).is_some())
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Connection => write!(f, "connection"),
            EntityKind::Account => write!(f, "account"),
            EntityKind::Transaction => write!(f, "transaction"),
            EntityKind::Investment => write!(f, "investment"),
            EntityKind::InvestmentTransaction => write!(f, "investment transaction"),
            EntityKind::Loan => write!(f, "loan"),
            EntityKind::CreditCardBill => write!(f, "credit card bill"),
            EntityKind::Identity => write!(f, "identity"),
        }
    }
}

/// Text form of an identifier value: non-empty strings and numbers only.
pub fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A normalized, kind-specific record.
///
/// Built from a JSON object whose kind-qualified id field has already been
/// populated by the id resolver. Records are immutable once constructed and
/// replaced wholesale on refetch.
pub trait CanonicalRecord: Sized + Clone {
    const KIND: EntityKind;

    /// Decode from a resolved JSON object.
    fn from_resolved(record: Value) -> Result<Self, serde_json::Error>;

    /// Primary identifier (never empty for records that came out of normalization).
    fn id(&self) -> &str;

    /// Identifier of the owning record, if the upstream supplied one.
    fn parent_id(&self) -> Option<&str> {
        None
    }

    /// Whether a view may offer this record for selection.
    /// Connections are top-level; everything else needs its foreign key.
    fn is_selectable(&self) -> bool {
        if self.id().is_empty() {
            return false;
        }
        match Self::KIND {
            EntityKind::Connection => true,
            _ => self.parent_id().is_some_and(|p| !p.is_empty()),
        }
    }
}

/// Shared plain-serde decoding for records without shape quirks.
pub(crate) fn decode<T: DeserializeOwned>(record: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(record)
}
