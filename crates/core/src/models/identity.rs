use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{decode, CanonicalRecord, EntityKind};
use super::fields::{null_as_empty, optional_datetime};

/// One e-mail address or phone number on file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub value: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Personal data the institution holds about the account owner.
///
/// At most one per connection; absence is a normal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "identity_id")]
    pub id: String,
    #[serde(default, rename = "item_id", alias = "itemId")]
    pub connection_id: Option<String>,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default, alias = "documentType")]
    pub document_type: Option<String>,
    #[serde(default, alias = "taxNumber")]
    pub tax_number: Option<String>,
    #[serde(default, alias = "birthDate", deserialize_with = "optional_datetime")]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "jobTitle")]
    pub job_title: Option<String>,
    #[serde(
        default,
        alias = "emailAddresses",
        alias = "email_addresses",
        deserialize_with = "null_as_empty"
    )]
    pub emails: Vec<ContactEntry>,
    #[serde(default, alias = "phoneNumbers", deserialize_with = "null_as_empty")]
    pub phone_numbers: Vec<ContactEntry>,
}

impl CanonicalRecord for Identity {
    const KIND: EntityKind = EntityKind::Identity;

    fn from_resolved(record: Value) -> Result<Self, serde_json::Error> {
        decode(record)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }
}
