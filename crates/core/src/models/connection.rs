use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{CanonicalRecord, EntityKind};
use super::fields::{optional_datetime, optional_string_or_number};

/// Sync status of a linked connection as reported by the aggregator.
/// Values we do not know map to `Unknown`, never to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Created,
    Updating,
    Updated,
    LoginError,
    Outdated,
    WaitingUserInput,
    #[serde(other)]
    Unknown,
}

impl ConnectionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CREATED" => ConnectionStatus::Created,
            "UPDATING" => ConnectionStatus::Updating,
            "UPDATED" => ConnectionStatus::Updated,
            "LOGIN_ERROR" => ConnectionStatus::LoginError,
            "OUTDATED" => ConnectionStatus::Outdated,
            "WAITING_USER_INPUT" => ConnectionStatus::WaitingUserInput,
            _ => ConnectionStatus::Unknown,
        }
    }

    /// Whether the aggregator still needs something from the user.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::LoginError
                | ConnectionStatus::Outdated
                | ConnectionStatus::WaitingUserInput
        )
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Created => "CREATED",
            ConnectionStatus::Updating => "UPDATING",
            ConnectionStatus::Updated => "UPDATED",
            ConnectionStatus::LoginError => "LOGIN_ERROR",
            ConnectionStatus::Outdated => "OUTDATED",
            ConnectionStatus::WaitingUserInput => "WAITING_USER_INPUT",
            ConnectionStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// A linked institution session (the aggregator calls it an "item").
///
/// Serializes to the mirror store's row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(rename = "item_id")]
    pub id: String,
    pub connector_id: Option<String>,
    pub connector_name: Option<String>,
    pub connector_image_url: Option<String>,
    pub status: ConnectionStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl Connection {
    /// Name for headings; falls back to the id when the connector is unnamed.
    pub fn display_name(&self) -> &str {
        self.connector_name.as_deref().unwrap_or(&self.id)
    }
}

// The live API nests the connector; the mirror flattens it into columns.

#[derive(Deserialize)]
struct RawConnector {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "imageUrl")]
    image_url: Option<String>,
}

#[derive(Deserialize)]
struct RawConnection {
    item_id: String,
    #[serde(default)]
    connector: Option<RawConnector>,
    #[serde(default, alias = "connectorId", deserialize_with = "optional_string_or_number")]
    connector_id: Option<String>,
    #[serde(default, alias = "connectorName")]
    connector_name: Option<String>,
    #[serde(default, alias = "connectorImageUrl")]
    connector_image_url: Option<String>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default, alias = "createdAt", deserialize_with = "optional_datetime")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", deserialize_with = "optional_datetime")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "lastUpdatedAt", deserialize_with = "optional_datetime")]
    last_updated_at: Option<DateTime<Utc>>,
}

impl From<RawConnection> for Connection {
    fn from(raw: RawConnection) -> Self {
        let (nested_id, nested_name, nested_image) = match raw.connector {
            Some(c) => (c.id, c.name, c.image_url),
            None => (None, None, None),
        };
        let status = raw
            .status
            .as_ref()
            .and_then(Value::as_str)
            .map(ConnectionStatus::parse)
            .unwrap_or(ConnectionStatus::Unknown);

        Connection {
            id: raw.item_id,
            connector_id: raw.connector_id.or(nested_id),
            connector_name: raw.connector_name.or(nested_name),
            connector_image_url: raw.connector_image_url.or(nested_image),
            status,
            created_at: raw.created_at,
            // The live API omits updatedAt for brand-new items.
            updated_at: raw.updated_at.or(raw.created_at),
            last_updated_at: raw.last_updated_at,
        }
    }
}

impl CanonicalRecord for Connection {
    const KIND: EntityKind = EntityKind::Connection;

    fn from_resolved(record: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<RawConnection>(record).map(Connection::from)
    }

    fn id(&self) -> &str {
        &self.id
    }
}
