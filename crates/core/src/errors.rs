use thiserror::Error;

use crate::models::entity::EntityKind;

/// Unified error type for the entire finlink-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport ───────────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{resource} not found: {id}")]
    NotFound {
        resource: String,
        id: String,
    },

    // ── Mirror store ────────────────────────────────────────────────
    #[error("Persistence error: {0}")]
    Persistence(String),

    // ── Navigation ──────────────────────────────────────────────────
    #[error("Selection of {kind} rejected: {reason}")]
    SelectionRejected {
        kind: EntityKind,
        reason: String,
    },

    #[error("No {0} selected")]
    NothingSelected(EntityKind),

    // ── Lifecycle ───────────────────────────────────────────────────
    #[error("Linking session failed: {message}")]
    SessionFailed {
        message: String,
        partial_connection_id: Option<String>,
    },

    #[error("No session provider configured")]
    NoSessionProvider,

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Data ────────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    /// Network/backend failures: fatal to the in-flight operation only.
    /// The caller shows them as a per-view error and the user may retry.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CoreError::Api { .. } | CoreError::Network(_) | CoreError::NotFound { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

/// Non-fatal conditions met while normalizing a payload.
/// These never propagate as `Err`; they travel next to the records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeWarning {
    #[error("Unrecognized {kind} payload shape: {shape}")]
    UnrecognizedShape { kind: EntityKind, shape: String },

    #[error("Dropped {kind} record #{index}: no resolvable identifier")]
    IdentityMissing { kind: EntityKind, index: usize },

    #[error("Dropped {kind} record {id}: {reason}")]
    InvalidRecord {
        kind: EntityKind,
        id: String,
        reason: String,
    },
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(e: toml::de::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors often carry the full URL; query strings may hold
        // identifiers or tokens, so strip them.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
