use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::connection::Connection;
use crate::models::session::ConnectToken;
use crate::models::transaction::Transaction;
use crate::services::pagination_service::PageCursor;

/// Identifiers of the selected account and its connection.
///
/// Some sources list investments and loans per connection, others per
/// account; each source picks the one it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafScope {
    pub connection_id: String,
    pub account_id: String,
}

impl LeafScope {
    pub fn new(connection_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            account_id: account_id.into(),
        }
    }
}

/// Read side shared by the live aggregator and the mirror store.
///
/// Every method returns the payload exactly as received. Shape handling is
/// the normalizer's job; implementations must not unwrap wrappers or
/// rename fields.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RecordSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    async fn list_connections(&self) -> Result<Value, CoreError>;

    async fn get_accounts(&self, connection_id: &str) -> Result<Value, CoreError>;

    async fn get_transactions(&self, account_id: &str, page: PageCursor)
        -> Result<Value, CoreError>;

    /// Fails with `CoreError::NotFound` when no identity is on file.
    async fn get_identity(&self, connection_id: &str) -> Result<Value, CoreError>;

    async fn get_investments(&self, scope: &LeafScope) -> Result<Value, CoreError>;

    async fn get_investment_transactions(
        &self,
        investment_id: &str,
        page: PageCursor,
    ) -> Result<Value, CoreError>;

    async fn get_loans(&self, scope: &LeafScope) -> Result<Value, CoreError>;

    async fn get_bills(&self, scope: &LeafScope) -> Result<Value, CoreError>;
}

/// The live account-aggregation provider.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AggregatorClient: RecordSource {
    /// Delete a connection upstream. The payload may carry `{warnings: [...]}`.
    async fn delete_connection(&self, connection_id: &str) -> Result<Value, CoreError>;

    /// Remember a connection created through a linking session, for
    /// aggregators that cannot list connections on their own.
    fn track_connection(&self, _connection_id: &str) {}

    fn untrack_connection(&self, _connection_id: &str) {}
}

/// Persisted relational copy of the aggregator's data.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MirrorStore: RecordSource {
    async fn save_connection(&self, connection: &Connection) -> Result<(), CoreError>;

    async fn save_transactions(
        &self,
        account_id: &str,
        transactions: &[Transaction],
    ) -> Result<(), CoreError>;

    /// Cascade-delete a connection with its accounts, identity and leaf
    /// records. Returns residual, non-fatal warnings.
    async fn delete_by_connection(&self, connection_id: &str) -> Result<Vec<String>, CoreError>;
}

/// Issues the short-lived token that opens a linking session.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SessionProvider: Send + Sync {
    /// `connection_id` is set when re-linking an existing connection.
    async fn create_connect_token(
        &self,
        connection_id: Option<&str>,
    ) -> Result<ConnectToken, CoreError>;
}
