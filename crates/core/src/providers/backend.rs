use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::connection::Connection;
use crate::models::session::ConnectToken;
use crate::models::settings::{Settings, DEFAULT_CONNECT_TOKEN_TTL_MINUTES};
use crate::models::transaction::Transaction;
use crate::services::lifecycle_service::warnings_from_payload;
use crate::services::pagination_service::PageCursor;

use super::http::{build_client, join_url, offset_params, page_params, read_json};
use super::traits::{LeafScope, MirrorStore, RecordSource, SessionProvider};

const PROVIDER: &str = "Backend";

/// Warning recorded when the mirror no longer holds the connection.
pub const ALREADY_ABSENT_IN_MIRROR: &str = "connection was already absent from the mirror";

/// Client of the backend REST API: the mirror store plus connect tokens.
///
/// Reads: `/api/items`, `/api/accounts`, `/api/transactions`,
/// `/api/identity`, `/api/investments`, `/api/investment-transactions`,
/// `/api/loans`, `/api/bills`. Writes: `POST /api/items`,
/// `POST /api/transactions`, `DELETE /api/items/{id}`, `POST /api/token`.
pub struct BackendClient {
    client: Client,
    base_url: String,
    token_ttl: Duration,
}

impl BackendClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: build_client(settings.request_timeout_secs),
            base_url: settings.backend_url.clone(),
            token_ttl: token_ttl(settings.connect_token_ttl_minutes),
        }
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: &str,
        id: &str,
    ) -> Result<Value, CoreError> {
        debug!(provider = PROVIDER, %resource, %id, "GET {path}");
        let resp = self
            .client
            .get(join_url(&self.base_url, path))
            .query(query)
            .send()
            .await?;
        read_json(resp, PROVIDER, resource, id).await
    }

    async fn post(&self, path: &str, body: &Value, resource: &str, id: &str) -> Result<Value, CoreError> {
        debug!(provider = PROVIDER, %resource, %id, "POST {path}");
        let resp = self
            .client
            .post(join_url(&self.base_url, path))
            .json(body)
            .send()
            .await?;
        read_json(resp, PROVIDER, resource, id).await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RecordSource for BackendClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list_connections(&self) -> Result<Value, CoreError> {
        self.get("/api/items", &[], "items", "*").await
    }

    async fn get_accounts(&self, connection_id: &str) -> Result<Value, CoreError> {
        self.get(
            "/api/accounts",
            &[("itemId", connection_id.to_string())],
            "accounts",
            connection_id,
        )
        .await
    }

    async fn get_transactions(
        &self,
        account_id: &str,
        page: PageCursor,
    ) -> Result<Value, CoreError> {
        let (limit, offset) = offset_params(page);
        self.get(
            "/api/transactions",
            &[
                ("accountId", account_id.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
            "transactions",
            account_id,
        )
        .await
    }

    async fn get_identity(&self, connection_id: &str) -> Result<Value, CoreError> {
        self.get(
            "/api/identity",
            &[("itemId", connection_id.to_string())],
            "identity",
            connection_id,
        )
        .await
    }

    async fn get_investments(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        self.get(
            "/api/investments",
            &[("itemId", scope.connection_id.clone())],
            "investments",
            &scope.connection_id,
        )
        .await
    }

    async fn get_investment_transactions(
        &self,
        investment_id: &str,
        page: PageCursor,
    ) -> Result<Value, CoreError> {
        let (page, page_size) = page_params(page);
        self.get(
            "/api/investment-transactions",
            &[
                ("investmentId", investment_id.to_string()),
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ],
            "investment transactions",
            investment_id,
        )
        .await
    }

    async fn get_loans(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        self.get(
            "/api/loans",
            &[("itemId", scope.connection_id.clone())],
            "loans",
            &scope.connection_id,
        )
        .await
    }

    async fn get_bills(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        self.get(
            "/api/bills",
            &[("accountId", scope.account_id.clone())],
            "bills",
            &scope.account_id,
        )
        .await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MirrorStore for BackendClient {
    async fn save_connection(&self, connection: &Connection) -> Result<(), CoreError> {
        let body = serde_json::to_value(connection)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.post("/api/items", &body, "item", &connection.id)
            .await
            .map_err(|e| CoreError::Persistence(e.to_string()))?;
        info!(connection_id = %connection.id, "Connection saved to mirror");
        Ok(())
    }

    async fn save_transactions(
        &self,
        account_id: &str,
        transactions: &[Transaction],
    ) -> Result<(), CoreError> {
        let rows = serde_json::to_value(transactions)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        let body = json!({ "accountId": account_id, "transactions": rows });
        self.post("/api/transactions", &body, "transactions", account_id)
            .await
            .map_err(|e| CoreError::Persistence(e.to_string()))?;
        debug!(%account_id, count = transactions.len(), "Transactions saved to mirror");
        Ok(())
    }

    async fn delete_by_connection(&self, connection_id: &str) -> Result<Vec<String>, CoreError> {
        let resp = self
            .client
            .delete(join_url(&self.base_url, &format!("/api/items/{connection_id}")))
            .send()
            .await?;
        match read_json(resp, PROVIDER, "item", connection_id).await {
            Ok(payload) => Ok(warnings_from_payload(&payload)),
            Err(e) if e.is_not_found() => Ok(vec![ALREADY_ABSENT_IN_MIRROR.to_string()]),
            Err(e) => Err(e),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SessionProvider for BackendClient {
    async fn create_connect_token(
        &self,
        connection_id: Option<&str>,
    ) -> Result<ConnectToken, CoreError> {
        let body = json!({ "itemId": connection_id, "options": {} });
        let payload = self
            .post("/api/token", &body, "connect token", connection_id.unwrap_or("new"))
            .await?;
        token_from_payload(payload, self.token_ttl)
    }
}

/// Out-of-range values fall back to the default TTL; `Settings::validate`
/// reports them.
fn token_ttl(minutes: i64) -> Duration {
    Duration::try_minutes(minutes)
        .filter(|ttl| *ttl > Duration::zero())
        .unwrap_or_else(|| Duration::minutes(DEFAULT_CONNECT_TOKEN_TTL_MINUTES))
}

/// Read `{accessToken, expiresAt?}`; a missing expiry becomes now + `ttl`.
pub(crate) fn token_from_payload(payload: Value, ttl: Duration) -> Result<ConnectToken, CoreError> {
    let mut token: ConnectToken = serde_json::from_value(payload).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Malformed connect token response: {e}"),
    })?;
    if token.access_token.trim().is_empty() {
        return Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: "Connect token response carried an empty token".into(),
        });
    }
    if token.expires_at.is_none() {
        let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            CoreError::Config(format!("connect token TTL out of range: {ttl}"))
        })?;
        token.expires_at = Some(expires_at);
    }
    Ok(token)
}
