use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::settings::Settings;
use crate::services::pagination_service::PageCursor;

use super::http::{build_client, join_url, page_params, read_json};
use super::traits::{AggregatorClient, LeafScope, RecordSource};

const PROVIDER: &str = "Pluggy";
const API_KEY_HEADER: &str = "X-API-KEY";

/// Live Pluggy API client.
///
/// - **Auth**: `X-API-KEY` header (an API key or a connect token).
/// - **Endpoints**: `/items/{id}`, `/accounts`, `/transactions`, `/identity`,
///   `/investments`, `/investments/{id}/transactions`, `/loans`, `/bills`.
///
/// The API cannot list items on its own, so the client remembers the
/// connections it was told about and fetches each one.
pub struct PluggyClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    tracked: Mutex<Vec<String>>,
}

impl PluggyClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: build_client(settings.request_timeout_secs),
            base_url: settings.api_base_url.clone(),
            api_key: settings.api_key.clone(),
            tracked: Mutex::new(Vec::new()),
        }
    }

    /// Start with a known set of connection ids.
    pub fn with_tracked<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tracked = Mutex::new(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn tracked_connections(&self) -> Vec<String> {
        self.tracked.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, join_url(&self.base_url, path));
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
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
            .request(reqwest::Method::GET, path)
            .query(query)
            .send()
            .await?;
        read_json(resp, PROVIDER, resource, id).await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RecordSource for PluggyClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list_connections(&self) -> Result<Value, CoreError> {
        let mut items = Vec::new();
        for id in self.tracked_connections() {
            match self.get(&format!("/items/{id}"), &[], "item", &id).await {
                Ok(item) => items.push(item),
                Err(e) if e.is_not_found() => {
                    warn!(connection_id = %id, "Tracked item no longer exists upstream");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Value::Array(items))
    }

    async fn get_accounts(&self, connection_id: &str) -> Result<Value, CoreError> {
        self.get(
            "/accounts",
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
        let (page, page_size) = page_params(page);
        self.get(
            "/transactions",
            &[
                ("accountId", account_id.to_string()),
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ],
            "transactions",
            account_id,
        )
        .await
    }

    async fn get_identity(&self, connection_id: &str) -> Result<Value, CoreError> {
        self.get(
            "/identity",
            &[("itemId", connection_id.to_string())],
            "identity",
            connection_id,
        )
        .await
    }

    async fn get_investments(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        self.get(
            "/investments",
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
            &format!("/investments/{investment_id}/transactions"),
            &[("page", page.to_string()), ("pageSize", page_size.to_string())],
            "investment transactions",
            investment_id,
        )
        .await
    }

    async fn get_loans(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        self.get(
            "/loans",
            &[("itemId", scope.connection_id.clone())],
            "loans",
            &scope.connection_id,
        )
        .await
    }

    async fn get_bills(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        self.get(
            "/bills",
            &[("accountId", scope.account_id.clone())],
            "bills",
            &scope.account_id,
        )
        .await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AggregatorClient for PluggyClient {
    async fn delete_connection(&self, connection_id: &str) -> Result<Value, CoreError> {
        debug!(provider = PROVIDER, %connection_id, "DELETE item");
        let resp = self
            .request(reqwest::Method::DELETE, &format!("/items/{connection_id}"))
            .send()
            .await?;
        read_json(resp, PROVIDER, "item", connection_id).await
    }

    fn track_connection(&self, connection_id: &str) {
        let mut tracked = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
        if !tracked.iter().any(|id| id == connection_id) {
            tracked.push(connection_id.to_string());
        }
    }

    fn untrack_connection(&self, connection_id: &str) {
        self.tracked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|id| id != connection_id);
    }
}
