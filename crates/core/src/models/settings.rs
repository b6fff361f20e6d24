use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Which upstream feeds the list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// The aggregator's public API.
    Live,
    /// The persisted relational copy behind the backend.
    Mirror,
}

impl std::str::FromStr for DataSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(DataSource::Live),
            "mirror" => Ok(DataSource::Mirror),
            other => Err(CoreError::Config(format!(
                "Unknown data source '{other}' (expected 'live' or 'mirror')"
            ))),
        }
    }
}

pub const DEFAULT_CONNECT_TOKEN_TTL_MINUTES: i64 = 30;

/// Upper bound for `connect_token_ttl_minutes`: one week.
pub const MAX_CONNECT_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Runtime configuration, loaded by `config::load_settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the aggregator API.
    pub api_base_url: String,

    /// Base URL of the backend that owns the mirror store and issues connect tokens.
    pub backend_url: String,

    /// Key sent as `X-API-KEY` to the aggregator. Usually a connect token.
    pub api_key: Option<String>,

    pub request_timeout_secs: u64,

    pub data_source: DataSource,

    /// Offset/limit page size of the account transactions view.
    pub transactions_page_limit: u32,

    /// Page-number page size of the investment transactions view.
    pub investment_transactions_page_size: u32,

    /// Lifetime given to connect tokens whose issuer omits an expiry.
    pub connect_token_ttl_minutes: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.pluggy.ai".to_string(),
            backend_url: "http://localhost:3000".to_string(),
            api_key: None,
            request_timeout_secs: 30,
            data_source: DataSource::Mirror,
            transactions_page_limit: 100,
            investment_transactions_page_size: 20,
            connect_token_ttl_minutes: DEFAULT_CONNECT_TOKEN_TTL_MINUTES,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.api_base_url.trim().is_empty() {
            return Err(CoreError::Config("api_base_url must not be empty".into()));
        }
        if self.backend_url.trim().is_empty() {
            return Err(CoreError::Config("backend_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config("request_timeout_secs must be positive".into()));
        }
        if self.transactions_page_limit == 0 || self.investment_transactions_page_size == 0 {
            return Err(CoreError::Config("page sizes must be positive".into()));
        }
        if !(1..=MAX_CONNECT_TOKEN_TTL_MINUTES).contains(&self.connect_token_ttl_minutes) {
            return Err(CoreError::Config(format!(
                "connect_token_ttl_minutes must be between 1 and {MAX_CONNECT_TOKEN_TTL_MINUTES}"
            )));
        }
        Ok(())
    }
}
