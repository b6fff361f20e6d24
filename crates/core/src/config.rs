use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::settings::{DataSource, Settings};

pub const ENV_API_URL: &str = "FINLINK_API_URL";
pub const ENV_BACKEND_URL: &str = "FINLINK_BACKEND_URL";
pub const ENV_API_KEY: &str = "FINLINK_API_KEY";
pub const ENV_DATA_SOURCE: &str = "FINLINK_DATA_SOURCE";
pub const ENV_TIMEOUT_SECS: &str = "FINLINK_TIMEOUT_SECS";
pub const ENV_TRANSACTIONS_LIMIT: &str = "FINLINK_TRANSACTIONS_LIMIT";
pub const ENV_INVESTMENT_PAGE_SIZE: &str = "FINLINK_INVESTMENT_PAGE_SIZE";

/// Build the settings: defaults, then the TOML file (if given), then
/// `.env` and the process environment. The result is validated.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, CoreError> {
    let settings = match path {
        Some(p) => load_file(p)?,
        None => Settings::default(),
    };

    if dotenvy::dotenv().is_ok() {
        debug!("Loaded .env file");
    }

    let settings = apply_env_overrides(settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    info!(
        data_source = ?settings.data_source,
        backend = %settings.backend_url,
        "Settings loaded"
    );
    Ok(settings)
}

/// Read a TOML settings file. Missing keys keep their defaults.
pub fn load_file(path: &Path) -> Result<Settings, CoreError> {
    debug!("Loading settings from {:?}", path);
    let contents = fs::read_to_string(path)
        .map_err(|e| CoreError::Config(format!("Failed to read {}: {e}", path.display())))?;
    toml::from_str(&contents)
        .map_err(|e| CoreError::Config(format!("Failed to parse {}: {e}", path.display())))
}

/// Apply `FINLINK_*` variables found through `lookup`. Blank values are ignored.
pub fn apply_env_overrides<F>(mut settings: Settings, lookup: F) -> Result<Settings, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(ENV_API_URL) {
        settings.api_base_url = v;
    }
    if let Some(v) = get(ENV_BACKEND_URL) {
        settings.backend_url = v;
    }
    if let Some(v) = get(ENV_API_KEY) {
        settings.api_key = Some(v);
    }
    if let Some(v) = get(ENV_DATA_SOURCE) {
        settings.data_source = DataSource::from_str(&v)?;
    }
    if let Some(v) = get(ENV_TIMEOUT_SECS) {
        settings.request_timeout_secs = parse_number(ENV_TIMEOUT_SECS, &v)?;
    }
    if let Some(v) = get(ENV_TRANSACTIONS_LIMIT) {
        settings.transactions_page_limit = parse_number(ENV_TRANSACTIONS_LIMIT, &v)?;
    }
    if let Some(v) = get(ENV_INVESTMENT_PAGE_SIZE) {
        settings.investment_transactions_page_size = parse_number(ENV_INVESTMENT_PAGE_SIZE, &v)?;
    }
    Ok(settings)
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}
