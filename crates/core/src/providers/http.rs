use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::services::pagination_service::PageCursor;

/// Longest slice of an error body kept in `CoreError::Api` messages.
const ERROR_BODY_PREVIEW: usize = 200;

pub(crate) fn build_client(timeout_secs: u64) -> Client {
    let builder = Client::builder();
    #[cfg(not(target_arch = "wasm32"))]
    let builder = builder.timeout(Duration::from_secs(timeout_secs));
    #[cfg(target_arch = "wasm32")]
    let _ = timeout_secs;
    builder.build().unwrap_or_else(|_| Client::new())
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn a response into raw JSON.
///
/// 404 becomes `NotFound { resource, id }`, any other non-2xx status
/// `Api`. An empty body reads as `null`.
pub(crate) async fn read_json(
    resp: Response,
    provider: &str,
    resource: &str,
    id: &str,
) -> Result<Value, CoreError> {
    let status = resp.status();

    if status == StatusCode::NOT_FOUND {
        return Err(CoreError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        });
    }

    let body = resp.text().await?;

    if !status.is_success() {
        let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
        return Err(CoreError::Api {
            provider: provider.to_string(),
            message: format!("HTTP {status} on {resource} {id}: {preview}"),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| CoreError::Api {
        provider: provider.to_string(),
        message: format!("Invalid JSON for {resource} {id}: {e}"),
    })
}

/// `(page, page_size)` for page-number APIs, whatever the cursor style.
pub(crate) fn page_params(cursor: PageCursor) -> (u32, u32) {
    match cursor {
        PageCursor::Page { page, page_size } => (page, page_size),
        PageCursor::Offset { limit, offset } => (offset / limit.max(1) + 1, limit),
    }
}

/// `(limit, offset)` for offset APIs, whatever the cursor style.
pub(crate) fn offset_params(cursor: PageCursor) -> (usize, usize) {
    (cursor.size(), cursor.start())
}
