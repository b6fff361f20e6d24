use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::errors::CoreError;
use crate::models::connection::Connection;
use crate::models::entity::EntityKind;
use crate::models::session::SessionResult;
use crate::normalize::id_resolver::resolved_id;
use crate::normalize::{normalize_one, resolve_id};
use crate::providers::traits::{AggregatorClient, MirrorStore};

use super::selection_service::SelectionStateMachine;

/// Warning recorded when the aggregator no longer knows the connection.
pub const ALREADY_ABSENT_UPSTREAM: &str = "connection was already absent upstream";

// ── Refresh generation ──────────────────────────────────────────────

/// Counter whose change tells every connection listing to refetch.
///
/// Only `ConnectionLifecycleManager` moves it. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct RefreshGeneration {
    tx: Arc<watch::Sender<u64>>,
}

impl RefreshGeneration {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> RefreshWatcher {
        RefreshWatcher {
            rx: self.tx.subscribe(),
        }
    }

    pub(crate) fn bump(&self) -> u64 {
        self.tx.send_modify(|g| *g = g.wrapping_add(1));
        let generation = self.current();
        info!(generation, "Refresh generation advanced");
        generation
    }
}

impl Default for RefreshGeneration {
    fn default() -> Self {
        Self::new()
    }
}

/// Read handle on a `RefreshGeneration`, for views living elsewhere.
#[derive(Debug, Clone)]
pub struct RefreshWatcher {
    rx: watch::Receiver<u64>,
}

impl RefreshWatcher {
    pub fn current(&self) -> u64 {
        *self.rx.borrow()
    }

    /// Whether the generation moved since the last `mark_seen`.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn mark_seen(&mut self) -> u64 {
        *self.rx.borrow_and_update()
    }

    /// Wait for the next change and return the new generation.
    pub async fn changed(&mut self) -> Result<u64, CoreError> {
        self.rx
            .changed()
            .await
            .map_err(|_| CoreError::Persistence("refresh generation dropped".into()))?;
        Ok(*self.rx.borrow_and_update())
    }
}

// ── Lifecycle ───────────────────────────────────────────────────────

/// Result of a successful cascading delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub connection_id: String,
    /// Residual, non-fatal conditions. Empty on a clean delete.
    pub warnings: Vec<String>,
}

impl DeleteOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Creates and deletes connections, keeping the mirror store and the
/// refresh generation in step.
pub struct ConnectionLifecycleManager {
    aggregator: Arc<dyn AggregatorClient>,
    mirror: Arc<dyn MirrorStore>,
    refresh: RefreshGeneration,
}

impl ConnectionLifecycleManager {
    pub fn new(
        aggregator: Arc<dyn AggregatorClient>,
        mirror: Arc<dyn MirrorStore>,
        refresh: RefreshGeneration,
    ) -> Self {
        Self {
            aggregator,
            mirror,
            refresh,
        }
    }

    pub fn refresh_generation(&self) -> &RefreshGeneration {
        &self.refresh
    }

    /// Persist the connection a linking session produced.
    ///
    /// The refresh generation moves only after the mirror store accepted
    /// the row.
    pub async fn create(&self, result: SessionResult) -> Result<Connection, CoreError> {
        let raw = match result {
            SessionResult::Success { connection } => connection,
            SessionResult::Error {
                message,
                partial_connection,
            } => {
                let partial_connection_id = partial_connection
                    .and_then(|c| resolve_id(c, EntityKind::Connection).ok())
                    .and_then(|r| resolved_id(&r, EntityKind::Connection));
                error!(
                    %message,
                    partial_connection_id = partial_connection_id.as_deref().unwrap_or("none"),
                    "Linking session failed"
                );
                return Err(CoreError::SessionFailed {
                    message,
                    partial_connection_id,
                });
            }
        };

        let (connection, warnings) = normalize_one::<Connection>(raw);
        let connection = connection.ok_or_else(|| {
            let reasons: Vec<String> = warnings.iter().map(ToString::to_string).collect();
            CoreError::ValidationError(format!(
                "linking session returned no usable connection ({})",
                reasons.join("; ")
            ))
        })?;

        self.mirror.save_connection(&connection).await?;
        self.aggregator.track_connection(&connection.id);
        let generation = self.refresh.bump();

        info!(
            connection_id = %connection.id,
            connector = %connection.display_name(),
            generation,
            "Connection created"
        );
        Ok(connection)
    }

    /// Cascade-delete a connection from the aggregator and the mirror store.
    ///
    /// A selection referencing the connection is reset once both deletes
    /// succeed. On a hard failure neither the selection nor the refresh
    /// generation changes, so listings keep the connection.
    pub async fn delete(
        &self,
        connection_id: &str,
        selection: &mut SelectionStateMachine,
    ) -> Result<DeleteOutcome, CoreError> {
        if connection_id.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "cannot delete a connection without identifier".into(),
            ));
        }

        let mut warnings = Vec::new();

        match self.aggregator.delete_connection(connection_id).await {
            Ok(payload) => warnings.extend(warnings_from_payload(&payload)),
            Err(e) if e.is_not_found() => {
                warn!(%connection_id, "Connection already absent at {}", self.aggregator.name());
                warnings.push(ALREADY_ABSENT_UPSTREAM.to_string());
            }
            Err(e) => {
                error!(%connection_id, error = %e, "Upstream delete failed");
                return Err(e);
            }
        }

        match self.mirror.delete_by_connection(connection_id).await {
            Ok(residual) => warnings.extend(residual),
            Err(e) => {
                error!(%connection_id, error = %e, "Mirror delete failed");
                return Err(e);
            }
        }

        if selection.references_connection(connection_id) {
            info!(%connection_id, "Resetting selection of deleted connection");
            selection.reset();
        }

        let mut seen = std::collections::HashSet::new();
        warnings.retain(|w| seen.insert(w.clone()));

        self.aggregator.untrack_connection(connection_id);
        let generation = self.refresh.bump();

        if warnings.is_empty() {
            info!(%connection_id, generation, "Connection deleted");
        } else {
            warn!(%connection_id, generation, ?warnings, "Connection deleted with warnings");
        }

        Ok(DeleteOutcome {
            connection_id: connection_id.to_string(),
            warnings,
        })
    }
}

/// Read `{warnings: [...]}` from a delete response. Anything else yields none.
pub fn warnings_from_payload(payload: &Value) -> Vec<String> {
    payload
        .get("warnings")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|w| match w {
                    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                    Value::Null => None,
                    Value::String(_) => None,
                    other => Some(other.to_string()),
                })
                .collect()
        })
        .unwrap_or_default()
}
