// ═══════════════════════════════════════════════════════════════════
// Service Tests — PaginationController, ListView, ConnectionLifecycleManager
// ═══════════════════════════════════════════════════════════════════

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use finlink_core::errors::CoreError;
use finlink_core::models::account::Account;
use finlink_core::models::connection::Connection;
use finlink_core::models::entity::CanonicalRecord;
use finlink_core::models::session::SessionResult;
use finlink_core::models::transaction::Transaction;
use finlink_core::normalize::normalize;
use finlink_core::providers::traits::{AggregatorClient, LeafScope, MirrorStore, RecordSource};
use finlink_core::services::fetch_service::{FetchOutcome, ListView, ViewStatus};
use finlink_core::services::lifecycle_service::{
    ConnectionLifecycleManager, RefreshGeneration, ALREADY_ABSENT_UPSTREAM,
};
use finlink_core::services::pagination_service::{PageCursor, PaginationController, FIRST_PAGE};
use finlink_core::services::selection_service::SelectionStateMachine;

// ═══════════════════════════════════════════════════════════════════
// Mock collaborators
// ═══════════════════════════════════════════════════════════════════

/// Aggregator whose delete answer is scripted per test.
struct MockAggregator {
    delete_response: Mutex<Option<Result<Value, CoreError>>>,
    deleted: Mutex<Vec<String>>,
    tracked: Mutex<Vec<String>>,
}

impl MockAggregator {
    fn answering(response: Result<Value, CoreError>) -> Self {
        Self {
            delete_response: Mutex::new(Some(response)),
            deleted: Mutex::new(Vec::new()),
            tracked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RecordSource for MockAggregator {
    fn name(&self) -> &str {
        "MockAggregator"
    }

    async fn list_connections(&self) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_accounts(&self, _connection_id: &str) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_transactions(&self, _account_id: &str, _page: PageCursor) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_identity(&self, connection_id: &str) -> Result<Value, CoreError> {
        Err(CoreError::NotFound {
            resource: "identity".into(),
            id: connection_id.into(),
        })
    }

    async fn get_investments(&self, _scope: &LeafScope) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_investment_transactions(
        &self,
        _investment_id: &str,
        _page: PageCursor,
    ) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_loans(&self, _scope: &LeafScope) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_bills(&self, _scope: &LeafScope) -> Result<Value, CoreError> {
        Ok(json!([]))
    }
}

#[async_trait]
impl AggregatorClient for MockAggregator {
    async fn delete_connection(&self, connection_id: &str) -> Result<Value, CoreError> {
        self.deleted.lock().unwrap().push(connection_id.to_string());
        self.delete_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(Value::Null))
    }

    fn track_connection(&self, connection_id: &str) {
        self.tracked.lock().unwrap().push(connection_id.to_string());
    }

    fn untrack_connection(&self, connection_id: &str) {
        self.tracked.lock().unwrap().retain(|id| id != connection_id);
    }
}

/// Mirror store that records writes and answers deletes from a script.
struct MockMirror {
    delete_response: Mutex<Option<Result<Vec<String>, CoreError>>>,
    saved: Mutex<Vec<Connection>>,
    fail_saves: bool,
}

impl MockMirror {
    fn answering(response: Result<Vec<String>, CoreError>) -> Self {
        Self {
            delete_response: Mutex::new(Some(response)),
            saved: Mutex::new(Vec::new()),
            fail_saves: false,
        }
    }

    fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::answering(Ok(vec![]))
        }
    }
}

#[async_trait]
impl RecordSource for MockMirror {
    fn name(&self) -> &str {
        "MockMirror"
    }

    async fn list_connections(&self) -> Result<Value, CoreError> {
        let saved = self.saved.lock().unwrap();
        Ok(serde_json::to_value(&*saved)?)
    }

    async fn get_accounts(&self, _connection_id: &str) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_transactions(&self, _account_id: &str, _page: PageCursor) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_identity(&self, _connection_id: &str) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_investments(&self, _scope: &LeafScope) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_investment_transactions(
        &self,
        _investment_id: &str,
        _page: PageCursor,
    ) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_loans(&self, _scope: &LeafScope) -> Result<Value, CoreError> {
        Ok(json!([]))
    }

    async fn get_bills(&self, _scope: &LeafScope) -> Result<Value, CoreError> {
        Ok(json!([]))
    }
}

#[async_trait]
impl MirrorStore for MockMirror {
    async fn save_connection(&self, connection: &Connection) -> Result<(), CoreError> {
        if self.fail_saves {
            return Err(CoreError::Persistence("mirror offline".into()));
        }
        self.saved.lock().unwrap().push(connection.clone());
        Ok(())
    }

    async fn save_transactions(
        &self,
        _account_id: &str,
        _transactions: &[Transaction],
    ) -> Result<(), CoreError> {
        Ok(())
    }

    async fn delete_by_connection(&self, _connection_id: &str) -> Result<Vec<String>, CoreError> {
        self.delete_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(vec![]))
    }
}

fn manager(
    aggregator: Arc<MockAggregator>,
    mirror: Arc<MockMirror>,
) -> ConnectionLifecycleManager {
    ConnectionLifecycleManager::new(aggregator, mirror, RefreshGeneration::new())
}

fn connection(id: &str) -> Connection {
    Connection::from_resolved(json!({ "item_id": id })).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// PaginationController
// ═══════════════════════════════════════════════════════════════════

mod pagination {
    use super::*;

    #[test]
    fn offset_style_advances_by_limit() {
        let mut p = PaginationController::offset(100);
        assert!(p.is_at_start());
        p.load_more();
        p.load_more();
        assert_eq!(p.cursor(), PageCursor::Offset { limit: 100, offset: 200 });
        assert_eq!(p.page_number_display(), 3);
        assert!(p.load_previous());
        assert_eq!(p.cursor().start(), 100);
    }

    #[test]
    fn previous_at_start_is_noop() {
        let mut offset = PaginationController::offset(50);
        assert!(!offset.load_previous());
        assert_eq!(offset.cursor(), PageCursor::Offset { limit: 50, offset: 0 });

        let mut paged = PaginationController::page_number(20);
        assert!(!paged.has_previous());
        assert!(!paged.load_previous());
        assert_eq!(paged.cursor(), PageCursor::Page { page: FIRST_PAGE, page_size: 20 });
    }

    #[test]
    fn page_style_never_drops_below_first_page() {
        let mut p = PaginationController::page_number(20);
        p.load_more();
        assert!(p.load_previous());
        assert!(!p.load_previous());
        assert_eq!(p.page_number_display(), 1);
    }

    #[test]
    fn next_is_always_available() {
        let mut p = PaginationController::page_number(20);
        for _ in 0..10 {
            assert!(p.has_next());
            p.load_more();
        }
        assert_eq!(p.page_number_display(), 11);
    }

    #[test]
    fn owner_change_resets_cursor() {
        let mut p = PaginationController::offset(100);
        assert!(p.set_owner(Some("a1")));
        p.load_more();
        assert!(!p.set_owner(Some("a1")));
        assert!(!p.is_at_start());

        assert!(p.set_owner(Some("a2")));
        assert!(p.is_at_start());
        assert_eq!(p.owner(), Some("a2"));
    }

    #[test]
    fn page_cursor_converts_to_offset() {
        let cursor = PageCursor::Page { page: 3, page_size: 20 };
        assert_eq!(cursor.start(), 40);
        assert_eq!(cursor.size(), 20);
        assert_eq!(PageCursor::Page { page: 0, page_size: 20 }.start(), 0);
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let p = PaginationController::offset(0);
        assert_eq!(p.cursor().size(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ListView — stale results
// ═══════════════════════════════════════════════════════════════════

mod list_view {
    use super::*;

    fn accounts(ids: &[&str]) -> Value {
        Value::Array(
            ids.iter()
                .map(|id| json!({ "account_id": id, "item_id": "c1" }))
                .collect(),
        )
    }

    #[test]
    fn applies_current_result() {
        let mut view: ListView<Account> = ListView::new();
        let ticket = view.begin(Some("c1"), 0);
        assert!(view.is_loading());

        let outcome = view.complete(&ticket, Ok(normalize(accounts(&["a1", "a2"]))), 0);
        assert!(matches!(outcome, FetchOutcome::Applied { count: 2, .. }));
        assert_eq!(view.status(), &ViewStatus::Ready);
        assert!(view.find("a2").is_some());
    }

    #[test]
    fn older_fetch_loses_to_newer_one() {
        let mut view: ListView<Account> = ListView::new();
        let first = view.begin(Some("c1"), 0);
        let second = view.begin(Some("c1"), 0);

        assert!(view.complete(&second, Ok(normalize(accounts(&["new"]))), 0).is_applied());
        assert!(view.complete(&first, Ok(normalize(accounts(&["old"]))), 0).is_stale());
        assert_eq!(view.records()[0].id, "new");
    }

    #[test]
    fn invalidate_keeps_records_but_drops_in_flight_result() {
        let mut view: ListView<Account> = ListView::new();
        let ticket = view.begin(Some("c1"), 0);
        view.complete(&ticket, Ok(normalize(accounts(&["a1"]))), 0);

        let pending = view.begin(Some("c1"), 0);
        view.invalidate();
        assert!(!view.is_loading());
        assert!(view.complete(&pending, Ok(normalize(accounts(&["a9"]))), 0).is_stale());
        assert_eq!(view.records()[0].id, "a1");
    }

    #[test]
    fn owner_change_discards_in_flight_result() {
        let mut view: ListView<Account> = ListView::new();
        let for_c1 = view.begin(Some("c1"), 0);
        let _for_c2 = view.begin(Some("c2"), 0);

        let outcome = view.complete(&for_c1, Ok(normalize(accounts(&["a1"]))), 0);
        assert!(outcome.is_stale());
        assert!(view.records().is_empty());
        assert_eq!(view.owner(), Some("c2"));
    }

    #[test]
    fn reset_discards_in_flight_result() {
        let mut view: ListView<Account> = ListView::new();
        let ticket = view.begin(Some("c1"), 0);
        view.reset();
        assert!(view.complete(&ticket, Ok(normalize(accounts(&["a1"]))), 0).is_stale());
        assert_eq!(view.status(), &ViewStatus::Idle);
    }

    #[test]
    fn refresh_bump_discards_in_flight_result() {
        let mut view: ListView<Connection> = ListView::new();
        let ticket = view.begin(None, 4);
        let outcome = view.complete(&ticket, Ok(normalize(json!([{ "id": "c1" }]))), 5);
        assert!(outcome.is_stale());
        assert!(view.needs_refresh(5));
    }

    #[test]
    fn transport_failure_clears_and_reports() {
        let mut view: ListView<Account> = ListView::new();
        let t = view.begin(Some("c1"), 0);
        view.complete(&t, Ok(normalize(accounts(&["a1"]))), 0);

        let t = view.begin(Some("c1"), 0);
        let outcome = view.complete(&t, Err(CoreError::Network("connection refused".into())), 0);
        assert!(matches!(outcome, FetchOutcome::Failed(CoreError::Network(_))));
        assert!(view.records().is_empty());
        assert!(matches!(view.status(), ViewStatus::Failed(msg) if msg.contains("connection refused")));
    }

    #[test]
    fn warnings_travel_with_records() {
        let mut view: ListView<Account> = ListView::new();
        let t = view.begin(Some("c1"), 0);
        let raw = json!([{ "account_id": "a1", "item_id": "c1" }, { "name": "no id" }]);
        view.complete(&t, Ok(normalize(raw)), 0);
        assert_eq!(view.records().len(), 1);
        assert_eq!(view.warnings().len(), 1);
    }

    #[test]
    fn selectable_requires_parent() {
        let mut view: ListView<Account> = ListView::new();
        let t = view.begin(Some("c1"), 0);
        let raw = json!([{ "account_id": "a1", "item_id": "c1" }, { "account_id": "a2" }]);
        view.complete(&t, Ok(normalize(raw)), 0);
        let selectable: Vec<&str> = view.selectable().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(selectable, vec!["a1"]);
    }

    #[test]
    fn needs_refresh_tracks_generation() {
        let mut view: ListView<Connection> = ListView::new();
        assert!(view.needs_refresh(0));
        let t = view.begin(None, 0);
        view.complete(&t, Ok(normalize(json!([]))), 0);
        assert!(!view.needs_refresh(0));
        assert!(view.needs_refresh(1));
    }
}

// ═══════════════════════════════════════════════════════════════════
// ConnectionLifecycleManager — delete
// ═══════════════════════════════════════════════════════════════════

mod lifecycle_delete {
    use super::*;

    #[tokio::test]
    async fn upstream_warning_is_surfaced_and_refresh_advances() {
        let aggregator = Arc::new(MockAggregator::answering(Ok(
            json!({ "warnings": ["identity already absent"] }),
        )));
        let mirror = Arc::new(MockMirror::answering(Ok(vec![])));
        let lifecycle = manager(aggregator.clone(), mirror);
        let mut watcher = lifecycle.refresh_generation().subscribe();
        let before = lifecycle.refresh_generation().current();

        let mut selection = SelectionStateMachine::new();
        let outcome = lifecycle.delete("conn1", &mut selection).await.unwrap();

        assert_eq!(outcome.connection_id, "conn1");
        assert_eq!(outcome.warnings, vec!["identity already absent".to_string()]);
        assert_eq!(lifecycle.refresh_generation().current(), before + 1);
        assert!(watcher.has_changed());
        assert_eq!(watcher.mark_seen(), before + 1);
        assert_eq!(*aggregator.deleted.lock().unwrap(), vec!["conn1".to_string()]);
    }

    #[tokio::test]
    async fn clean_delete_has_no_warnings() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({})))),
            Arc::new(MockMirror::answering(Ok(vec![]))),
        );
        let outcome = lifecycle
            .delete("conn1", &mut SelectionStateMachine::new())
            .await
            .unwrap();
        assert!(!outcome.has_warnings());
    }

    #[tokio::test]
    async fn warnings_from_both_sides_are_deduplicated() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({ "warnings": ["w1", "w2"] })))),
            Arc::new(MockMirror::answering(Ok(vec!["w2".into(), "w3".into()]))),
        );
        let outcome = lifecycle
            .delete("conn1", &mut SelectionStateMachine::new())
            .await
            .unwrap();
        assert_eq!(outcome.warnings, vec!["w1", "w2", "w3"]);
    }

    #[tokio::test]
    async fn upstream_not_found_is_a_warning() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Err(CoreError::NotFound {
                resource: "item".into(),
                id: "conn1".into(),
            }))),
            Arc::new(MockMirror::answering(Ok(vec![]))),
        );
        let outcome = lifecycle
            .delete("conn1", &mut SelectionStateMachine::new())
            .await
            .unwrap();
        assert_eq!(outcome.warnings, vec![ALREADY_ABSENT_UPSTREAM.to_string()]);
        assert_eq!(lifecycle.refresh_generation().current(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_keeps_refresh_generation() {
        let mirror = Arc::new(MockMirror::answering(Ok(vec![])));
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Err(CoreError::Network("timeout".into())))),
            mirror,
        );
        let err = lifecycle
            .delete("conn1", &mut SelectionStateMachine::new())
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(lifecycle.refresh_generation().current(), 0);
    }

    #[tokio::test]
    async fn failed_delete_keeps_selection() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Err(CoreError::Network("timeout".into())))),
            Arc::new(MockMirror::answering(Ok(vec![]))),
        );
        let mut selection = SelectionStateMachine::new();
        selection.select_connection(connection("conn1")).unwrap();

        assert!(lifecycle.delete("conn1", &mut selection).await.is_err());
        assert!(selection.references_connection("conn1"));
        assert_eq!(selection.connection().map(|c| c.id.as_str()), Some("conn1"));
    }

    #[tokio::test]
    async fn mirror_failure_keeps_selection() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({})))),
            Arc::new(MockMirror::answering(Err(CoreError::Persistence("disk full".into())))),
        );
        let mut selection = SelectionStateMachine::new();
        selection.select_connection(connection("conn1")).unwrap();

        assert!(lifecycle.delete("conn1", &mut selection).await.is_err());
        assert!(selection.references_connection("conn1"));
    }

    #[tokio::test]
    async fn mirror_failure_keeps_refresh_generation() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({})))),
            Arc::new(MockMirror::answering(Err(CoreError::Persistence("disk full".into())))),
        );
        let err = lifecycle
            .delete("conn1", &mut SelectionStateMachine::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert_eq!(lifecycle.refresh_generation().current(), 0);
    }

    #[tokio::test]
    async fn selection_of_deleted_connection_is_reset() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({})))),
            Arc::new(MockMirror::answering(Ok(vec![]))),
        );
        let mut selection = SelectionStateMachine::new();
        selection.select_connection(connection("conn1")).unwrap();

        lifecycle.delete("conn1", &mut selection).await.unwrap();
        assert!(selection.is_browsing());
    }

    #[tokio::test]
    async fn selection_of_other_connection_survives() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({})))),
            Arc::new(MockMirror::answering(Ok(vec![]))),
        );
        let mut selection = SelectionStateMachine::new();
        selection.select_connection(connection("conn2")).unwrap();

        lifecycle.delete("conn1", &mut selection).await.unwrap();
        assert!(selection.references_connection("conn2"));
    }

    #[tokio::test]
    async fn blank_id_is_rejected_before_io() {
        let aggregator = Arc::new(MockAggregator::answering(Ok(json!({}))));
        let lifecycle = manager(aggregator.clone(), Arc::new(MockMirror::answering(Ok(vec![]))));
        let err = lifecycle
            .delete(" ", &mut SelectionStateMachine::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(aggregator.deleted.lock().unwrap().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// ConnectionLifecycleManager — create
// ═══════════════════════════════════════════════════════════════════

mod lifecycle_create {
    use super::*;

    #[tokio::test]
    async fn success_persists_tracks_and_refreshes() {
        let aggregator = Arc::new(MockAggregator::answering(Ok(json!({}))));
        let mirror = Arc::new(MockMirror::answering(Ok(vec![])));
        let lifecycle = manager(aggregator.clone(), mirror.clone());

        let created = lifecycle
            .create(SessionResult::Success {
                connection: json!({ "id": "c1", "status": "UPDATING", "connector": { "name": "Banco X" } }),
            })
            .await
            .unwrap();

        assert_eq!(created.id, "c1");
        assert_eq!(mirror.saved.lock().unwrap()[0].id, "c1");
        assert_eq!(*aggregator.tracked.lock().unwrap(), vec!["c1".to_string()]);
        assert_eq!(lifecycle.refresh_generation().current(), 1);
    }

    #[tokio::test]
    async fn session_error_reports_partial_connection() {
        let mirror = Arc::new(MockMirror::answering(Ok(vec![])));
        let lifecycle = manager(Arc::new(MockAggregator::answering(Ok(json!({})))), mirror.clone());

        let err = lifecycle
            .create(SessionResult::Error {
                message: "invalid credentials".into(),
                partial_connection: Some(json!({ "id": "c9" })),
            })
            .await
            .unwrap_err();

        match err {
            CoreError::SessionFailed {
                message,
                partial_connection_id,
            } => {
                assert_eq!(message, "invalid credentials");
                assert_eq!(partial_connection_id.as_deref(), Some("c9"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(mirror.saved.lock().unwrap().is_empty());
        assert_eq!(lifecycle.refresh_generation().current(), 0);
    }

    #[tokio::test]
    async fn session_error_without_partial_connection() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({})))),
            Arc::new(MockMirror::answering(Ok(vec![]))),
        );
        let err = lifecycle
            .create(SessionResult::Error {
                message: "closed".into(),
                partial_connection: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::SessionFailed { partial_connection_id: None, .. }
        ));
    }

    #[tokio::test]
    async fn connection_without_id_is_rejected() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({})))),
            Arc::new(MockMirror::answering(Ok(vec![]))),
        );
        let err = lifecycle
            .create(SessionResult::Success {
                connection: json!({ "status": "UPDATED" }),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(lifecycle.refresh_generation().current(), 0);
    }

    #[tokio::test]
    async fn mirror_write_failure_keeps_refresh_generation() {
        let aggregator = Arc::new(MockAggregator::answering(Ok(json!({}))));
        let lifecycle = manager(aggregator.clone(), Arc::new(MockMirror::failing_saves()));
        let err = lifecycle
            .create(SessionResult::Success {
                connection: json!({ "id": "c1" }),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert!(aggregator.tracked.lock().unwrap().is_empty());
        assert_eq!(lifecycle.refresh_generation().current(), 0);
    }

    #[tokio::test]
    async fn watcher_wakes_on_create() {
        let lifecycle = manager(
            Arc::new(MockAggregator::answering(Ok(json!({})))),
            Arc::new(MockMirror::answering(Ok(vec![]))),
        );
        let mut watcher = lifecycle.refresh_generation().subscribe();
        lifecycle
            .create(SessionResult::Success {
                connection: json!({ "id": "c1" }),
            })
            .await
            .unwrap();
        assert_eq!(watcher.changed().await.unwrap(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// SessionResult payloads
// ═══════════════════════════════════════════════════════════════════

mod session_payloads {
    use super::*;

    #[test]
    fn success_payload() {
        let parsed = SessionResult::from_payload(&json!({ "item": { "id": "c1" } })).unwrap();
        assert_eq!(
            parsed,
            SessionResult::Success {
                connection: json!({ "id": "c1" })
            }
        );
    }

    #[test]
    fn error_payload_with_partial_item() {
        let parsed = SessionResult::from_payload(&json!({
            "message": "login failed",
            "data": { "item": { "id": "c2" } }
        }))
        .unwrap();
        assert!(matches!(
            parsed,
            SessionResult::Error { ref partial_connection, .. } if partial_connection.is_some()
        ));
    }

    #[test]
    fn unrelated_payload() {
        assert!(SessionResult::from_payload(&json!({ "foo": 1 })).is_none());
        assert!(SessionResult::from_payload(&json!("done")).is_none());
    }
}
