// ═══════════════════════════════════════════════════════════════════
// Selection Tests — connection → account → leaf navigation
// ═══════════════════════════════════════════════════════════════════

use serde_json::json;

use finlink_core::errors::CoreError;
use finlink_core::models::account::Account;
use finlink_core::models::connection::Connection;
use finlink_core::models::entity::{CanonicalRecord, EntityKind};
use finlink_core::models::investment::Investment;
use finlink_core::services::selection_service::{
    ConnectionTab, LeafKind, SelectionState, SelectionStateMachine,
};

fn connection(id: &str) -> Connection {
    Connection::from_resolved(json!({ "item_id": id, "connector_name": "Banco X" })).unwrap()
}

fn account(id: &str, connection_id: &str) -> Account {
    Account::from_resolved(json!({ "account_id": id, "item_id": connection_id, "name": "Checking" }))
        .unwrap()
}

fn investment(id: &str) -> Investment {
    Investment::from_resolved(json!({ "investment_id": id, "name": "CDB" })).unwrap()
}

fn at_account(conn: &str, acc: &str) -> SelectionStateMachine {
    let mut sm = SelectionStateMachine::new();
    sm.select_connection(connection(conn)).unwrap();
    sm.select_account(account(acc, conn)).unwrap();
    sm
}

// ═══════════════════════════════════════════════════════════════════
// Connection selection
// ═══════════════════════════════════════════════════════════════════

mod select_connection {
    use super::*;

    #[test]
    fn starts_browsing() {
        let sm = SelectionStateMachine::new();
        assert!(sm.is_browsing());
        assert_eq!(sm.state().depth(), 0);
    }

    #[test]
    fn selects_with_accounts_tab() {
        let mut sm = SelectionStateMachine::new();
        let selected = sm.select_connection(connection("c1")).unwrap();
        assert_eq!(selected.id, "c1");
        assert_eq!(sm.tab(), Some(ConnectionTab::Accounts));
        assert_eq!(sm.state().depth(), 1);
    }

    #[test]
    fn empty_record_never_reaches_connection_selected() {
        let mut sm = SelectionStateMachine::new();
        let err = sm.select_connection_record(&json!({})).unwrap_err();
        assert!(matches!(
            err,
            CoreError::SelectionRejected { kind: EntityKind::Connection, .. }
        ));

        let error = sm.error().expect("error state");
        assert_eq!(error.raw, json!({}));
        assert_eq!(*error.fallback, SelectionState::Browsing);
        assert!(sm.connection().is_none());
        assert!(!matches!(sm.state(), SelectionState::ConnectionSelected { .. }));
    }

    #[test]
    fn blank_id_rejected() {
        let mut sm = SelectionStateMachine::new();
        let mut c = connection("c1");
        c.id = "  ".into();
        assert!(sm.select_connection(c).is_err());
        assert!(sm.error().is_some());
        assert_eq!(sm.state().depth(), 0);
    }

    #[test]
    fn record_with_generic_id_accepted() {
        let mut sm = SelectionStateMachine::new();
        let c = sm
            .select_connection_record(&json!({ "id": "c9", "status": "UPDATED" }))
            .unwrap();
        assert_eq!(c.id, "c9");
    }

    #[test]
    fn reselecting_clears_account() {
        let mut sm = at_account("c1", "a1");
        sm.select_connection(connection("c2")).unwrap();
        assert!(sm.account().is_none());
        assert_eq!(sm.connection().map(|c| c.id.as_str()), Some("c2"));
    }

    #[test]
    fn rejection_keeps_previous_selection_as_fallback() {
        let mut sm = at_account("c1", "a1");
        let _ = sm.select_connection_record(&json!({ "name": "no id" }));
        assert!(sm.error().is_some());
        // A failed connection selection falls back to browsing.
        sm.dismiss_error();
        assert!(sm.is_browsing());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Account selection
// ═══════════════════════════════════════════════════════════════════

mod select_account {
    use super::*;

    #[test]
    fn rejected_while_browsing() {
        let mut sm = SelectionStateMachine::new();
        let err = sm.select_account(account("a1", "c1")).unwrap_err();
        assert!(matches!(err, CoreError::NothingSelected(EntityKind::Connection)));
        assert!(sm.is_browsing());
        assert!(sm.account().is_none());
    }

    #[test]
    fn record_rejected_while_browsing() {
        let mut sm = SelectionStateMachine::new();
        assert!(sm.select_account_record(&json!({ "id": "a1" })).is_err());
        assert!(sm.is_browsing());
    }

    #[test]
    fn selects_with_transactions_leaf() {
        let sm = at_account("c1", "a1");
        assert_eq!(sm.account().map(|a| a.id.as_str()), Some("a1"));
        assert_eq!(sm.leaf(), Some(LeafKind::Transactions));
        assert_eq!(sm.state().depth(), 2);
    }

    #[test]
    fn account_of_other_connection_rejected() {
        let mut sm = SelectionStateMachine::new();
        sm.select_connection(connection("c1")).unwrap();
        let err = sm.select_account(account("a1", "c2")).unwrap_err();
        assert!(matches!(err, CoreError::SelectionRejected { kind: EntityKind::Account, .. }));
        assert!(sm.error().is_some());
        // The connection stays selected underneath.
        assert_eq!(sm.connection().map(|c| c.id.as_str()), Some("c1"));
    }

    #[test]
    fn record_without_id_enters_error_state() {
        let mut sm = SelectionStateMachine::new();
        sm.select_connection(connection("c1")).unwrap();
        let raw = json!({ "name": "Savings" });
        assert!(sm.select_account_record(&raw).is_err());
        let error = sm.error().unwrap();
        assert_eq!(error.kind, EntityKind::Account);
        assert_eq!(error.raw, raw);
        assert_eq!(error.fallback.depth(), 1);
    }

    #[test]
    fn switching_accounts_within_connection() {
        let mut sm = at_account("c1", "a1");
        sm.select_leaf(LeafKind::Bills).unwrap();
        sm.select_account(account("a2", "c1")).unwrap();
        assert_eq!(sm.account().map(|a| a.id.as_str()), Some("a2"));
        assert_eq!(sm.leaf(), Some(LeafKind::Transactions));
    }

    #[test]
    fn account_without_parent_is_accepted() {
        let mut sm = SelectionStateMachine::new();
        sm.select_connection(connection("c1")).unwrap();
        let orphan = Account::from_resolved(json!({ "account_id": "a1" })).unwrap();
        assert!(!orphan.is_selectable());
        assert!(sm.select_account(orphan).is_ok());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Tabs, leaves, investments
// ═══════════════════════════════════════════════════════════════════

mod tabs_and_leaves {
    use super::*;

    #[test]
    fn tab_switch_requires_connection_level() {
        let mut sm = SelectionStateMachine::new();
        assert!(sm.select_tab(ConnectionTab::Identity).is_err());
        sm.select_connection(connection("c1")).unwrap();
        sm.select_tab(ConnectionTab::Identity).unwrap();
        assert_eq!(sm.tab(), Some(ConnectionTab::Identity));
    }

    #[test]
    fn leaf_switch_requires_account() {
        let mut sm = SelectionStateMachine::new();
        sm.select_connection(connection("c1")).unwrap();
        assert!(sm.select_leaf(LeafKind::Loans).is_err());
    }

    #[test]
    fn investment_only_under_investments_leaf() {
        let mut sm = at_account("c1", "a1");
        assert!(sm.select_investment(investment("i1")).is_err());

        sm.select_leaf(LeafKind::Investments).unwrap();
        sm.select_investment(investment("i1")).unwrap();
        assert_eq!(sm.investment().map(|i| i.id.as_str()), Some("i1"));
        assert_eq!(sm.state().depth(), 3);

        sm.select_leaf(LeafKind::Loans).unwrap();
        assert!(sm.investment().is_none());
    }

    #[test]
    fn leaf_kinds_map_to_entities() {
        assert_eq!(LeafKind::Bills.entity_kind(), EntityKind::CreditCardBill);
        assert_eq!(LeafKind::ALL.len(), 4);
    }
}

// ═══════════════════════════════════════════════════════════════════
// back / reset
// ═══════════════════════════════════════════════════════════════════

mod navigation {
    use super::*;

    #[test]
    fn back_walks_up_one_level_at_a_time() {
        let mut sm = at_account("c1", "a1");
        sm.select_leaf(LeafKind::Investments).unwrap();
        sm.select_investment(investment("i1")).unwrap();

        sm.back();
        assert!(sm.investment().is_none());
        assert_eq!(sm.account().map(|a| a.id.as_str()), Some("a1"));

        sm.back();
        assert!(sm.account().is_none());
        assert_eq!(sm.tab(), Some(ConnectionTab::Accounts));

        sm.back();
        assert!(sm.is_browsing());

        sm.back();
        assert!(sm.is_browsing());
    }

    #[test]
    fn back_from_error_returns_to_fallback() {
        let mut sm = SelectionStateMachine::new();
        sm.select_connection(connection("c1")).unwrap();
        let _ = sm.select_account_record(&json!({}));
        sm.back();
        assert!(sm.error().is_none());
        assert_eq!(sm.state().depth(), 1);
    }

    #[test]
    fn reset_from_anywhere() {
        let mut sm = at_account("c1", "a1");
        sm.reset();
        assert!(sm.is_browsing());

        let _ = sm.select_connection_record(&json!(null));
        sm.reset();
        assert!(sm.is_browsing());
    }

    #[test]
    fn machine_is_reusable() {
        let mut sm = SelectionStateMachine::new();
        for round in 0..3 {
            let conn = format!("c{round}");
            sm.select_connection(connection(&conn)).unwrap();
            sm.select_account(account("a", &conn)).unwrap();
            sm.reset();
        }
        assert!(sm.is_browsing());
    }

    #[test]
    fn references() {
        let sm = at_account("c1", "a1");
        assert!(sm.references_connection("c1"));
        assert!(sm.references_account("a1"));
        assert!(!sm.references_connection("c2"));
    }
}
