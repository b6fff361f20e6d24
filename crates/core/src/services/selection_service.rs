use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::account::Account;
use crate::models::connection::Connection;
use crate::models::entity::{CanonicalRecord, EntityKind};
use crate::models::investment::Investment;
use crate::normalize::resolve_id;

/// Sub-tab shown while a connection is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionTab {
    #[default]
    Accounts,
    Identity,
}

/// Detail list shown while an account is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LeafKind {
    #[default]
    Transactions,
    Investments,
    Loans,
    Bills,
}

impl LeafKind {
    pub const ALL: [LeafKind; 4] = [
        LeafKind::Transactions,
        LeafKind::Investments,
        LeafKind::Loans,
        LeafKind::Bills,
    ];

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            LeafKind::Transactions => EntityKind::Transaction,
            LeafKind::Investments => EntityKind::Investment,
            LeafKind::Loans => EntityKind::Loan,
            LeafKind::Bills => EntityKind::CreditCardBill,
        }
    }
}

/// A selection that could not be completed, kept for diagnostic display.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionError {
    pub kind: EntityKind,
    pub reason: String,
    /// The record exactly as it was offered.
    pub raw: Value,
    /// State to return to once the error is dismissed.
    pub fallback: Box<SelectionState>,
}

/// Navigation depth and the entities selected along the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Browsing,
    ConnectionSelected {
        connection: Connection,
        tab: ConnectionTab,
    },
    AccountSelected {
        connection: Connection,
        account: Account,
        leaf: LeafKind,
        /// Drill-down into one investment while the Investments leaf is active.
        investment: Option<Investment>,
    },
    SelectionError(SelectionError),
}

impl SelectionState {
    /// 0 = browsing connections, 1 = connection, 2 = account, 3 = investment.
    /// An error state reports the depth of its fallback.
    pub fn depth(&self) -> usize {
        match self {
            SelectionState::Browsing => 0,
            SelectionState::ConnectionSelected { .. } => 1,
            SelectionState::AccountSelected {
                investment: None, ..
            } => 2,
            SelectionState::AccountSelected { .. } => 3,
            SelectionState::SelectionError(e) => e.fallback.depth(),
        }
    }
}

/// Connection → account → leaf navigation.
///
/// Every selection requires a non-empty identifier. A selection that fails
/// moves the machine into `SelectionError` (never silently dropped); the
/// error keeps the state to fall back to. No state is terminal.
#[derive(Debug, Clone, Default)]
pub struct SelectionStateMachine {
    state: SelectionState,
}

impl SelectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_browsing(&self) -> bool {
        self.state == SelectionState::Browsing
    }

    pub fn error(&self) -> Option<&SelectionError> {
        match &self.state {
            SelectionState::SelectionError(e) => Some(e),
            _ => None,
        }
    }

    pub fn connection(&self) -> Option<&Connection> {
        match self.effective() {
            SelectionState::ConnectionSelected { connection, .. }
            | SelectionState::AccountSelected { connection, .. } => Some(connection),
            _ => None,
        }
    }

    pub fn account(&self) -> Option<&Account> {
        match self.effective() {
            SelectionState::AccountSelected { account, .. } => Some(account),
            _ => None,
        }
    }

    pub fn investment(&self) -> Option<&Investment> {
        match self.effective() {
            SelectionState::AccountSelected { investment, .. } => investment.as_ref(),
            _ => None,
        }
    }

    pub fn tab(&self) -> Option<ConnectionTab> {
        match self.effective() {
            SelectionState::ConnectionSelected { tab, .. } => Some(*tab),
            _ => None,
        }
    }

    pub fn leaf(&self) -> Option<LeafKind> {
        match self.effective() {
            SelectionState::AccountSelected { leaf, .. } => Some(*leaf),
            _ => None,
        }
    }

    // ── Transitions ─────────────────────────────────────────────────

    /// Select a connection from any state. Clears any account selection.
    pub fn select_connection(&mut self, connection: Connection) -> Result<&Connection, CoreError> {
        if connection.id.trim().is_empty() {
            let raw = serde_json::to_value(&connection).unwrap_or(Value::Null);
            return Err(self.reject(
                EntityKind::Connection,
                "missing identifier",
                raw,
                SelectionState::Browsing,
            ));
        }

        debug!(connection_id = %connection.id, "Connection selected");
        self.state = SelectionState::ConnectionSelected {
            connection,
            tab: ConnectionTab::default(),
        };
        self.connection()
            .ok_or(CoreError::NothingSelected(EntityKind::Connection))
    }

    /// Select a connection straight from an upstream record.
    pub fn select_connection_record(&mut self, raw: &Value) -> Result<&Connection, CoreError> {
        let decoded = resolve_id(raw.clone(), EntityKind::Connection)
            .map_err(|_| "missing identifier".to_string())
            .and_then(|resolved| Connection::from_resolved(resolved).map_err(|e| e.to_string()));

        match decoded {
            Ok(connection) => self.select_connection(connection),
            Err(reason) => Err(self.reject(
                EntityKind::Connection,
                &reason,
                raw.clone(),
                SelectionState::Browsing,
            )),
        }
    }

    /// Select an account of the selected connection.
    ///
    /// Without a selected connection the call is refused and the state is
    /// left unchanged.
    pub fn select_account(&mut self, account: Account) -> Result<&Account, CoreError> {
        let base = self.effective().clone();
        let connection = match &base {
            SelectionState::ConnectionSelected { connection, .. }
            | SelectionState::AccountSelected { connection, .. } => connection.clone(),
            _ => {
                warn!(account_id = %account.id, "Account selected while no connection is selected");
                return Err(CoreError::NothingSelected(EntityKind::Connection));
            }
        };

        if account.id.trim().is_empty() {
            let raw = serde_json::to_value(&account).unwrap_or(Value::Null);
            return Err(self.reject(EntityKind::Account, "missing identifier", raw, base));
        }

        if let Some(parent) = account.connection_id.as_deref() {
            if parent != connection.id {
                let raw = serde_json::to_value(&account).unwrap_or(Value::Null);
                let reason = format!(
                    "belongs to connection {parent}, not the selected {}",
                    connection.id
                );
                return Err(self.reject(EntityKind::Account, &reason, raw, base));
            }
        }

        debug!(account_id = %account.id, connection_id = %connection.id, "Account selected");
        self.state = SelectionState::AccountSelected {
            connection,
            account,
            leaf: LeafKind::default(),
            investment: None,
        };
        self.account()
            .ok_or(CoreError::NothingSelected(EntityKind::Account))
    }

    /// Select an account straight from an upstream record.
    pub fn select_account_record(&mut self, raw: &Value) -> Result<&Account, CoreError> {
        if self.connection().is_none() {
            return Err(CoreError::NothingSelected(EntityKind::Connection));
        }
        let decoded = resolve_id(raw.clone(), EntityKind::Account)
            .map_err(|_| "missing identifier".to_string())
            .and_then(|resolved| Account::from_resolved(resolved).map_err(|e| e.to_string()));

        match decoded {
            Ok(account) => self.select_account(account),
            Err(reason) => {
                let base = self.effective().clone();
                Err(self.reject(EntityKind::Account, &reason, raw.clone(), base))
            }
        }
    }

    /// Switch between the Accounts and Identity tabs of a connection.
    pub fn select_tab(&mut self, tab: ConnectionTab) -> Result<(), CoreError> {
        self.dismiss_error();
        match &mut self.state {
            SelectionState::ConnectionSelected { tab: current, .. } => {
                *current = tab;
                Ok(())
            }
            _ => Err(CoreError::NothingSelected(EntityKind::Connection)),
        }
    }

    /// Switch the leaf list of the selected account. Leaves any investment.
    pub fn select_leaf(&mut self, leaf: LeafKind) -> Result<(), CoreError> {
        self.dismiss_error();
        match &mut self.state {
            SelectionState::AccountSelected {
                leaf: current,
                investment,
                ..
            } => {
                *current = leaf;
                *investment = None;
                Ok(())
            }
            _ => Err(CoreError::NothingSelected(EntityKind::Account)),
        }
    }

    /// Drill into one investment. Only valid while the Investments leaf is shown.
    pub fn select_investment(&mut self, selected: Investment) -> Result<&Investment, CoreError> {
        let base = self.effective().clone();
        if !matches!(
            base,
            SelectionState::AccountSelected {
                leaf: LeafKind::Investments,
                ..
            }
        ) {
            return Err(CoreError::NothingSelected(EntityKind::Account));
        }

        if selected.id.trim().is_empty() {
            let raw = serde_json::to_value(&selected).unwrap_or(Value::Null);
            return Err(self.reject(EntityKind::Investment, "missing identifier", raw, base));
        }

        self.state = base;
        if let SelectionState::AccountSelected { investment, .. } = &mut self.state {
            debug!(investment_id = %selected.id, "Investment selected");
            *investment = Some(selected);
        }
        self.investment()
            .ok_or(CoreError::NothingSelected(EntityKind::Investment))
    }

    /// Go up one level. From an error, return to its fallback.
    pub fn back(&mut self) {
        let current = std::mem::take(&mut self.state);
        self.state = match current {
            SelectionState::Browsing => SelectionState::Browsing,
            SelectionState::ConnectionSelected { .. } => SelectionState::Browsing,
            SelectionState::AccountSelected {
                connection,
                account,
                leaf,
                investment: Some(_),
            } => SelectionState::AccountSelected {
                connection,
                account,
                leaf,
                investment: None,
            },
            SelectionState::AccountSelected { connection, .. } => {
                SelectionState::ConnectionSelected {
                    connection,
                    tab: ConnectionTab::Accounts,
                }
            }
            SelectionState::SelectionError(e) => *e.fallback,
        };
        debug!(depth = self.state.depth(), "Navigated back");
    }

    /// Force `Browsing` from any state.
    pub fn reset(&mut self) {
        self.state = SelectionState::Browsing;
    }

    /// Leave the error state, if any, for its fallback.
    pub fn dismiss_error(&mut self) {
        if let SelectionState::SelectionError(e) = &self.state {
            self.state = (*e.fallback).clone();
        }
    }

    /// Whether the selection (or its fallback) points at this connection.
    pub fn references_connection(&self, connection_id: &str) -> bool {
        self.connection().is_some_and(|c| c.id == connection_id)
    }

    pub fn references_account(&self, account_id: &str) -> bool {
        self.account().is_some_and(|a| a.id == account_id)
    }

    // ── Internal ────────────────────────────────────────────────────

    /// The state selections build on: the fallback while an error is shown.
    fn effective(&self) -> &SelectionState {
        match &self.state {
            SelectionState::SelectionError(e) => &e.fallback,
            other => other,
        }
    }

    fn reject(
        &mut self,
        kind: EntityKind,
        reason: &str,
        raw: Value,
        fallback: SelectionState,
    ) -> CoreError {
        warn!(%kind, %reason, "Selection rejected");
        self.state = SelectionState::SelectionError(SelectionError {
            kind,
            reason: reason.to_string(),
            raw,
            fallback: Box::new(fallback),
        });
        CoreError::SelectionRejected {
            kind,
            reason: reason.to_string(),
        }
    }
}
