use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::connection::Connection;
use crate::models::entity::{id_text, EntityKind, GENERIC_ID_FIELD};
use crate::models::transaction::Transaction;
use crate::services::pagination_service::PageCursor;

use super::backend::ALREADY_ABSENT_IN_MIRROR;
use super::traits::{LeafScope, MirrorStore, RecordSource};

const PROVIDER: &str = "InMemoryMirror";

/// Warning recorded when a deleted connection had no identity row.
pub const IDENTITY_ALREADY_ABSENT: &str = "identity data was already absent";

const CONNECTION_KEYS: [&str; 2] = ["item_id", "itemId"];
const ACCOUNT_KEYS: [&str; 2] = ["account_id", "accountId"];
const INVESTMENT_KEYS: [&str; 2] = ["investment_id", "investmentId"];

#[derive(Debug, Default)]
struct Tables {
    connections: Vec<Value>,
    accounts: Vec<Value>,
    transactions: Vec<Value>,
    identities: Vec<Value>,
    investments: Vec<Value>,
    investment_transactions: Vec<Value>,
    loans: Vec<Value>,
    bills: Vec<Value>,
}

impl Tables {
    fn table_mut(&mut self, kind: EntityKind) -> &mut Vec<Value> {
        match kind {
            EntityKind::Connection => &mut self.connections,
            EntityKind::Account => &mut self.accounts,
            EntityKind::Transaction => &mut self.transactions,
            EntityKind::Identity => &mut self.identities,
            EntityKind::Investment => &mut self.investments,
            EntityKind::InvestmentTransaction => &mut self.investment_transactions,
            EntityKind::Loan => &mut self.loans,
            EntityKind::CreditCardBill => &mut self.bills,
        }
    }

    fn table(&self, kind: EntityKind) -> &[Value] {
        match kind {
            EntityKind::Connection => &self.connections,
            EntityKind::Account => &self.accounts,
            EntityKind::Transaction => &self.transactions,
            EntityKind::Identity => &self.identities,
            EntityKind::Investment => &self.investments,
            EntityKind::InvestmentTransaction => &self.investment_transactions,
            EntityKind::Loan => &self.loans,
            EntityKind::CreditCardBill => &self.bills,
        }
    }
}

/// Process-local mirror store.
///
/// Holds rows exactly as inserted, answers reads in the backend's shapes
/// and performs the cascading delete. Used when no backend is reachable
/// and by tests.
#[derive(Debug, Default)]
pub struct InMemoryMirrorStore {
    tables: RwLock<Tables>,
}

impl InMemoryMirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace rows of `kind`, matched on their id.
    pub fn upsert<I>(&self, kind: EntityKind, rows: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let table = tables.table_mut(kind);
        for row in rows {
            match row_id(&row, kind) {
                Some(id) => {
                    let existing = table
                        .iter_mut()
                        .find(|r| row_id(r, kind).as_deref() == Some(id.as_str()));
                    if let Some(existing) = existing {
                        *existing = row;
                    } else {
                        table.push(row);
                    }
                }
                None => table.push(row),
            }
        }
    }

    /// Number of rows of `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .table(kind)
            .len()
    }

    fn select(&self, kind: EntityKind, keys: &[&str], owner: &str) -> Vec<Value> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .table(kind)
            .iter()
            .filter(|row| field_matches(row, keys, owner))
            .cloned()
            .collect()
    }

    /// Investments and loans hang off a connection, sometimes off an account too.
    fn select_scoped(&self, kind: EntityKind, scope: &LeafScope) -> Vec<Value> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .table(kind)
            .iter()
            .filter(|row| match row_text(row, &ACCOUNT_KEYS) {
                Some(account) => account == scope.account_id,
                None => field_matches(row, &CONNECTION_KEYS, &scope.connection_id),
            })
            .cloned()
            .collect()
    }
}

fn row_text(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| row.get(*k).and_then(id_text))
}

fn field_matches(row: &Value, keys: &[&str], wanted: &str) -> bool {
    row_text(row, keys).is_some_and(|v| v == wanted)
}

fn row_id(row: &Value, kind: EntityKind) -> Option<String> {
    row.get(kind.id_field())
        .and_then(id_text)
        .or_else(|| row.get(GENERIC_ID_FIELD).and_then(id_text))
}

fn slice(rows: Vec<Value>, cursor: PageCursor) -> Vec<Value> {
    rows.into_iter()
        .skip(cursor.start())
        .take(cursor.size())
        .collect()
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RecordSource for InMemoryMirrorStore {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list_connections(&self) -> Result<Value, CoreError> {
        let rows = self
            .tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .connections
            .clone();
        Ok(Value::Array(rows))
    }

    async fn get_accounts(&self, connection_id: &str) -> Result<Value, CoreError> {
        let rows = self.select(EntityKind::Account, &CONNECTION_KEYS, connection_id);
        Ok(json!({ "results": rows }))
    }

    async fn get_transactions(
        &self,
        account_id: &str,
        page: PageCursor,
    ) -> Result<Value, CoreError> {
        let rows = self.select(EntityKind::Transaction, &ACCOUNT_KEYS, account_id);
        Ok(json!({ "transactions": slice(rows, page) }))
    }

    async fn get_identity(&self, connection_id: &str) -> Result<Value, CoreError> {
        self.select(EntityKind::Identity, &CONNECTION_KEYS, connection_id)
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NotFound {
                resource: "identity".into(),
                id: connection_id.to_string(),
            })
    }

    async fn get_investments(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        Ok(Value::Array(self.select_scoped(EntityKind::Investment, scope)))
    }

    async fn get_investment_transactions(
        &self,
        investment_id: &str,
        page: PageCursor,
    ) -> Result<Value, CoreError> {
        let rows = self.select(
            EntityKind::InvestmentTransaction,
            &INVESTMENT_KEYS,
            investment_id,
        );
        Ok(Value::Array(slice(rows, page)))
    }

    async fn get_loans(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        Ok(json!({ "loans": self.select_scoped(EntityKind::Loan, scope) }))
    }

    async fn get_bills(&self, scope: &LeafScope) -> Result<Value, CoreError> {
        let rows = self.select(EntityKind::CreditCardBill, &ACCOUNT_KEYS, &scope.account_id);
        Ok(Value::Array(rows))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MirrorStore for InMemoryMirrorStore {
    async fn save_connection(&self, connection: &Connection) -> Result<(), CoreError> {
        let row = serde_json::to_value(connection)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.upsert(EntityKind::Connection, [row]);
        debug!(connection_id = %connection.id, "Connection row stored");
        Ok(())
    }

    async fn save_transactions(
        &self,
        account_id: &str,
        transactions: &[Transaction],
    ) -> Result<(), CoreError> {
        let mut rows = Vec::with_capacity(transactions.len());
        for t in transactions {
            let mut row =
                serde_json::to_value(t).map_err(|e| CoreError::Serialization(e.to_string()))?;
            if let Some(obj) = row.as_object_mut() {
                obj.entry("account_id")
                    .or_insert_with(|| Value::String(account_id.to_string()));
            }
            rows.push(row);
        }
        self.upsert(EntityKind::Transaction, rows);
        Ok(())
    }

    async fn delete_by_connection(&self, connection_id: &str) -> Result<Vec<String>, CoreError> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let mut warnings = Vec::new();

        let before = tables.connections.len();
        tables
            .connections
            .retain(|row| row_id(row, EntityKind::Connection).as_deref() != Some(connection_id));
        if tables.connections.len() == before {
            warnings.push(ALREADY_ABSENT_IN_MIRROR.to_string());
        }

        let account_ids: HashSet<String> = tables
            .accounts
            .iter()
            .filter(|row| field_matches(row, &CONNECTION_KEYS, connection_id))
            .filter_map(|row| row_id(row, EntityKind::Account))
            .collect();
        tables
            .accounts
            .retain(|row| !field_matches(row, &CONNECTION_KEYS, connection_id));

        let owned_by_account =
            |row: &Value| row_text(row, &ACCOUNT_KEYS).is_some_and(|a| account_ids.contains(&a));
        let owned_by_connection = |row: &Value| field_matches(row, &CONNECTION_KEYS, connection_id);

        tables.transactions.retain(|row| !owned_by_account(row));
        tables.bills.retain(|row| !owned_by_account(row));

        let investment_ids: HashSet<String> = tables
            .investments
            .iter()
            .filter(|row| owned_by_connection(row) || owned_by_account(row))
            .filter_map(|row| row_id(row, EntityKind::Investment))
            .collect();
        tables
            .investments
            .retain(|row| !(owned_by_connection(row) || owned_by_account(row)));
        tables.investment_transactions.retain(|row| {
            !row_text(row, &INVESTMENT_KEYS).is_some_and(|i| investment_ids.contains(&i))
        });
        tables
            .loans
            .retain(|row| !(owned_by_connection(row) || owned_by_account(row)));

        let identities = tables.identities.len();
        tables.identities.retain(|row| !owned_by_connection(row));
        if tables.identities.len() == identities {
            warnings.push(IDENTITY_ALREADY_ABSENT.to_string());
        }

        info!(
            %connection_id,
            accounts = account_ids.len(),
            investments = investment_ids.len(),
            warnings = warnings.len(),
            "Mirror rows deleted"
        );
        Ok(warnings)
    }
}
