pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod services;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use errors::CoreError;
use models::{
    account::Account,
    bill::CreditCardBill,
    connection::Connection,
    entity::{CanonicalRecord, EntityKind},
    identity::Identity,
    investment::{Investment, InvestmentTransaction},
    loan::Loan,
    session::{ConnectToken, SessionResult},
    settings::{DataSource, Settings},
    transaction::Transaction,
};
use normalize::normalize;
use providers::{
    backend::BackendClient,
    pluggy::PluggyClient,
    traits::{AggregatorClient, LeafScope, MirrorStore, RecordSource, SessionProvider},
};
use services::{
    fetch_service::{FetchOutcome, FetchTicket, ListView},
    lifecycle_service::{ConnectionLifecycleManager, DeleteOutcome, RefreshGeneration, RefreshWatcher},
    pagination_service::{PageCursor, PaginationController},
    selection_service::{ConnectionTab, LeafKind, SelectionStateMachine},
};

/// A list view of the navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewTarget {
    Connections,
    Accounts,
    Identity,
    Transactions,
    Investments,
    InvestmentTransactions,
    Loans,
    Bills,
}

impl ViewTarget {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            ViewTarget::Connections => EntityKind::Connection,
            ViewTarget::Accounts => EntityKind::Account,
            ViewTarget::Identity => EntityKind::Identity,
            ViewTarget::Transactions => EntityKind::Transaction,
            ViewTarget::Investments => EntityKind::Investment,
            ViewTarget::InvestmentTransactions => EntityKind::InvestmentTransaction,
            ViewTarget::Loans => EntityKind::Loan,
            ViewTarget::Bills => EntityKind::CreditCardBill,
        }
    }
}

impl From<LeafKind> for ViewTarget {
    fn from(leaf: LeafKind) -> Self {
        match leaf {
            LeafKind::Transactions => ViewTarget::Transactions,
            LeafKind::Investments => ViewTarget::Investments,
            LeafKind::Loans => ViewTarget::Loans,
            LeafKind::Bills => ViewTarget::Bills,
        }
    }
}

/// The paginated leaf lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pager {
    /// Offset/limit.
    Transactions,
    /// Page number/page size.
    InvestmentTransactions,
}

#[derive(Debug, Clone)]
enum FetchRequest {
    Connections,
    Accounts { connection_id: String },
    Identity { connection_id: String },
    Transactions { account_id: String, cursor: PageCursor },
    Investments(LeafScope),
    InvestmentTransactions { investment_id: String, cursor: PageCursor },
    Loans(LeafScope),
    Bills(LeafScope),
}

/// A fetch that has been registered with its view but not yet sent.
///
/// Holds everything it needs, so it can run while the `FinLink` is
/// borrowed elsewhere.
pub struct PendingFetch {
    target: ViewTarget,
    ticket: FetchTicket,
    request: FetchRequest,
    source: Arc<dyn RecordSource>,
}

impl std::fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFetch")
            .field("target", &self.target)
            .field("ticket", &self.ticket)
            .field("request", &self.request)
            .field("source", &self.source.name())
            .finish()
    }
}

impl PendingFetch {
    pub fn target(&self) -> ViewTarget {
        self.target
    }

    pub fn ticket(&self) -> &FetchTicket {
        &self.ticket
    }

    /// Perform the request. A missing identity reads as an empty list.
    pub async fn run(self) -> CompletedFetch {
        let source = &self.source;
        let result = match &self.request {
            FetchRequest::Connections => source.list_connections().await,
            FetchRequest::Accounts { connection_id } => source.get_accounts(connection_id).await,
            FetchRequest::Identity { connection_id } => {
                match source.get_identity(connection_id).await {
                    Err(e) if e.is_not_found() => {
                        debug!(%connection_id, "No identity on file");
                        Ok(Value::Array(Vec::new()))
                    }
                    other => other,
                }
            }
            FetchRequest::Transactions { account_id, cursor } => {
                source.get_transactions(account_id, *cursor).await
            }
            FetchRequest::Investments(scope) => source.get_investments(scope).await,
            FetchRequest::InvestmentTransactions {
                investment_id,
                cursor,
            } => {
                source
                    .get_investment_transactions(investment_id, *cursor)
                    .await
            }
            FetchRequest::Loans(scope) => source.get_loans(scope).await,
            FetchRequest::Bills(scope) => source.get_bills(scope).await,
        };

        CompletedFetch {
            target: self.target,
            ticket: self.ticket,
            result,
        }
    }
}

/// A raw payload (or transport error) waiting to be applied to its view.
#[derive(Debug)]
pub struct CompletedFetch {
    target: ViewTarget,
    ticket: FetchTicket,
    result: Result<Value, CoreError>,
}

impl CompletedFetch {
    pub fn target(&self) -> ViewTarget {
        self.target
    }
}

/// Main entry point: navigation over linked connections and their data.
/// Holds the selection, one list view per level and the collaborators
/// that feed them.
#[must_use]
pub struct FinLink {
    settings: Settings,
    live: Arc<dyn RecordSource>,
    mirror: Arc<dyn RecordSource>,
    mirror_store: Arc<dyn MirrorStore>,
    sessions: Option<Arc<dyn SessionProvider>>,
    lifecycle: ConnectionLifecycleManager,
    refresh: RefreshGeneration,
    selection: SelectionStateMachine,
    connections: ListView<Connection>,
    accounts: ListView<Account>,
    identity: ListView<Identity>,
    transactions: ListView<Transaction>,
    investments: ListView<Investment>,
    investment_transactions: ListView<InvestmentTransaction>,
    loans: ListView<Loan>,
    bills: ListView<CreditCardBill>,
    transactions_pager: PaginationController,
    investment_transactions_pager: PaginationController,
}

impl std::fmt::Debug for FinLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinLink")
            .field("data_source", &self.settings.data_source)
            .field("selection_depth", &self.selection.state().depth())
            .field("connections", &self.connections.records().len())
            .field("refresh_generation", &self.refresh.current())
            .finish()
    }
}

impl FinLink {
    /// Wire the facade to an aggregator and a mirror store.
    pub fn new<A, M>(settings: Settings, aggregator: Arc<A>, mirror: Arc<M>) -> Self
    where
        A: AggregatorClient + 'static,
        M: MirrorStore + 'static,
    {
        let refresh = RefreshGeneration::new();
        let aggregator_client: Arc<dyn AggregatorClient> = aggregator.clone();
        let mirror_store: Arc<dyn MirrorStore> = mirror.clone();
        let live: Arc<dyn RecordSource> = aggregator;
        let mirror: Arc<dyn RecordSource> = mirror;

        let lifecycle =
            ConnectionLifecycleManager::new(aggregator_client, mirror_store.clone(), refresh.clone());

        Self {
            transactions_pager: PaginationController::offset(settings.transactions_page_limit),
            investment_transactions_pager: PaginationController::page_number(
                settings.investment_transactions_page_size,
            ),
            settings,
            live,
            mirror,
            mirror_store,
            sessions: None,
            lifecycle,
            refresh,
            selection: SelectionStateMachine::new(),
            connections: ListView::new(),
            accounts: ListView::new(),
            identity: ListView::new(),
            transactions: ListView::new(),
            investments: ListView::new(),
            investment_transactions: ListView::new(),
            loans: ListView::new(),
            bills: ListView::new(),
        }
    }

    /// Pluggy for live reads, the backend for the mirror and connect tokens.
    pub fn from_settings(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let aggregator = Arc::new(PluggyClient::new(&settings));
        let backend = Arc::new(BackendClient::new(&settings));
        let sessions: Arc<dyn SessionProvider> = backend.clone();
        Ok(Self::new(settings, aggregator, backend).with_session_provider(sessions))
    }

    pub fn with_session_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.sessions = Some(provider);
        self
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn data_source(&self) -> DataSource {
        self.settings.data_source
    }

    /// Switch where list views read from. Loaded views are dropped.
    pub fn set_data_source(&mut self, data_source: DataSource) {
        if self.settings.data_source == data_source {
            return;
        }
        info!(?data_source, "Switching data source");
        self.settings.data_source = data_source;
        self.connections.reset();
        self.accounts.reset();
        self.identity.reset();
        self.reset_leaf_views();
    }

    fn source(&self) -> Arc<dyn RecordSource> {
        match self.settings.data_source {
            DataSource::Live => Arc::clone(&self.live),
            DataSource::Mirror => Arc::clone(&self.mirror),
        }
    }

    // ── Fetching ────────────────────────────────────────────────────

    /// Register a fetch for `target` against the current selection.
    ///
    /// Views below the selection cannot be fetched: `NothingSelected`.
    pub fn begin(&mut self, target: ViewTarget) -> Result<PendingFetch, CoreError> {
        let refresh = self.refresh.current();
        let source = self.source();

        let (ticket, request) = match target {
            ViewTarget::Connections => {
                (self.connections.begin(None, refresh), FetchRequest::Connections)
            }
            ViewTarget::Accounts => {
                let connection_id = self.selected_connection_id()?;
                let ticket = self.accounts.begin(Some(&connection_id), refresh);
                (ticket, FetchRequest::Accounts { connection_id })
            }
            ViewTarget::Identity => {
                let connection_id = self.selected_connection_id()?;
                let ticket = self.identity.begin(Some(&connection_id), refresh);
                (ticket, FetchRequest::Identity { connection_id })
            }
            ViewTarget::Transactions => {
                let scope = self.selected_scope()?;
                self.transactions_pager.set_owner(Some(&scope.account_id));
                let cursor = self.transactions_pager.cursor();
                let ticket = self.transactions.begin(Some(&scope.account_id), refresh);
                let request = FetchRequest::Transactions {
                    account_id: scope.account_id,
                    cursor,
                };
                (ticket, request)
            }
            ViewTarget::Investments => {
                let scope = self.selected_scope()?;
                let ticket = self.investments.begin(Some(&scope.account_id), refresh);
                (ticket, FetchRequest::Investments(scope))
            }
            ViewTarget::InvestmentTransactions => {
                let investment_id = self
                    .selection
                    .investment()
                    .map(|i| i.id.clone())
                    .ok_or(CoreError::NothingSelected(EntityKind::Investment))?;
                self.investment_transactions_pager
                    .set_owner(Some(&investment_id));
                let cursor = self.investment_transactions_pager.cursor();
                let ticket = self
                    .investment_transactions
                    .begin(Some(&investment_id), refresh);
                let request = FetchRequest::InvestmentTransactions {
                    investment_id,
                    cursor,
                };
                (ticket, request)
            }
            ViewTarget::Loans => {
                let scope = self.selected_scope()?;
                let ticket = self.loans.begin(Some(&scope.account_id), refresh);
                (ticket, FetchRequest::Loans(scope))
            }
            ViewTarget::Bills => {
                let scope = self.selected_scope()?;
                let ticket = self.bills.begin(Some(&scope.account_id), refresh);
                (ticket, FetchRequest::Bills(scope))
            }
        };

        debug!(?target, source = source.name(), "Fetch started");
        Ok(PendingFetch {
            target,
            ticket,
            request,
            source,
        })
    }

    /// Normalize a completed fetch into its view, unless it went stale.
    pub fn apply(&mut self, completed: CompletedFetch) -> FetchOutcome {
        let refresh = self.refresh.current();
        let CompletedFetch {
            target,
            ticket,
            result,
        } = completed;

        let outcome = match target {
            ViewTarget::Connections => settle(&mut self.connections, &ticket, result, refresh),
            ViewTarget::Accounts => settle(&mut self.accounts, &ticket, result, refresh),
            ViewTarget::Identity => settle(&mut self.identity, &ticket, result, refresh),
            ViewTarget::Transactions => settle(&mut self.transactions, &ticket, result, refresh),
            ViewTarget::Investments => settle(&mut self.investments, &ticket, result, refresh),
            ViewTarget::InvestmentTransactions => {
                settle(&mut self.investment_transactions, &ticket, result, refresh)
            }
            ViewTarget::Loans => settle(&mut self.loans, &ticket, result, refresh),
            ViewTarget::Bills => settle(&mut self.bills, &ticket, result, refresh),
        };

        if let FetchOutcome::Failed(e) = &outcome {
            warn!(?target, error = %e, "Fetch failed");
        }
        outcome
    }

    /// `begin`, `run` and `apply` in one go.
    pub async fn load(&mut self, target: ViewTarget) -> Result<FetchOutcome, CoreError> {
        let pending = self.begin(target)?;
        let completed = pending.run().await;
        Ok(self.apply(completed))
    }

    /// Whether the connection list predates the last create or delete.
    #[must_use]
    pub fn connections_need_refresh(&self) -> bool {
        self.connections.needs_refresh(self.refresh.current())
    }

    // ── Views ───────────────────────────────────────────────────────

    #[must_use]
    pub fn connections(&self) -> &ListView<Connection> {
        &self.connections
    }

    #[must_use]
    pub fn accounts(&self) -> &ListView<Account> {
        &self.accounts
    }

    #[must_use]
    pub fn identity_view(&self) -> &ListView<Identity> {
        &self.identity
    }

    /// The identity on file for the selected connection, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.records().first()
    }

    #[must_use]
    pub fn transactions(&self) -> &ListView<Transaction> {
        &self.transactions
    }

    #[must_use]
    pub fn investments(&self) -> &ListView<Investment> {
        &self.investments
    }

    #[must_use]
    pub fn investment_transactions(&self) -> &ListView<InvestmentTransaction> {
        &self.investment_transactions
    }

    #[must_use]
    pub fn loans(&self) -> &ListView<Loan> {
        &self.loans
    }

    #[must_use]
    pub fn bills(&self) -> &ListView<CreditCardBill> {
        &self.bills
    }

    // ── Selection ───────────────────────────────────────────────────

    #[must_use]
    pub fn selection(&self) -> &SelectionStateMachine {
        &self.selection
    }

    pub fn select_connection(&mut self, connection: Connection) -> Result<&Connection, CoreError> {
        let result = self.selection.select_connection(connection).map(|_| ());
        self.prune_views();
        result?;
        self.selection
            .connection()
            .ok_or(CoreError::NothingSelected(EntityKind::Connection))
    }

    /// Select a connection from an upstream record of any spelling.
    pub fn select_connection_record(&mut self, raw: &Value) -> Result<&Connection, CoreError> {
        let result = self.selection.select_connection_record(raw).map(|_| ());
        self.prune_views();
        result?;
        self.selection
            .connection()
            .ok_or(CoreError::NothingSelected(EntityKind::Connection))
    }

    /// Select a connection of the loaded connection list.
    pub fn select_connection_by_id(&mut self, id: &str) -> Result<&Connection, CoreError> {
        let connection = self
            .connections
            .find(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                resource: "connection".into(),
                id: id.to_string(),
            })?;
        self.select_connection(connection)
    }

    pub fn select_account(&mut self, account: Account) -> Result<&Account, CoreError> {
        let result = self.selection.select_account(account).map(|_| ());
        self.prune_views();
        result?;
        self.selection
            .account()
            .ok_or(CoreError::NothingSelected(EntityKind::Account))
    }

    pub fn select_account_record(&mut self, raw: &Value) -> Result<&Account, CoreError> {
        let result = self.selection.select_account_record(raw).map(|_| ());
        self.prune_views();
        result?;
        self.selection
            .account()
            .ok_or(CoreError::NothingSelected(EntityKind::Account))
    }

    /// Select an account of the loaded account list.
    pub fn select_account_by_id(&mut self, id: &str) -> Result<&Account, CoreError> {
        let account = self
            .accounts
            .find(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                resource: "account".into(),
                id: id.to_string(),
            })?;
        self.select_account(account)
    }

    pub fn select_tab(&mut self, tab: ConnectionTab) -> Result<(), CoreError> {
        self.selection.select_tab(tab)
    }

    pub fn select_leaf(&mut self, leaf: LeafKind) -> Result<(), CoreError> {
        let result = self.selection.select_leaf(leaf);
        self.prune_views();
        result
    }

    pub fn select_investment(&mut self, investment: Investment) -> Result<&Investment, CoreError> {
        let result = self.selection.select_investment(investment).map(|_| ());
        self.prune_views();
        result?;
        self.selection
            .investment()
            .ok_or(CoreError::NothingSelected(EntityKind::Investment))
    }

    /// Select an investment of the loaded investment list.
    pub fn select_investment_by_id(&mut self, id: &str) -> Result<&Investment, CoreError> {
        let investment = self
            .investments
            .find(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                resource: "investment".into(),
                id: id.to_string(),
            })?;
        self.select_investment(investment)
    }

    pub fn back(&mut self) {
        self.selection.back();
        self.prune_views();
    }

    pub fn reset_selection(&mut self) {
        self.selection.reset();
        self.prune_views();
    }

    pub fn dismiss_selection_error(&mut self) {
        self.selection.dismiss_error();
        self.prune_views();
    }

    // ── Pagination ──────────────────────────────────────────────────

    #[must_use]
    pub fn pager(&self, pager: Pager) -> &PaginationController {
        match pager {
            Pager::Transactions => &self.transactions_pager,
            Pager::InvestmentTransactions => &self.investment_transactions_pager,
        }
    }

    /// Advance one page. The next `begin` of that view reads it; a fetch
    /// still running for the old page goes stale.
    pub fn load_more(&mut self, pager: Pager) {
        self.pager_mut(pager).load_more();
        self.invalidate_paged_view(pager);
    }

    /// Go back one page; `false` when already at the first.
    pub fn load_previous(&mut self, pager: Pager) -> bool {
        let moved = self.pager_mut(pager).load_previous();
        if moved {
            self.invalidate_paged_view(pager);
        }
        moved
    }

    fn invalidate_paged_view(&mut self, pager: Pager) {
        match pager {
            Pager::Transactions => self.transactions.invalidate(),
            Pager::InvestmentTransactions => self.investment_transactions.invalidate(),
        }
    }

    fn pager_mut(&mut self, pager: Pager) -> &mut PaginationController {
        match pager {
            Pager::Transactions => &mut self.transactions_pager,
            Pager::InvestmentTransactions => &mut self.investment_transactions_pager,
        }
    }

    // ── Connection Lifecycle ────────────────────────────────────────

    /// Persist the connection produced by a linking session.
    pub async fn create_connection(&self, result: SessionResult) -> Result<Connection, CoreError> {
        self.lifecycle.create(result).await
    }

    /// Cascade-delete a connection. On success it leaves the local list
    /// right away; listings refetch on the next refresh check.
    pub async fn delete_connection(&mut self, connection_id: &str) -> Result<DeleteOutcome, CoreError> {
        let result = self
            .lifecycle
            .delete(connection_id, &mut self.selection)
            .await;
        self.prune_views();
        let outcome = result?;
        self.connections.remove(connection_id);
        Ok(outcome)
    }

    /// Copy the loaded transactions of the selected account into the mirror.
    /// Returns how many were written.
    pub async fn mirror_transactions(&self) -> Result<usize, CoreError> {
        let account_id = self
            .selection
            .account()
            .map(|a| a.id.as_str())
            .ok_or(CoreError::NothingSelected(EntityKind::Account))?;
        let records = self.transactions.records();
        self.mirror_store
            .save_transactions(account_id, records)
            .await?;
        Ok(records.len())
    }

    /// Token for opening a new linking session.
    pub async fn connect_token(&self) -> Result<ConnectToken, CoreError> {
        self.connect_token_for(None).await
    }

    /// Token for a new session, or for re-linking `connection_id`.
    pub async fn connect_token_for(
        &self,
        connection_id: Option<&str>,
    ) -> Result<ConnectToken, CoreError> {
        let sessions = self.sessions.as_ref().ok_or(CoreError::NoSessionProvider)?;
        sessions.create_connect_token(connection_id).await
    }

    #[must_use]
    pub fn refresh_generation(&self) -> u64 {
        self.refresh.current()
    }

    /// Handle for observers outside the facade.
    pub fn watch_refresh(&self) -> RefreshWatcher {
        self.refresh.subscribe()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn selected_connection_id(&self) -> Result<String, CoreError> {
        self.selection
            .connection()
            .map(|c| c.id.clone())
            .ok_or(CoreError::NothingSelected(EntityKind::Connection))
    }

    fn selected_scope(&self) -> Result<LeafScope, CoreError> {
        let connection_id = self.selected_connection_id()?;
        let account_id = self
            .selection
            .account()
            .map(|a| a.id.clone())
            .ok_or(CoreError::NothingSelected(EntityKind::Account))?;
        Ok(LeafScope::new(connection_id, account_id))
    }

    /// Drop every view whose owner is no longer selected. Pagers follow
    /// their owner and restart at the first page on change.
    fn prune_views(&mut self) {
        let connection_id = self.selection.connection().map(|c| c.id.clone());
        let account_id = self.selection.account().map(|a| a.id.clone());
        let investment_id = self.selection.investment().map(|i| i.id.clone());

        prune(&mut self.accounts, connection_id.as_deref());
        prune(&mut self.identity, connection_id.as_deref());
        prune(&mut self.transactions, account_id.as_deref());
        prune(&mut self.investments, account_id.as_deref());
        prune(&mut self.loans, account_id.as_deref());
        prune(&mut self.bills, account_id.as_deref());
        prune(&mut self.investment_transactions, investment_id.as_deref());

        self.transactions_pager.set_owner(account_id.as_deref());
        self.investment_transactions_pager
            .set_owner(investment_id.as_deref());
    }

    fn reset_leaf_views(&mut self) {
        self.transactions.reset();
        self.investments.reset();
        self.investment_transactions.reset();
        self.loans.reset();
        self.bills.reset();
    }
}

fn settle<T: CanonicalRecord>(
    view: &mut ListView<T>,
    ticket: &FetchTicket,
    result: Result<Value, CoreError>,
    refresh: u64,
) -> FetchOutcome {
    view.complete(ticket, result.map(normalize::<T>), refresh)
}

fn prune<T: CanonicalRecord>(view: &mut ListView<T>, owner: Option<&str>) {
    if view.owner().is_some() && view.owner() != owner {
        view.reset();
    }
}
