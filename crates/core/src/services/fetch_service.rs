use tracing::debug;

use crate::errors::{CoreError, NormalizeWarning};
use crate::models::entity::CanonicalRecord;
use crate::normalize::Normalized;

/// Handed out when a fetch starts; must come back with its result.
///
/// A result is applied only if, since `begin`, the view has not started a
/// newer fetch, changed owner or been reset, and the refresh generation has
/// not moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    owner: Option<String>,
    refresh_generation: u64,
}

impl FetchTicket {
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn refresh_generation(&self) -> u64 {
        self.refresh_generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Transport failure; the view shows it and waits for a manual retry.
    Failed(String),
}

/// What happened to a completed fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    Applied {
        count: usize,
        warnings: Vec<NormalizeWarning>,
    },
    /// The view moved on while the fetch was in flight; the result was dropped.
    Stale,
    Failed(CoreError),
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::Stale)
    }
}

/// Records of one list view and the bookkeeping that keeps late results out.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    owner: Option<String>,
    generation: u64,
    status: ViewStatus,
    records: Vec<T>,
    warnings: Vec<NormalizeWarning>,
    loaded_at_refresh: Option<u64>,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            owner: None,
            generation: 0,
            status: ViewStatus::Idle,
            records: Vec::new(),
            warnings: Vec::new(),
            loaded_at_refresh: None,
        }
    }
}

impl<T: CanonicalRecord> ListView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch for `owner` (the parent id, or `None` for top-level lists).
    /// Records of a previous owner are discarded right away.
    pub fn begin(&mut self, owner: Option<&str>, refresh_generation: u64) -> FetchTicket {
        if self.owner.as_deref() != owner {
            self.owner = owner.map(str::to_string);
            self.records.clear();
            self.warnings.clear();
            self.loaded_at_refresh = None;
        }
        self.generation += 1;
        self.status = ViewStatus::Loading;

        FetchTicket {
            generation: self.generation,
            owner: self.owner.clone(),
            refresh_generation,
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket, refresh_generation: u64) -> bool {
        ticket.generation == self.generation
            && ticket.owner == self.owner
            && ticket.refresh_generation == refresh_generation
    }

    /// Apply a fetch result, unless the ticket went stale.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Normalized<T>, CoreError>,
        refresh_generation: u64,
    ) -> FetchOutcome {
        if !self.is_current(ticket, refresh_generation) {
            let kind = T::KIND;
            debug!(
                %kind,
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale fetch result"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(normalized) => {
                let count = normalized.records.len();
                self.records = normalized.records;
                self.warnings = normalized.warnings.clone();
                self.status = ViewStatus::Ready;
                self.loaded_at_refresh = Some(ticket.refresh_generation);
                FetchOutcome::Applied {
                    count,
                    warnings: normalized.warnings,
                }
            }
            Err(e) => {
                self.records.clear();
                self.warnings.clear();
                self.status = ViewStatus::Failed(e.to_string());
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Drop records and owner; any in-flight fetch becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.owner = None;
        self.records.clear();
        self.warnings.clear();
        self.status = ViewStatus::Idle;
        self.loaded_at_refresh = None;
    }

    /// Make any in-flight fetch stale, keeping what is on screen.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if self.status == ViewStatus::Loading {
            self.status = ViewStatus::Idle;
        }
    }

    /// Remove one record locally (after a confirmed deletion).
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let idx = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(idx))
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Records a user may select: those with their foreign key present.
    pub fn selectable(&self) -> Vec<&T> {
        self.records.iter().filter(|r| r.is_selectable()).collect()
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn warnings(&self) -> &[NormalizeWarning] {
        &self.warnings
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == ViewStatus::Loading
    }

    /// True when the view has never loaded, or loaded before the given
    /// refresh generation.
    pub fn needs_refresh(&self, refresh_generation: u64) -> bool {
        self.loaded_at_refresh != Some(refresh_generation)
    }
}
