use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::NormalizeWarning;
use crate::models::entity::{CanonicalRecord, EntityKind};

use super::id_resolver::{resolve_id, resolved_id, Unidentifiable};
use super::payload::Payload;

/// Records recovered from a payload plus everything that was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub warnings: Vec<NormalizeWarning>,
}

impl<T> Normalized<T> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// No shape problems and nothing dropped.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Turn any payload into the ordered resolved JSON records of `kind`.
///
/// Never fails: unknown shapes yield an empty sequence with an
/// `UnrecognizedShape` warning, records without id are dropped with an
/// `IdentityMissing` warning.
pub fn normalize_raw(payload: Value, kind: EntityKind) -> Normalized<Value> {
    let payload = Payload::classify(payload, kind);
    let mut out = Normalized::empty();

    if !payload.is_recognized() {
        let shape = payload.describe();
        warn!(%kind, %shape, "Unrecognized payload shape, treating as empty");
        out.warnings
            .push(NormalizeWarning::UnrecognizedShape { kind, shape });
        return out;
    }

    debug!(%kind, shape = %payload.describe(), "Normalizing payload");

    for (index, record) in payload.into_records().into_iter().enumerate() {
        match resolve_id(record, kind) {
            Ok(resolved) => out.records.push(resolved),
            Err(Unidentifiable(_)) => {
                warn!(%kind, index, "Dropping record without identifier");
                out.warnings
                    .push(NormalizeWarning::IdentityMissing { kind, index });
            }
        }
    }

    out
}

/// Normalize a payload into canonical records of type `T`.
///
/// Records whose fields cannot be decoded (e.g. a non-numeric amount) are
/// dropped with an `InvalidRecord` warning; the rest keep upstream order.
pub fn normalize<T: CanonicalRecord>(payload: Value) -> Normalized<T> {
    let kind = T::KIND;
    let raw = normalize_raw(payload, kind);
    let mut out = Normalized {
        records: Vec::with_capacity(raw.records.len()),
        warnings: raw.warnings,
    };

    for record in raw.records {
        let id = resolved_id(&record, kind).unwrap_or_default();
        match T::from_resolved(record) {
            Ok(canonical) => out.records.push(canonical),
            Err(e) => {
                warn!(%kind, %id, error = %e, "Dropping undecodable record");
                out.warnings.push(NormalizeWarning::InvalidRecord {
                    kind,
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }

    out
}

/// Normalize a payload expected to carry at most one record.
/// Extra records are ignored; the first one wins.
pub fn normalize_one<T: CanonicalRecord>(payload: Value) -> (Option<T>, Vec<NormalizeWarning>) {
    let Normalized { records, warnings } = normalize::<T>(payload);
    (records.into_iter().next(), warnings)
}
