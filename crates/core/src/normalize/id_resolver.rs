use serde_json::Value;

use crate::models::entity::{id_text, EntityKind, GENERIC_ID_FIELD};

/// A record for which no identifier could be found. It is dropped by the
/// caller and never stored or offered for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Unidentifiable(pub Value);

/// Populate the kind-qualified id field of `record`.
///
/// 1. A non-empty kind-qualified field is kept (numbers become strings).
/// 2. Otherwise the generic `id` field is copied into it.
/// 3. Otherwise the record is unidentifiable.
///
/// Applying it to its own output returns the same value.
pub fn resolve_id(record: Value, kind: EntityKind) -> Result<Value, Unidentifiable> {
    let Value::Object(mut object) = record else {
        return Err(Unidentifiable(record));
    };

    let field = kind.id_field();
    let resolved = object
        .get(field)
        .and_then(id_text)
        .or_else(|| object.get(GENERIC_ID_FIELD).and_then(id_text));

    match resolved {
        Some(id) => {
            object.insert(field.to_string(), Value::String(id));
            Ok(Value::Object(object))
        }
        None => Err(Unidentifiable(Value::Object(object))),
    }
}

/// The canonical id of a resolved record, if any.
pub fn resolved_id(record: &Value, kind: EntityKind) -> Option<String> {
    record.get(kind.id_field()).and_then(id_text)
}
