use serde_json::{Map, Value};

use crate::models::entity::{EntityKind, RESULTS_WRAPPER_KEY};

/// An upstream payload, classified once by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A bare sequence of records.
    List(Vec<Value>),
    /// A wrapper object holding the sequence under `key`.
    Wrapped { key: String, items: Vec<Value> },
    /// One object that identifies as a record of the requested kind.
    Single(Map<String, Value>),
    /// Anything else: null, scalars, objects without id or known wrapper.
    Unrecognized(Value),
}

impl Payload {
    /// Shape policy, in priority order:
    /// bare sequence, known wrapper key (plural kind keys, then `"results"`),
    /// single identifiable object, otherwise unrecognized.
    pub fn classify(raw: Value, kind: EntityKind) -> Self {
        let mut object = match raw {
            Value::Array(items) => return Payload::List(items),
            Value::Object(object) => object,
            other => return Payload::Unrecognized(other),
        };

        let wrapper = kind
            .wrapper_keys()
            .iter()
            .copied()
            .chain(std::iter::once(RESULTS_WRAPPER_KEY))
            .find(|key| matches!(object.get(*key), Some(Value::Array(_))));

        if let Some(key) = wrapper {
            if let Some(Value::Array(items)) = object.remove(key) {
                return Payload::Wrapped {
                    key: key.to_string(),
                    items,
                };
            }
        }

        if kind.has_identifying_field(&object) {
            Payload::Single(object)
        } else {
            Payload::Unrecognized(Value::Object(object))
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Payload::Unrecognized(_))
    }

    /// Short description for diagnostics (never the full payload).
    pub fn describe(&self) -> String {
        match self {
            Payload::List(items) => format!("list of {}", items.len()),
            Payload::Wrapped { key, items } => format!("{{{key}: [{}]}}", items.len()),
            Payload::Single(_) => "single object".to_string(),
            Payload::Unrecognized(value) => describe_value(value),
        }
    }

    /// The records carried, in upstream order.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            Payload::List(items) | Payload::Wrapped { items, .. } => items,
            Payload::Single(object) => vec![Value::Object(object)],
            Payload::Unrecognized(_) => Vec::new(),
        }
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(object) => {
            let mut keys: Vec<&str> = object.keys().map(String::as_str).take(5).collect();
            keys.sort_unstable();
            format!("object with keys [{}]", keys.join(", "))
        }
    }
}
