pub mod id_resolver;
pub mod normalizer;
pub mod payload;

pub use id_resolver::{resolve_id, Unidentifiable};
pub use normalizer::{normalize, normalize_one, normalize_raw, Normalized};
pub use payload::Payload;
