pub mod traits;

// Collaborator implementations
pub mod backend;
pub mod memory;
pub mod pluggy;

mod http;
