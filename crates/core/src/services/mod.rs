pub mod display_service;
pub mod fetch_service;
pub mod lifecycle_service;
pub mod pagination_service;
pub mod selection_service;
