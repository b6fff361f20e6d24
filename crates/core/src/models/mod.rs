pub mod account;
pub mod bill;
pub mod connection;
pub mod entity;
pub mod fields;
pub mod identity;
pub mod investment;
pub mod loan;
pub mod session;
pub mod settings;
pub mod transaction;
