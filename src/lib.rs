// src/lib.rs

pub mod config;
pub mod dispatcher;
pub mod distance;
pub mod error;
pub mod gazetteer;
pub mod handlers;
pub mod i18n;
pub mod ledger;
pub mod models;
pub mod payments;
pub mod registration;
pub mod routes;
pub mod selector;
pub mod session;
pub mod state;
pub mod store;
pub mod telegram;
pub mod transport;

// Re-export specific items for convenience if needed
pub use routes::probe_router;
