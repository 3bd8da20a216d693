/// Lockside - smart-lock access code service
///
/// Issues time-bounded numeric PINs for physical locks after purchase or
/// payment events, persists them alongside a purchase ledger, and
/// classifies which codes are currently active.
pub mod api;
pub mod codes;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod server;
pub mod store;
