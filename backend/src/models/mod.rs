//! Database models for the Retail Stock Ledger Platform
//!
//! Re-exports the domain models from the shared crate

pub use shared::models::*;
