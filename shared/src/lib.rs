//! Shared types and models for the Retail Stock Ledger Platform
//!
//! This crate contains the domain models, the pure FIFO/LIFO consumption
//! planning core, and validation helpers shared between the backend and
//! other components of the system.

pub mod consumption;
pub mod models;
pub mod types;
pub mod validation;

pub use consumption::*;
pub use models::*;
pub use types::*;
pub use validation::*;
