//! Domain models for the Retail Stock Ledger Platform

mod finance;
mod product;
mod stock;

pub use finance::*;
pub use product::*;
pub use stock::*;
