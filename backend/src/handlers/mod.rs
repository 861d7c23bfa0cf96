//! HTTP request handlers

pub mod finance;
pub mod health;
pub mod product;
pub mod stock;
