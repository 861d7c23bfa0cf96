//! Business logic services for the Retail Stock Ledger Platform

pub mod consumption;
pub mod finance;
pub mod product;
pub mod stock_batch;
pub mod stock_change;

pub use consumption::ConsumptionService;
pub use finance::FinanceService;
pub use product::ProductService;
pub use stock_batch::StockBatchService;
pub use stock_change::StockChangeService;
