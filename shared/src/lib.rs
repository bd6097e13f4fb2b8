//! Shared types for the Kasir print bridge
//!
//! Plain data carried between the receipt composer, the broker client and
//! the surrounding application. Nothing in here performs I/O.

pub mod models;
pub mod types;

// Re-exports
pub use models::{
    Discount, DiscountType, PaymentMethod, SaleItem, SaleRecord, SaleTimestamp, SplitPayment,
};
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};
pub use types::{PaperWidth, PrintJob, PrinterId, ReceiptLayout};
