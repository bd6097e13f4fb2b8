//! # kasir-printer
//!
//! ESC/POS receipt rendering for 58mm and 80mm thermal printers.
//!
//! ## Scope
//!
//! This crate decides WHAT goes on paper and how it is laid out:
//! - ESC/POS control codes and a text builder
//! - Rupiah / date formatting
//! - Sale receipt layout
//! - Fixed payloads (test page, cash drawer kick)
//!
//! Delivering bytes to a printer is the broker's job (see `kasir-bridge`).
//! Everything here is synchronous and free of I/O.
//!
//! ## Example
//!
//! ```ignore
//! use kasir_printer::compose_receipt;
//! use shared::{PaperWidth, ReceiptLayout};
//!
//! let stream = compose_receipt(&sale, ReceiptLayout::new(PaperWidth::Mm58));
//! ```

mod escpos;
mod format;
mod receipt;
mod templates;

// Re-exports
pub use escpos::{
    DIVIDER_CHAR, EscPosTextBuilder, center, cmd, ellipsize, left_right, strip_control_codes,
    text_width,
};
pub use format::{CURRENCY_PREFIX, format_currency, format_date, format_datetime, format_number};
pub use receipt::{
    DEFAULT_FOOTER_FAREWELL, DEFAULT_FOOTER_THANKS, ReceiptComposer, compose_receipt,
};
pub use templates::{cash_drawer_kick, test_page};
