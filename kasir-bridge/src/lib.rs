//! Kasir Bridge - client for the local print broker
//!
//! Connects the POS to the broker process that owns the printers, keeps a
//! single shared session alive and submits ESC/POS jobs built by
//! `kasir-printer`.

pub mod bridge;
pub mod config;
pub mod connection;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod logger;
pub mod transport;

pub use bridge::PrintBridge;
pub use config::BridgeConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use directory::PrinterDirectory;
pub use dispatcher::{PrintJobDispatcher, PrintReceiptOptions};
pub use error::{BROKER_NOT_DETECTED, BridgeError, BridgeResult, TransportError};
pub use logger::{init_logger, init_logger_with_file};
pub use transport::{BrokerTransport, TcpBrokerTransport, TransportEvent};

// Re-export for callers building credentials / receipts
pub use kasir_cert::{Credential, SoftwareTrustProvider, TrustProvider};
pub use shared::{PaperWidth, PrinterId, SaleRecord};
