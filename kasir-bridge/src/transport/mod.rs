//! Broker transport abstraction
//!
//! The rest of the crate talks to the print broker only through
//! [`BrokerTransport`]; [`TcpBrokerTransport`] is the production adapter.

pub mod protocol;
mod tcp;

pub use tcp::TcpBrokerTransport;

use crate::error::TransportError;
use async_trait::async_trait;
use kasir_cert::TrustProvider;
use shared::{PrintJob, PrinterId};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Lifecycle notifications published by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Session ended (remote close, EOF or local disconnect)
    Closed,
    /// Broker reported a connection error
    Error(String),
}

/// Capability set of the local print broker
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Whether a session is currently open
    fn is_active(&self) -> bool;

    /// Register the provider that answers certificate / signature requests
    fn install_trust(&self, trust: Arc<dyn TrustProvider>);

    /// Subscribe to lifecycle events
    ///
    /// `Closed` must be published only after [`is_active`](Self::is_active)
    /// has turned false for the session that ended.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;

    /// Open a session, completing the trust handshake
    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    async fn find_printers(&self) -> Result<Vec<PrinterId>, TransportError>;

    async fn default_printer(&self) -> Result<Option<PrinterId>, TransportError>;

    /// Submit one raw job
    async fn print(&self, job: &PrintJob) -> Result<(), TransportError>;
}
