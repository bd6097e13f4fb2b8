use crate::config::BridgeConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::directory::PrinterDirectory;
use crate::dispatcher::{PrintJobDispatcher, PrintReceiptOptions};
use crate::error::BridgeResult;
use crate::transport::{BrokerTransport, TcpBrokerTransport};
use kasir_cert::{Credential, SoftwareTrustProvider, TrustProvider};
use shared::PrinterId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Printing surface exposed to the POS application
///
/// Cheap to clone; all clones share one broker connection.
#[derive(Clone)]
pub struct PrintBridge {
    connection: ConnectionManager,
    directory: PrinterDirectory,
    dispatcher: PrintJobDispatcher,
}

impl PrintBridge {
    pub fn new(
        transport: Arc<dyn BrokerTransport>,
        trust: Option<Arc<dyn TrustProvider>>,
        connect_timeout: Option<Duration>,
    ) -> Self {
        let connection = ConnectionManager::new(transport, trust, connect_timeout);
        Self {
            directory: PrinterDirectory::new(connection.clone()),
            dispatcher: PrintJobDispatcher::new(connection.clone()),
            connection,
        }
    }

    /// TCP transport to the configured broker, signing with the configured
    /// credential files
    pub fn from_config(config: &BridgeConfig) -> BridgeResult<Self> {
        let trust: Option<Arc<dyn TrustProvider>> = match config.credential_paths()? {
            Some((cert, key)) => {
                let credential = Credential::from_files(cert, key)?;
                info!(cert = %cert.display(), "credential loaded");
                Some(Arc::new(SoftwareTrustProvider::new(credential)))
            }
            None => {
                warn!("no credential configured; broker may prompt for every session");
                None
            }
        };

        let transport = TcpBrokerTransport::new(&config.broker_addr, config.request_timeout);
        Ok(Self::new(Arc::new(transport), trust, config.connect_timeout))
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe_state()
    }

    pub async fn connect(&self) -> BridgeResult<()> {
        self.connection.ensure_connected().await
    }

    pub async fn disconnect(&self) -> BridgeResult<()> {
        self.connection.disconnect().await
    }

    pub async fn list_printers(&self) -> BridgeResult<Vec<PrinterId>> {
        self.directory.list_printers().await
    }

    pub async fn default_printer(&self) -> BridgeResult<Option<PrinterId>> {
        self.directory.default_printer().await
    }

    pub async fn print_receipt(&self, options: &PrintReceiptOptions) -> BridgeResult<()> {
        self.dispatcher.print_receipt(options).await
    }

    pub async fn print_test_page(&self, printer_name: &PrinterId) -> BridgeResult<()> {
        self.dispatcher.print_test_page(printer_name).await
    }

    pub async fn open_cash_drawer(&self, printer_name: &PrinterId) -> BridgeResult<()> {
        self.dispatcher.open_cash_drawer(printer_name).await
    }

    pub async fn is_available(&self) -> bool {
        self.dispatcher.is_available().await
    }
}
