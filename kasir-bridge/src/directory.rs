use crate::connection::ConnectionManager;
use crate::error::BridgeResult;
use shared::PrinterId;
use tracing::{debug, instrument};

/// Printer enumeration through the broker
#[derive(Clone)]
pub struct PrinterDirectory {
    connection: ConnectionManager,
}

impl PrinterDirectory {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// All printers the broker can reach
    #[instrument(skip(self))]
    pub async fn list_printers(&self) -> BridgeResult<Vec<PrinterId>> {
        self.connection.ensure_connected().await?;
        let printers = self.connection.transport().find_printers().await?;
        debug!(count = printers.len(), "printers listed");
        Ok(printers)
    }

    /// The broker's default printer, if it has one
    #[instrument(skip(self))]
    pub async fn default_printer(&self) -> BridgeResult<Option<PrinterId>> {
        self.connection.ensure_connected().await?;
        Ok(self.connection.transport().default_printer().await?)
    }
}
