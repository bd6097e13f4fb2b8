use crate::connection::ConnectionManager;
use crate::error::BridgeResult;
use chrono::Local;
use kasir_printer::{cash_drawer_kick, compose_receipt, test_page};
use shared::{PaperWidth, PrintJob, PrinterId, ReceiptLayout, SaleRecord};
use tracing::{debug, info, instrument};

/// What to print and where
#[derive(Debug, Clone)]
pub struct PrintReceiptOptions {
    pub printer_name: PrinterId,
    pub sale: SaleRecord,
    pub paper_width: PaperWidth,
}

impl PrintReceiptOptions {
    /// Receipt on 80mm paper
    pub fn new(printer_name: impl Into<PrinterId>, sale: SaleRecord) -> Self {
        Self {
            printer_name: printer_name.into(),
            sale,
            paper_width: PaperWidth::default(),
        }
    }

    pub fn with_paper_width(mut self, paper_width: PaperWidth) -> Self {
        self.paper_width = paper_width;
        self
    }
}

/// Submits print jobs over the broker connection
#[derive(Clone)]
pub struct PrintJobDispatcher {
    connection: ConnectionManager,
}

impl PrintJobDispatcher {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, options), fields(printer = %options.printer_name, order = %options.sale.order_number))]
    pub async fn print_receipt(&self, options: &PrintReceiptOptions) -> BridgeResult<()> {
        self.connection.ensure_connected().await?;
        let content = compose_receipt(&options.sale, ReceiptLayout::new(options.paper_width));
        self.submit(PrintJob::new(options.printer_name.clone(), content))
            .await?;
        info!("receipt printed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn print_test_page(&self, printer_name: &PrinterId) -> BridgeResult<()> {
        self.connection.ensure_connected().await?;
        let content = test_page(
            printer_name,
            &Local::now().naive_local(),
            ReceiptLayout::default(),
        );
        self.submit(PrintJob::new(printer_name.clone(), content))
            .await
    }

    #[instrument(skip(self))]
    pub async fn open_cash_drawer(&self, printer_name: &PrinterId) -> BridgeResult<()> {
        self.connection.ensure_connected().await?;
        self.submit(PrintJob::new(printer_name.clone(), cash_drawer_kick()))
            .await
    }

    /// Whether the broker can be reached; never fails
    pub async fn is_available(&self) -> bool {
        match self.connection.ensure_connected().await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "print broker unavailable");
                false
            }
        }
    }

    async fn submit(&self, job: PrintJob) -> BridgeResult<()> {
        debug!(printer = %job.printer, bytes = job.len(), "submitting print job");
        self.connection.transport().print(&job).await?;
        Ok(())
    }
}
