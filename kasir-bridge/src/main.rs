//! kasir-bridge command line
//!
//! ```text
//! kasir-bridge printers
//! kasir-bridge test-page "EPSON TM-T82"
//! kasir-bridge receipt "EPSON TM-T82" sale.json --paper 58
//! kasir-bridge preview sale.json
//! ```
//!
//! Settings come from the environment (and `.env`); see `BridgeConfig`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use kasir_bridge::{
    BridgeConfig, PaperWidth, PrintBridge, PrintReceiptOptions, PrinterId, SaleRecord,
};
use kasir_printer::{compose_receipt, strip_control_codes};
use shared::ReceiptLayout;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "kasir-bridge", about = "Print broker client for Kasir POS", version)]
struct Cli {
    /// Broker address (host:port)
    #[arg(long, env = "KASIR_BROKER_ADDR")]
    broker: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List printers known to the broker
    Printers,
    /// Show the broker's default printer
    DefaultPrinter,
    /// Print a test page
    TestPage { printer: String },
    /// Kick the cash drawer attached to a printer
    Drawer { printer: String },
    /// Print a receipt from a sale JSON file
    Receipt {
        printer: String,
        sale: PathBuf,
        /// Paper width in mm (58 or 80)
        #[arg(long)]
        paper: Option<PaperWidth>,
    },
    /// Check whether the broker is reachable
    Status,
    /// Render a receipt to stdout without printing
    Preview {
        sale: PathBuf,
        #[arg(long)]
        paper: Option<PaperWidth>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = BridgeConfig::from_env()?;
    if let Some(addr) = cli.broker {
        config = config.with_broker_addr(addr);
    }
    kasir_bridge::init_logger_with_file(
        &config.log_level,
        config.log_json,
        config.log_dir.as_deref(),
    )?;

    match cli.command {
        Command::Preview { sale, paper } => preview(&sale, paper.unwrap_or(config.paper_width)),
        command => {
            let bridge = PrintBridge::from_config(&config)?;
            let result = run(&bridge, &config, command).await;
            if let Err(e) = bridge.disconnect().await {
                warn!(error = %e, "disconnect failed");
            }
            result
        }
    }
}

async fn run(bridge: &PrintBridge, config: &BridgeConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Printers => {
            for printer in bridge.list_printers().await? {
                println!("{}", printer);
            }
        }
        Command::DefaultPrinter => match bridge.default_printer().await? {
            Some(printer) => println!("{}", printer),
            None => println!("(no default printer)"),
        },
        Command::TestPage { printer } => {
            bridge.print_test_page(&PrinterId::new(printer)).await?;
            info!("test page sent");
        }
        Command::Drawer { printer } => {
            bridge.open_cash_drawer(&PrinterId::new(printer)).await?;
            info!("drawer kick sent");
        }
        Command::Receipt {
            printer,
            sale,
            paper,
        } => {
            let sale = load_sale(&sale)?;
            let options = PrintReceiptOptions::new(printer, sale)
                .with_paper_width(paper.unwrap_or(config.paper_width));
            bridge.print_receipt(&options).await?;
        }
        Command::Status => {
            let available = bridge.is_available().await;
            println!("broker {}: {}", config.broker_addr, bridge.state());
            if !available {
                anyhow::bail!(kasir_bridge::BROKER_NOT_DETECTED);
            }
        }
        Command::Preview { sale, paper } => {
            preview(&sale, paper.unwrap_or(config.paper_width))?;
        }
    }
    Ok(())
}

/// Receipt as plain text, control codes removed
fn preview(sale: &Path, paper: PaperWidth) -> anyhow::Result<()> {
    let sale = load_sale(sale)?;
    let receipt = compose_receipt(&sale, ReceiptLayout::new(paper));
    println!("{}", strip_control_codes(&receipt));
    Ok(())
}

fn load_sale(path: &Path) -> anyhow::Result<SaleRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading sale file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing sale file {}", path.display()))
}
