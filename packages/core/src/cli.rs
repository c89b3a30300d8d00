use clap::Parser;

/// Medicine tracker CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "medicine-tracker",
    version,
    about = "Household medicine inventory with expiry alerts and barcode lookup"
)]
pub struct Cli {
    /// SQLite database URL (e.g. sqlite://medicine.db)
    #[arg(long)]
    pub database_url: Option<String>,

    /// HTTP listen port
    #[arg(long)]
    pub port: Option<u16>,

    /// Expiry sweep interval in seconds (0 disables the scheduler)
    #[arg(long)]
    pub sweep_interval: Option<u64>,

    /// Run a single expiry sweep, print the report and exit
    #[arg(long)]
    pub sweep_once: bool,
}
