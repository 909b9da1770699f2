//! Binary entrypoint for vehiclescan.
use clap::Parser;
use dtc_cli::{init_logging, Cli};

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.run()
}
