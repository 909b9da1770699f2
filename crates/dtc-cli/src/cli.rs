//! Command-line interface for vehiclescan
//!
//! Parses arguments with clap and dispatches to [`crate::commands`].

use crate::commands;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dtc_core::Settings;
use std::path::PathBuf;

/// vehiclescan - turn scanner exports into diagnostic PDF reports
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build, mail and store a report from a scanner export
    Report(ReportArgs),
    /// Delete reports older than the retention period
    Purge {
        /// Retention in days (defaults to the configured value)
        #[arg(long, value_name = "N")]
        days: Option<i64>,
    },
    /// List stored reports
    List,
    /// List languages with a translation catalog
    Languages,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Scanner export (CSV or plain text)
    #[arg(value_name = "SCANNER_FILE")]
    pub scanner_file: Option<PathBuf>,

    /// JPEG image to include (repeatable)
    #[arg(short, long = "image", value_name = "FILE")]
    pub images: Vec<PathBuf>,

    /// Recipient email address
    #[arg(short, long)]
    pub email: Option<String>,

    /// Vehicle identification number
    #[arg(long)]
    pub vin: Option<String>,

    /// Odometer reading, free text
    #[arg(long)]
    pub mileage: Option<String>,

    /// Notes printed with the vehicle details
    #[arg(long)]
    pub notes: Option<String>,

    /// Report language (falls back to the default when unavailable)
    #[arg(short, long)]
    pub language: Option<String>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref()).context("Failed to load settings")?;

        match self.command {
            Commands::Report(args) => commands::report(settings, args),
            Commands::Purge { days } => commands::purge(&settings, days),
            Commands::List => commands::list(&settings),
            Commands::Languages => commands::languages(&settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_report_arguments() {
        let cli = Cli::try_parse_from([
            "vehiclescan",
            "report",
            "scan.csv",
            "--image",
            "a.jpg",
            "-i",
            "b.jpeg",
            "--email",
            "owner@example.com",
            "--vin",
            "WVWZZZ1JZXW000001",
            "--language",
            "de",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.scanner_file, Some(PathBuf::from("scan.csv")));
                assert_eq!(args.images, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpeg")]);
                assert_eq!(args.email.as_deref(), Some("owner@example.com"));
                assert_eq!(args.language.as_deref(), Some("de"));
                assert!(args.mileage.is_none());
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_purge_days() {
        let cli = Cli::try_parse_from(["vehiclescan", "purge", "--days", "7"]).unwrap();
        assert!(matches!(cli.command, Commands::Purge { days: Some(7) }));
        assert!(Cli::try_parse_from(["vehiclescan", "purge", "--days", "week"]).is_err());
    }
}
