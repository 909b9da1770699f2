//! Command implementations; each prints plain text to stdout.

use crate::cli::ReportArgs;
use crate::pipeline::{App, Submission, SubmitError};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use dtc_core::{Settings, VehicleInfo};
use dtc_i18n::Translator;
use dtc_store::{format_timestamp, purge_expired, ReportStore};

pub fn report(settings: Settings, args: ReportArgs) -> Result<()> {
    let submission = Submission {
        scanner_file: args.scanner_file,
        images: args.images,
        email: args.email.unwrap_or_default(),
        vehicle: VehicleInfo {
            vin: args.vin,
            mileage: args.mileage,
            notes: args.notes,
        },
        language: args.language,
    };

    let app = App::new(settings).context("Failed to prepare storage")?;
    let summary = match app.submit(submission) {
        Ok(summary) => summary,
        Err(SubmitError::Invalid(messages)) => {
            for message in &messages {
                eprintln!("error: {}", message);
            }
            bail!("submission rejected");
        }
        Err(err) => return Err(err).context("Report generation failed"),
    };

    println!("Report {}", summary.report_id);
    println!("  Created:  {}", format_timestamp(&summary.created_at));
    println!("  Language: {}", summary.language);
    println!("  PDF:      {} ({} page(s))", summary.pdf_path.display(), summary.pages);
    if summary.codes.is_empty() {
        println!("  Codes:    none");
    } else {
        println!("  Codes:");
        for code in &summary.codes {
            let status = code.status.map(|s| s.as_str()).unwrap_or("-");
            println!(
                "    {}  {:<9} {:<8} {}",
                code.code, status, code.severity_label, code.description
            );
        }
    }
    if summary.email_sent {
        println!("  Email:    sent to {}", summary.email);
    } else {
        println!("  Email:    not sent");
    }
    Ok(())
}

pub fn purge(settings: &Settings, days: Option<i64>) -> Result<()> {
    let days = days.unwrap_or(settings.retention_days);
    if days < 0 {
        bail!("retention must not be negative (got {})", days);
    }

    let store = ReportStore::open(&settings.database_path).context("Failed to open report store")?;
    let summary = purge_expired(&store, days, Utc::now()).context("Purge failed")?;

    if summary.purged == 0 {
        println!("No expired reports to purge.");
    } else {
        println!(
            "Purged {} report(s) older than {} day(s), removed {} file(s).",
            summary.purged, days, summary.files_removed
        );
    }
    Ok(())
}

pub fn list(settings: &Settings) -> Result<()> {
    let store = ReportStore::open(&settings.database_path).context("Failed to open report store")?;
    let reports = store.list_reports().context("Failed to read reports")?;

    if reports.is_empty() {
        println!("No reports stored.");
        return Ok(());
    }

    for record in reports {
        let metadata = &record.metadata;
        println!(
            "{}  {}  {}  {} code(s)  {}  {}",
            record.report_id,
            format_timestamp(&record.created_at),
            metadata.language,
            metadata.codes.len(),
            metadata.email,
            if metadata.email_sent { "sent" } else { "not sent" }
        );
    }
    Ok(())
}

pub fn languages(settings: &Settings) -> Result<()> {
    let translator = Translator::new(&settings.i18n_dir, settings.default_language.clone());
    for language in translator.available_languages() {
        if language == translator.default_language() {
            println!("{} (default)", language);
        } else {
            println!("{}", language);
        }
    }
    Ok(())
}
