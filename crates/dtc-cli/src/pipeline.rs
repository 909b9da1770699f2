//! Pipeline: one submission in, one stored report out.
//!
//! ```text
//! validate → stage uploads → extract → interpret → render → mail → store
//! ```
//!
//! Validation messages are localized in the submission's language and
//! returned together. Staged files are removed again when extraction or
//! rendering fails, so a rejected submission leaves nothing behind.

use chrono::{DateTime, Utc};
use dtc_core::{new_report_id, ConfigError, InterpretedCode, ReportContext, Settings, VehicleInfo};
use dtc_i18n::{Localizer, Translator};
use dtc_interpret::{Interpreter, KnowledgeBase};
use dtc_out::RenderError;
use dtc_store::files::{is_allowed_image, remove_files, stage_file};
use dtc_store::{ReportMetadata, ReportStore, StoreError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can end a submission
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Localized messages for the user, one per problem
    #[error("{}", .0.join("\n"))]
    Invalid(Vec<String>),
    #[error("{0}")]
    Parse(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What the user submitted
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub scanner_file: Option<PathBuf>,
    pub images: Vec<PathBuf>,
    pub email: String,
    pub vehicle: VehicleInfo,
    pub language: Option<String>,
}

/// Outcome of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub report_id: String,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub pdf_path: PathBuf,
    pub pages: usize,
    pub email: String,
    pub email_sent: bool,
    pub vehicle: VehicleInfo,
    pub codes: Vec<InterpretedCode>,
}

/// Long-lived collaborators for processing submissions
pub struct App {
    pub settings: Settings,
    pub translator: Translator,
    pub knowledge_base: KnowledgeBase,
    pub store: ReportStore,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self, SubmitError> {
        settings.ensure_dirs()?;
        let translator = Translator::new(&settings.i18n_dir, settings.default_language.clone());
        let knowledge_base =
            KnowledgeBase::load(&settings.knowledge_base_path, &settings.default_language);
        let store = ReportStore::open(&settings.database_path)?;

        Ok(App {
            settings,
            translator,
            knowledge_base,
            store,
        })
    }

    pub fn submit(&self, submission: Submission) -> Result<ReportSummary, SubmitError> {
        self.submit_at(submission, Utc::now())
    }

    /// Process a submission as if it arrived at `now`
    pub fn submit_at(&self, submission: Submission, now: DateTime<Utc>) -> Result<ReportSummary, SubmitError> {
        let language = self.translator.resolve_language(submission.language.as_deref());
        let l = self.translator.localizer(language.as_str());

        let scanner_file = validate(&submission, &l)?;
        let recipient = submission.email.trim().to_string();
        let vehicle = normalize_vehicle(&submission.vehicle);

        let report_id = new_report_id();
        info!("processing report {} ({})", report_id, language);

        // Stage uploads under the report id
        let upload_dir = &self.settings.upload_dir;
        let scanner_path = stage_file(scanner_file, upload_dir, &format!("{}_scanner", report_id))?;
        let mut staged = vec![scanner_path.clone()];
        let mut image_paths = Vec::with_capacity(submission.images.len());
        for (index, image) in submission.images.iter().enumerate() {
            match stage_file(image, upload_dir, &format!("{}_image{}", report_id, index)) {
                Ok(path) => {
                    staged.push(path.clone());
                    image_paths.push(path);
                }
                Err(err) => {
                    remove_files(&staged);
                    return Err(err.into());
                }
            }
        }

        let entries = match dtc_in::extract_file(&scanner_path) {
            Ok(entries) => entries,
            Err(err) => {
                remove_files(&staged);
                let error = err.to_string();
                return Err(SubmitError::Parse(l.text_with(
                    "upload.errors.parse_failed",
                    "Unable to parse scanner file: {error}",
                    &[("error", error.as_str())],
                )));
            }
        };

        let codes = Interpreter::new(&self.knowledge_base, &self.translator).interpret(&entries, &language);

        let context = ReportContext {
            report_id: report_id.clone(),
            created_at: now,
            language: language.clone(),
            vehicle,
            codes,
            images: image_paths,
        };

        let pdf_path = self.settings.report_dir.join(format!("{}.pdf", report_id));
        let rendered = match dtc_out::render(&context, &l, &pdf_path) {
            Ok(rendered) => rendered,
            Err(err) => {
                remove_files(&staged);
                return Err(err.into());
            }
        };

        let email_sent = self.send(&context, &recipient, &rendered.path, &l);

        let metadata = ReportMetadata {
            created_at: now,
            scanner_file: Some(scanner_path),
            image_paths: context.images.clone(),
            pdf_path: Some(rendered.path.clone()),
            email: recipient.clone(),
            language: language.clone(),
            vehicle: context.vehicle.clone(),
            codes: context.codes.clone(),
            fingerprint: Some(rendered.fingerprint),
            email_sent,
        };
        self.store.store_report(&report_id, &metadata)?;

        info!(
            "report {} complete: {} code(s), email sent: {}",
            report_id,
            context.codes.len(),
            email_sent
        );

        Ok(ReportSummary {
            report_id,
            created_at: now,
            language,
            pdf_path: rendered.path,
            pages: rendered.pages,
            email: recipient,
            email_sent,
            vehicle: context.vehicle,
            codes: context.codes,
        })
    }

    /// Mail the report; any failure is logged and reported as not sent
    fn send(&self, context: &ReportContext, recipient: &str, pdf_path: &Path, l: &Localizer<'_>) -> bool {
        let vin = context
            .vehicle
            .vin
            .clone()
            .unwrap_or_else(|| context.report_id.clone());
        let subject = l.text_with(
            "email.subject",
            "Vehicle diagnostic report for {vin}",
            &[("vin", vin.as_str())],
        );

        let codes = if context.codes.is_empty() {
            l.text("report.diagnostics.no_codes", "None")
        } else {
            context
                .codes
                .iter()
                .map(|c| c.code.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let body = l.text_with(
            "email.body",
            "Attached is the diagnostic report for your vehicle.\n\nReport ID: {report_id}\nDetected codes: {codes}",
            &[("report_id", context.report_id.as_str()), ("codes", codes.as_str())],
        );

        match dtc_mail::send_report(recipient, &subject, &body, pdf_path, self.settings.mail.as_ref()) {
            Ok(sent) => sent,
            Err(err) => {
                warn!("email for report {} failed: {}", context.report_id, err);
                false
            }
        }
    }
}

/// Process one submission with fresh collaborators built from `settings`
pub fn submit(settings: &Settings, submission: Submission) -> Result<ReportSummary, SubmitError> {
    App::new(settings.clone())?.submit(submission)
}

/// Check required fields and image types; returns the scanner file
fn validate<'s>(submission: &'s Submission, l: &Localizer<'_>) -> Result<&'s Path, SubmitError> {
    let mut errors = Vec::new();

    let scanner_file = submission
        .scanner_file
        .as_deref()
        .filter(|path| path.is_file());
    if scanner_file.is_none() {
        errors.push(l.text("upload.errors.missing_scanner", "Scanner file is required."));
    }
    if submission.email.trim().is_empty() {
        errors.push(l.text("upload.errors.missing_email", "Email address is required."));
    }

    if errors.is_empty() {
        let invalid: Vec<String> = submission
            .images
            .iter()
            .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
            .filter(|name| !is_allowed_image(name))
            .collect();
        if !invalid.is_empty() {
            let filenames = invalid.join(", ");
            errors.push(l.text_with(
                "upload.errors.invalid_images",
                "Only JPG images are supported.",
                &[("filenames", filenames.as_str())],
            ));
        }
    }

    match scanner_file {
        Some(path) if errors.is_empty() => Ok(path),
        _ => Err(SubmitError::Invalid(errors)),
    }
}

/// Trim vehicle fields; blank ones become absent
pub fn normalize_vehicle(vehicle: &VehicleInfo) -> VehicleInfo {
    let clean = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };
    VehicleInfo {
        vin: clean(&vehicle.vin),
        mileage: clean(&vehicle.mileage),
        notes: clean(&vehicle.notes),
    }
}
