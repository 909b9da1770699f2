//! DTC Core: shared data model, settings and configuration errors.
//!
//! Every other crate in the workspace speaks in these types. Extraction
//! produces [`RawCodeEntry`] values, interpretation turns them into
//! [`InterpretedCode`], and rendering consumes a [`ReportContext`].

pub mod data_model;
pub mod error;
pub mod settings;

pub use data_model::{
    is_normalized_code, new_report_id, CodeStatus, InterpretedCode, RawCodeEntry, ReportContext,
    Severity, SourceKind, VehicleInfo, DTC_PATTERN,
};
pub use error::ConfigError;
pub use settings::{MailSettings, Settings};

/// Language used when a requested translation is missing.
pub const DEFAULT_LANGUAGE: &str = "en";
