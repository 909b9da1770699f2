//! Data Model: RawCodeEntry, InterpretedCode, ReportContext
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Pattern of a single diagnostic trouble code, bounded by word boundaries.
pub const DTC_PATTERN: &str = r"(?i)\b([PCBU][0-9A-F]{4})\b";

lazy_static! {
    static ref FULL_DTC: Regex = Regex::new(r"^[PCBU][0-9A-F]{4}$").unwrap();
}

/// True when `code` is an already-normalized (uppercase) DTC.
pub fn is_normalized_code(code: &str) -> bool {
    FULL_DTC.is_match(code)
}

/// Status reported by the scanner next to a code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Pending,
    Stored,
    History,
    Permanent,
    Active,
}

impl CodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeStatus::Pending => "pending",
            CodeStatus::Stored => "stored",
            CodeStatus::History => "history",
            CodeStatus::Permanent => "permanent",
            CodeStatus::Active => "active",
        }
    }
}

impl fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which extraction path produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Csv,
    Text,
}

/// A code as found in scanner output, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCodeEntry {
    /// Uppercase DTC, e.g. "P0300"
    pub code: String,
    pub status: Option<CodeStatus>,
    pub source: SourceKind,
}

impl RawCodeEntry {
    pub fn new(code: impl Into<String>, status: Option<CodeStatus>, source: SourceKind) -> Self {
        Self {
            code: code.into().to_ascii_uppercase(),
            status,
            source,
        }
    }
}

/// Triage class of a code. Unrecognized names from the dataset are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
            Severity::Other(name) => name,
        }
    }

    /// Name with the first letter capitalized ("high" -> "High").
    pub fn title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }
}

impl From<&str> for Severity {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            "unknown" | "" => Severity::Unknown,
            other => Severity::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Severity::from(raw.as_str()))
    }
}

/// A code resolved against the knowledge base in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretedCode {
    pub code: String,
    pub description: String,
    pub severity: Severity,
    pub severity_label: String,
    pub advice: String,
    pub status: Option<CodeStatus>,
    /// False when the knowledge base has no record for the code
    pub known: bool,
}

/// Optional vehicle details entered alongside the scanner file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub vin: Option<String>,
    pub mileage: Option<String>,
    pub notes: Option<String>,
}

impl VehicleInfo {
    pub fn is_empty(&self) -> bool {
        self.vin.is_none() && self.mileage.is_none() && self.notes.is_none()
    }
}

/// Everything needed to render one report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportContext {
    pub report_id: String,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub vehicle: VehicleInfo,
    pub codes: Vec<InterpretedCode>,
    pub images: Vec<PathBuf>,
}

/// New opaque report identifier (32 lowercase hex chars).
pub fn new_report_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
