//! DTC-STORE: Report metadata, staged uploads and retention
//!
//! - [`ReportStore`]: one SQLite row per report (id, creation time, JSON metadata)
//! - [`files`]: staging of scanner files and images, best-effort removal
//! - [`purge`]: deletes reports and their files once they pass the retention window

pub mod files;
pub mod purge;

use chrono::{DateTime, SecondsFormat, Utc};
use dtc_core::{InterpretedCode, VehicleInfo};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use purge::{purge_expired, PurgeSummary};

pub const DB_FILENAME: &str = "metadata.db";

/// Errors that can occur in the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Metadata encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid timestamp {value:?} in store: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Retention of {days} day(s) is out of range")]
    Retention { days: i64 },
    #[error("Failed to stage {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What is kept about one generated report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub created_at: DateTime<Utc>,
    pub scanner_file: Option<PathBuf>,
    #[serde(default)]
    pub image_paths: Vec<PathBuf>,
    pub pdf_path: Option<PathBuf>,
    pub email: String,
    pub language: String,
    #[serde(default)]
    pub vehicle: VehicleInfo,
    #[serde(default)]
    pub codes: Vec<InterpretedCode>,
    /// Layout fingerprint of the rendered PDF
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub email_sent: bool,
}

impl ReportMetadata {
    /// Every file on disk that belongs to the report
    pub fn files(&self) -> Vec<&Path> {
        self.scanner_file
            .iter()
            .chain(self.pdf_path.iter())
            .chain(self.image_paths.iter())
            .map(PathBuf::as_path)
            .collect()
    }
}

/// One stored row
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub report_id: String,
    pub created_at: DateTime<Utc>,
    pub metadata: ReportMetadata,
}

/// Fixed-width RFC 3339 (UTC, microseconds) so text order matches time order
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|source| StoreError::Timestamp {
            value: value.to_string(),
            source,
        })
}

/// SQLite-backed metadata store. Each operation opens its own connection.
#[derive(Debug, Clone)]
pub struct ReportStore {
    db_path: PathBuf,
}

impl ReportStore {
    /// Open (and create when missing) the database at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                report_id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                metadata TEXT NOT NULL
            );
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at);",
            [],
        )?;

        Ok(Self { db_path: path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Insert or replace the row for `report_id`
    pub fn store_report(&self, report_id: &str, metadata: &ReportMetadata) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let json = serde_json::to_string(metadata)?;
        conn.execute(
            "INSERT OR REPLACE INTO reports (report_id, created_at, metadata) VALUES (?1, ?2, ?3)",
            params![report_id, format_timestamp(&metadata.created_at), json],
        )?;
        debug!("stored metadata for report {}", report_id);
        Ok(())
    }

    /// Every report, oldest first
    pub fn list_reports(&self) -> Result<Vec<ReportRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT report_id, created_at, metadata FROM reports ORDER BY created_at, report_id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<(String, String, String)>, _>>()?;
        rows.into_iter().map(to_record).collect()
    }

    /// Reports created strictly before `cutoff`, oldest first
    pub fn reports_older_than(&self, cutoff: &DateTime<Utc>) -> Result<Vec<ReportRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT report_id, created_at, metadata FROM reports WHERE created_at < ?1 ORDER BY created_at, report_id",
        )?;
        let rows = stmt
            .query_map(params![format_timestamp(cutoff)], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<(String, String, String)>, _>>()?;
        rows.into_iter().map(to_record).collect()
    }

    pub fn get_report(&self, report_id: &str) -> Result<Option<ReportRecord>, StoreError> {
        let conn = self.connect()?;
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT report_id, created_at, metadata FROM reports WHERE report_id = ?1",
                params![report_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(to_record).transpose()
    }

    /// Delete rows by id in one transaction; returns how many existed
    pub fn delete_reports(&self, report_ids: &[String]) -> Result<usize, StoreError> {
        if report_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM reports WHERE report_id = ?1")?;
            for id in report_ids {
                deleted += stmt.execute(params![id])?;
            }
        }
        tx.commit()?;

        debug!("deleted {} report row(s)", deleted);
        Ok(deleted)
    }
}

fn to_record((report_id, created_at, metadata): (String, String, String)) -> Result<ReportRecord, StoreError> {
    Ok(ReportRecord {
        created_at: parse_timestamp(&created_at)?,
        metadata: serde_json::from_str(&metadata)?,
        report_id,
    })
}
