//! Retention: drop reports (rows and files) older than a number of days.

use crate::files::remove_files;
use crate::{ReportStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Rows deleted
    pub purged: usize,
    /// Files removed from disk
    pub files_removed: usize,
    pub cutoff: DateTime<Utc>,
}

/// Delete every report created before `now - days`.
///
/// Files go first (best effort), then all expired rows in one transaction.
/// A `days` value whose cutoff is not a representable time is rejected.
pub fn purge_expired(store: &ReportStore, days: i64, now: DateTime<Utc>) -> Result<PurgeSummary, StoreError> {
    let cutoff = Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(StoreError::Retention { days })?;
    let expired = store.reports_older_than(&cutoff)?;

    if expired.is_empty() {
        info!("no expired reports to purge");
        return Ok(PurgeSummary {
            purged: 0,
            files_removed: 0,
            cutoff,
        });
    }

    let mut files_removed = 0;
    let mut ids = Vec::with_capacity(expired.len());
    for record in &expired {
        files_removed += remove_files(record.metadata.files());
        ids.push(record.report_id.clone());
    }

    let purged = store.delete_reports(&ids)?;
    info!("purged {} report(s) older than {} day(s)", purged, days);

    Ok(PurgeSummary {
        purged,
        files_removed,
        cutoff,
    })
}
