//! CSV extraction for scanner exports with a header row.

use crate::patterns::{find_code, find_status, is_code_header};
use dtc_core::{RawCodeEntry, SourceKind};
use tracing::debug;

/// Extract one entry per data row that carries a code.
///
/// The code comes from the code column when there is one and it holds a
/// code; otherwise from the first cell that contains one. Rows without a
/// code are skipped, and so are records the CSV reader rejects.
pub fn extract_csv(content: &str) -> Vec<RawCodeEntry> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let code_column = match reader.headers() {
        Ok(headers) => headers.iter().position(is_code_header),
        Err(err) => {
            debug!("csv header unreadable: {}", err);
            return Vec::new();
        }
    };

    let mut entries = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                debug!("skipping csv record {}: {}", index + 1, err);
                continue;
            }
        };

        let code = code_column
            .and_then(|column| record.get(column))
            .and_then(find_code)
            .or_else(|| record.iter().find_map(find_code));

        let Some(code) = code else {
            continue;
        };

        let status = find_status(record.iter());
        entries.push(RawCodeEntry::new(code, status, SourceKind::Csv));
    }

    entries
}
