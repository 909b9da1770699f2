//! Free-text extraction: every code on every line.

use crate::patterns::{find_all_codes, find_status, split_lines};
use dtc_core::{RawCodeEntry, SourceKind};

/// Scan line by line. All codes on a line share that line's status.
pub fn extract_text(content: &str) -> Vec<RawCodeEntry> {
    let mut entries = Vec::new();

    for line in split_lines(content) {
        let codes = find_all_codes(line);
        if codes.is_empty() {
            continue;
        }

        let status = find_status([line]);
        entries.extend(
            codes
                .into_iter()
                .map(|code| RawCodeEntry::new(code, status, SourceKind::Text)),
        );
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtc_core::CodeStatus;

    #[test]
    fn test_status_shared_across_line() {
        let entries = extract_text("Found codes: P0171 (pending) and P0442");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "P0171");
        assert_eq!(entries[1].code, "P0442");
        assert!(entries.iter().all(|e| e.status == Some(CodeStatus::Pending)));
        assert!(entries.iter().all(|e| e.source == SourceKind::Text));
    }

    #[test]
    fn test_status_is_per_line() {
        let entries = extract_text("P0300 stored\nP0420\r\nhistory: u0100\n");
        let summary: Vec<_> = entries.iter().map(|e| (e.code.as_str(), e.status)).collect();
        assert_eq!(
            summary,
            vec![
                ("P0300", Some(CodeStatus::Stored)),
                ("P0420", None),
                ("U0100", Some(CodeStatus::History)),
            ]
        );
    }

    #[test]
    fn test_carriage_return_ends_line() {
        let entries = extract_text("P0300 stored\rP0420\r");
        let summary: Vec<_> = entries.iter().map(|e| (e.code.as_str(), e.status)).collect();
        assert_eq!(
            summary,
            vec![("P0300", Some(CodeStatus::Stored)), ("P0420", None)]
        );
    }

    #[test]
    fn test_duplicates_kept() {
        let entries = extract_text("P0300 P0300\nP0300");
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_no_codes() {
        assert!(extract_text("Scan complete.\nNo faults.").is_empty());
        assert!(extract_text("").is_empty());
    }
}
