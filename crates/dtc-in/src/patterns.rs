//! Declarative recognition tables for DTC-IN.
//!
//! Everything the extractor recognizes is defined here:
//! - The DTC token pattern
//! - The status keyword table, in priority order
//! - Line breaks (`\r\n`, `\r` and `\n`)

use dtc_core::{CodeStatus, DTC_PATTERN};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// One code token: P/C/B/U followed by four hex digits, word-bounded
    static ref CODE: Regex = Regex::new(DTC_PATTERN).unwrap();

    static ref LINE_BREAK: Regex = Regex::new(r"\r\n|\r|\n").unwrap();
}

/// Status keywords, matched as case-insensitive substrings.
///
/// When a value contains several keywords the earliest row here wins.
pub const STATUS_KEYWORDS: &[(&str, CodeStatus)] = &[
    ("pending", CodeStatus::Pending),
    ("stored", CodeStatus::Stored),
    ("history", CodeStatus::History),
    ("permanent", CodeStatus::Permanent),
    ("active", CodeStatus::Active),
];

/// Header fragments that mark the code column of a CSV export
pub const CODE_HEADER_KEYWORDS: &[&str] = &["code", "dtc", "fault"];

/// First code in `text`, uppercased
pub fn find_code(text: &str) -> Option<String> {
    CODE.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Every non-overlapping code in `text`, in order of appearance, uppercased
pub fn find_all_codes(text: &str) -> Vec<String> {
    CODE.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
        .collect()
}

/// Scan values in order; the first value containing any keyword decides.
pub fn find_status<'a, I>(values: I) -> Option<CodeStatus>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter(|value| !value.is_empty())
        .find_map(|value| {
            let lowered = value.to_lowercase();
            STATUS_KEYWORDS
                .iter()
                .find(|(keyword, _)| lowered.contains(keyword))
                .map(|(_, status)| *status)
        })
}

/// Lines of `text`, treating old Mac `\r` endings as breaks too
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    LINE_BREAK.split(text)
}

/// True when a CSV header names the code column
pub fn is_code_header(header: &str) -> bool {
    let lowered = header.trim().to_lowercase();
    CODE_HEADER_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_code_uppercases() {
        assert_eq!(find_code("fault p0300 seen"), Some("P0300".to_string()));
        assert_eq!(find_code("c0035"), Some("C0035".to_string()));
        assert_eq!(find_code("no codes here"), None);
    }

    #[test]
    fn test_word_boundaries() {
        // Embedded in a longer token: not a code
        assert_eq!(find_code("XP0300"), None);
        assert_eq!(find_code("P03001"), None);
        assert_eq!(find_code("P0300_x"), None);
        // Punctuation is a boundary
        assert_eq!(find_code("(P0300)"), Some("P0300".to_string()));
        assert_eq!(find_code("code:U0100,"), Some("U0100".to_string()));
    }

    #[test]
    fn test_hex_digits_accepted() {
        assert_eq!(find_all_codes("P0A0F and b1aBc"), vec!["P0A0F", "B1ABC"]);
        assert!(find_all_codes("P0G00").is_empty());
    }

    #[test]
    fn test_find_all_codes_order() {
        let codes = find_all_codes("U0100, P0171; P0171 then C0035");
        assert_eq!(codes, vec!["U0100", "P0171", "P0171", "C0035"]);
    }

    #[test]
    fn test_status_priority_is_table_order() {
        // Both keywords present in one value: "pending" is declared first
        assert_eq!(find_status(["Stored / Pending"]), Some(CodeStatus::Pending));
        assert_eq!(find_status(["ACTIVE permanent"]), Some(CodeStatus::Permanent));
    }

    #[test]
    fn test_status_first_value_wins() {
        assert_eq!(
            find_status(["", "P0300", "History", "Pending"]),
            Some(CodeStatus::History)
        );
        assert_eq!(find_status(["P0300", "n/a"]), None);
    }

    #[test]
    fn test_split_lines_handles_all_endings() {
        let lines: Vec<&str> = split_lines("a\r\nb\rc\nd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_code_header_detection() {
        assert!(is_code_header("DTC"));
        assert!(is_code_header(" Fault Code "));
        assert!(is_code_header("Trouble code"));
        assert!(!is_code_header("Status"));
    }
}
