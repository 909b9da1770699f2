//! Named `{placeholder}` substitution for translated templates.
//!
//! `{{` and `}}` produce literal braces. A placeholder without a matching
//! parameter stays in the output as written.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::warn;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// Substitute `params` into `template`
pub fn substitute(template: &str, params: &[(&str, &str)]) -> String {
    if !template.contains('{') && !template.contains('}') {
        return template.to_string();
    }

    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let whole = &caps[0];
            match caps.get(1) {
                None if whole == "{{" => "{".to_string(),
                None => "}".to_string(),
                Some(name) => match params.iter().find(|(key, _)| *key == name.as_str()) {
                    Some((_, value)) => value.to_string(),
                    None => {
                        warn!("no value for placeholder {} in {:?}", whole, template);
                        whole.to_string()
                    }
                },
            }
        })
        .into_owned()
}

/// Placeholder names used in a template, in order of appearance
pub fn placeholder_names(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_substitution() {
        let out = substitute("No database entry for code {code}.", &[("code", "P9999")]);
        assert_eq!(out, "No database entry for code P9999.");
    }

    #[test]
    fn test_repeated_and_multiple() {
        let out = substitute("{a}-{b}-{a}", &[("b", "2"), ("a", "1")]);
        assert_eq!(out, "1-2-1");
    }

    #[test]
    fn test_escaped_braces() {
        let out = substitute("{{literal}} {name}", &[("name", "x")]);
        assert_eq!(out, "{literal} x");
    }

    #[test]
    fn test_missing_parameter_left_verbatim() {
        assert_eq!(substitute("Hello {name}", &[]), "Hello {name}");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let out = substitute("{a}", &[("a", "{b}"), ("b", "oops")]);
        assert_eq!(out, "{b}");
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(
            placeholder_names("Report {report_id}: {codes} {{skip}}"),
            vec!["report_id", "codes"]
        );
    }
}
