//! DTC-INTERPRET: Raw codes to localized, human-readable findings
//!
//! Each [`RawCodeEntry`] becomes exactly one [`InterpretedCode`], in input
//! order. Duplicates stay duplicates.
//!
//! - Known codes take description, advice and severity from the
//!   [`KnowledgeBase`], localized to the requested language
//! - Unknown codes get `known = false`, severity `unknown` and translated
//!   placeholder text naming the code
//!
//! Interpretation never fails. A missing dataset or translation only means
//! more codes fall back to defaults.

pub mod knowledge_base;

pub use knowledge_base::{KnowledgeBase, KnowledgeBaseRecord, LocalizedText};

use dtc_core::settings::default_knowledge_base_path;
use dtc_core::{InterpretedCode, RawCodeEntry, Severity, DEFAULT_LANGUAGE};
use dtc_i18n::Translator;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use tracing::debug;

pub const UNKNOWN_DESCRIPTION: &str = "No database entry for code {code}.";
pub const UNKNOWN_ADVICE: &str = "Refer to a qualified technician for further diagnosis.";

/// Process-wide dataset, loaded on first use.
///
/// `VEHICLESCAN_KB_PATH` overrides the location.
static GLOBAL_KB: Lazy<KnowledgeBase> = Lazy::new(|| {
    let path = std::env::var_os("VEHICLESCAN_KB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(default_knowledge_base_path);
    KnowledgeBase::load(&path, DEFAULT_LANGUAGE)
});

/// Shared knowledge base instance
pub fn global_knowledge_base() -> &'static KnowledgeBase {
    &GLOBAL_KB
}

/// Interpret with the shared knowledge base and translator
pub fn interpret(entries: &[RawCodeEntry], language: &str) -> Vec<InterpretedCode> {
    Interpreter::new(&GLOBAL_KB, dtc_i18n::global()).interpret(entries, language)
}

/// Resolves codes against one dataset and one set of translations
#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'a> {
    kb: &'a KnowledgeBase,
    translator: &'a Translator,
}

impl<'a> Interpreter<'a> {
    pub fn new(kb: &'a KnowledgeBase, translator: &'a Translator) -> Self {
        Interpreter { kb, translator }
    }

    pub fn interpret(&self, entries: &[RawCodeEntry], language: &str) -> Vec<InterpretedCode> {
        let codes: Vec<InterpretedCode> = entries
            .iter()
            .map(|entry| self.interpret_entry(entry, language))
            .collect();

        debug!(
            "interpreted {} code(s), {} unknown",
            codes.len(),
            codes.iter().filter(|c| !c.known).count()
        );
        codes
    }

    pub fn interpret_entry(&self, entry: &RawCodeEntry, language: &str) -> InterpretedCode {
        let code = entry.code.to_ascii_uppercase();

        match self.kb.get(&code) {
            Some(record) => {
                let default_language = self.kb.default_language();
                InterpretedCode {
                    description: record.description.resolve(language, default_language).to_string(),
                    advice: record.advice.resolve(language, default_language).to_string(),
                    severity_label: self.severity_label(&record.severity, language),
                    severity: record.severity.clone(),
                    status: entry.status,
                    known: true,
                    code,
                }
            }
            None => {
                debug!("{} not in knowledge base", code);
                InterpretedCode {
                    description: self.translator.translate(
                        "report.unknown_code_description",
                        language,
                        Some(UNKNOWN_DESCRIPTION),
                        &[("code", code.as_str())],
                    ),
                    advice: self.translator.translate(
                        "report.unknown_code_advice",
                        language,
                        Some(UNKNOWN_ADVICE),
                        &[],
                    ),
                    severity_label: self.severity_label(&Severity::Unknown, language),
                    severity: Severity::Unknown,
                    status: entry.status,
                    known: false,
                    code,
                }
            }
        }
    }

    fn severity_label(&self, severity: &Severity, language: &str) -> String {
        let key = format!("severity.{}", severity.as_str());
        self.translator
            .translate(&key, language, Some(severity.title().as_str()), &[])
    }
}
