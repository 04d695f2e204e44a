//! Display names for MARC bibliographic language codes.
//!
//! Resolving a language name is allowed to fail; callers that only need a
//! label use [`display_name_or_empty`], which turns the failure into an
//! empty string at one explicit place.

use lazy_static::lazy_static;
use std::collections::HashMap;
use thiserror::Error;

/// Failure to resolve a language code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageLookupError {
    /// The code is not three ASCII letters.
    #[error("malformed language code '{0}'")]
    Malformed(String),

    /// The code is well formed but not known to the lookup.
    #[error("unknown language code '{0}'")]
    Unknown(String),
}

/// Maps a bibliographic (ISO 639-2/B, MARC) language code to a display name.
pub trait LanguageNames: Send + Sync {
    /// Resolve `code` to a human-readable name.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageLookupError`] when the code is malformed or unknown.
    fn display_name(&self, code: &str) -> Result<String, LanguageLookupError>;
}

lazy_static! {
    static ref MARC_LANGUAGES: HashMap<&'static str, &'static str> = [
        ("ara", "Arabic"),
        ("arm", "Armenian"),
        ("ben", "Bengali"),
        ("bul", "Bulgarian"),
        ("chi", "Chinese"),
        ("cze", "Czech"),
        ("dan", "Danish"),
        ("dut", "Dutch"),
        ("eng", "English"),
        ("fin", "Finnish"),
        ("fre", "French"),
        ("geo", "Georgian"),
        ("ger", "German"),
        ("gre", "Greek, Modern (1453-)"),
        ("grc", "Greek, Ancient (to 1453)"),
        ("heb", "Hebrew"),
        ("hin", "Hindi"),
        ("hun", "Hungarian"),
        ("ice", "Icelandic"),
        ("ind", "Indonesian"),
        ("ita", "Italian"),
        ("jpn", "Japanese"),
        ("kor", "Korean"),
        ("lat", "Latin"),
        ("mul", "Multiple languages"),
        ("nor", "Norwegian"),
        ("per", "Persian"),
        ("pol", "Polish"),
        ("por", "Portuguese"),
        ("rum", "Romanian"),
        ("rus", "Russian"),
        ("spa", "Spanish"),
        ("swe", "Swedish"),
        ("tha", "Thai"),
        ("tur", "Turkish"),
        ("ukr", "Ukrainian"),
        ("und", "Undetermined"),
        ("urd", "Urdu"),
        ("vie", "Vietnamese"),
        ("yid", "Yiddish"),
        ("zxx", "No linguistic content"),
    ]
    .into_iter()
    .collect();
}

/// Built-in table of the MARC language codes common in catalog records.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarcLanguageTable;

impl LanguageNames for MarcLanguageTable {
    fn display_name(&self, code: &str) -> Result<String, LanguageLookupError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LanguageLookupError::Malformed(code.to_string()));
        }
        let key = code.to_ascii_lowercase();
        MARC_LANGUAGES
            .get(key.as_str())
            .map(|name| (*name).to_string())
            .ok_or(LanguageLookupError::Unknown(key))
    }
}

/// Display name for `code`, or an empty string if it cannot be resolved.
#[must_use]
pub fn display_name_or_empty(names: &dyn LanguageNames, code: &str) -> String {
    match names.display_name(code) {
        Ok(name) => name,
        Err(e) => {
            tracing::debug!(error = %e, "no display name for language");
            String::new()
        },
    }
}
