//! Identifier normalization for ISBN, ISSN, OCLC, and LCCN values.
//!
//! Catalog data arrives dirty: co-listed ISBNs, trailing `(pbk.)` annotations,
//! embedded whitespace, revision suffixes on LCCNs. Every function here is
//! total. Malformed input degrades to a best-effort string, never an error,
//! and normalizing an already-normalized value returns it unchanged.
//!
//! # Examples
//!
//! ```
//! use launchpad::identifiers::{normalize, IdentifierKind};
//!
//! assert_eq!(normalize(IdentifierKind::Lccn, "n 79-18774").as_str(), "n79018774");
//! assert_eq!(
//!     normalize(IdentifierKind::Isbn, "0679302603; 0679302611 (papbk)").as_str(),
//!     "0679302603"
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Kind of a standard identifier, selecting both the normalization rule and
/// the catalog index it is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    /// International Standard Book Number (10 or 13 characters)
    Isbn,
    /// International Standard Serial Number (8 characters)
    Issn,
    /// OCLC control number
    Oclc,
    /// Library of Congress Control Number
    Lccn,
}

impl IdentifierKind {
    /// All kinds, in the order a bibliographic input is resolved.
    pub const ALL: [IdentifierKind; 4] = [
        IdentifierKind::Isbn,
        IdentifierKind::Issn,
        IdentifierKind::Oclc,
        IdentifierKind::Lccn,
    ];

    /// Lowercase name used in configuration files and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Isbn => "isbn",
            Self::Issn => "issn",
            Self::Oclc => "oclc",
            Self::Lccn => "lccn",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isbn" => Ok(Self::Isbn),
            "issn" => Ok(Self::Issn),
            "oclc" => Ok(Self::Oclc),
            "lccn" => Ok(Self::Lccn),
            other => Err(format!("unknown identifier kind '{other}'")),
        }
    }
}

/// Canonical form of an identifier, as the catalog indexes store it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedIdentifier {
    kind: IdentifierKind,
    value: String,
}

impl NormalizedIdentifier {
    /// The identifier kind this value was normalized as.
    #[must_use]
    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// The canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Whether normalization produced nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Consume and return the canonical string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for NormalizedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Normalize a raw identifier of the given kind.
///
/// Never fails; the worst case is an empty or partially cleaned value.
#[must_use]
pub fn normalize(kind: IdentifierKind, raw: &str) -> NormalizedIdentifier {
    let value = match kind {
        IdentifierKind::Isbn => clean_isbn(raw),
        IdentifierKind::Issn => clean_issn(raw),
        IdentifierKind::Oclc => clean_oclc(raw),
        IdentifierKind::Lccn => clean_lccn(raw),
    };
    NormalizedIdentifier { kind, value }
}

/// Fold compatibility forms (full-width digits, ideographic spaces) to ASCII
/// and drop whatever is left outside ASCII. Every canonical form is ASCII.
fn fold_ascii(raw: &str) -> String {
    raw.nfkc().filter(char::is_ascii).collect()
}

fn is_isbn_delimiter(c: char) -> bool {
    c.is_ascii_whitespace() || matches!(c, '.' | ';' | ',' | ':' | '(' | ')' | '[' | ']' | '/')
}

fn is_isbn_shaped(token: &str) -> bool {
    let bytes = token.as_bytes();
    match bytes.len() {
        13 => bytes.iter().all(u8::is_ascii_digit),
        10 => {
            bytes[..9].iter().all(u8::is_ascii_digit)
                && (bytes[9].is_ascii_digit() || bytes[9] == b'X')
        },
        _ => false,
    }
}

/// Extract the first ISBN from a field that may list several.
///
/// Tokens are split on whitespace and punctuation; hyphens inside a token are
/// dropped and a lowercase check character is uppercased. The first token of
/// ISBN-10 or ISBN-13 shape wins. If no token has that shape, the first
/// non-empty token is returned as a best effort.
///
/// # Examples
///
/// ```
/// use launchpad::identifiers::clean_isbn;
///
/// assert_eq!(clean_isbn("0080212472. 0080212464"), "0080212472");
/// assert_eq!(clean_isbn("978-0-306-40615-7 (hbk.)"), "9780306406157");
/// ```
#[must_use]
pub fn clean_isbn(raw: &str) -> String {
    let text = fold_ascii(raw);
    let mut fallback: Option<String> = None;

    for token in text.split(is_isbn_delimiter) {
        let candidate: String = token
            .chars()
            .filter(|c| *c != '-')
            .map(|c| if c == 'x' { 'X' } else { c })
            .collect();
        if candidate.is_empty() {
            continue;
        }
        if is_isbn_shaped(&candidate) {
            return candidate;
        }
        if fallback.is_none() {
            fallback = Some(candidate);
        }
    }

    fallback.unwrap_or_default()
}

/// Reduce an ISSN to the eight-character form used by the serial index.
///
/// Only digits and the `X` check character survive; anything after the eighth
/// of those (a second co-listed ISSN, say) is dropped.
///
/// # Examples
///
/// ```
/// use launchpad::identifiers::clean_issn;
///
/// assert_eq!(clean_issn("0010-194x"), "0010194X");
/// assert_eq!(clean_issn("ISSN 0164-4297 (print)"), "01644297");
/// ```
#[must_use]
pub fn clean_issn(raw: &str) -> String {
    fold_ascii(raw)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'x' || *c == 'X')
        .map(|c| c.to_ascii_uppercase())
        .take(8)
        .collect()
}

/// Reduce an OCLC number to its bare numeric control number.
///
/// Prefixes such as `(OCoLC)`, `ocm`, `ocn`, and `on` are skipped by taking the
/// first run of digits. Leading zeros are kept.
///
/// # Examples
///
/// ```
/// use launchpad::identifiers::clean_oclc;
///
/// assert_eq!(clean_oclc("(OCoLC)ocm01234567"), "01234567");
/// assert_eq!(clean_oclc(" on1045678901 "), "1045678901");
/// ```
#[must_use]
pub fn clean_oclc(raw: &str) -> String {
    fold_ascii(raw)
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect()
}

/// Normalize an LCCN following the Library of Congress algorithm.
///
/// 1. Remove all whitespace.
/// 2. Drop the first `/` and everything after it (revision suffixes).
/// 3. If a hyphen remains, left-pad the serial after it with zeros to six
///    characters and join it to the prefix.
///
/// # Examples
///
/// ```
/// use launchpad::identifiers::clean_lccn;
///
/// assert_eq!(clean_lccn("85-2"), "85000002");
/// assert_eq!(clean_lccn(" 79139101 /AC/r932"), "79139101");
/// assert_eq!(clean_lccn("sn2006058112"), "sn2006058112");
/// ```
#[must_use]
pub fn clean_lccn(raw: &str) -> String {
    let compact: String = fold_ascii(raw)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let compact = match compact.split_once('/') {
        Some((head, _)) => head.to_string(),
        None => compact,
    };

    match compact.split_once('-') {
        Some((prefix, serial)) => {
            let serial: String = serial.chars().filter(|c| *c != '-').collect();
            format!("{prefix}{serial:0>6}")
        },
        None => compact,
    }
}
