//! Response grammars of partner catalogs.
//!
//! The protocol layer hands back each result record serialized as free text,
//! one `name: value` element per line (OPAC record syntax). Partners differ in
//! which element names carry status, call number, and location, and in how
//! they pack holdings into a record, so each format is a named [`Grammar`].
//! New partner formats add a variant here.
//!
//! Values are whatever follows the colon after the element name, minus one
//! leading space and trailing whitespace. Nothing is validated; a missing
//! element is an empty string.

use super::FederatedHolding;
use serde::{Deserialize, Serialize};

/// Response format of a partner catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grammar {
    /// One holding per record. Each line is read on its own and every record
    /// yields a row, with empty strings for absent elements.
    FieldPerLine,
    /// Holdings packed several to a record. Call number and location lines end
    /// at the first backslash, and a row is emitted only once status, call
    /// number, and location have all been seen.
    BackslashPacked,
}

impl Grammar {
    /// Parse every record of a result set.
    #[must_use]
    pub fn parse<S: AsRef<str>>(&self, records: &[S]) -> Vec<FederatedHolding> {
        match self {
            Grammar::FieldPerLine => parse_field_per_line(records),
            Grammar::BackslashPacked => parse_backslash_packed(records),
        }
    }
}

/// Element names of the field-per-line format.
mod field_per_line {
    pub const STATUS: &str = "publicNote";
    pub const CALL_NUMBER: &str = "callNumber";
    pub const LOCATION: &str = "localLocation";
}

/// Element names of the backslash-packed format.
mod backslash_packed {
    pub const STATUS: &str = "availableNow";
    pub const CALL_NUMBER: &str = "callNumber";
    pub const LOCATION: &str = "localLocation";
}

/// Text following the first colon after `name` in `line`, if `name` occurs.
fn element<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let start = line.find(name)? + name.len();
    let after_name = &line[start..];
    let value = match after_name.find(':') {
        Some(colon) => &after_name[colon + 1..],
        None => "",
    };
    Some(value.strip_prefix(' ').unwrap_or(value).trim_end())
}

/// Cut a value at the first backslash, which starts packed sub-fields.
fn before_backslash(value: &str) -> &str {
    value.split('\\').next().unwrap_or(value)
}

/// Parse records where every line stands alone and every record is a row.
#[must_use]
pub fn parse_field_per_line<S: AsRef<str>>(records: &[S]) -> Vec<FederatedHolding> {
    use field_per_line::{CALL_NUMBER, LOCATION, STATUS};

    records
        .iter()
        .map(|record| {
            let mut holding = FederatedHolding::default();
            for line in record.as_ref().lines() {
                if let Some(value) = element(line, STATUS) {
                    holding.status = value.to_string();
                }
                if let Some(value) = element(line, CALL_NUMBER) {
                    holding.call_number = value.to_string();
                }
                if let Some(value) = element(line, LOCATION) {
                    holding.location = value.to_string();
                }
            }
            holding
        })
        .collect()
}

/// Parse records that pack several holdings, emitting only complete ones.
///
/// Buffers are cleared after each emitted row and at every record boundary,
/// so a holding missing an element is dropped rather than merged with the
/// next one.
#[must_use]
pub fn parse_backslash_packed<S: AsRef<str>>(records: &[S]) -> Vec<FederatedHolding> {
    use backslash_packed::{CALL_NUMBER, LOCATION, STATUS};

    let mut holdings = Vec::new();
    for record in records {
        let mut status: Option<String> = None;
        let mut call_number: Option<String> = None;
        let mut location: Option<String> = None;

        for line in record.as_ref().lines() {
            if let Some(value) = element(line, STATUS) {
                status = Some(value.to_string());
            }
            if let Some(value) = element(line, CALL_NUMBER) {
                call_number = Some(before_backslash(value).trim_end().to_string());
            }
            if let Some(value) = element(line, LOCATION) {
                location = Some(before_backslash(value).trim_end().to_string());
            }

            if status.is_some() && call_number.is_some() && location.is_some() {
                holdings.push(FederatedHolding {
                    status: status.take().unwrap_or_default(),
                    call_number: call_number.take().unwrap_or_default(),
                    location: location.take().unwrap_or_default(),
                });
            }
        }
    }
    holdings
}
