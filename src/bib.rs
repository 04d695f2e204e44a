//! Bibliographic records of the union catalog.
//!
//! A [`BibRecord`] is read fresh for every request. Besides the descriptive
//! columns it carries the record's 880 (Alternate Graphical Representation)
//! fields, which the catalog hands back packed into one string. They are
//! unpacked here into labelled [`CjkField`] pairs.
//!
//! # Packed 880 format
//!
//! Fields are separated by `//` followed by the next field's `$6`, so a `//`
//! inside a value (an 856 URL, say) stays with its field. Inside a field, subfields start with `$`
//! and a one-character code. Subfield 6 carries the linkage back to the
//! romanized field, `TAG-OCC[/script][/r]`, where the CJK script code is
//! itself written `$1`:
//!
//! ```text
//! $6245-01/$1$a紅樓夢$c曹雪芹著 // $6100-02/$1$a曹雪芹
//! ```

use crate::catalog::statements::BIB_RECORD;
use crate::catalog::{BibId, CatalogSource, Row, SqlValue};
use crate::error::Result;
use crate::language::{display_name_or_empty, LanguageNames};
use crate::resolver::CandidateIdentifiers;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // TAG-OCC, then an optional script code ((2, (3, (N, $1 ...) and /r
    static ref LINKAGE: Regex =
        Regex::new(r"^(\d{3})-(\d{2,3})(?:/([\(\$][A-Za-z0-9]))?(/r)?").unwrap();
    static ref FIELD_BREAK: Regex = Regex::new(r"//\s*\$6").unwrap();
}

/// Information extracted from a subfield 6 linkage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageInfo {
    /// Tag of the romanized field this 880 pairs with
    pub tag: String,
    /// Occurrence number shared by the pair
    pub occurrence: String,
    /// Script identification code, `$1` for CJK; empty if absent
    pub script_id: String,
    /// Whether the right-to-left flag is set
    pub is_reverse: bool,
}

impl LinkageInfo {
    /// Parse a linkage at the start of `value`, returning it with the number
    /// of bytes it spans.
    #[must_use]
    pub fn parse_prefix(value: &str) -> Option<(Self, usize)> {
        let caps = LINKAGE.captures(value)?;
        let span = caps.get(0)?.end();
        Some((
            LinkageInfo {
                tag: caps.get(1)?.as_str().to_string(),
                occurrence: caps.get(2)?.as_str().to_string(),
                script_id: caps
                    .get(3)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                is_reverse: caps.get(4).is_some(),
            },
            span,
        ))
    }

    /// Display label for the linked field.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.tag.as_str() {
            "245" | "246" | "130" | "240" => "TITLE",
            "250" => "EDITION",
            "260" | "264" => "IMPRINT",
            t if t.starts_with('1') || t.starts_with('7') => "AUTHOR",
            t if t.starts_with('4') || t.starts_with("80") || t.starts_with("83") => "SERIES",
            _ => "OTHER",
        }
    }
}

/// One vernacular field value with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CjkField {
    /// Label of the romanized field, e.g. `TITLE`, `AUTHOR`
    pub field: String,
    /// Tag of the romanized field, e.g. `245`
    pub tag: String,
    /// Subfield values joined by single spaces
    pub value: String,
}

/// Unpack a packed 880 column into labelled fields.
///
/// Fields without a readable linkage, or with nothing but a linkage, are
/// skipped rather than reported.
#[must_use]
pub fn parse_cjk_info(packed: &str) -> Vec<CjkField> {
    let mut fields = Vec::new();
    let mut start = 0;
    for brk in FIELD_BREAK.find_iter(packed) {
        fields.push(&packed[start..brk.start()]);
        // the next field keeps its $6
        start = brk.end() - 2;
    }
    fields.push(&packed[start..]);

    fields
        .into_iter()
        .filter_map(|field| {
            let field = field.trim();
            parse_cjk_field(field.strip_suffix("//").unwrap_or(field).trim_end())
        })
        .collect()
}

fn parse_cjk_field(field: &str) -> Option<CjkField> {
    let rest = field.strip_prefix("$6")?;
    let (linkage, span) = LinkageInfo::parse_prefix(rest.trim_start())?;
    let subfields = &rest.trim_start()[span..];

    let value = subfields
        .split('$')
        .filter_map(|sub| {
            let mut chars = sub.chars();
            chars.next()?;
            let text = chars.as_str().trim();
            (!text.is_empty()).then_some(text)
        })
        .collect::<Vec<_>>()
        .join(" ");

    if value.is_empty() {
        return None;
    }

    Some(CjkField {
        field: linkage.label().to_string(),
        tag: linkage.tag,
        value,
    })
}

/// A bibliographic record with its owning library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibRecord {
    /// Union-catalog id
    pub bib_id: BibId,
    /// Title statement
    pub title: Option<String>,
    /// Main entry
    pub author: Option<String>,
    /// Edition statement
    pub edition: Option<String>,
    /// Raw ISBN column, possibly listing several
    pub isbn: Option<String>,
    /// Raw ISSN column
    pub issn: Option<String>,
    /// Raw network (OCLC) number
    pub network_number: Option<String>,
    /// Publisher name
    pub publisher: Option<String>,
    /// Place of publication
    pub pub_place: Option<String>,
    /// Full imprint statement
    pub imprint: Option<String>,
    /// Two-character format code (record type + bib level)
    pub bib_format: Option<String>,
    /// MARC language code
    pub language: Option<String>,
    /// Language display name, empty when it cannot be resolved
    pub language_display: String,
    /// Owning library
    pub library_name: Option<String>,
    /// First 856 $u
    pub link: Option<String>,
    /// Unpacked 880 fields
    pub cjk_info: Vec<CjkField>,
}

impl BibRecord {
    /// Build from a `BIB_RECORD` row, resolving the language label.
    #[must_use]
    pub fn from_row(row: &Row, languages: &dyn LanguageNames) -> Self {
        let language = row.text("LANGUAGE");
        let language_display = language
            .as_deref()
            .map(|code| display_name_or_empty(languages, code))
            .unwrap_or_default();

        BibRecord {
            bib_id: BibId(row.int("BIB_ID").unwrap_or_default()),
            title: row.text("TITLE"),
            author: row.text("AUTHOR"),
            edition: row.text("EDITION"),
            isbn: row.text("ISBN"),
            issn: row.text("ISSN"),
            network_number: row.text("NETWORK_NUMBER"),
            publisher: row.text("PUBLISHER"),
            pub_place: row.text("PUB_PLACE"),
            imprint: row.text("IMPRINT"),
            bib_format: row.text("BIB_FORMAT"),
            language,
            language_display,
            library_name: row.text("LIBRARY_NAME"),
            link: row.text("LINK"),
            cjk_info: row
                .text("CJK_INFO")
                .map(|packed| parse_cjk_info(&packed))
                .unwrap_or_default(),
        }
    }

    /// The identifiers this record contributes to a holdings lookup.
    #[must_use]
    pub fn candidates(&self) -> CandidateIdentifiers {
        CandidateIdentifiers {
            isbn: self.isbn.clone(),
            issn: self.issn.clone(),
            oclc: self.network_number.clone(),
        }
    }
}

impl From<&BibRecord> for CandidateIdentifiers {
    fn from(bib: &BibRecord) -> Self {
        bib.candidates()
    }
}

/// Fetch one unsuppressed bib record; `Ok(None)` when there is none.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub fn fetch_bib_record(
    catalog: &dyn CatalogSource,
    bib_id: BibId,
    languages: &dyn LanguageNames,
) -> Result<Option<BibRecord>> {
    let param = SqlValue::from(bib_id);
    let row = catalog.fetch_first(&BIB_RECORD, &[param.clone(), param.clone(), param])?;
    Ok(row.map(|row| BibRecord::from_row(&row, languages)))
}
