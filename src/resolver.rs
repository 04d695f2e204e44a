//! Resolution of standard identifiers to union-catalog bib records.
//!
//! Each identifier kind has its own index in the catalog. Lookups normalize
//! their input first, skip the query entirely when nothing usable is left,
//! and return a set so that the same record reached through different
//! indexes collapses to one id.

use crate::catalog::statements::{
    self, BIBIDS_BY_ISBN, BIBIDS_BY_ISSN, BIBIDS_BY_OCLC, PARTNER_CONTROL_NUMBERS,
};
use crate::catalog::{BibId, CatalogSource, Row, SqlValue, Statement};
use crate::error::Result;
use crate::identifiers::{clean_isbn, clean_issn, clean_oclc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Loose bibliographic identifiers supplied by a caller.
///
/// Values are raw; the resolver normalizes them. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateIdentifiers {
    /// Raw ISBN field, possibly listing several ISBNs
    pub isbn: Option<String>,
    /// Raw ISSN field
    pub issn: Option<String>,
    /// Raw OCLC / network number
    pub oclc: Option<String>,
}

impl CandidateIdentifiers {
    /// Create an empty candidate set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw ISBN
    #[must_use]
    pub fn isbn(mut self, value: impl Into<String>) -> Self {
        self.isbn = Some(value.into());
        self
    }

    /// Set the raw ISSN
    #[must_use]
    pub fn issn(mut self, value: impl Into<String>) -> Self {
        self.issn = Some(value.into());
        self
    }

    /// Set the raw OCLC number
    #[must_use]
    pub fn oclc(mut self, value: impl Into<String>) -> Self {
        self.oclc = Some(value.into());
        self
    }

    /// Whether no identifier with any content is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.isbn, &self.issn, &self.oclc]
            .iter()
            .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// Index code for a normalized ISBN: 13-character values live in their own index.
#[must_use]
pub fn isbn_index_code(isbn: &str) -> &'static str {
    if isbn.len() == 13 {
        statements::INDEX_ISBN13
    } else {
        statements::INDEX_ISBN10
    }
}

/// Escape `LIKE` wildcards so a best-effort ISBN token matches literally.
fn like_prefix(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 1);
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn bib_ids(rows: &[Row]) -> BTreeSet<BibId> {
    rows.iter().filter_map(|row| row.int("BIB_ID")).map(BibId).collect()
}

/// Resolves identifiers to bib record ids against a [`CatalogSource`].
pub struct IndexResolver<'a> {
    catalog: &'a dyn CatalogSource,
}

impl std::fmt::Debug for IndexResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexResolver").finish_non_exhaustive()
    }
}

impl<'a> IndexResolver<'a> {
    /// Create a resolver over the given catalog
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogSource) -> Self {
        IndexResolver { catalog }
    }

    fn lookup(&self, statement: &Statement, params: &[SqlValue]) -> Result<BTreeSet<BibId>> {
        let rows = self.catalog.fetch(statement, params)?;
        let ids = bib_ids(&rows);
        tracing::debug!(statement = statement.name, count = ids.len(), "resolved bib ids");
        Ok(ids)
    }

    /// Bib ids whose ISBN index heading starts with the normalized ISBN.
    ///
    /// # Errors
    ///
    /// Returns an error only if the catalog query fails.
    pub fn resolve_by_isbn(&self, raw: &str) -> Result<BTreeSet<BibId>> {
        let isbn = clean_isbn(raw);
        if isbn.is_empty() {
            return Ok(BTreeSet::new());
        }
        let code = isbn_index_code(&isbn);
        self.lookup(
            &BIBIDS_BY_ISBN,
            &[SqlValue::from(code), SqlValue::from(like_prefix(&isbn))],
        )
    }

    /// Bib ids whose ISSN index heading equals the normalized ISSN.
    ///
    /// # Errors
    ///
    /// Returns an error only if the catalog query fails.
    pub fn resolve_by_issn(&self, raw: &str) -> Result<BTreeSet<BibId>> {
        let issn = clean_issn(raw);
        if issn.is_empty() {
            return Ok(BTreeSet::new());
        }
        self.lookup(&BIBIDS_BY_ISSN, &[SqlValue::from(issn)])
    }

    /// Bib ids whose OCLC index heading equals the normalized number.
    ///
    /// # Errors
    ///
    /// Returns an error only if the catalog query fails.
    pub fn resolve_by_oclc(&self, raw: &str) -> Result<BTreeSet<BibId>> {
        let oclc = clean_oclc(raw);
        if oclc.is_empty() {
            return Ok(BTreeSet::new());
        }
        self.lookup(&BIBIDS_BY_OCLC, &[SqlValue::from(oclc)])
    }

    /// Union of the bib ids reachable from every present identifier,
    /// queried in ISBN, ISSN, OCLC order.
    ///
    /// # Errors
    ///
    /// Returns the first catalog failure; ids already resolved are discarded.
    pub fn resolve(&self, candidates: &CandidateIdentifiers) -> Result<BTreeSet<BibId>> {
        let mut ids = BTreeSet::new();
        if let Some(isbn) = &candidates.isbn {
            ids.extend(self.resolve_by_isbn(isbn)?);
        }
        if let Some(issn) = &candidates.issn {
            ids.extend(self.resolve_by_issn(issn)?);
        }
        if let Some(oclc) = &candidates.oclc {
            ids.extend(self.resolve_by_oclc(oclc)?);
        }
        Ok(ids)
    }

    /// Local control numbers of a union record, as a partner that indexes
    /// by control number expects them (035 headings stored verbatim).
    ///
    /// # Errors
    ///
    /// Returns an error only if the catalog query fails.
    pub fn partner_control_numbers(&self, bib_id: BibId) -> Result<Vec<String>> {
        let rows = self
            .catalog
            .fetch(&PARTNER_CONTROL_NUMBERS, &[SqlValue::from(bib_id)])?;
        Ok(rows
            .iter()
            .filter_map(|row| row.text("NORMAL_HEADING"))
            .collect())
    }
}
