//! Read-only access to the relational union catalog.
//!
//! The catalog itself (an Oracle-hosted integrated library system schema in
//! production) is an external collaborator. This module defines the seam:
//! a [`CatalogSource`] executes a named, parameterized [`Statement`] and
//! returns rows as column-ordered maps. Nothing here ever writes.
//!
//! Column names are upper-case, as the catalog reports them.

pub mod statements;

use crate::error::Result;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use statements::Statement;

/// Opaque identifier of a bibliographic record in the union catalog.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BibId(pub i64);

impl fmt::Display for BibId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Integer column
    Int(i64),
    /// Character column
    Text(String),
    /// Date/time column
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// The value as text, if it is a character column.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an integer. Numeric text is accepted since some drivers
    /// report NUMBER columns as strings.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(n) => Some(*n),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The value as a timestamp.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<BibId> for SqlValue {
    fn from(value: BibId) -> Self {
        SqlValue::Int(value.0)
    }
}

/// One result row: column name to value, in select-list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row(IndexMap<String, SqlValue>);

impl Row {
    /// Create an empty row
    #[must_use]
    pub fn new() -> Self {
        Row(IndexMap::new())
    }

    /// Builder-style column insert, mostly for fixtures.
    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.0.insert(column.to_string(), value.into());
        self
    }

    /// Insert or replace a column value
    pub fn insert(&mut self, column: impl Into<String>, value: SqlValue) {
        self.0.insert(column.into(), value);
    }

    /// Raw value of a column
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.0.get(column)
    }

    /// Text of a column with trailing blanks removed; `None` when the column
    /// is absent, NULL, non-text, or blank.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column)
            .and_then(SqlValue::as_text)
            .map(str::trim_end)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Text of a column, or an empty string.
    #[must_use]
    pub fn text_or_empty(&self, column: &str) -> String {
        self.text(column).unwrap_or_default()
    }

    /// Integer value of a column
    #[must_use]
    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_int)
    }

    /// Timestamp value of a column
    #[must_use]
    pub fn timestamp(&self, column: &str) -> Option<NaiveDateTime> {
        self.get(column).and_then(SqlValue::as_timestamp)
    }

    /// Column names in select-list order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Row(iter.into_iter().collect())
    }
}

/// Read-only query interface over the union catalog.
///
/// Implementations bind `params` positionally to the statement's `?`
/// placeholders; values are never spliced into SQL text. A query that
/// matches nothing returns an empty vector. Failures of the backend itself
/// are reported as [`crate::LaunchpadError::Query`].
///
/// Implementations must be shareable across threads: lookups for different
/// identifiers and bib records run concurrently against one source.
pub trait CatalogSource: Send + Sync {
    /// Execute `statement` with positional `params` and return every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or rejects the query.
    fn fetch(&self, statement: &Statement, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Execute `statement` and return only its first row, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or rejects the query.
    fn fetch_first(&self, statement: &Statement, params: &[SqlValue]) -> Result<Option<Row>> {
        Ok(self.fetch(statement, params)?.into_iter().next())
    }
}
