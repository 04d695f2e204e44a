//! Federated search of partner catalogs outside the union catalog.
//!
//! Partners are reached over a session-oriented, attribute-based search
//! protocol (Z39.50). The wire protocol itself is an external collaborator
//! behind [`Connector`] and [`SearchSession`]; this module builds queries,
//! owns the session lifetime, and hands result text to the partner's
//! [`Grammar`].
//!
//! Sessions are not shared. Each search opens its own, and a
//! [`SessionGuard`] closes it exactly once on every exit path: success, an
//! empty result set, a protocol error, or a caller that stops waiting.

pub mod grammar;

use crate::config::{AttributeScheme, PartnerConfig, ServerTarget};
use crate::error::{LaunchpadError, Result};
use crate::identifiers::{normalize, IdentifierKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use grammar::Grammar;

/// A holding synthesized from a partner's search response.
///
/// Fields are extracted by pattern, not validated, and are empty strings when
/// the partner omitted them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedHolding {
    /// Circulation status text
    pub status: String,
    /// Location text
    pub location: String,
    /// Call number text
    pub call_number: String,
}

/// Failure reported by the protocol layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProtocolError(pub String);

/// A single-term query on one use attribute (bib-1 attribute type 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeQuery {
    /// Use attribute, e.g. 7 for ISBN, 8 for ISSN, 1007 for OCLC
    pub use_attribute: u32,
    /// Search term
    pub term: String,
}

impl AttributeQuery {
    /// Create a query
    #[must_use]
    pub fn new(use_attribute: u32, term: impl Into<String>) -> Self {
        AttributeQuery {
            use_attribute,
            term: term.into(),
        }
    }

    /// Render as Prefix Query Format, quoting terms that need it.
    ///
    /// ```
    /// use launchpad::federated::AttributeQuery;
    ///
    /// assert_eq!(AttributeQuery::new(7, "0080212472").to_pqf(), "@attr 1=7 0080212472");
    /// assert_eq!(AttributeQuery::new(4, "red chamber").to_pqf(), "@attr 1=4 \"red chamber\"");
    /// ```
    #[must_use]
    pub fn to_pqf(&self) -> String {
        let needs_quotes = self.term.is_empty()
            || self
                .term
                .chars()
                .any(|c| c.is_whitespace() || c == '"' || c == '@');
        if needs_quotes {
            let escaped = self.term.replace('\\', "\\\\").replace('"', "\\\"");
            format!("@attr 1={} \"{escaped}\"", self.use_attribute)
        } else {
            format!("@attr 1={} {}", self.use_attribute, self.term)
        }
    }
}

impl fmt::Display for AttributeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pqf())
    }
}

/// Result records of one search, each serialized to text.
pub type RecordIter<'s> =
    Box<dyn Iterator<Item = std::result::Result<String, ProtocolError>> + 's>;

/// An open session with a partner's search endpoint.
///
/// Not safe for concurrent reuse; one search per session at a time.
pub trait SearchSession: Send {
    /// Run `query` and iterate its result set.
    ///
    /// # Errors
    ///
    /// Returns an error if the partner rejects the query.
    fn search(&mut self, query: &AttributeQuery) -> std::result::Result<RecordIter<'_>, ProtocolError>;

    /// Release the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the partner does not acknowledge the close.
    fn close(&mut self) -> std::result::Result<(), ProtocolError>;
}

/// Opens sessions to partner endpoints.
pub trait Connector: Send + Sync {
    /// Connect to `target` with its database and preferred record syntax.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be reached.
    fn connect(
        &self,
        target: &ServerTarget,
    ) -> std::result::Result<Box<dyn SearchSession>, ProtocolError>;
}

/// Owns a session and closes it exactly once: on [`SessionGuard::close`], or
/// on drop if that was never reached.
pub struct SessionGuard {
    partner: String,
    session: Box<dyn SearchSession>,
    closed: bool,
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("partner", &self.partner)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    /// Take ownership of an open session
    #[must_use]
    pub fn new(partner: impl Into<String>, session: Box<dyn SearchSession>) -> Self {
        SessionGuard {
            partner: partner.into(),
            session,
            closed: false,
        }
    }

    /// Search and read the whole result set.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchpadError::Protocol`] if the search or reading any
    /// record fails.
    pub fn fetch_all(&mut self, query: &AttributeQuery) -> Result<Vec<String>> {
        let partner = &self.partner;
        let protocol = |e: ProtocolError| LaunchpadError::Protocol {
            partner: partner.clone(),
            message: e.0,
        };
        self.session
            .search(query)
            .map_err(protocol)?
            .map(|record| record.map_err(protocol))
            .collect()
    }

    /// Close the session now.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchpadError::Protocol`] if the close is not acknowledged.
    /// The session counts as released either way.
    pub fn close(mut self) -> Result<()> {
        self.release().map_err(|e| LaunchpadError::Protocol {
            partner: self.partner.clone(),
            message: e.0,
        })
    }

    fn release(&mut self) -> std::result::Result<(), ProtocolError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.session.close()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(partner = %self.partner, error = %e, "failed to close partner session");
        }
    }
}

/// Searches configured partner catalogs.
pub struct FederatedClient {
    connector: Arc<dyn Connector>,
    partners: IndexMap<String, PartnerConfig>,
}

impl fmt::Debug for FederatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederatedClient")
            .field("partners", &self.partners.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl FederatedClient {
    /// Create a client for the given partner table
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, partners: IndexMap<String, PartnerConfig>) -> Self {
        FederatedClient {
            connector,
            partners,
        }
    }

    /// Names of the configured partners, in configuration order
    pub fn partner_names(&self) -> impl Iterator<Item = &str> {
        self.partners.keys().map(String::as_str)
    }

    fn partner(&self, name: &str) -> Result<&PartnerConfig> {
        self.partners
            .get(name)
            .ok_or_else(|| LaunchpadError::UnknownPartner(name.to_string()))
    }

    /// Search `partner` for a raw identifier of the given kind.
    ///
    /// The value is normalized first. A value that normalizes to nothing, or
    /// a kind the partner has no attribute for, is an empty result without a
    /// connection being made.
    ///
    /// # Errors
    ///
    /// Returns an error if the partner is unknown, unreachable, or fails the
    /// search.
    pub fn search(
        &self,
        partner: &str,
        kind: IdentifierKind,
        raw: &str,
    ) -> Result<Vec<FederatedHolding>> {
        let config = self.partner(partner)?;
        let Some(attribute) = config.attributes.use_attribute(kind) else {
            tracing::debug!(partner, kind = %kind, "partner has no attribute for kind");
            return Ok(Vec::new());
        };
        let value = normalize(kind, raw);
        if value.is_empty() {
            return Ok(Vec::new());
        }
        self.run(partner, config, &AttributeQuery::new(attribute, value.into_string()))
    }

    /// Search `partner` for a term used verbatim, such as a local control
    /// number. Only partners with a fixed attribute accept raw terms.
    ///
    /// # Errors
    ///
    /// Returns an error if the partner is unknown, has no fixed attribute,
    /// is unreachable, or fails the search.
    pub fn search_term(&self, partner: &str, term: &str) -> Result<Vec<FederatedHolding>> {
        let config = self.partner(partner)?;
        let AttributeScheme::Fixed { attribute } = config.attributes else {
            return Err(LaunchpadError::Config(format!(
                "partner '{partner}' searches by identifier kind, not by raw term"
            )));
        };
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.run(partner, config, &AttributeQuery::new(attribute, term))
    }

    fn run(
        &self,
        partner: &str,
        config: &PartnerConfig,
        query: &AttributeQuery,
    ) -> Result<Vec<FederatedHolding>> {
        let session =
            self.connector
                .connect(&config.server)
                .map_err(|e| LaunchpadError::Connection {
                    partner: partner.to_string(),
                    message: e.0,
                })?;
        let mut guard = SessionGuard::new(partner, session);

        let records = guard.fetch_all(query);
        if let Err(e) = guard.close() {
            tracing::warn!(partner, error = %e, "partner session close failed");
        }
        let records = records?;

        let holdings = config.grammar.parse(&records);
        tracing::debug!(
            partner,
            query = %query,
            records = records.len(),
            count = holdings.len(),
            "partner search complete"
        );
        Ok(holdings)
    }
}
