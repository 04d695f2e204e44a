//! Error types for catalog lookups.
//!
//! This module provides the [`LaunchpadError`] type for all union-catalog and
//! federated-search operations and the [`Result`] convenience type.
//!
//! Malformed identifiers and lookups that match nothing are never errors; only
//! an unavailable backend or an unusable configuration surfaces here.

use thiserror::Error;

/// Error type for all lookup operations.
#[derive(Error, Debug)]
pub enum LaunchpadError {
    /// The relational union catalog rejected or failed a query.
    #[error("Catalog query '{statement}' failed: {message}")]
    Query {
        /// Name of the statement that failed
        statement: &'static str,
        /// Backend-supplied failure description
        message: String,
    },

    /// A partner's search endpoint could not be reached.
    #[error("Connection to partner '{partner}' failed: {message}")]
    Connection {
        /// Partner name from the configuration table
        partner: String,
        /// Connector-supplied failure description
        message: String,
    },

    /// A partner session failed while searching or fetching records.
    #[error("Protocol error from partner '{partner}': {message}")]
    Protocol {
        /// Partner name from the configuration table
        partner: String,
        /// Session-supplied failure description
        message: String,
    },

    /// No partner with this name is configured.
    #[error("Unknown partner: {0}")]
    UnknownPartner(String),

    /// A source did not answer before the fan-out deadline.
    #[error("Timed out waiting for {0}")]
    TimedOut(String),

    /// The configuration is structurally valid TOML but semantically unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The configuration could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error reading a configuration file.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LaunchpadError {
    /// Build a [`LaunchpadError::Query`] for the named statement.
    pub fn query(statement: &'static str, message: impl Into<String>) -> Self {
        LaunchpadError::Query {
            statement,
            message: message.into(),
        }
    }

    /// Whether this error came from a source being unreachable or failing,
    /// as opposed to a local configuration problem.
    #[must_use]
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            LaunchpadError::Query { .. }
                | LaunchpadError::Connection { .. }
                | LaunchpadError::Protocol { .. }
                | LaunchpadError::TimedOut(_)
        )
    }
}

/// Convenience type alias for [`std::result::Result`] with [`LaunchpadError`].
pub type Result<T> = std::result::Result<T, LaunchpadError>;
