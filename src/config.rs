//! Federation configuration: partner endpoints and request-link settings.
//!
//! Configuration is an explicit value handed to the clients that need it;
//! nothing is read from process-wide state. It is usually loaded from TOML:
//!
//! ```toml
//! search_timeout_ms = 8000
//!
//! [request_link]
//! base_url = "https://www.aladin.wrlc.org/Z-WEB/ILLAuthClient?"
//! sid_suffix = ":GWLP"
//! sid_value_width = 31
//!
//! [partners.GT]
//! host = "gtcat.example.edu"
//! port = 7090
//! database = "Voyager"
//! record_syntax = "OPAC"
//! grammar = "field-per-line"
//! attributes = { scheme = "by-kind", isbn = 7, issn = 8, oclc = 1007 }
//!
//! [partners.GM]
//! host = "gmcat.example.edu"
//! port = 210
//! database = "INNOPAC"
//! grammar = "backslash-packed"
//! attributes = { scheme = "fixed", attribute = 12 }
//! ```

use crate::error::{LaunchpadError, Result};
use crate::federated::Grammar;
use crate::identifiers::IdentifierKind;
use crate::request_link::RequestLinkConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 10_000;

fn default_search_timeout_ms() -> u64 {
    DEFAULT_SEARCH_TIMEOUT_MS
}

fn default_record_syntax() -> String {
    "OPAC".to_string()
}

/// Connection parameters of a partner's search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTarget {
    /// Host name
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Database name to search
    pub database: String,
    /// Preferred record syntax, e.g. `OPAC`, `USMARC`
    #[serde(default = "default_record_syntax")]
    pub record_syntax: String,
}

/// How a partner maps identifier kinds to use attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "kebab-case")]
pub enum AttributeScheme {
    /// A distinct attribute per identifier kind; kinds left out are not searchable.
    ByKind {
        /// Attribute for ISBN searches
        #[serde(default)]
        isbn: Option<u32>,
        /// Attribute for ISSN searches
        #[serde(default)]
        issn: Option<u32>,
        /// Attribute for OCLC searches
        #[serde(default)]
        oclc: Option<u32>,
        /// Attribute for LCCN searches
        #[serde(default)]
        lccn: Option<u32>,
    },
    /// One attribute regardless of kind.
    Fixed {
        /// The attribute every search uses
        attribute: u32,
    },
}

impl AttributeScheme {
    /// Use attribute for searching `kind`, if the partner supports it.
    #[must_use]
    pub fn use_attribute(&self, kind: IdentifierKind) -> Option<u32> {
        match *self {
            AttributeScheme::Fixed { attribute } => Some(attribute),
            AttributeScheme::ByKind {
                isbn,
                issn,
                oclc,
                lccn,
            } => match kind {
                IdentifierKind::Isbn => isbn,
                IdentifierKind::Issn => issn,
                IdentifierKind::Oclc => oclc,
                IdentifierKind::Lccn => lccn,
            },
        }
    }
}

/// One partner catalog outside the union catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerConfig {
    /// Endpoint
    #[serde(flatten)]
    pub server: ServerTarget,
    /// Response grammar
    pub grammar: Grammar,
    /// Query attribute mapping
    pub attributes: AttributeScheme,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Partner catalogs by name, in search order
    #[serde(default)]
    pub partners: IndexMap<String, PartnerConfig>,
    /// Interlibrary-loan request link settings
    #[serde(default)]
    pub request_link: RequestLinkConfig,
    /// How long a fan-out waits for its slowest source
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
}

impl Default for FederationConfig {
    fn default() -> Self {
        FederationConfig {
            partners: IndexMap::new(),
            request_link: RequestLinkConfig::default(),
            search_timeout_ms: DEFAULT_SEARCH_TIMEOUT_MS,
        }
    }
}

impl FederationConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is unusable.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: FederationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check values serde cannot: non-empty endpoints, non-zero attributes.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchpadError::Config`] naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        for (name, partner) in &self.partners {
            let server = &partner.server;
            if server.host.trim().is_empty() {
                return Err(LaunchpadError::Config(format!("partner '{name}' has no host")));
            }
            if server.port == 0 {
                return Err(LaunchpadError::Config(format!("partner '{name}' has port 0")));
            }
            if server.database.trim().is_empty() {
                return Err(LaunchpadError::Config(format!(
                    "partner '{name}' has no database name"
                )));
            }
            let has_zero = IdentifierKind::ALL
                .iter()
                .any(|kind| partner.attributes.use_attribute(*kind) == Some(0));
            if has_zero {
                return Err(LaunchpadError::Config(format!(
                    "partner '{name}' maps a kind to attribute 0"
                )));
            }
        }
        if self.request_link.sid_value_width == 0 {
            return Err(LaunchpadError::Config(
                "request_link.sid_value_width must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration of the named partner.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchpadError::UnknownPartner`] if it is not configured.
    pub fn partner(&self, name: &str) -> Result<&PartnerConfig> {
        self.partners
            .get(name)
            .ok_or_else(|| LaunchpadError::UnknownPartner(name.to_string()))
    }

    /// Fan-out deadline as a [`Duration`]
    #[must_use]
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
search_timeout_ms = 2500

[partners.GT]
host = "gtcat.example.edu"
port = 7090
database = "Voyager"
grammar = "field-per-line"
attributes = { scheme = "by-kind", isbn = 7, issn = 8, oclc = 1007 }

[partners.GM]
host = "gmcat.example.edu"
port = 210
database = "INNOPAC"
record_syntax = "USMARC"
grammar = "backslash-packed"
attributes = { scheme = "fixed", attribute = 12 }
"#;

    #[test]
    fn test_parse_sample() {
        let config = FederationConfig::from_toml_str(SAMPLE).unwrap();
        let names: Vec<&str> = config.partners.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["GT", "GM"]);
        assert_eq!(config.search_timeout(), Duration::from_millis(2500));

        let gt = config.partner("GT").unwrap();
        assert_eq!(gt.server.record_syntax, "OPAC");
        assert_eq!(gt.grammar, Grammar::FieldPerLine);
        assert_eq!(gt.attributes.use_attribute(IdentifierKind::Oclc), Some(1007));
        assert_eq!(gt.attributes.use_attribute(IdentifierKind::Lccn), None);

        let gm = config.partner("GM").unwrap();
        assert_eq!(gm.server.record_syntax, "USMARC");
        assert_eq!(gm.grammar, Grammar::BackslashPacked);
        assert_eq!(gm.attributes.use_attribute(IdentifierKind::Isbn), Some(12));
    }

    #[test]
    fn test_defaults() {
        let config = FederationConfig::from_toml_str("").unwrap();
        assert!(config.partners.is_empty());
        assert_eq!(config.search_timeout_ms, DEFAULT_SEARCH_TIMEOUT_MS);
        assert_eq!(config.request_link, RequestLinkConfig::default());
    }

    #[test]
    fn test_unknown_partner() {
        let config = FederationConfig::default();
        assert!(matches!(
            config.partner("XX"),
            Err(LaunchpadError::UnknownPartner(name)) if name == "XX"
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_port = SAMPLE.replace("port = 210", "port = 0");
        assert!(matches!(
            FederationConfig::from_toml_str(&bad_port),
            Err(LaunchpadError::Config(_))
        ));

        let bad_attr = SAMPLE.replace("attribute = 12", "attribute = 0");
        assert!(matches!(
            FederationConfig::from_toml_str(&bad_attr),
            Err(LaunchpadError::Config(_))
        ));

        let bad_width = "[request_link]\nsid_value_width = 0\n";
        assert!(FederationConfig::from_toml_str(bad_width).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = FederationConfig::from_toml_str("partners = 3").unwrap_err();
        assert!(matches!(err, LaunchpadError::ConfigParse(_)));
    }

    #[test]
    fn test_unknown_grammar_rejected() {
        let text = SAMPLE.replace("backslash-packed", "marc-xml");
        assert!(FederationConfig::from_toml_str(&text).is_err());
    }
}
