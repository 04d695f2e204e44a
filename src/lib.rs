#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Launchpad: holdings lookup across a library federation
//!
//! Answers "which member library holds this publication, and where" from
//! loose bibliographic identifiers. Members that share the relational union
//! catalog are answered from it; partners outside it are searched over a
//! legacy attribute-based search protocol and their free-text responses are
//! parsed into the same holdings shape.
//!
//! ## Quick Start
//!
//! ```ignore
//! use launchpad::{CandidateIdentifiers, FederationConfig, Lookup};
//! use std::sync::Arc;
//!
//! # fn main() -> launchpad::Result<()> {
//! let config = FederationConfig::from_file("launchpad.toml")?;
//! let lookup = Lookup::from_config(Arc::new(my_catalog), Arc::new(my_connector), &config);
//!
//! let candidates = CandidateIdentifiers::new().isbn("0-19-503540-2 (pbk.)");
//! let queries = lookup.partner_queries(launchpad::IdentifierKind::Isbn, "0-19-503540-2");
//! let report = lookup.run(&candidates, &queries);
//!
//! for holding in report.union.iter().flatten() {
//!     println!("{}: {:?}", holding.library_name, holding.call_number);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`identifiers`]: ISBN, ISSN, OCLC, and LCCN normalization
//! - [`catalog`]: Read-only query interface over the union catalog
//! - [`resolver`]: Identifier to bib record resolution
//! - [`bib`]: Bib records and their vernacular (880) fields
//! - [`holdings`]: Holdings, electronic access, and item availability
//! - [`federated`]: Partner catalog search and response grammars
//! - [`lookup`]: Concurrent union and partner lookups
//! - [`request_link`]: Interlibrary-loan request link repair
//! - [`config`]: Federation configuration
//! - [`language`]: Language display names
//! - [`error`]: Error types and result type

pub mod bib;
pub mod catalog;
pub mod config;
pub mod error;
pub mod federated;
pub mod holdings;
pub mod identifiers;
pub mod language;
pub mod lookup;
pub mod request_link;
pub mod resolver;

pub use bib::{fetch_bib_record, BibRecord, CjkField, LinkageInfo};
pub use catalog::{BibId, CatalogSource, Row, SqlValue, Statement};
pub use config::{AttributeScheme, FederationConfig, PartnerConfig, ServerTarget};
pub use error::{LaunchpadError, Result};
pub use federated::{
    AttributeQuery, Connector, FederatedClient, FederatedHolding, Grammar, ProtocolError,
    SearchSession, SessionGuard,
};
pub use holdings::{Availability, ElectronicAccess, HoldingRecord, HoldingsAggregator, ItemStatus};
pub use identifiers::{normalize, IdentifierKind, NormalizedIdentifier};
pub use language::{LanguageLookupError, LanguageNames, MarcLanguageTable};
pub use lookup::{Lookup, LookupReport, PartnerQuery, SourceOutcome};
pub use request_link::{repair_request_link, repair_sid_link, RequestLinkConfig};
pub use resolver::{CandidateIdentifiers, IndexResolver};
