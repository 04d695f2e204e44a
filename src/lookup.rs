//! Concurrent lookup across the union catalog and partner catalogs.
//!
//! A [`Lookup`] runs the union-catalog holdings aggregation and one search
//! per partner query at the same time, each on its own thread, and collects
//! their results over a channel until every source has answered or the
//! deadline passes. Each source's outcome is kept separately in the
//! [`LookupReport`]: one failing or slow partner never hides the others.
//!
//! Merging the holdings lists is left to the caller.

use crate::catalog::CatalogSource;
use crate::config::FederationConfig;
use crate::error::{LaunchpadError, Result};
use crate::federated::{Connector, FederatedClient, FederatedHolding};
use crate::holdings::{HoldingRecord, HoldingsAggregator};
use crate::identifiers::IdentifierKind;
use crate::resolver::CandidateIdentifiers;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of one source in a fan-out.
pub type SourceOutcome<T> = Result<T>;

/// Label used for the union catalog in logs and timeout errors.
pub const UNION_SOURCE: &str = "union catalog";

/// One search to run against a partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerQuery {
    /// Partner name from the configuration table
    pub partner: String,
    /// Identifier kind of `term`; `None` searches the raw term on the
    /// partner's fixed attribute
    pub kind: Option<IdentifierKind>,
    /// Search value
    pub term: String,
}

impl PartnerQuery {
    /// Search `partner` for a raw identifier of the given kind
    #[must_use]
    pub fn identifier(
        partner: impl Into<String>,
        kind: IdentifierKind,
        raw: impl Into<String>,
    ) -> Self {
        PartnerQuery {
            partner: partner.into(),
            kind: Some(kind),
            term: raw.into(),
        }
    }

    /// Search `partner` for a term used verbatim
    #[must_use]
    pub fn term(partner: impl Into<String>, term: impl Into<String>) -> Self {
        PartnerQuery {
            partner: partner.into(),
            kind: None,
            term: term.into(),
        }
    }

    fn execute(&self, client: &FederatedClient) -> SourceOutcome<Vec<FederatedHolding>> {
        match self.kind {
            Some(kind) => client.search(&self.partner, kind, &self.term),
            None => client.search_term(&self.partner, &self.term),
        }
    }
}

/// Per-source outcomes of a fan-out.
#[derive(Debug)]
pub struct LookupReport {
    /// Union-catalog holdings
    pub union: SourceOutcome<Vec<HoldingRecord>>,
    /// Partner results in query order
    pub partners: Vec<(String, SourceOutcome<Vec<FederatedHolding>>)>,
}

impl LookupReport {
    /// Whether every source failed, as opposed to some answering with
    /// nothing.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.union.is_err() && self.partners.iter().all(|(_, outcome)| outcome.is_err())
    }

    /// Number of sources that failed or timed out
    #[must_use]
    pub fn failure_count(&self) -> usize {
        usize::from(self.union.is_err())
            + self
                .partners
                .iter()
                .filter(|(_, outcome)| outcome.is_err())
                .count()
    }

    /// Total holdings found across the sources that succeeded
    #[must_use]
    pub fn holdings_count(&self) -> usize {
        let union = self.union.as_ref().map_or(0, Vec::len);
        let partners: usize = self
            .partners
            .iter()
            .filter_map(|(_, outcome)| outcome.as_ref().ok())
            .map(Vec::len)
            .sum();
        union + partners
    }

    /// Results of the named partner, if it was queried
    #[must_use]
    pub fn partner(&self, name: &str) -> Option<&SourceOutcome<Vec<FederatedHolding>>> {
        self.partners
            .iter()
            .find(|(partner, _)| partner == name)
            .map(|(_, outcome)| outcome)
    }
}

enum Message {
    Union(SourceOutcome<Vec<HoldingRecord>>),
    Partner(usize, SourceOutcome<Vec<FederatedHolding>>),
}

/// Runs union and partner lookups concurrently with a shared deadline.
pub struct Lookup {
    catalog: Arc<dyn CatalogSource>,
    client: Arc<FederatedClient>,
    timeout: Duration,
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lookup")
            .field("client", &self.client)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Lookup {
    /// Create a lookup over the given sources
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        client: Arc<FederatedClient>,
        timeout: Duration,
    ) -> Self {
        Lookup {
            catalog,
            client,
            timeout,
        }
    }

    /// Create a lookup from configuration, with partners reached through
    /// `connector`
    #[must_use]
    pub fn from_config(
        catalog: Arc<dyn CatalogSource>,
        connector: Arc<dyn Connector>,
        config: &FederationConfig,
    ) -> Self {
        let client = FederatedClient::new(connector, config.partners.clone());
        Lookup::new(catalog, Arc::new(client), config.search_timeout())
    }

    /// One query per configured partner for the same raw identifier.
    #[must_use]
    pub fn partner_queries(&self, kind: IdentifierKind, raw: &str) -> Vec<PartnerQuery> {
        self.client
            .partner_names()
            .map(|name| PartnerQuery::identifier(name, kind, raw))
            .collect()
    }

    /// Run the union-catalog lookup for `candidates` and every partner query
    /// concurrently.
    ///
    /// Sources that have not answered by the deadline are reported as
    /// [`LaunchpadError::TimedOut`]. Their threads are not waited for; a
    /// late partner search still closes its session when it returns.
    #[must_use]
    pub fn run(&self, candidates: &CandidateIdentifiers, queries: &[PartnerQuery]) -> LookupReport {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let (sender, receiver) = unbounded();

        let mut union: Option<SourceOutcome<Vec<HoldingRecord>>> = None;
        let mut partners: Vec<Option<SourceOutcome<Vec<FederatedHolding>>>> =
            queries.iter().map(|_| None).collect();
        let mut pending = 0usize;

        match self.spawn_union(candidates.clone(), sender.clone()) {
            Ok(()) => pending += 1,
            Err(e) => union = Some(Err(e)),
        }
        for (index, query) in queries.iter().enumerate() {
            match self.spawn_partner(index, query.clone(), sender.clone()) {
                Ok(()) => pending += 1,
                Err(e) => partners[index] = Some(Err(e)),
            }
        }
        drop(sender);

        // A worker that panics never reports and ends up recorded as timed out.
        while pending > 0 {
            match receiver.recv_deadline(deadline) {
                Ok(Message::Union(outcome)) => union = Some(outcome),
                Ok(Message::Partner(index, outcome)) => partners[index] = Some(outcome),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
            pending -= 1;
        }

        let report = LookupReport {
            union: union.unwrap_or_else(|| Err(LaunchpadError::TimedOut(UNION_SOURCE.to_string()))),
            partners: queries
                .iter()
                .zip(partners)
                .map(|(query, outcome)| {
                    let outcome = outcome
                        .unwrap_or_else(|| Err(LaunchpadError::TimedOut(query.partner.clone())));
                    (query.partner.clone(), outcome)
                })
                .collect(),
        };
        log_report(&report, started.elapsed());
        report
    }

    fn spawn_union(
        &self,
        candidates: CandidateIdentifiers,
        sender: Sender<Message>,
    ) -> Result<()> {
        let catalog = Arc::clone(&self.catalog);
        thread::Builder::new()
            .name("launchpad-union".to_string())
            .spawn(move || {
                let outcome = HoldingsAggregator::new(catalog.as_ref()).get_holdings(&candidates);
                // The receiver is gone once the deadline has passed.
                let _ = sender.send(Message::Union(outcome));
            })?;
        Ok(())
    }

    fn spawn_partner(
        &self,
        index: usize,
        query: PartnerQuery,
        sender: Sender<Message>,
    ) -> Result<()> {
        let client = Arc::clone(&self.client);
        thread::Builder::new()
            .name(format!("launchpad-{}", query.partner))
            .spawn(move || {
                let outcome = query.execute(&client);
                let _ = sender.send(Message::Partner(index, outcome));
            })?;
        Ok(())
    }
}

fn log_report(report: &LookupReport, elapsed: Duration) {
    if let Err(e) = &report.union {
        tracing::warn!(source = UNION_SOURCE, error = %e, "union catalog lookup failed");
    }
    for (partner, outcome) in &report.partners {
        if let Err(e) = outcome {
            tracing::warn!(partner = %partner, error = %e, "partner lookup failed");
        }
    }
    tracing::info!(
        partners = report.partners.len(),
        failed = report.failure_count(),
        holdings = report.holdings_count(),
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "lookup complete"
    );
}
