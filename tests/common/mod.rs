//! Common test doubles shared across the integration test suite.
//!
//! `FakeCatalog` answers statements by name and last parameter, and
//! `FakeConnector` serves canned partner responses while counting how often
//! sessions are opened and closed.

#![allow(dead_code)]

use launchpad::catalog::statements::{
    AVAILABILITY, BIBIDS_BY_ISBN, BIBIDS_BY_ISSN, BIBIDS_BY_OCLC, ELECTRONIC_ACCESS,
    HOLDINGS_FOR_BIB,
};
use launchpad::{
    AttributeQuery, AttributeScheme, CatalogSource, Connector, Grammar, LaunchpadError,
    PartnerConfig, ProtocolError, Row, SearchSession, ServerTarget, SqlValue, Statement,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

// =============================================================================
// UNION CATALOG
// =============================================================================

struct Answer {
    statement: &'static str,
    key: SqlValue,
    rows: Vec<Row>,
}

/// In-memory union catalog.
///
/// A statement is answered when its name matches and its last parameter
/// equals the registered key; anything else matches nothing.
#[derive(Default)]
pub struct FakeCatalog {
    answers: Vec<Answer>,
    failing: Option<&'static str>,
    calls: Mutex<Vec<(&'static str, Vec<SqlValue>)>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `statement` called with `key` as its last parameter.
    pub fn answer(mut self, statement: &Statement, key: impl Into<SqlValue>, rows: Vec<Row>) -> Self {
        self.answers.push(Answer {
            statement: statement.name,
            key: key.into(),
            rows,
        });
        self
    }

    /// Fail every execution of `statement` as an unreachable backend would.
    pub fn failing_on(mut self, statement: &Statement) -> Self {
        self.failing = Some(statement.name);
        self
    }

    pub fn isbn(self, pattern: &str, bib_ids: &[i64]) -> Self {
        self.answer(&BIBIDS_BY_ISBN, pattern, bib_rows(bib_ids))
    }

    pub fn issn(self, issn: &str, bib_ids: &[i64]) -> Self {
        self.answer(&BIBIDS_BY_ISSN, issn, bib_rows(bib_ids))
    }

    pub fn oclc(self, oclc: &str, bib_ids: &[i64]) -> Self {
        self.answer(&BIBIDS_BY_OCLC, oclc, bib_rows(bib_ids))
    }

    /// Register the holdings of one bib as `(mfhd_id, library_name)` pairs.
    pub fn holdings(self, bib_id: i64, holdings: &[(i64, &str)]) -> Self {
        let rows = holdings
            .iter()
            .map(|(mfhd_id, library)| holding_row(bib_id, *mfhd_id, library))
            .collect();
        self.answer(&HOLDINGS_FOR_BIB, bib_id, rows)
    }

    pub fn items(self, mfhd_id: i64, items: Vec<Row>) -> Self {
        self.answer(&AVAILABILITY, mfhd_id, items)
    }

    pub fn link(self, mfhd_id: i64, url: &str) -> Self {
        let row = Row::new().with("MFHD_ID", mfhd_id).with("LINK856U", url);
        self.answer(&ELECTRONIC_ACCESS, mfhd_id, vec![row])
    }

    /// Number of times the named statement was executed.
    pub fn calls_to(&self, statement: &Statement) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|(name, _)| *name == statement.name).count())
            .unwrap_or_default()
    }

    /// Parameters of every execution of the named statement.
    pub fn params_of(&self, statement: &Statement) -> Vec<Vec<SqlValue>> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(name, _)| *name == statement.name)
                    .map(|(_, params)| params.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl CatalogSource for FakeCatalog {
    fn fetch(&self, statement: &Statement, params: &[SqlValue]) -> launchpad::Result<Vec<Row>> {
        assert_eq!(params.len(), statement.arity, "arity of {}", statement.name);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((statement.name, params.to_vec()));
        }
        if self.failing == Some(statement.name) {
            return Err(LaunchpadError::query(
                statement.name,
                "ORA-03113: end-of-file on communication channel",
            ));
        }
        let rows = self
            .answers
            .iter()
            .filter(|a| a.statement == statement.name && params.last() == Some(&a.key))
            .flat_map(|a| a.rows.clone())
            .collect();
        Ok(rows)
    }
}

pub fn bib_rows(bib_ids: &[i64]) -> Vec<Row> {
    bib_ids
        .iter()
        .map(|id| Row::new().with("BIB_ID", *id).with("LIBRARY_NAME", "GW"))
        .collect()
}

pub fn holding_row(bib_id: i64, mfhd_id: i64, library: &str) -> Row {
    Row::new()
        .with("BIB_ID", bib_id)
        .with("MFHD_ID", mfhd_id)
        .with("LOCATION_ID", 100 + mfhd_id)
        .with("DISPLAY_CALL_NO", format!("QA76.{mfhd_id}"))
        .with("LOCATION_DISPLAY_NAME", "Stacks")
        .with("LIBRARY_NAME", library)
}

pub fn item_row(item_id: i64, status: i64, description: &str, location: &str) -> Row {
    Row::new()
        .with("ITEM_ID", item_id)
        .with("ITEM_STATUS", status)
        .with("ITEM_STATUS_DESC", description)
        .with("PERM_LOCATION", location)
        .with("DISPLAY_CALL_NO", "QA76 .A1")
}

// =============================================================================
// PARTNER CATALOGS
// =============================================================================

/// What a fake partner endpoint does when searched.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Answer with these records
    Records(Vec<String>),
    /// Refuse the connection
    RefuseConnect,
    /// Reject the search
    FailSearch,
    /// Yield this many records, then fail reading the next one
    FailAfter(usize, Vec<String>),
    /// Answer after a delay
    Slow(Duration, Vec<String>),
    /// Answer normally but reject the close
    FailClose(Vec<String>),
}

/// Partner endpoints keyed by host name.
#[derive(Default)]
pub struct FakeConnector {
    endpoints: HashMap<String, Behavior>,
    pub connects: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, host: &str, behavior: Behavior) -> Self {
        self.endpoints.insert(host.to_string(), behavior);
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn sent_queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl Connector for FakeConnector {
    fn connect(&self, target: &ServerTarget) -> Result<Box<dyn SearchSession>, ProtocolError> {
        let behavior = self
            .endpoints
            .get(&target.host)
            .cloned()
            .ok_or_else(|| ProtocolError(format!("no route to host {}", target.host)))?;
        if matches!(behavior, Behavior::RefuseConnect) {
            return Err(ProtocolError("connection refused".to_string()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            behavior,
            closes: Arc::clone(&self.closes),
            queries: Arc::clone(&self.queries),
        }))
    }
}

struct FakeSession {
    behavior: Behavior,
    closes: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
}

fn ok_records(records: &[String]) -> Vec<Result<String, ProtocolError>> {
    records.iter().cloned().map(Ok).collect()
}

impl SearchSession for FakeSession {
    fn search(
        &mut self,
        query: &AttributeQuery,
    ) -> Result<launchpad::federated::RecordIter<'_>, ProtocolError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_pqf());
        }
        let results = match &self.behavior {
            Behavior::Records(records) | Behavior::FailClose(records) => ok_records(records),
            Behavior::Slow(delay, records) => {
                thread::sleep(*delay);
                ok_records(records)
            }
            Behavior::FailAfter(n, records) => {
                let mut results = ok_records(&records[..*n]);
                results.push(Err(ProtocolError("record retrieval failed".to_string())));
                results
            }
            Behavior::FailSearch => return Err(ProtocolError("unsupported use attribute".to_string())),
            Behavior::RefuseConnect => Vec::new(),
        };
        Ok(Box::new(results.into_iter()))
    }

    fn close(&mut self) -> Result<(), ProtocolError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::FailClose(_) => Err(ProtocolError("close not acknowledged".to_string())),
            _ => Ok(()),
        }
    }
}

pub fn partner(host: &str, grammar: Grammar, attributes: AttributeScheme) -> PartnerConfig {
    PartnerConfig {
        server: ServerTarget {
            host: host.to_string(),
            port: 210,
            database: "Voyager".to_string(),
            record_syntax: "OPAC".to_string(),
        },
        grammar,
        attributes,
    }
}

/// Field-per-line partner searched by ISBN, ISSN, and OCLC attributes.
pub fn gt_partner() -> PartnerConfig {
    partner(
        "gt.example.edu",
        Grammar::FieldPerLine,
        AttributeScheme::ByKind {
            isbn: Some(7),
            issn: Some(8),
            oclc: Some(1007),
            lccn: None,
        },
    )
}

/// Backslash-packed partner searched on one fixed attribute.
pub fn gm_partner() -> PartnerConfig {
    partner(
        "gm.example.edu",
        Grammar::BackslashPacked,
        AttributeScheme::Fixed { attribute: 12 },
    )
}

pub fn gt_record(status: &str, call_number: &str, location: &str) -> String {
    format!(
        "holdingsData:\n localLocation: {location}\n callNumber: {call_number}\n publicNote: {status}\n"
    )
}

pub fn gm_record(holdings: &[(&str, &str, &str)]) -> String {
    holdings
        .iter()
        .map(|(status, call_number, location)| {
            format!(
                "availableNow: {status}\ncallNumber: {call_number}\\Stacks\nlocalLocation: {location}\\Main\n"
            )
        })
        .collect()
}
