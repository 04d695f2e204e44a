//! Integration tests for the concurrent union + partner lookup.

mod common;

use common::{gm_partner, gm_record, gt_partner, gt_record, Behavior, FakeCatalog, FakeConnector};
use launchpad::catalog::statements::BIBIDS_BY_ISBN;
use launchpad::{
    CandidateIdentifiers, FederatedClient, FederationConfig, IdentifierKind, LaunchpadError,
    Lookup, PartnerQuery,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const ISBN: &str = "0-19-503540-2 (pbk.)";

fn catalog() -> Arc<FakeCatalog> {
    Arc::new(
        FakeCatalog::new()
            .isbn("0195035402%", &[1])
            .holdings(1, &[(10, "Georgetown"), (11, "American")]),
    )
}

fn config(timeout_ms: u64) -> FederationConfig {
    let mut config = FederationConfig {
        search_timeout_ms: timeout_ms,
        ..FederationConfig::default()
    };
    config.partners.insert("GT".to_string(), gt_partner());
    config.partners.insert("GM".to_string(), gm_partner());
    config
}

fn lookup(catalog: Arc<FakeCatalog>, connector: &Arc<FakeConnector>, timeout_ms: u64) -> Lookup {
    Lookup::from_config(catalog, Arc::clone(connector) as _, &config(timeout_ms))
}

fn connector(gt: Behavior, gm: Behavior) -> Arc<FakeConnector> {
    Arc::new(
        FakeConnector::new()
            .endpoint("gt.example.edu", gt)
            .endpoint("gm.example.edu", gm),
    )
}

#[test]
fn test_all_sources_answer() {
    let fake = connector(
        Behavior::Records(vec![gt_record("AVAILABLE", "PS3545", "Lauinger")]),
        Behavior::Records(vec![gm_record(&[("1", "Z699", "Fenwick"), ("0", "Z699", "Arlington")])]),
    );
    let lookup = lookup(catalog(), &fake, 5_000);
    let queries = lookup.partner_queries(IdentifierKind::Isbn, ISBN);
    let report = lookup.run(&CandidateIdentifiers::new().isbn(ISBN), &queries);

    let union = report.union.as_ref().unwrap();
    assert_eq!(union.len(), 2);
    assert_eq!(union[0].library_name, "American");

    let names: Vec<&str> = report.partners.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["GT", "GM"]);
    assert_eq!(report.partner("GT").unwrap().as_ref().unwrap().len(), 1);
    assert_eq!(report.partner("GM").unwrap().as_ref().unwrap().len(), 2);
    assert_eq!(report.holdings_count(), 5);
    assert_eq!(report.failure_count(), 0);
    assert_eq!(fake.close_count(), 2);
}

#[test]
fn test_partner_failure_is_isolated() {
    let fake = connector(
        Behavior::RefuseConnect,
        Behavior::Records(vec![gm_record(&[("1", "Z699", "Fenwick")])]),
    );
    let lookup = lookup(catalog(), &fake, 5_000);
    let queries = lookup.partner_queries(IdentifierKind::Isbn, ISBN);
    let report = lookup.run(&CandidateIdentifiers::new().isbn(ISBN), &queries);

    assert!(report.union.is_ok());
    assert!(matches!(
        report.partner("GT"),
        Some(Err(LaunchpadError::Connection { .. }))
    ));
    assert_eq!(report.partner("GM").unwrap().as_ref().unwrap().len(), 1);
    assert_eq!(report.failure_count(), 1);
    assert!(!report.all_failed());
}

#[test]
fn test_slow_partner_times_out_and_still_closes() {
    let fake = connector(
        Behavior::Slow(Duration::from_millis(1_500), vec![gt_record("AVAILABLE", "Z1", "Main")]),
        Behavior::Records(vec![]),
    );
    let lookup = lookup(catalog(), &fake, 500);
    let queries = lookup.partner_queries(IdentifierKind::Isbn, ISBN);
    let started = Instant::now();
    let report = lookup.run(&CandidateIdentifiers::new().isbn(ISBN), &queries);

    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert!(matches!(
        report.partner("GT"),
        Some(Err(LaunchpadError::TimedOut(name))) if name == "GT"
    ));
    assert!(report.partner("GM").unwrap().is_ok());
    assert!(report.union.is_ok());

    let deadline = Instant::now() + Duration::from_secs(10);
    while fake.close_count() < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(fake.close_count(), 2);
}

#[test]
fn test_every_source_failing() {
    let catalog = Arc::new(FakeCatalog::new().failing_on(&BIBIDS_BY_ISBN));
    let fake = connector(Behavior::RefuseConnect, Behavior::FailSearch);
    let lookup = lookup(catalog, &fake, 5_000);
    let queries = lookup.partner_queries(IdentifierKind::Isbn, ISBN);
    let report = lookup.run(&CandidateIdentifiers::new().isbn(ISBN), &queries);

    assert!(report.all_failed());
    assert_eq!(report.failure_count(), 3);
    assert_eq!(report.holdings_count(), 0);
}

#[test]
fn test_nothing_found_is_not_failure() {
    let fake = connector(Behavior::Records(vec![]), Behavior::Records(vec![]));
    let lookup = lookup(Arc::new(FakeCatalog::new()), &fake, 5_000);
    let queries = lookup.partner_queries(IdentifierKind::Oclc, "ocm12345");
    let report = lookup.run(&CandidateIdentifiers::new().oclc("ocm12345"), &queries);

    assert!(!report.all_failed());
    assert_eq!(report.holdings_count(), 0);
}

#[test]
fn test_mixed_queries_and_no_partners() {
    let fake = connector(
        Behavior::Records(vec![gt_record("AVAILABLE", "Z1", "Main")]),
        Behavior::Records(vec![gm_record(&[("1", "Z699", "Fenwick")])]),
    );
    let client = FederatedClient::new(Arc::clone(&fake) as _, config(5_000).partners);
    let lookup = Lookup::new(catalog(), Arc::new(client), Duration::from_secs(5));

    let queries = [
        PartnerQuery::identifier("GT", IdentifierKind::Issn, "0010-194X"),
        PartnerQuery::term("GM", "ocm00054321"),
        PartnerQuery::identifier("XX", IdentifierKind::Isbn, ISBN),
    ];
    let report = lookup.run(&CandidateIdentifiers::new().isbn(ISBN), &queries);
    assert_eq!(report.partners.len(), 3);
    assert!(report.partner("GT").unwrap().is_ok());
    assert!(report.partner("GM").unwrap().is_ok());
    assert!(matches!(
        report.partner("XX"),
        Some(Err(LaunchpadError::UnknownPartner(_)))
    ));
    assert_eq!(
        fake.sent_queries().len(),
        2,
        "unknown partner must not open a session"
    );

    let report = lookup.run(&CandidateIdentifiers::new().isbn(ISBN), &[]);
    assert!(report.partners.is_empty());
    assert_eq!(report.union.unwrap().len(), 2);
}
