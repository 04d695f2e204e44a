//! Holdings aggregation across the union catalog.
//!
//! Given loose identifiers, the aggregator resolves every matching bib record
//! and expands each into its holdings (MFHD records), attaching electronic
//! access links and item-level availability. The result is one list,
//! deduplicated by holding and ordered by owning library.
//!
//! Missing data is never an error: a bib with no holdings contributes
//! nothing, and a holding with no items carries no [`Availability`].

use crate::catalog::statements::{AVAILABILITY, ELECTRONIC_ACCESS, HOLDINGS_FOR_BIB};
use crate::catalog::{BibId, CatalogSource, Row, SqlValue};
use crate::error::Result;
use crate::resolver::{CandidateIdentifiers, IndexResolver};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Voyager item status code for an item on the shelf.
pub const STATUS_NOT_CHARGED: i64 = 1;

/// Link and location subfields of a holding (856/852/866).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectronicAccess {
    /// 856 $u, the access URL
    pub url: Option<String>,
    /// 856 $z, public note on the link
    pub url_note: Option<String>,
    /// 852 $z, public note on the location
    pub location_note: Option<String>,
    /// 852 $a, location
    pub location: Option<String>,
    /// 852 $h, classification part
    pub classification: Option<String>,
    /// 866 textual summary holdings
    pub summary_holdings: Option<String>,
}

impl ElectronicAccess {
    fn from_row(row: &Row) -> Self {
        ElectronicAccess {
            url: row.text("LINK856U"),
            url_note: row.text("LINK856Z"),
            location_note: row.text("LINK852Z"),
            location: row.text("LINK852A"),
            classification: row.text("LINK852H"),
            summary_holdings: row.text("LINK866"),
        }
    }

    /// Whether no subfield carried a value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.url_note.is_none()
            && self.location_note.is_none()
            && self.location.is_none()
            && self.classification.is_none()
            && self.summary_holdings.is_none()
    }
}

/// Circulation state of one physical copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatus {
    /// Item id
    pub item_id: Option<i64>,
    /// Numeric status code
    pub status_code: Option<i64>,
    /// Status description, e.g. "Not Charged", "Charged"
    pub status: Option<String>,
    /// Call number as displayed
    pub call_number: Option<String>,
    /// Permanent location
    pub perm_location: Option<String>,
    /// Temporary location, when the copy is away from home
    pub temp_location: Option<String>,
    /// Enumeration, e.g. "v. 2"
    pub enumeration: Option<String>,
    /// Chronology, e.g. "1998"
    pub chronology: Option<String>,
    /// When the status last changed
    pub status_date: Option<NaiveDateTime>,
}

impl ItemStatus {
    fn from_row(row: &Row) -> Self {
        ItemStatus {
            item_id: row.int("ITEM_ID"),
            status_code: row.int("ITEM_STATUS"),
            status: row.text("ITEM_STATUS_DESC"),
            call_number: row.text("DISPLAY_CALL_NO"),
            perm_location: row.text("PERM_LOCATION"),
            temp_location: row.text("TEMP_LOCATION"),
            enumeration: row.text("ITEM_ENUM"),
            chronology: row.text("CHRON"),
            status_date: row.timestamp("ITEM_STATUS_DATE"),
        }
    }

    /// Where the copy currently is: the temporary location if set.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.temp_location
            .as_deref()
            .or(self.perm_location.as_deref())
    }

    /// Whether the copy is on the shelf
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status_code == Some(STATUS_NOT_CHARGED)
    }
}

/// Availability snapshot of a holding: its copies in location order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// One entry per copy; never empty
    pub items: Vec<ItemStatus>,
}

impl Availability {
    /// The first copy, which stands for the holding in summary displays.
    #[must_use]
    pub fn primary(&self) -> Option<&ItemStatus> {
        self.items.first()
    }

    /// Whether any copy is on the shelf
    #[must_use]
    pub fn any_available(&self) -> bool {
        self.items.iter().any(ItemStatus::is_available)
    }

    /// Most recent status change across copies
    #[must_use]
    pub fn last_status_change(&self) -> Option<NaiveDateTime> {
        self.items.iter().filter_map(|i| i.status_date).max()
    }
}

/// One holding attached to a union-catalog bib record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingRecord {
    /// Bib record the holding hangs from
    pub bib_id: BibId,
    /// Holding (MFHD) id
    pub mfhd_id: i64,
    /// Location id
    pub location_id: Option<i64>,
    /// Call number as displayed
    pub call_number: Option<String>,
    /// Location display name
    pub location_name: Option<String>,
    /// Owning library
    pub library_name: String,
    /// Link subfields, if the holding has a row for them
    pub electronic: Option<ElectronicAccess>,
    /// Copy-level status, absent when the holding has no items
    pub availability: Option<Availability>,
}

impl HoldingRecord {
    fn from_row(row: &Row) -> Option<Self> {
        Some(HoldingRecord {
            bib_id: BibId(row.int("BIB_ID")?),
            mfhd_id: row.int("MFHD_ID")?,
            location_id: row.int("LOCATION_ID"),
            call_number: row.text("DISPLAY_CALL_NO"),
            location_name: row.text("LOCATION_DISPLAY_NAME"),
            library_name: row.text_or_empty("LIBRARY_NAME"),
            electronic: None,
            availability: None,
        })
    }
}

/// Merges the holdings of every bib record matching a set of identifiers.
pub struct HoldingsAggregator<'a> {
    catalog: &'a dyn CatalogSource,
}

impl std::fmt::Debug for HoldingsAggregator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoldingsAggregator").finish_non_exhaustive()
    }
}

impl<'a> HoldingsAggregator<'a> {
    /// Create an aggregator over the given catalog
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogSource) -> Self {
        HoldingsAggregator { catalog }
    }

    /// Resolve `candidates` and return the merged holdings of every match.
    ///
    /// # Errors
    ///
    /// Returns an error if any catalog query fails.
    pub fn get_holdings(&self, candidates: &CandidateIdentifiers) -> Result<Vec<HoldingRecord>> {
        let bib_ids = IndexResolver::new(self.catalog).resolve(candidates)?;
        self.holdings_for_bibs(&bib_ids)
    }

    /// Holdings of the given bib records, deduplicated by holding id and
    /// stably ordered by library name.
    ///
    /// Bib records are expanded in parallel; a bib that no longer exists
    /// simply contributes no holdings.
    ///
    /// # Errors
    ///
    /// Returns an error if any catalog query fails, including the link or
    /// availability query of a single holding. Holdings already fetched are
    /// discarded: a failed query means the catalog is unavailable, and the
    /// caller reports the union source as failed rather than as incomplete.
    pub fn holdings_for_bibs(&self, bib_ids: &BTreeSet<BibId>) -> Result<Vec<HoldingRecord>> {
        let ids: Vec<BibId> = bib_ids.iter().copied().collect();
        let per_bib = ids
            .par_iter()
            .map(|id| self.holdings_for_bib(*id))
            .collect::<Result<Vec<Vec<HoldingRecord>>>>()?;

        let mut seen = HashSet::new();
        let mut holdings: Vec<HoldingRecord> = per_bib
            .into_iter()
            .flatten()
            .filter(|h| seen.insert(h.mfhd_id))
            .collect();
        holdings.sort_by(|a, b| a.library_name.cmp(&b.library_name));

        tracing::debug!(
            bibs = ids.len(),
            count = holdings.len(),
            "aggregated union holdings"
        );
        Ok(holdings)
    }

    /// Unsuppressed holdings of one bib with links and availability attached.
    ///
    /// # Errors
    ///
    /// Returns an error if any catalog query fails.
    pub fn holdings_for_bib(&self, bib_id: BibId) -> Result<Vec<HoldingRecord>> {
        let rows = self
            .catalog
            .fetch(&HOLDINGS_FOR_BIB, &[SqlValue::from(bib_id)])?;

        rows.iter()
            .filter_map(HoldingRecord::from_row)
            .map(|mut holding| {
                holding.electronic = self.electronic_access(holding.mfhd_id)?;
                holding.availability = self.availability(holding.mfhd_id)?;
                Ok(holding)
            })
            .collect()
    }

    fn electronic_access(&self, mfhd_id: i64) -> Result<Option<ElectronicAccess>> {
        let params = vec![SqlValue::from(mfhd_id); ELECTRONIC_ACCESS.arity];
        Ok(self
            .catalog
            .fetch_first(&ELECTRONIC_ACCESS, &params)?
            .map(|row| ElectronicAccess::from_row(&row)))
    }

    fn availability(&self, mfhd_id: i64) -> Result<Option<Availability>> {
        let rows = self
            .catalog
            .fetch(&AVAILABILITY, &[SqlValue::from(mfhd_id)])?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(Availability {
            items: rows.iter().map(ItemStatus::from_row).collect(),
        }))
    }
}
