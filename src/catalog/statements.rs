//! SQL text for every query the lookup pipeline issues.
//!
//! All statements are read-only and take positional `?` parameters. The
//! `wrlcdb.*` functions are stored procedures of the consortium schema that
//! unpack MARC subfields server-side.

/// A named, parameterized, read-only query.
///
/// The name identifies the statement in logs and errors, and lets test
/// doubles answer by name instead of by SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    /// Stable identifier of the statement
    pub name: &'static str,
    /// SQL text with `?` placeholders
    pub sql: &'static str,
    /// Number of positional parameters the SQL expects
    pub arity: usize,
}

/// Bib index code for 13-character ISBNs.
pub const INDEX_ISBN13: &str = "ISB3";
/// Bib index code for 10-character ISBNs and other 020 values.
pub const INDEX_ISBN10: &str = "020N";
/// Bib index code for ISSNs.
pub const INDEX_ISSN: &str = "022A";
/// Bib index code for OCLC and other 035 system control numbers.
pub const INDEX_OCLC: &str = "035A";

/// One bib record with its owning library; params: bib id x3.
pub const BIB_RECORD: Statement = Statement {
    name: "bib_record",
    sql: "\
SELECT bib_text.bib_id, title, author, edition, isbn, issn, network_number,
       publisher, pub_place, imprint, bib_format, language, library_name,
       RTRIM(wrlcdb.GetMarcField(?,0,0,'856','','u',1)) AS link,
       wrlcdb.GetAllBibTag(?, '880', 1) AS cjk_info
FROM bib_text, bib_master, library
WHERE bib_text.bib_id = ?
AND bib_text.bib_id = bib_master.bib_id
AND bib_master.library_id = library.library_id
AND bib_master.suppress_in_opac = 'N'",
    arity: 3,
};

/// Bib ids by ISBN prefix; params: index code, `LIKE` pattern escaped with `\`.
pub const BIBIDS_BY_ISBN: Statement = Statement {
    name: "bibids_by_isbn",
    sql: "\
SELECT bib_index.bib_id, bib_master.library_id, library_name
FROM bib_index, bib_master, library
WHERE bib_index.index_code = ?
AND bib_index.normal_heading LIKE ? ESCAPE '\\'
AND bib_index.bib_id = bib_master.bib_id
AND bib_master.library_id = library.library_id
AND bib_master.suppress_in_opac = 'N'",
    arity: 2,
};

/// Bib ids by exact ISSN; params: ISSN.
pub const BIBIDS_BY_ISSN: Statement = Statement {
    name: "bibids_by_issn",
    sql: "\
SELECT bib_index.bib_id, bib_master.library_id, library.library_name
FROM bib_index, bib_master, library
WHERE bib_index.index_code = '022A'
AND REPLACE(bib_index.normal_heading, ' ', '') = ?
AND bib_index.bib_id = bib_master.bib_id
AND bib_master.library_id = library.library_id
AND bib_master.suppress_in_opac = 'N'",
    arity: 1,
};

/// Bib ids by exact OCLC number; params: OCLC number.
pub const BIBIDS_BY_OCLC: Statement = Statement {
    name: "bibids_by_oclc",
    sql: "\
SELECT bib_index.bib_id, bib_master.library_id, library.library_name
FROM bib_index, bib_master, library
WHERE bib_index.index_code = '035A'
AND bib_index.normal_heading = ?
AND bib_master.bib_id = bib_index.bib_id
AND bib_master.library_id = library.library_id
AND bib_master.suppress_in_opac = 'N'",
    arity: 1,
};

/// Unsuppressed holdings of one bib; params: bib id.
pub const HOLDINGS_FOR_BIB: Statement = Statement {
    name: "holdings_for_bib",
    sql: "\
SELECT bib_mfhd.bib_id, mfhd_master.mfhd_id, mfhd_master.location_id,
       mfhd_master.display_call_no, location.location_display_name,
       library.library_name
FROM bib_mfhd INNER JOIN mfhd_master ON bib_mfhd.mfhd_id = mfhd_master.mfhd_id,
     location, library
WHERE mfhd_master.location_id = location.location_id
AND bib_mfhd.bib_id = ?
AND mfhd_master.suppress_in_opac != 'Y'
AND location.library_id = library.library_id
ORDER BY library.library_name",
    arity: 1,
};

/// Link and summary-holdings subfields of one holding; params: mfhd id x7.
pub const ELECTRONIC_ACCESS: Statement = Statement {
    name: "electronic_access",
    sql: "\
SELECT mfhd_master.mfhd_id,
       RTRIM(wrlcdb.GetMfHDsubfield(?,'856','u')) AS link856u,
       RTRIM(wrlcdb.GetMfHDsubfield(?,'856','z')) AS link856z,
       RTRIM(wrlcdb.GetMfHDsubfield(?,'852','z')) AS link852z,
       RTRIM(wrlcdb.GetMfHDsubfield(?,'852','a')) AS link852a,
       RTRIM(wrlcdb.GetMfHDsubfield(?,'852','h')) AS link852h,
       RTRIM(wrlcdb.GetAllTags(?,'M','866',2)) AS link866
FROM mfhd_master
WHERE mfhd_master.mfhd_id = ?",
    arity: 7,
};

/// Item-level status rows of one holding; params: mfhd id.
pub const AVAILABILITY: Statement = Statement {
    name: "availability",
    sql: "\
SELECT DISTINCT display_call_no, item_status_desc, item_status.item_status,
       permLocation.location_display_name AS perm_location,
       tempLocation.location_display_name AS temp_location,
       mfhd_item.item_enum, mfhd_item.chron, item.item_id, item_status_date,
       bib_master.bib_id
FROM bib_master
JOIN library ON library.library_id = bib_master.library_id
JOIN bib_text ON bib_text.bib_id = bib_master.bib_id
JOIN bib_mfhd ON bib_master.bib_id = bib_mfhd.bib_id
JOIN mfhd_master ON mfhd_master.mfhd_id = bib_mfhd.mfhd_id
JOIN mfhd_item ON mfhd_item.mfhd_id = mfhd_master.mfhd_id
JOIN item ON item.item_id = mfhd_item.item_id
JOIN item_status ON item_status.item_id = item.item_id
JOIN item_status_type ON item_status.item_status = item_status_type.item_status_type
JOIN location permLocation ON permLocation.location_id = item.perm_location
LEFT OUTER JOIN location tempLocation ON tempLocation.location_id = item.temp_location
WHERE bib_mfhd.mfhd_id = ?
ORDER BY perm_location, temp_location",
    arity: 1,
};

/// 035 control numbers whose display and normalized forms agree; params: bib id.
pub const PARTNER_CONTROL_NUMBERS: Statement = Statement {
    name: "partner_control_numbers",
    sql: "\
SELECT bib_index.normal_heading
FROM bib_index
WHERE bib_index.bib_id = ?
AND bib_index.index_code = '035A'
AND bib_index.normal_heading = bib_index.display_heading",
    arity: 1,
};
