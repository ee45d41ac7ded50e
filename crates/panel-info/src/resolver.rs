//! Matching compatible strings against the database.
//!
//! Candidates are tried most specific first. The first candidate that any
//! record lists wins, no matter where that record sits in the database.

use crate::compatible::Compatibles;
use crate::database::Database;
use crate::device::ResolvedDevice;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves a candidate list to a single device.
///
/// Returns [`Error::NoMatch`] if no candidate is known and
/// [`Error::StaleHandle`] if the database was invalidated. When several
/// records list the matching string the first in database order is used and
/// a database integrity error is logged.
pub fn resolve(candidates: &Compatibles, db: &Arc<Database>) -> Result<ResolvedDevice> {
    if !db.is_valid() {
        return Err(Error::StaleHandle {
            generation: db.generation(),
        });
    }

    for candidate in candidates {
        let records = db.records_for(candidate.as_str());
        let Some(&index) = records.first() else {
            debug!("No record for {}", candidate);
            continue;
        };

        if records.len() > 1 {
            warn!(
                "Database integrity error: {} is claimed by records {:?}, using record {}",
                candidate, records, index
            );
        }

        debug!("Resolved {} to record {}", candidate, index);
        return Ok(ResolvedDevice::new(
            db.clone(),
            index,
            candidate.as_str().to_string(),
        ));
    }

    Err(Error::NoMatch {
        candidates: candidates.to_strings(),
    })
}

impl Database {
    /// Resolves a candidate list against this database. See [`resolve`].
    pub fn resolve(self: &Arc<Self>, candidates: &Compatibles) -> Result<ResolvedDevice> {
        resolve(candidates, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB: &str = r#"{
        "devices": [
            {
                "compatibles": ["oneplus,fajita", "qcom,sdm845"],
                "x-res": 1080,
                "y-res": 2340,
                "corner-radii": [68, 68, 68, 68]
            }
        ]
    }"#;

    // Generic record first so database order disagrees with candidate order.
    const ORDERED_DB: &str = r#"{
        "devices": [
            { "compatibles": ["qcom,sdm845"], "x-res": 720, "y-res": 1440 },
            { "compatibles": ["oneplus,fajita"], "x-res": 1080, "y-res": 2340 }
        ]
    }"#;

    fn db(json: &str) -> Arc<Database> {
        Arc::new(Database::from_json(json).unwrap())
    }

    fn candidates(list: &[&str]) -> Compatibles {
        Compatibles::new(list).unwrap()
    }

    #[test]
    fn test_resolve_fajita() {
        let db = db(DB);
        let device = resolve(&candidates(&["oneplus,fajita", "qcom,sdm845"]), &db).unwrap();
        assert_eq!(device.matched_compatible(), "oneplus,fajita");
        assert_eq!(device.width().unwrap(), 1080);
        assert_eq!(device.height().unwrap(), 2340);
        assert_eq!(device.corner_radii().unwrap(), [68, 68, 68, 68]);
    }

    #[test]
    fn test_resolve_generic_fallback() {
        let db = db(DB);
        let device = db
            .resolve(&candidates(&["oneplus,unknown", "qcom,sdm845"]))
            .unwrap();
        assert_eq!(device.matched_compatible(), "qcom,sdm845");
        assert_eq!(device.record_index(), 0);
    }

    #[test]
    fn test_no_match() {
        let db = db(DB);
        match resolve(&candidates(&["unknown,device"]), &db) {
            Err(Error::NoMatch { candidates }) => assert_eq!(candidates, ["unknown,device"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_candidate_order_beats_database_order() {
        let db = db(ORDERED_DB);
        let device = resolve(&candidates(&["oneplus,fajita", "qcom,sdm845"]), &db).unwrap();
        assert_eq!(device.record_index(), 1);
        assert_eq!(device.width().unwrap(), 1080);

        let device = resolve(&candidates(&["qcom,sdm845", "oneplus,fajita"]), &db).unwrap();
        assert_eq!(device.record_index(), 0);
        assert_eq!(device.width().unwrap(), 720);
        assert!(db.integrity_violations().is_empty());
    }

    #[test]
    fn test_deterministic() {
        let db = db(ORDERED_DB);
        let list = candidates(&["vendor,none", "oneplus,fajita", "qcom,sdm845"]);
        let first = resolve(&list, &db).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve(&list, &db).unwrap(), first);
        }
    }

    #[test]
    fn test_ambiguous_match_uses_first_record() {
        let db = db(r#"{ "devices": [
            { "compatibles": ["vendor,a", "qcom,sdm845"], "x-res": 720, "y-res": 1440 },
            { "compatibles": ["vendor,b", "qcom,sdm845"], "x-res": 1080, "y-res": 2340 }
        ] }"#);
        let device = resolve(&candidates(&["qcom,sdm845"]), &db).unwrap();
        assert_eq!(device.record_index(), 0);
        assert_eq!(device.width().unwrap(), 720);

        let violations = db.integrity_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].compatible, "qcom,sdm845");
        assert_eq!(violations[0].records, [0, 1]);
    }

    #[test]
    fn test_resolve_on_invalidated_database() {
        let db = db(DB);
        db.invalidate();
        let err = resolve(&candidates(&["oneplus,fajita"]), &db).unwrap_err();
        assert!(err.is_stale());
    }

    #[test]
    fn test_geometry_invariants_on_builtin() {
        let db = Arc::new(Database::builtin().unwrap());
        for record in db.all_records() {
            let list = Compatibles::new(record.compatibles()).unwrap();
            let device = resolve(&list, &db).unwrap();
            assert!(device.width().unwrap() > 0);
            assert!(device.height().unwrap() > 0);
            assert_eq!(device.corner_radii().unwrap().len(), 4);
        }
    }
}
