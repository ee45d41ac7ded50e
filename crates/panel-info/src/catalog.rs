//! Loading guard for the device database.
//!
//! The catalog loads its database lazily on first use. Concurrent callers
//! block until that first load finishes and then share the same database.

use crate::compatible::Compatibles;
use crate::database::{Database, Source};
use crate::device::ResolvedDevice;
use crate::Result;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info};

/// Owns the current database for a [`Source`].
#[derive(Debug)]
pub struct Catalog {
    source: Source,
    current: RwLock<Option<Arc<Database>>>,
    /// Serializes loads, reloads and invalidation.
    load_lock: Mutex<()>,
}

impl Catalog {
    /// Creates a catalog. Nothing is loaded until first use.
    pub fn new(source: Source) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// A catalog over the database shipped with the library.
    pub fn builtin() -> Self {
        Self::new(Source::Builtin)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Returns the loaded database, if any.
    ///
    /// A database invalidated behind the catalog's back counts as not
    /// loaded.
    pub fn current(&self) -> Option<Arc<Database>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|db| db.is_valid())
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Returns the database, loading it first if needed.
    pub fn database(&self) -> Result<Arc<Database>> {
        if let Some(db) = self.current() {
            return Ok(db);
        }

        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished loading while we waited.
        if let Some(db) = self.current() {
            debug!("Database generation {} loaded concurrently", db.generation());
            return Ok(db);
        }

        let db = Arc::new(Database::load(&self.source)?);
        if let Some(old) = self.store(Some(db.clone())) {
            debug!("Replacing invalidated database generation {}", old.generation());
        }
        Ok(db)
    }

    /// Loads a fresh database and swaps it in.
    ///
    /// On success the previous database is invalidated and every handle
    /// resolved from it goes stale. On failure the previous database stays
    /// in place.
    pub fn reload(&self) -> Result<Arc<Database>> {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let db = Arc::new(Database::load(&self.source)?);
        if let Some(old) = self.store(Some(db.clone())) {
            old.invalidate();
            info!(
                "Reloaded database: generation {} replaces {}",
                db.generation(),
                old.generation()
            );
        }
        Ok(db)
    }

    /// Invalidates the current database and drops it from the catalog.
    ///
    /// Handles resolved from it go stale. The next access loads a fresh
    /// database from the source.
    pub fn invalidate(&self) {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = self.store(None) {
            old.invalidate();
        }
    }

    /// Resolves candidates against the current database.
    pub fn resolve(&self, candidates: &Compatibles) -> Result<ResolvedDevice> {
        self.database()?.resolve(candidates)
    }

    fn store(&self, db: Option<Arc<Database>>) -> Option<Arc<Database>> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, db)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

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

    fn fajita() -> Compatibles {
        Compatibles::new(["oneplus,fajita", "qcom,sdm845"]).unwrap()
    }

    fn db_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "panel-info-catalog-{}-{}.json",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_lazy_load() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_loaded());
        let device = catalog.resolve(&fajita()).unwrap();
        assert!(catalog.is_loaded());
        assert_eq!(device.width().unwrap(), 1080);
        assert_eq!(device.height().unwrap(), 2340);
    }

    #[test]
    fn test_concurrent_first_load() {
        let catalog = Catalog::builtin();
        let databases: Vec<Arc<Database>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| catalog.database().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for db in &databases {
            assert!(Arc::ptr_eq(db, &databases[0]));
        }
    }

    #[test]
    fn test_reload_makes_handles_stale() {
        let path = db_file("reload", DB);
        let catalog = Catalog::new(Source::File(path.clone()));

        let old = catalog.resolve(&fajita()).unwrap();
        assert_eq!(old.corner_radii().unwrap(), [68; 4]);

        let new_db = catalog.reload().unwrap();
        assert!(old.width().unwrap_err().is_stale());
        assert_ne!(new_db.generation(), old.generation());

        let fresh = catalog.resolve(&fajita()).unwrap();
        assert_eq!(fresh.generation(), new_db.generation());
        assert_eq!(fresh.width().unwrap(), 1080);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_failed_reload_keeps_database() {
        let path = db_file("broken", DB);
        let catalog = Catalog::new(Source::File(path.clone()));
        let device = catalog.resolve(&fajita()).unwrap();

        std::fs::write(&path, "{ \"devices\": [").unwrap();
        let err = catalog.reload().unwrap_err();
        assert!(err.is_load());
        assert!(!device.is_stale());
        assert_eq!(
            catalog.current().unwrap().generation(),
            device.generation()
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalidate_then_reload_on_access() {
        let catalog = Catalog::builtin();
        let device = catalog.resolve(&fajita()).unwrap();
        catalog.invalidate();
        assert!(!catalog.is_loaded());
        assert!(device.is_stale());

        let again = catalog.resolve(&fajita()).unwrap();
        assert!(!again.is_stale());
        assert_ne!(again.generation(), device.generation());
    }

    #[test]
    fn test_database_invalidated_directly() {
        let catalog = Catalog::builtin();
        let db = catalog.database().unwrap();
        let device = catalog.resolve(&fajita()).unwrap();

        db.invalidate();
        assert!(!catalog.is_loaded());
        assert!(device.is_stale());

        let again = catalog.resolve(&fajita()).unwrap();
        assert!(!again.is_stale());
        assert_ne!(again.generation(), db.generation());
        assert_eq!(again.width().unwrap(), 1080);
        assert!(Arc::ptr_eq(&catalog.database().unwrap(), &catalog.current().unwrap()));
    }

    #[test]
    fn test_missing_source() {
        let catalog = Catalog::new(Source::File(PathBuf::from("/nonexistent/devices.json")));
        let err = catalog.resolve(&fajita()).unwrap_err();
        assert!(err.is_load());
        assert!(!catalog.is_loaded());
    }
}
