//! The device compatibility database.
//!
//! A database is built once from a [`Source`] and never mutated afterwards.
//! Sharing it between threads only needs an `Arc`.

use crate::document::{DatabaseDocument, PanelDocument};
use crate::panel::DisplayPanel;
use crate::LoadError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Database compiled into the library.
const BUILTIN_DATABASE: &str = include_str!("../data/devices.json");

/// Generation counter shared by all databases in the process.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Where a database is loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Source {
    /// The database shipped with the library.
    #[default]
    Builtin,
    /// A single database document (`{"devices": [...]}`).
    File(PathBuf),
    /// A directory of `<compatible>.json` panel documents.
    Directory(PathBuf),
}

impl Source {
    /// Picks `File` or `Directory` depending on what the path points to.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            Source::Directory(path.to_path_buf())
        } else {
            Source::File(path.to_path_buf())
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Builtin => write!(f, "builtin"),
            Source::File(path) => write!(f, "file {}", path.display()),
            Source::Directory(path) => write!(f, "directory {}", path.display()),
        }
    }
}

/// One known device: its compatible strings and its panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    compatibles: Vec<String>,
    panel: DisplayPanel,
}

impl DeviceRecord {
    /// Creates a record. At least one compatible string is required.
    pub fn new(
        compatibles: Vec<String>,
        panel: DisplayPanel,
    ) -> std::result::Result<Self, LoadError> {
        let origin = compatibles
            .first()
            .cloned()
            .unwrap_or_else(|| "<unnamed>".to_string());
        if compatibles.is_empty() {
            return Err(LoadError::invalid(origin, "no compatible strings"));
        }
        if let Some(bad) = compatibles.iter().find(|c| !crate::compatible::is_valid(c)) {
            return Err(LoadError::invalid(
                origin,
                format!("invalid compatible string {bad:?}"),
            ));
        }
        Ok(Self { compatibles, panel })
    }

    /// Compatible strings, most specific first.
    pub fn compatibles(&self) -> &[String] {
        &self.compatibles
    }

    pub fn panel(&self) -> &DisplayPanel {
        &self.panel
    }

    /// Returns true if the record lists this exact compatible string.
    pub fn matches(&self, compatible: &str) -> bool {
        self.compatibles.iter().any(|c| c == compatible)
    }
}

/// A compatible string claimed by more than one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    pub compatible: String,
    /// Indices of the claiming records, in database order.
    pub records: Vec<usize>,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compatible {:?} is claimed by records {:?}",
            self.compatible, self.records
        )
    }
}

/// An immutable, ordered collection of device records.
#[derive(Debug)]
pub struct Database {
    records: Vec<DeviceRecord>,
    index: HashMap<String, Vec<usize>>,
    source: Source,
    generation: u64,
    valid: AtomicBool,
}

impl Database {
    /// Loads a database from the given source.
    ///
    /// Every record is validated; any error aborts the load.
    pub fn load(source: &Source) -> std::result::Result<Self, LoadError> {
        let records = match source {
            Source::Builtin => parse_database(BUILTIN_DATABASE, "builtin database")?,
            Source::File(path) => {
                let data = read_file(path)?;
                parse_database(&data, &path.display().to_string())?
            }
            Source::Directory(path) => load_directory(path)?,
        };
        let db = Self::build(records, source.clone());
        info!(
            "Loaded {} device records from {} (generation {})",
            db.len(),
            source,
            db.generation
        );
        Ok(db)
    }

    /// Loads the database shipped with the library.
    pub fn builtin() -> std::result::Result<Self, LoadError> {
        Self::load(&Source::Builtin)
    }

    /// Parses a database document held in memory.
    pub fn from_json(data: &str) -> std::result::Result<Self, LoadError> {
        let records = parse_database(data, "database data")?;
        Ok(Self::build(records, Source::Builtin))
    }

    /// Builds a database from already validated records.
    pub fn from_records(records: Vec<DeviceRecord>) -> Self {
        Self::build(records, Source::Builtin)
    }

    fn build(records: Vec<DeviceRecord>, source: Source) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            for compatible in &record.compatibles {
                let entry = index.entry(compatible.clone()).or_default();
                // A record listing the same string twice is still one claim.
                if entry.last() != Some(&i) {
                    entry.push(i);
                }
            }
        }

        let db = Self {
            records,
            index,
            source,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            valid: AtomicBool::new(true),
        };
        for violation in db.integrity_violations() {
            warn!("Database integrity error: {}", violation);
        }
        db
    }

    /// All records in load order.
    pub fn all_records(&self) -> &[DeviceRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&DeviceRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Indices of the records listing `compatible`, in database order.
    pub fn records_for(&self, compatible: &str) -> &[usize] {
        self.index.get(compatible).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every compatible string claimed by more than one record, sorted.
    pub fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        let mut violations: Vec<_> = self
            .index
            .iter()
            .filter(|(_, records)| records.len() > 1)
            .map(|(compatible, records)| IntegrityViolation {
                compatible: compatible.clone(),
                records: records.clone(),
            })
            .collect();
        violations.sort_by(|a, b| a.compatible.cmp(&b.compatible));
        violations
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Unique number identifying this database within the process.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the database has been invalidated.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Marks the database as invalid. Handles resolved from it go stale.
    pub fn invalidate(&self) {
        if self.valid.swap(false, Ordering::AcqRel) {
            debug!("Invalidated database generation {}", self.generation);
        }
    }

    /// Serializes the database as a database document.
    pub fn to_json(&self) -> String {
        let doc = DatabaseDocument {
            devices: self
                .records
                .iter()
                .map(|r| PanelDocument::from_panel(&r.panel, &r.compatibles))
                .collect(),
        };
        serde_json::to_string_pretty(&doc).unwrap_or_default()
    }
}

fn read_file(path: &Path) -> std::result::Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_database(data: &str, origin: &str) -> std::result::Result<Vec<DeviceRecord>, LoadError> {
    let doc: DatabaseDocument = serde_json::from_str(data).map_err(|source| LoadError::Syntax {
        origin: origin.to_string(),
        source,
    })?;

    doc.devices
        .iter()
        .enumerate()
        .map(|(i, device)| {
            let name = format!("{} device #{}", origin, i);
            let compatibles = device.validated_compatibles(&name)?;
            let panel = device.to_panel(&name)?;
            DeviceRecord::new(compatibles, panel)
        })
        .collect()
}

/// Loads one record per `<compatible>.json` file, in file name order.
fn load_directory(dir: &Path) -> std::result::Result<Vec<DeviceRecord>, LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        let origin = path.display().to_string();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LoadError::invalid(&origin, "file name is not valid UTF-8"))?
            .to_string();

        let data = read_file(&path)?;
        let doc: PanelDocument = serde_json::from_str(&data).map_err(|source| LoadError::Syntax {
            origin: origin.clone(),
            source,
        })?;

        let mut compatibles = vec![stem];
        for alias in doc.validated_compatibles(&origin)? {
            if !compatibles.contains(&alias) {
                compatibles.push(alias);
            }
        }
        let panel = doc.to_panel(&origin)?;
        debug!("Loaded panel for {} from {}", compatibles[0], origin);
        records.push(DeviceRecord::new(compatibles, panel)?);
    }
    Ok(records)
}
