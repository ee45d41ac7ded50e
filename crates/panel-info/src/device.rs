//! Handles to resolved devices.

use crate::cutout::Cutout;
use crate::database::{Database, DeviceRecord};
use crate::panel::{CornerPosition, DisplayPanel, CORNER_COUNT};
use crate::{Error, Result};
use std::sync::Arc;

/// A device matched against a [`Database`].
///
/// The handle keeps the database alive but stops answering once the
/// database is invalidated, e.g. by [`Catalog::reload`](crate::Catalog::reload).
#[derive(Debug, Clone)]
pub struct ResolvedDevice {
    db: Arc<Database>,
    index: usize,
    matched: String,
}

impl ResolvedDevice {
    pub(crate) fn new(db: Arc<Database>, index: usize, matched: String) -> Self {
        Self { db, index, matched }
    }

    fn record(&self) -> Result<&DeviceRecord> {
        if !self.db.is_valid() {
            return Err(Error::StaleHandle {
                generation: self.db.generation(),
            });
        }
        // Records are never removed from a database, so the index stays in range.
        self.db.record(self.index).ok_or(Error::StaleHandle {
            generation: self.db.generation(),
        })
    }

    /// The panel of the matched record.
    pub fn panel(&self) -> Result<&DisplayPanel> {
        Ok(self.record()?.panel())
    }

    /// Horizontal resolution in pixels.
    pub fn width(&self) -> Result<u32> {
        Ok(self.panel()?.width())
    }

    /// Vertical resolution in pixels.
    pub fn height(&self) -> Result<u32> {
        Ok(self.panel()?.height())
    }

    /// Corner radii in pixels, clockwise from top-left.
    pub fn corner_radii(&self) -> Result<[u32; CORNER_COUNT]> {
        Ok(self.panel()?.corner_radii())
    }

    pub fn corner_radius(&self, corner: CornerPosition) -> Result<u32> {
        Ok(self.panel()?.corner_radius(corner))
    }

    /// Top-left corner radius.
    pub fn border_radius(&self) -> Result<u32> {
        Ok(self.panel()?.border_radius())
    }

    pub fn name(&self) -> Result<Option<&str>> {
        Ok(self.panel()?.name())
    }

    pub fn physical_size_mm(&self) -> Result<Option<(u32, u32)>> {
        Ok(self.panel()?.physical_size_mm())
    }

    pub fn cutouts(&self) -> Result<&[Cutout]> {
        Ok(self.panel()?.cutouts())
    }

    /// All compatible strings of the matched record.
    pub fn compatibles(&self) -> Result<&[String]> {
        Ok(self.record()?.compatibles())
    }

    /// The candidate string that produced the match.
    pub fn matched_compatible(&self) -> &str {
        &self.matched
    }

    /// Position of the matched record in the database.
    pub fn record_index(&self) -> usize {
        self.index
    }

    /// Generation of the database this handle was resolved from.
    pub fn generation(&self) -> u64 {
        self.db.generation()
    }

    pub fn is_stale(&self) -> bool {
        !self.db.is_valid()
    }
}

impl PartialEq for ResolvedDevice {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.db, &other.db) && self.index == other.index && self.matched == other.matched
    }
}

impl Eq for ResolvedDevice {}
