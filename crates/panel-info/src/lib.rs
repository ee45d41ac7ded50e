//! Panel Info Library
//!
//! Looks up the display panel of a device (resolution, rounded corners,
//! cutouts) from its device-tree compatible strings.
//!
//! ```no_run
//! use panel_info::{Catalog, Compatibles};
//!
//! let catalog = Catalog::builtin();
//! let candidates = Compatibles::new(["oneplus,fajita", "qcom,sdm845"])?;
//! let device = catalog.resolve(&candidates)?;
//! println!(
//!     "{}x{}, corner radii: {:?}",
//!     device.width()?,
//!     device.height()?,
//!     device.corner_radii()?
//! );
//! # Ok::<(), panel_info::Error>(())
//! ```

pub mod catalog;
pub mod compatible;
pub mod cutout;
pub mod database;
pub mod device;
pub mod document;
pub mod error;
pub mod panel;
pub mod resolver;

pub use catalog::Catalog;
pub use compatible::{Compatible, Compatibles};
pub use cutout::{Cutout, Rect};
pub use database::{Database, DeviceRecord, IntegrityViolation, Source};
pub use device::ResolvedDevice;
pub use error::{Error, LoadError, Result};
pub use panel::{CornerPosition, DisplayPanel, PanelGeometry};
pub use resolver::resolve;
