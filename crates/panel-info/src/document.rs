//! JSON documents describing panels and device databases.
//!
//! A panel document:
//!
//! ```json
//! {
//!   "name": "Oneplus 6T",
//!   "x-res": 1080,
//!   "y-res": 2340,
//!   "corner-radii": [68, 68, 68, 68],
//!   "width": 68,
//!   "height": 145,
//!   "cutouts": [{ "name": "notch", "path": "M 455 0 V 79 H 625 V 0 Z" }]
//! }
//! ```
//!
//! `width` and `height` are the physical size in millimeters. The legacy
//! `border-radius` key sets all four corners; `corner-radii` takes
//! precedence when both are present. A database document wraps panel
//! documents that additionally carry a `compatibles` array:
//! `{ "devices": [ { "compatibles": ["oneplus,fajita"], ... } ] }`.

use crate::compatible;
use crate::cutout::Cutout;
use crate::panel::{DisplayPanel, PanelGeometry, CORNER_COUNT};
use crate::LoadError;
use serde::{Deserialize, Serialize};

/// Serialized form of a cutout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoutDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
}

/// Serialized form of a panel, optionally tagged with compatible strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PanelDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compatibles: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub x_res: u32,

    #[serde(default)]
    pub y_res: u32,

    /// Physical width in millimeters.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub width: u32,

    /// Physical height in millimeters.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub height: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radii: Option<Vec<u32>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cutouts: Vec<CutoutDocument>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Serialized form of a whole device database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDocument {
    #[serde(default)]
    pub devices: Vec<PanelDocument>,
}

impl PanelDocument {
    /// Validates the document and builds the panel it describes.
    ///
    /// `origin` names the document in error messages.
    pub fn to_panel(&self, origin: &str) -> std::result::Result<DisplayPanel, LoadError> {
        let corner_radii = match (&self.corner_radii, self.border_radius) {
            (Some(radii), _) if radii.is_empty() => [0; CORNER_COUNT],
            (Some(radii), _) => <[u32; CORNER_COUNT]>::try_from(radii.as_slice()).map_err(|_| {
                LoadError::invalid(
                    origin,
                    format!("corner-radii needs {} values, got {}", CORNER_COUNT, radii.len()),
                )
            })?,
            (None, Some(radius)) => [radius; CORNER_COUNT],
            (None, None) => [0; CORNER_COUNT],
        };

        let geometry = PanelGeometry::new(self.x_res, self.y_res, corner_radii).ok_or_else(|| {
            LoadError::invalid(
                origin,
                format!("resolution must be positive, got {}x{}", self.x_res, self.y_res),
            )
        })?;

        let cutouts = self
            .cutouts
            .iter()
            .map(|c| Cutout::new(c.name.clone(), &c.path).map_err(|e| e.in_record(origin)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut panel = DisplayPanel::new(geometry)
            .with_physical_size(self.width, self.height)
            .with_cutouts(cutouts);
        if let Some(name) = &self.name {
            panel = panel.with_name(name.clone());
        }
        Ok(panel)
    }

    /// Serializes a panel. Radii are always written as `corner-radii`.
    pub fn from_panel(panel: &DisplayPanel, compatibles: &[String]) -> Self {
        Self {
            compatibles: compatibles.to_vec(),
            name: panel.name().map(str::to_string),
            x_res: panel.width(),
            y_res: panel.height(),
            width: panel.width_mm().unwrap_or(0),
            height: panel.height_mm().unwrap_or(0),
            border_radius: None,
            corner_radii: Some(panel.corner_radii().to_vec()),
            cutouts: panel
                .cutouts()
                .iter()
                .map(|c| CutoutDocument {
                    name: c.name().map(str::to_string),
                    path: c.path().to_string(),
                })
                .collect(),
        }
    }

    /// Returns the document's compatible strings, validating each.
    pub fn validated_compatibles(&self, origin: &str) -> std::result::Result<Vec<String>, LoadError> {
        for c in &self.compatibles {
            if !compatible::is_valid(c) {
                return Err(LoadError::invalid(
                    origin,
                    format!("invalid compatible string {c:?}"),
                ));
            }
        }
        Ok(self.compatibles.clone())
    }
}

impl DisplayPanel {
    /// Parses a single panel document.
    pub fn from_json(data: &str) -> std::result::Result<Self, LoadError> {
        let doc: PanelDocument = serde_json::from_str(data).map_err(|source| LoadError::Syntax {
            origin: "panel data".to_string(),
            source,
        })?;
        doc.to_panel("panel data")
    }

    /// Serializes the panel as a pretty-printed panel document.
    pub fn to_json(&self) -> String {
        // A document of plain strings and integers always serializes.
        serde_json::to_string_pretty(&PanelDocument::from_panel(self, &[])).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutout::Rect;
    use crate::panel::CornerPosition;

    const ONEPLUS_6T: &str = r#"{
        "name": "Oneplus 6T",
        "x-res": 1080,
        "y-res": 2340,
        "border-radius": 10,
        "width": 68,
        "height": 145,
        "cutouts": [
            { "name": "notch", "path": "M 455 0 V 79 H 625 V 0 Z" }
        ]
    }"#;

    #[test]
    fn test_parse_panel() {
        let panel = DisplayPanel::from_json(ONEPLUS_6T).unwrap();
        assert_eq!(panel.name(), Some("Oneplus 6T"));
        assert_eq!(panel.width(), 1080);
        assert_eq!(panel.height(), 2340);
        assert_eq!(panel.border_radius(), 10);
        assert_eq!(panel.corner_radii(), [10, 10, 10, 10]);
        assert_eq!(panel.physical_size_mm(), Some((68, 145)));

        let cutouts = panel.cutouts();
        assert_eq!(cutouts.len(), 1);
        assert_eq!(cutouts[0].name(), Some("notch"));
        assert_eq!(*cutouts[0].bounds(), Rect::new(455, 0, 170, 79));
    }

    #[test]
    fn test_corner_radii() {
        let json = r#"{
            "name": "Oneplus 6T",
            "x-res": 1080,
            "y-res": 2340,
            "corner-radii": [10, 11, 12, 13],
            "width": 68,
            "height": 145
        }"#;
        let panel = DisplayPanel::from_json(json).unwrap();
        assert_eq!(panel.border_radius(), 10);
        assert_eq!(panel.corner_radius(CornerPosition::TopLeft), 10);
        assert_eq!(panel.corner_radius(CornerPosition::TopRight), 11);
        assert_eq!(panel.corner_radius(CornerPosition::BottomRight), 12);
        assert_eq!(panel.corner_radius(CornerPosition::BottomLeft), 13);
        assert!(panel.cutouts().is_empty());
    }

    #[test]
    fn test_corner_radii_override_border_radius() {
        let json = r#"{ "x-res": 720, "y-res": 1440, "border-radius": 5, "corner-radii": [1, 2, 3, 4] }"#;
        let panel = DisplayPanel::from_json(json).unwrap();
        assert_eq!(panel.corner_radii(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_radii_are_zero() {
        let panel = DisplayPanel::from_json(r#"{ "x-res": 720, "y-res": 1440 }"#).unwrap();
        assert_eq!(panel.corner_radii(), [0; 4]);
        assert_eq!(panel.physical_size_mm(), None);
        assert_eq!(panel.name(), None);
    }

    #[test]
    fn test_invalid_panels() {
        let wrong_count = r#"{ "x-res": 720, "y-res": 1440, "corner-radii": [1, 2, 3] }"#;
        assert!(matches!(
            DisplayPanel::from_json(wrong_count),
            Err(LoadError::InvalidRecord { .. })
        ));

        let no_res = r#"{ "y-res": 1440 }"#;
        assert!(matches!(
            DisplayPanel::from_json(no_res),
            Err(LoadError::InvalidRecord { .. })
        ));

        let negative = r#"{ "x-res": 720, "y-res": 1440, "corner-radii": [1, 2, -3, 4] }"#;
        assert!(matches!(
            DisplayPanel::from_json(negative),
            Err(LoadError::Syntax { .. })
        ));

        assert!(matches!(
            DisplayPanel::from_json("{ not json"),
            Err(LoadError::Syntax { .. })
        ));

        let bad_path = r#"{ "x-res": 720, "y-res": 1440, "cutouts": [{ "path": "Q" }] }"#;
        assert!(matches!(
            DisplayPanel::from_json(bad_path),
            Err(LoadError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_serialize_panel() {
        let panel = DisplayPanel::from_json(ONEPLUS_6T).unwrap();
        let out = panel.to_json();
        assert!(out.contains("\"corner-radii\""));
        assert!(!out.contains("border-radius"));

        let reparsed = DisplayPanel::from_json(&out).unwrap();
        assert_eq!(reparsed, panel);
    }
}
