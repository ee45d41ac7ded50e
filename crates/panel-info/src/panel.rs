//! Physical properties of a display panel.

use crate::cutout::Cutout;
use crate::{Error, Result};
use std::str::FromStr;

/// Number of corners with a radius.
pub const CORNER_COUNT: usize = 4;

/// Corner positions, clockwise from top-left.
///
/// The discriminant is the index into [`DisplayPanel::corner_radii`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CornerPosition {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl CornerPosition {
    /// All corners in radius array order.
    pub const ALL: [CornerPosition; CORNER_COUNT] = [
        CornerPosition::TopLeft,
        CornerPosition::TopRight,
        CornerPosition::BottomRight,
        CornerPosition::BottomLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for CornerPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "top-left" | "top_left" => Ok(CornerPosition::TopLeft),
            "top-right" | "top_right" => Ok(CornerPosition::TopRight),
            "bottom-right" | "bottom_right" => Ok(CornerPosition::BottomRight),
            "bottom-left" | "bottom_left" => Ok(CornerPosition::BottomLeft),
            _ => Err(Error::InvalidCorner(s.to_string())),
        }
    }
}

impl std::fmt::Display for CornerPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CornerPosition::TopLeft => write!(f, "top-left"),
            CornerPosition::TopRight => write!(f, "top-right"),
            CornerPosition::BottomRight => write!(f, "bottom-right"),
            CornerPosition::BottomLeft => write!(f, "bottom-left"),
        }
    }
}

/// Resolution and corner radii of a panel, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    pub width: u32,
    pub height: u32,
    pub corner_radii: [u32; CORNER_COUNT],
}

impl PanelGeometry {
    /// Creates a geometry. Returns `None` if either dimension is zero.
    pub fn new(width: u32, height: u32, corner_radii: [u32; CORNER_COUNT]) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width,
            height,
            corner_radii,
        })
    }

    /// Radius of a single corner.
    pub fn corner_radius(&self, corner: CornerPosition) -> u32 {
        self.corner_radii[corner.index()]
    }

    /// Returns true if all four corners share the same radius.
    pub fn is_uniform(&self) -> bool {
        self.corner_radii.iter().all(|r| *r == self.corner_radii[0])
    }
}

/// A display panel: geometry plus optional physical size, name and cutouts.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPanel {
    name: Option<String>,
    geometry: PanelGeometry,
    width_mm: Option<u32>,
    height_mm: Option<u32>,
    cutouts: Vec<Cutout>,
}

impl DisplayPanel {
    /// Creates a panel without name, physical size or cutouts.
    pub fn new(geometry: PanelGeometry) -> Self {
        Self {
            name: None,
            geometry,
            width_mm: None,
            height_mm: None,
            cutouts: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the physical size in millimeters. Zero means unknown.
    pub fn with_physical_size(mut self, width_mm: u32, height_mm: u32) -> Self {
        self.width_mm = (width_mm > 0).then_some(width_mm);
        self.height_mm = (height_mm > 0).then_some(height_mm);
        self
    }

    pub fn with_cutouts(mut self, cutouts: Vec<Cutout>) -> Self {
        self.cutouts = cutouts;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    /// Horizontal resolution in pixels.
    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    /// Vertical resolution in pixels.
    pub fn height(&self) -> u32 {
        self.geometry.height
    }

    /// Corner radii, clockwise from top-left.
    pub fn corner_radii(&self) -> [u32; CORNER_COUNT] {
        self.geometry.corner_radii
    }

    pub fn corner_radius(&self, corner: CornerPosition) -> u32 {
        self.geometry.corner_radius(corner)
    }

    /// The top-left radius, for consumers that only know a single radius.
    pub fn border_radius(&self) -> u32 {
        self.geometry.corner_radius(CornerPosition::TopLeft)
    }

    /// Physical width in millimeters, if known.
    pub fn width_mm(&self) -> Option<u32> {
        self.width_mm
    }

    /// Physical height in millimeters, if known.
    pub fn height_mm(&self) -> Option<u32> {
        self.height_mm
    }

    /// Physical size as `(width, height)` in millimeters, if both are known.
    pub fn physical_size_mm(&self) -> Option<(u32, u32)> {
        Some((self.width_mm?, self.height_mm?))
    }

    pub fn cutouts(&self) -> &[Cutout] {
        &self.cutouts
    }
}
