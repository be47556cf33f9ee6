//! # Project Input
//!
//! The typed request a sizing run consumes: component selection, DC string
//! topology, AC inverter topology, routing segments and interconnection
//! choice.
//!
//! ## Structure
//!
//! ```text
//! ProjectInput
//! ├── components: ComponentSelection (panel, inverter, mounting)
//! ├── dc: DcDesign (panels per string, strings, segments, tray method)
//! ├── ac: AcDesign (inverters, segments, tray method)
//! └── interconnection: InterconnectionPoint
//! ```
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "name": "Warehouse Roof 60 kW",
//!   "coordinates": "20.6597, -103.3496",
//!   "components": { "panel_model": "P-550", "inverter_model": "INV-50", "mounting": "Coplanar" },
//!   "dc": {
//!     "panels_per_string": 15,
//!     "string_count": 4,
//!     "segments": [ { "kind": "Tray", "length_m": 40.0 }, { "kind": "Conduit", "length_m": 20.0 } ]
//!   },
//!   "ac": {
//!     "inverter_count": 1,
//!     "segments": [ { "kind": "Conduit", "length_m": 50.0, "placement": "Buried" } ]
//!   },
//!   "interconnection": "MainPanel"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::climate::Coordinates;
use crate::errors::{SizingError, SizingResult};

/// Upper bound on modules in one series string
pub const MAX_PANELS_PER_STRING: u32 = 100;

/// Upper bound on strings sharing one DC route
pub const MAX_STRING_COUNT: u32 = 10_000;

/// Upper bound on inverters sharing one AC route
pub const MAX_INVERTER_COUNT: u32 = 1_000;

/// Raceway type of a routing segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingKind {
    /// Closed conduit, sized by area fill; grouping derating applies
    Conduit,
    /// Open wire-mesh tray, sized by width; no grouping derating
    Tray,
}

impl RoutingKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            RoutingKind::Conduit => "Conduit",
            RoutingKind::Tray => "Tray",
        }
    }
}

/// Where a segment runs. Affects BOM labels only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    Buried,
    Exposed,
}

impl Placement {
    pub fn display_name(&self) -> &'static str {
        match self {
            Placement::Buried => "buried",
            Placement::Exposed => "exposed",
        }
    }
}

/// One stretch of the route between two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingSegment {
    pub kind: RoutingKind,

    /// Segment length in metres
    pub length_m: f64,

    #[serde(default)]
    pub placement: Option<Placement>,
}

impl RoutingSegment {
    pub fn new(kind: RoutingKind, length_m: f64) -> Self {
        RoutingSegment {
            kind,
            length_m,
            placement: None,
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }
}

/// How conductors are laid out in a tray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrayMethod {
    /// Every conductor side by side with one diameter of spacing
    #[default]
    Linear,
    /// One compact bundle per circuit unit, bundles spaced apart
    Trefoil,
}

/// Mounting structure, drives the per-watt structure cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MountingType {
    Coplanar,
    #[default]
    FixTilt,
    GroundMount,
    Carport,
}

impl MountingType {
    pub const ALL: [MountingType; 4] = [
        MountingType::Coplanar,
        MountingType::FixTilt,
        MountingType::GroundMount,
        MountingType::Carport,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            MountingType::Coplanar => "Coplanar",
            MountingType::FixTilt => "Fix tilt",
            MountingType::GroundMount => "Ground mount",
            MountingType::Carport => "Carport",
        }
    }
}

/// Point of interconnection with the site's electrical system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InterconnectionPoint {
    #[default]
    MainPanel,
    MvTransformer,
    ServiceDrop,
    SecondaryPanel,
}

impl InterconnectionPoint {
    /// Stable code used in SKUs
    pub fn code(&self) -> &'static str {
        match self {
            InterconnectionPoint::MainPanel => "MAIN-PANEL",
            InterconnectionPoint::MvTransformer => "MV-TRANSFORMER",
            InterconnectionPoint::ServiceDrop => "SERVICE-DROP",
            InterconnectionPoint::SecondaryPanel => "SECONDARY-PANEL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InterconnectionPoint::MainPanel => "Main switchboard",
            InterconnectionPoint::MvTransformer => "MV transformer",
            InterconnectionPoint::ServiceDrop => "Service drop (cable)",
            InterconnectionPoint::SecondaryPanel => "Secondary panel / upgrades",
        }
    }
}

/// Catalog models chosen for the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSelection {
    pub panel_model: String,
    pub inverter_model: String,
    #[serde(default)]
    pub mounting: MountingType,
}

/// DC side: series strings routed to the inverter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcDesign {
    pub panels_per_string: u32,
    pub string_count: u32,
    pub segments: Vec<RoutingSegment>,
    #[serde(default)]
    pub tray_method: TrayMethod,
}

/// AC side: inverters routed to the interconnection point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcDesign {
    pub inverter_count: u32,
    pub segments: Vec<RoutingSegment>,
    #[serde(default = "default_ac_tray_method")]
    pub tray_method: TrayMethod,
}

fn default_ac_tray_method() -> TrayMethod {
    TrayMethod::Trefoil
}

/// Complete sizing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,

    /// "lat, lon" in decimal degrees
    pub coordinates: String,

    pub components: ComponentSelection,

    pub dc: DcDesign,

    pub ac: AcDesign,

    #[serde(default)]
    pub interconnection: InterconnectionPoint,
}

impl ProjectInput {
    /// Validate request shape before sizing.
    pub fn validate(&self) -> SizingResult<()> {
        if self.name.trim().is_empty() {
            return Err(SizingError::invalid_input("name", "", "Project name is required"));
        }
        Coordinates::parse(&self.coordinates)?;
        if self.components.panel_model.is_empty() {
            return Err(SizingError::invalid_input("components.panel_model", "", "Panel model is required"));
        }
        if self.components.inverter_model.is_empty() {
            return Err(SizingError::invalid_input("components.inverter_model", "", "Inverter model is required"));
        }
        self.dc.validate()?;
        self.ac.validate()?;
        Ok(())
    }

    /// Parsed site coordinates
    pub fn site(&self) -> SizingResult<Coordinates> {
        Coordinates::parse(&self.coordinates)
    }
}

impl DcDesign {
    pub fn validate(&self) -> SizingResult<()> {
        check_count("dc.panels_per_string", self.panels_per_string, MAX_PANELS_PER_STRING)?;
        check_count("dc.string_count", self.string_count, MAX_STRING_COUNT)?;
        validate_segments("dc.segments", &self.segments)
    }

    /// Saturates instead of wrapping for designs that skipped `validate()`
    pub fn panel_count(&self) -> u32 {
        self.panels_per_string.saturating_mul(self.string_count)
    }

    /// One-way route length (m)
    pub fn route_length_m(&self) -> f64 {
        route_length(&self.segments)
    }
}

impl AcDesign {
    pub fn validate(&self) -> SizingResult<()> {
        check_count("ac.inverter_count", self.inverter_count, MAX_INVERTER_COUNT)?;
        validate_segments("ac.segments", &self.segments)
    }

    /// One-way route length (m)
    pub fn route_length_m(&self) -> f64 {
        route_length(&self.segments)
    }
}

fn route_length(segments: &[RoutingSegment]) -> f64 {
    segments.iter().map(|s| s.length_m).sum()
}

fn check_count(field: &str, value: u32, max: u32) -> SizingResult<()> {
    if value == 0 || value > max {
        return Err(SizingError::invalid_input(
            field,
            value.to_string(),
            format!("Must be between 1 and {}", max),
        ));
    }
    Ok(())
}

fn validate_segments(field: &str, segments: &[RoutingSegment]) -> SizingResult<()> {
    if segments.is_empty() {
        return Err(SizingError::invalid_input(field, "[]", "At least one routing segment"));
    }
    for (i, seg) in segments.iter().enumerate() {
        if !seg.length_m.is_finite() || seg.length_m < 0.0 {
            return Err(SizingError::invalid_input(
                format!("{}[{}].length_m", field, i),
                seg.length_m.to_string(),
                "Length must be zero or positive",
            ));
        }
    }
    Ok(())
}
