//! # Routing Materials
//!
//! Sizes the raceway for every segment of a route.
//!
//! ## Conduit (area fill)
//!
//! ```text
//! A_req = n_cc · π(d/2)² + n_g · π(d_g/2)²
//! trade size = first IMC size whose 40 % allowance ≥ A_req
//! ```
//!
//! ## Tray, linear layout
//!
//! All conductors (grounds included) side by side, one conductor diameter
//! between neighbours:
//!
//! ```text
//! W_req = n_cc · d + n_g · d_g + (n_cc + n_g − 1) · d
//! ```
//!
//! ## Tray, trefoil layout
//!
//! One compact group per circuit unit (string or inverter), groups spaced
//! by `k · d` (k = 2.15 by default):
//!
//! ```text
//! group = c · d + d_g
//! W_req = u · group + (u − 1) · k · d
//! ```
//!
//! A requirement beyond the largest size is resolved by the configured
//! [`RoutingOverflowPolicy`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::Alert;
use crate::catalog::sku;
use crate::code_tables::CodeTables;
use crate::config::{RoutingOverflowPolicy, SizingConfig};
use crate::errors::{CircuitClass, SizingError, SizingResult};
use crate::project::{Placement, RoutingKind, RoutingSegment, TrayMethod};
use crate::tables::{Selection, ThresholdTable};
use crate::units::Millimeters;

/// Conductor bundle carried by every segment of a route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BundleGeometry {
    pub circuit: CircuitClass,

    /// Strings (DC) or inverters (AC)
    pub units: u32,

    /// Current-carrying conductors per unit
    pub conductors_per_unit: u32,

    /// Grounding conductors in the whole bundle (area fill and linear tray)
    pub ground_count: u32,

    /// Outer diameter of a current-carrying conductor
    pub conductor_diameter: Millimeters,

    /// Outer diameter of a grounding conductor
    pub ground_diameter: Millimeters,
}

impl BundleGeometry {
    /// Current-carrying conductors in the bundle
    pub fn current_carrying(&self) -> u32 {
        self.units.saturating_mul(self.conductors_per_unit)
    }

    /// Occupied cross-section for conduit fill (mm²)
    pub fn required_area_mm2(&self) -> f64 {
        let conductors = self.conductor_diameter.circle_area().value() * self.current_carrying() as f64;
        let grounds = self.ground_diameter.circle_area().value() * self.ground_count as f64;
        conductors + grounds
    }

    /// Required tray width for the linear layout (mm)
    pub fn linear_width_mm(&self) -> f64 {
        let d = self.conductor_diameter.value();
        let n_cc = self.current_carrying() as f64;
        let n_g = self.ground_count as f64;
        let total = n_cc + n_g;
        n_cc * d + n_g * self.ground_diameter.value() + (total - 1.0).max(0.0) * d
    }

    /// Required tray width for the trefoil layout (mm)
    pub fn trefoil_width_mm(&self, spacing_factor: f64) -> f64 {
        let d = self.conductor_diameter.value();
        let units = self.units as f64;
        let group = self.conductors_per_unit as f64 * d + self.ground_diameter.value();
        units * group + (units - 1.0).max(0.0) * spacing_factor * d
    }
}

/// How a segment's requirement was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizingMethod {
    AreaFill,
    LinearTray,
    TrefoilTray,
}

/// Raceway chosen for one routing segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingMaterial {
    /// Position of the segment in the route
    pub segment: usize,

    pub kind: RoutingKind,

    pub method: SizingMethod,

    /// Trade size (`1"`) or width (`200 mm`)
    pub specification: String,

    /// Price lookup key
    pub sku: String,

    /// BOM label, placement included
    pub label: String,

    pub length_m: f64,

    #[serde(default)]
    pub placement: Option<Placement>,

    /// Requirement: mm² for conduit, mm for tray
    pub required: f64,

    /// Allowance of the selected size, same unit as `required`
    pub capacity: f64,

    /// True when the requirement exceeded the largest available size
    pub overflow: bool,
}

/// Size the raceway for a single segment.
pub fn size_segment(
    index: usize,
    segment: &RoutingSegment,
    bundle: &BundleGeometry,
    tray_method: TrayMethod,
    tables: &CodeTables,
    config: &SizingConfig,
) -> SizingResult<RoutingMaterial> {
    match segment.kind {
        RoutingKind::Conduit => {
            let required = bundle.required_area_mm2();
            let selection = select_or_largest(&tables.conduit_fill, required);
            check_overflow(index, required, &selection, config)?;
            let trade_size = selection.value;
            Ok(RoutingMaterial {
                segment: index,
                kind: segment.kind,
                method: SizingMethod::AreaFill,
                sku: sku::conduit(&trade_size),
                label: label("IMC conduit", segment.placement),
                specification: trade_size,
                length_m: segment.length_m,
                placement: segment.placement,
                required,
                capacity: selection.key,
                overflow: selection.overflowed,
            })
        }
        RoutingKind::Tray => {
            let (method, required) = match tray_method {
                TrayMethod::Linear => (SizingMethod::LinearTray, bundle.linear_width_mm()),
                TrayMethod::Trefoil => (
                    SizingMethod::TrefoilTray,
                    bundle.trefoil_width_mm(config.trefoil_spacing_factor),
                ),
            };
            let selection = select_or_largest(tables.tray_widths(bundle.circuit), required);
            check_overflow(index, required, &selection, config)?;
            let width_mm = selection.value;
            Ok(RoutingMaterial {
                segment: index,
                kind: segment.kind,
                method,
                specification: format!("{} mm", width_mm),
                sku: sku::tray(width_mm),
                label: label("Wire-mesh tray", segment.placement),
                length_m: segment.length_m,
                placement: segment.placement,
                required,
                capacity: selection.key,
                overflow: selection.overflowed,
            })
        }
    }
}

/// Size every segment of a route, collecting overflow alerts.
pub fn size_route(
    segments: &[RoutingSegment],
    bundle: &BundleGeometry,
    tray_method: TrayMethod,
    tables: &CodeTables,
    config: &SizingConfig,
) -> SizingResult<(Vec<RoutingMaterial>, Vec<Alert>)> {
    let mut materials = Vec::with_capacity(segments.len());
    let mut alerts = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        let material = size_segment(index, segment, bundle, tray_method, tables, config)?;
        debug!(
            circuit = %bundle.circuit,
            segment = index,
            spec = %material.specification,
            required = material.required,
            "routing sized"
        );
        if material.overflow {
            alerts.push(Alert::warning(
                "ROUTING-OVERFLOW",
                format!(
                    "{} segment {}: requirement {:.1} exceeds the largest size {}; split the run",
                    bundle.circuit, index, material.required, material.specification
                ),
            ));
        }
        materials.push(material);
    }

    Ok((materials, alerts))
}

// Every built-in routing table clamps, but a substituted one may not
fn select_or_largest<V: Clone>(table: &ThresholdTable<V>, required: f64) -> Selection<V> {
    table.select(required).unwrap_or_else(|| {
        let (key, value) = table.last();
        Selection {
            key,
            value: value.clone(),
            overflowed: true,
        }
    })
}

fn check_overflow<V: ToString>(
    index: usize,
    required: f64,
    selection: &Selection<V>,
    config: &SizingConfig,
) -> SizingResult<()> {
    if !selection.overflowed {
        return Ok(());
    }
    match config.routing_overflow {
        RoutingOverflowPolicy::Flag => {
            warn!(segment = index, required, largest = %selection.value.to_string(), "routing overflow");
            Ok(())
        }
        RoutingOverflowPolicy::Reject => Err(SizingError::RoutingOverflow {
            segment: index,
            required,
            largest: selection.value.to_string(),
        }),
    }
}

fn label(base: &str, placement: Option<Placement>) -> String {
    match placement {
        Some(p) => format!("{} ({})", base, p.display_name()),
        None => base.to_string(),
    }
}
