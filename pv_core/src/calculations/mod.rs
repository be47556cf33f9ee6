//! # Sizing Calculations
//!
//! The engineering pipeline, leaves first:
//!
//! - [`protection`] - design current → standard breaker rating
//! - [`grounding`] - breaker rating → grounding conductor
//! - [`conductor`] - iterative gauge search (ampacity + voltage drop)
//! - [`routing`] - conduit trade size / tray width per segment
//! - [`dc`] - DC stage orchestration (strings → inverter)
//! - [`ac`] - AC stage orchestration (inverters → interconnection)
//! - [`cost`] - BOM quantities, pricing, fixed cost and margin stack
//!
//! Every stage is a pure function of its inputs plus the read-only
//! [`SizingContext`]; independent projects can be sized concurrently.

pub mod ac;
pub mod conductor;
pub mod cost;
pub mod dc;
pub mod grounding;
pub mod protection;
pub mod routing;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogProvider;
use crate::code_tables::CodeTables;
use crate::config::SizingConfig;
use crate::errors::CircuitClass;
use crate::units::Millimeters;

pub use ac::{size_ac_circuit, AcResult};
pub use conductor::{select_conductor, ConductorRequest, ConductorSelection, DropFormula};
pub use cost::{rollup_costs, BomLine, CommercialOptions, CostCategory, CostReport, CostSummary};
pub use dc::{size_dc_circuit, DcResult};
pub use grounding::{select_grounding, GroundingSelection};
pub use protection::{select_protection, ProtectionSelection};
pub use routing::{BundleGeometry, RoutingMaterial};

/// Current-carrying conductors per DC string (positive + negative)
pub const DC_CONDUCTORS_PER_STRING: u32 = 2;

/// Grounding conductors shared by the whole DC bundle
pub const DC_GROUNDS_PER_BUNDLE: u32 = 1;

/// Current-carrying conductors per inverter circuit (3 phases + neutral)
pub const AC_CONDUCTORS_PER_INVERTER: u32 = 4;

/// Grounding conductors per inverter circuit
pub const AC_GROUNDS_PER_INVERTER: u32 = 1;

/// Read-only collaborators shared by every stage of a request.
#[derive(Clone, Copy)]
pub struct SizingContext<'a> {
    pub catalog: &'a dyn CatalogProvider,
    pub tables: &'a CodeTables,
    pub config: &'a SizingConfig,
}

impl<'a> SizingContext<'a> {
    pub fn new(catalog: &'a dyn CatalogProvider, tables: &'a CodeTables, config: &'a SizingConfig) -> Self {
        SizingContext {
            catalog,
            tables,
            config,
        }
    }

    /// Context using the built-in NOM-001-SEDE tables
    pub fn with_standard_tables(catalog: &'a dyn CatalogProvider, config: &'a SizingConfig) -> Self {
        SizingContext::new(catalog, CodeTables::standard(), config)
    }
}

/// Ground conductor diameter: catalog value when the gauge is listed for
/// this circuit, otherwise a fixed fraction of the phase conductor.
pub(crate) fn ground_diameter(
    ctx: &SizingContext,
    circuit: CircuitClass,
    gauge: &str,
    conductor_diameter: Millimeters,
) -> Millimeters {
    match ctx.catalog.conductor(circuit, gauge) {
        Some(spec) => spec.diameter(),
        None => conductor_diameter * ctx.config.ground_diameter_ratio(circuit),
    }
}

/// Severity of an engineering alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    Info,
    Warning,
}

/// Non-fatal message produced while sizing or costing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    /// Stable machine-readable code, e.g. "DC-CALC-OK"
    pub code: String,
    pub message: String,
}

impl Alert {
    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Alert {
            level: AlertLevel::Info,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Alert {
            level: AlertLevel::Warning,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Engineering outcome shared by the DC and AC stages.
///
/// ## JSON Example
///
/// ```json
/// {
///   "circuit": "Ac",
///   "design_current_a": 130.0,
///   "protection_a": 150,
///   "conductor": { "gauge": "3/0 AWG", "voltage_drop_pct": 0.45, "...": "..." },
///   "grounding": { "gauge": "6 AWG", "breakpoint_a": 200.0, "sentinel": false },
///   "routing": [ { "specification": "2\"", "length_m": 50.0, "...": "..." } ],
///   "route_length_m": 50.0,
///   "current_carrying_conductors": 4,
///   "ground_conductors": 1,
///   "total_cable_m": 200.0,
///   "ground_cable_m": 50.0,
///   "alerts": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSizing {
    pub circuit: CircuitClass,

    /// Operating current × protection multiplier (A)
    pub design_current_a: f64,

    /// Selected standard breaker rating (A)
    pub protection_a: u32,

    pub conductor: ConductorSelection,

    pub grounding: GroundingSelection,

    /// One material entry per routing segment, in route order
    pub routing: Vec<RoutingMaterial>,

    /// One-way route length (m)
    pub route_length_m: f64,

    /// Current-carrying conductors in the bundle (grouping count and BOM multiplicity)
    pub current_carrying_conductors: u32,

    /// Grounding conductors in the bundle
    pub ground_conductors: u32,

    /// Current-carrying cable to purchase: route length × conductor count (m)
    pub total_cable_m: f64,

    /// Grounding cable to purchase: route length × ground count (m)
    pub ground_cable_m: f64,

    pub alerts: Vec<Alert>,
}

impl CircuitSizing {
    pub fn gauge(&self) -> &str {
        &self.conductor.gauge
    }

    pub fn voltage_drop_pct(&self) -> f64 {
        self.conductor.voltage_drop_pct
    }

    /// True when any segment fell back to the largest conduit/tray
    pub fn has_routing_overflow(&self) -> bool {
        self.routing.iter().any(|m| m.overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    #[test]
    fn test_ground_diameter_from_catalog() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);

        // 10 AWG is listed among the DC conductors
        let d = ground_diameter(&ctx, CircuitClass::Dc, "10 AWG", Millimeters(5.5));
        assert_eq!(d.value(), 6.1);
    }

    #[test]
    fn test_ground_diameter_falls_back_to_ratio() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);

        let dc = ground_diameter(&ctx, CircuitClass::Dc, "14 AWG", Millimeters(5.5));
        assert!((dc.value() - 5.5 * 0.8).abs() < 1e-12);

        // 6 AWG is not an AC catalog gauge
        let ac = ground_diameter(&ctx, CircuitClass::Ac, "6 AWG", Millimeters(15.3));
        assert!((ac.value() - 15.3 * 0.7).abs() < 1e-12);
    }
}
