//! # DC Circuit Sizing
//!
//! Strings of PV modules routed to the inverter.
//!
//! ## Procedure
//!
//! 1. Protection: `Isc × 1.56` → standard DC breaker
//! 2. Conductor: ampacity vs. protection, then loop drop with `Imp` and the
//!    string voltage `Vmp × panels per string`
//! 3. Grounding from the protection rating
//! 4. Routing per segment, two conductors per string plus one shared ground
//! 5. Cold open-circuit string voltage against the inverter DC limit
//!    (NOM 690-7), when both ratings are known
//!
//! The string count is the bundle multiplier: it drives grouping derating,
//! raceway fill and purchased cable metres.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::calculations::conductor::{select_conductor, ConductorRequest, DropFormula};
use crate::calculations::grounding::select_grounding;
use crate::calculations::protection::select_protection;
use crate::calculations::routing::{size_route, BundleGeometry};
use crate::calculations::{
    ground_diameter, Alert, CircuitSizing, SizingContext, DC_CONDUCTORS_PER_STRING, DC_GROUNDS_PER_BUNDLE,
};
use crate::climate::DesignClimate;
use crate::errors::{CircuitClass, SizingResult};
use crate::project::{ComponentSelection, DcDesign, RoutingKind};
use crate::units::{Kilowatts, Millimeters, Watts};

/// DC stage result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcResult {
    pub sizing: CircuitSizing,

    pub panel_model: String,

    pub panels_per_string: u32,

    pub string_count: u32,

    pub panel_count: u32,

    /// Panel count × Pmax
    pub installed_power: Kilowatts,

    /// Vmp × panels per string (V)
    pub string_vmp_v: f64,

    /// Voc × panels per string × 690-7 factor (V), when the panel lists Voc
    pub string_voc_cold_v: Option<f64>,
}

/// Size the DC side of a project.
///
/// # Errors
///
/// - `InvalidInput` for an empty topology or invalid design climate
/// - `UnknownCatalogEntry` for an unknown panel or inverter model
/// - `NoStandardProtection`, `NoSuitableConductor`, `RoutingOverflow` from
///   the individual stages
#[instrument(skip_all, fields(panel = %components.panel_model, strings = design.string_count))]
pub fn size_dc_circuit(
    ctx: &SizingContext,
    components: &ComponentSelection,
    design: &DcDesign,
    climate: &DesignClimate,
) -> SizingResult<DcResult> {
    design.validate()?;
    climate.validate()?;

    let panel = ctx.catalog.panel(&components.panel_model)?;
    let inverter = ctx.catalog.inverter(&components.inverter_model)?;
    let circuit = CircuitClass::Dc;

    let protection = select_protection(
        circuit,
        panel.isc_a,
        ctx.config.protection_multiplier(circuit),
        ctx.tables.breakers(circuit),
    )?;

    let string_vmp_v = panel.vmp_v * design.panels_per_string as f64;
    let route_length_m = design.route_length_m();
    let current_carrying = DC_CONDUCTORS_PER_STRING * design.string_count;

    let conductor = select_conductor(
        &ConductorRequest {
            circuit,
            candidates: ctx.catalog.conductors(circuit),
            protection_a: protection.rating_a,
            drop_current_a: panel.imp_a,
            length_m: route_length_m,
            reference_voltage_v: string_vmp_v,
            formula: DropFormula::DcLoop,
            max_design_temp_c: climate.max_design_temp_c,
            bundle_size: current_carrying,
            in_conduit: design.segments.iter().any(|s| s.kind == RoutingKind::Conduit),
            max_drop_pct: ctx.config.max_voltage_drop_pct,
        },
        ctx.tables,
    )?;

    let grounding = select_grounding(protection.rating_a, &ctx.tables.grounding)?;

    let mut alerts = Vec::new();
    if grounding.sentinel {
        alerts.push(Alert::warning(
            "GROUND-SENTINEL",
            format!(
                "DC protection {} A exceeds the grounding table; using {}",
                protection.rating_a, grounding.gauge
            ),
        ));
    }

    let conductor_diameter = Millimeters(conductor.outer_diameter_mm);
    let ground_diameter = ground_diameter(ctx, circuit, &grounding.gauge, conductor_diameter);
    let bundle = BundleGeometry {
        circuit,
        units: design.string_count,
        conductors_per_unit: DC_CONDUCTORS_PER_STRING,
        ground_count: DC_GROUNDS_PER_BUNDLE,
        conductor_diameter,
        ground_diameter,
    };
    let (routing, routing_alerts) = size_route(&design.segments, &bundle, design.tray_method, ctx.tables, ctx.config)?;
    alerts.extend(routing_alerts);

    // Cold open-circuit voltage check
    let string_voc_cold_v = panel.voc_v.map(|voc| {
        voc * design.panels_per_string as f64 * ctx.tables.voltage_correction_factor(climate.min_design_temp_c)
    });
    if let (Some(voc_cold), Some(limit)) = (string_voc_cold_v, inverter.max_dc_voltage_v) {
        if voc_cold > limit {
            warn!(voc_cold, limit, "cold string Voc exceeds inverter DC limit");
            alerts.push(Alert::warning(
                "DC-VOC-MAX",
                format!(
                    "String Voc at {:.1} °C is {:.1} V, above the inverter limit of {:.0} V; shorten the strings",
                    climate.min_design_temp_c, voc_cold, limit
                ),
            ));
        }
    }

    alerts.insert(
        0,
        Alert::info(
            "DC-CALC-OK",
            format!(
                "DC conductor {} selected. Vdrop: {:.2}%",
                conductor.gauge, conductor.voltage_drop_pct
            ),
        ),
    );

    let panel_count = design.panel_count();
    let installed_power: Kilowatts = Watts(panel.pmax_w * panel_count as f64).into();

    info!(
        gauge = %conductor.gauge,
        protection_a = protection.rating_a,
        drop_pct = conductor.voltage_drop_pct,
        kw = installed_power.value(),
        "DC circuit sized"
    );

    Ok(DcResult {
        sizing: CircuitSizing {
            circuit,
            design_current_a: protection.design_current_a,
            protection_a: protection.rating_a,
            conductor,
            grounding,
            routing,
            route_length_m,
            current_carrying_conductors: current_carrying,
            ground_conductors: DC_GROUNDS_PER_BUNDLE,
            total_cable_m: route_length_m * current_carrying as f64,
            ground_cable_m: route_length_m * DC_GROUNDS_PER_BUNDLE as f64,
            alerts,
        },
        panel_model: panel.model.clone(),
        panels_per_string: design.panels_per_string,
        string_count: design.string_count,
        panel_count,
        installed_power,
        string_vmp_v,
        string_voc_cold_v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::AlertLevel;
    use crate::config::SizingConfig;
    use crate::errors::{ConductorFailure, SizingError};
    use crate::project::RoutingSegment;
    use crate::test_fixtures;

    #[test]
    fn test_fixture_dc_sizing() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let project = test_fixtures::project();

        let dc = size_dc_circuit(&ctx, &project.components, &project.dc, &test_fixtures::climate()).unwrap();
        let s = &dc.sizing;

        assert_eq!(s.protection_a, 20);
        assert_eq!(s.gauge(), "12 AWG");
        // 2 × 0.00521 × 60 × 10.5 / 615 × 100
        assert!((s.voltage_drop_pct() - 1.06741).abs() < 1e-4);
        assert_eq!(s.conductor.grouping_factor, 0.70);
        assert_eq!(s.grounding.gauge, "12 AWG");
        assert_eq!(s.current_carrying_conductors, 8);
        assert_eq!(s.total_cable_m, 480.0);
        assert_eq!(s.ground_cable_m, 60.0);

        assert_eq!(s.routing.len(), 2);
        assert_eq!(s.routing[0].specification, "100 mm");
        assert_eq!(s.routing[1].specification, "1\"");

        assert_eq!(dc.panel_count, 60);
        assert!((dc.installed_power.value() - 33.0).abs() < 1e-9);
        assert_eq!(dc.string_vmp_v, 615.0);
        assert_eq!(s.alerts[0].code, "DC-CALC-OK");
        assert_eq!(s.alerts[0].message, "DC conductor 12 AWG selected. Vdrop: 1.07%");
    }

    #[test]
    fn test_cold_voc_within_limit() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let project = test_fixtures::project();

        // 49.5 V × 15 × 1.10 (2 °C) = 816.75 V < 1000 V
        let dc = size_dc_circuit(&ctx, &project.components, &project.dc, &test_fixtures::climate()).unwrap();
        assert!((dc.string_voc_cold_v.unwrap() - 816.75).abs() < 1e-9);
        assert!(dc.sizing.alerts.iter().all(|a| a.code != "DC-VOC-MAX"));
    }

    #[test]
    fn test_cold_voc_exceeds_inverter_limit() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let mut project = test_fixtures::project();
        project.dc.panels_per_string = 20;

        // 49.5 × 20 × 1.10 = 1089 V
        let dc = size_dc_circuit(&ctx, &project.components, &project.dc, &test_fixtures::climate()).unwrap();
        let alert = dc.sizing.alerts.iter().find(|a| a.code == "DC-VOC-MAX").unwrap();
        assert_eq!(alert.level, AlertLevel::Warning);
    }

    #[test]
    fn test_tray_only_route_skips_grouping() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let mut project = test_fixtures::project();
        project.dc.segments = vec![RoutingSegment::new(RoutingKind::Tray, 60.0)];

        let dc = size_dc_circuit(&ctx, &project.components, &project.dc, &test_fixtures::climate()).unwrap();
        assert_eq!(dc.sizing.conductor.grouping_factor, 1.0);
        assert!(dc.sizing.routing.iter().all(|m| m.kind == RoutingKind::Tray));
    }

    #[test]
    fn test_long_route_upsizes_conductor() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let mut project = test_fixtures::project();
        project.dc.segments = vec![RoutingSegment::new(RoutingKind::Tray, 250.0)];

        // 12 AWG: 2 × 0.00521 × 250 × 10.5 / 615 = 4.45 %; 10 AWG: 2.80 %
        let dc = size_dc_circuit(&ctx, &project.components, &project.dc, &test_fixtures::climate()).unwrap();
        assert_eq!(dc.sizing.gauge(), "10 AWG");
        assert_eq!(dc.sizing.conductor.rejected.len(), 1);
    }

    #[test]
    fn test_route_too_long() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let mut project = test_fixtures::project();
        project.dc.segments = vec![RoutingSegment::new(RoutingKind::Tray, 5000.0)];

        let err = size_dc_circuit(&ctx, &project.components, &project.dc, &test_fixtures::climate()).unwrap_err();
        assert!(matches!(
            err,
            SizingError::NoSuitableConductor {
                failure: ConductorFailure::DistanceTooLong,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_panel() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let mut project = test_fixtures::project();
        project.components.panel_model = "P-999".to_string();

        let err = size_dc_circuit(&ctx, &project.components, &project.dc, &test_fixtures::climate()).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CATALOG_ENTRY");
    }
}
