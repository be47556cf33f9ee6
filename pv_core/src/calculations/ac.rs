//! # AC Circuit Sizing
//!
//! Inverter outputs routed to the interconnection point. Each inverter is
//! its own three-phase circuit (3 phases + neutral + ground); all of them
//! share the raceway.
//!
//! ```text
//! I_design = I_max,inverter × 1.25
//! ΔV%      = √3 · Z · L · I_max / V_LL × 100
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::calculations::conductor::{select_conductor, ConductorRequest, DropFormula};
use crate::calculations::grounding::select_grounding;
use crate::calculations::protection::select_protection;
use crate::calculations::routing::{size_route, BundleGeometry};
use crate::calculations::{
    ground_diameter, Alert, CircuitSizing, SizingContext, AC_CONDUCTORS_PER_INVERTER, AC_GROUNDS_PER_INVERTER,
};
use crate::climate::DesignClimate;
use crate::errors::{CircuitClass, SizingError, SizingResult};
use crate::project::{AcDesign, ComponentSelection, RoutingKind};
use crate::units::Millimeters;

/// AC stage result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcResult {
    pub sizing: CircuitSizing,

    pub inverter_model: String,

    pub inverter_count: u32,

    /// Line-to-line voltage used for the drop (V)
    pub line_voltage_v: f64,
}

/// Size the AC side of a project.
///
/// # Errors
///
/// - `InvalidInput` for a non three-phase inverter or empty topology
/// - `UnknownCatalogEntry` for an unknown inverter model
/// - `NoStandardProtection`, `NoSuitableConductor`, `RoutingOverflow` from
///   the individual stages
#[instrument(skip_all, fields(inverter = %components.inverter_model, inverters = design.inverter_count))]
pub fn size_ac_circuit(
    ctx: &SizingContext,
    components: &ComponentSelection,
    design: &AcDesign,
    climate: &DesignClimate,
) -> SizingResult<AcResult> {
    design.validate()?;
    climate.validate()?;

    let inverter = ctx.catalog.inverter(&components.inverter_model)?;
    if !inverter.is_three_phase() {
        return Err(SizingError::invalid_input(
            format!("inverter[{}].phases", inverter.model),
            inverter.phases.to_string(),
            "AC sizing requires a three-phase inverter",
        ));
    }
    let circuit = CircuitClass::Ac;

    let protection = select_protection(
        circuit,
        inverter.max_ac_current_a,
        ctx.config.protection_multiplier(circuit),
        ctx.tables.breakers(circuit),
    )?;

    let route_length_m = design.route_length_m();
    let current_carrying = AC_CONDUCTORS_PER_INVERTER * design.inverter_count;
    let ground_conductors = AC_GROUNDS_PER_INVERTER * design.inverter_count;

    let conductor = select_conductor(
        &ConductorRequest {
            circuit,
            candidates: ctx.catalog.conductors(circuit),
            protection_a: protection.rating_a,
            drop_current_a: inverter.max_ac_current_a,
            length_m: route_length_m,
            reference_voltage_v: inverter.ac_voltage_v,
            formula: DropFormula::ThreePhase,
            max_design_temp_c: climate.max_design_temp_c,
            bundle_size: current_carrying,
            in_conduit: design.segments.iter().any(|s| s.kind == RoutingKind::Conduit),
            max_drop_pct: ctx.config.max_voltage_drop_pct,
        },
        ctx.tables,
    )?;

    let grounding = select_grounding(protection.rating_a, &ctx.tables.grounding)?;

    let mut alerts = vec![Alert::info(
        "AC-CALC-OK",
        format!(
            "AC conductor {} selected. Vdrop: {:.2}%",
            conductor.gauge, conductor.voltage_drop_pct
        ),
    )];
    if grounding.sentinel {
        alerts.push(Alert::warning(
            "GROUND-SENTINEL",
            format!(
                "AC protection {} A exceeds the grounding table; using {}",
                protection.rating_a, grounding.gauge
            ),
        ));
    }

    let conductor_diameter = Millimeters(conductor.outer_diameter_mm);
    let bundle = BundleGeometry {
        circuit,
        units: design.inverter_count,
        conductors_per_unit: AC_CONDUCTORS_PER_INVERTER,
        ground_count: ground_conductors,
        conductor_diameter,
        ground_diameter: ground_diameter(ctx, circuit, &grounding.gauge, conductor_diameter),
    };
    let (routing, routing_alerts) = size_route(&design.segments, &bundle, design.tray_method, ctx.tables, ctx.config)?;
    alerts.extend(routing_alerts);

    info!(
        gauge = %conductor.gauge,
        protection_a = protection.rating_a,
        drop_pct = conductor.voltage_drop_pct,
        "AC circuit sized"
    );

    Ok(AcResult {
        sizing: CircuitSizing {
            circuit,
            design_current_a: protection.design_current_a,
            protection_a: protection.rating_a,
            conductor,
            grounding,
            routing,
            route_length_m,
            current_carrying_conductors: current_carrying,
            ground_conductors,
            total_cable_m: route_length_m * current_carrying as f64,
            ground_cable_m: route_length_m * ground_conductors as f64,
            alerts,
        },
        inverter_model: inverter.model.clone(),
        inverter_count: design.inverter_count,
        line_voltage_v: inverter.ac_voltage_v,
    })
}
