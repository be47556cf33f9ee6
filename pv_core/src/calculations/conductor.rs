//! # Conductor Selection
//!
//! Iterative gauge search over a catalog list in ascending ampacity order.
//! A gauge is accepted when it passes both checks, in this order:
//!
//! 1. **Ampacity** (NOM 310-15):
//!    ```text
//!    I_corrected = I_base × F_temp × F_group  ≥  protection rating
//!    ```
//!    `F_temp` comes from the maximum design temperature. `F_group` applies
//!    only when the route contains a conduit segment; open trays are not
//!    derated for grouping.
//!
//! 2. **Voltage drop** (strictly below the configured limit, 3 % by default):
//!    ```text
//!    DC loop:      ΔV% = 2 · R · L · I / V × 100
//!    AC 3-phase:   ΔV% = √3 · Z · L · I / V_LL × 100
//!    ```
//!    with R/Z in Ω/m, L the one-way route length and V the string Vmp or
//!    the line-to-line voltage.
//!
//! If the list is exhausted, the error says which check was binding: a
//! gauge that passed ampacity and failed drop means the route is too long;
//! no gauge passing ampacity means the current is too high.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::code_tables::CodeTables;
use crate::components::ConductorSpec;
use crate::errors::{CircuitClass, ConductorFailure, SizingError, SizingResult};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Voltage-drop formula for a circuit topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropFormula {
    /// Two-wire DC loop: 2·R·L·I / V
    DcLoop,
    /// Balanced three-phase, line-to-line: √3·Z·L·I / V_LL
    ThreePhase,
}

impl DropFormula {
    /// Voltage drop in percent of the reference voltage.
    pub fn drop_pct(&self, ohm_per_m: f64, length_m: f64, current_a: f64, reference_voltage_v: f64) -> f64 {
        let factor = match self {
            DropFormula::DcLoop => 2.0,
            DropFormula::ThreePhase => SQRT_3,
        };
        factor * ohm_per_m * length_m * current_a / reference_voltage_v * 100.0
    }
}

/// Everything the gauge search needs for one circuit
#[derive(Debug, Clone)]
pub struct ConductorRequest<'a> {
    pub circuit: CircuitClass,

    /// Candidates in ascending ampacity order
    pub candidates: &'a [ConductorSpec],

    /// Selected protection rating the corrected ampacity must meet (A)
    pub protection_a: u32,

    /// Current used for voltage drop (Imp for DC, inverter max for AC)
    pub drop_current_a: f64,

    /// One-way route length (m)
    pub length_m: f64,

    /// String Vmp (DC) or line-to-line voltage (AC)
    pub reference_voltage_v: f64,

    pub formula: DropFormula,

    /// Maximum design ambient temperature (°C)
    pub max_design_temp_c: f64,

    /// Current-carrying conductors sharing the raceway
    pub bundle_size: u32,

    /// Grouping derating applies only when the route has a conduit segment
    pub in_conduit: bool,

    /// Acceptance threshold, strict (%)
    pub max_drop_pct: f64,
}

/// Why a candidate gauge was skipped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    /// Corrected ampacity below the protection rating
    Ampacity { corrected_a: f64 },
    /// Voltage drop at or above the limit
    VoltageDrop { drop_pct: f64 },
}

/// A candidate evaluated and skipped before the accepted gauge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedGauge {
    pub gauge: String,
    pub reason: Rejection,
}

/// Accepted gauge with the figures that justified it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConductorSelection {
    pub gauge: String,

    /// Catalog ampacity before derating (A)
    pub base_ampacity_a: f64,

    pub temperature_factor: f64,

    pub grouping_factor: f64,

    /// Base ampacity × both factors (A)
    pub corrected_ampacity_a: f64,

    pub voltage_drop_pct: f64,

    pub ohm_per_km: f64,

    pub outer_diameter_mm: f64,

    /// Smaller gauges tried first, in search order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedGauge>,
}

impl ConductorSelection {
    /// Margin between corrected ampacity and the protection rating (A)
    pub fn ampacity_margin(&self, protection_a: u32) -> f64 {
        self.corrected_ampacity_a - protection_a as f64
    }
}

impl ConductorRequest<'_> {
    fn validate(&self) -> SizingResult<()> {
        if !self.length_m.is_finite() || self.length_m < 0.0 {
            return Err(SizingError::invalid_input(
                "length_m",
                self.length_m.to_string(),
                "Route length must be zero or positive",
            ));
        }
        if !self.drop_current_a.is_finite() || self.drop_current_a < 0.0 {
            return Err(SizingError::invalid_input(
                "drop_current_a",
                self.drop_current_a.to_string(),
                "Current must be zero or positive",
            ));
        }
        if !(self.reference_voltage_v > 0.0) {
            return Err(SizingError::invalid_input(
                "reference_voltage_v",
                self.reference_voltage_v.to_string(),
                "Reference voltage must be positive",
            ));
        }
        Ok(())
    }
}

/// Smallest catalog gauge passing ampacity and voltage drop.
///
/// # Example
///
/// ```rust
/// use pv_core::calculations::conductor::{select_conductor, ConductorRequest, DropFormula};
/// use pv_core::code_tables::CodeTables;
/// use pv_core::components::ConductorSpec;
/// use pv_core::errors::CircuitClass;
///
/// let candidates = vec![ConductorSpec {
///     gauge: "10 AWG".to_string(),
///     ampacity_a: 40.0,
///     ohm_per_km: 3.28,
///     outer_diameter_mm: 6.1,
/// }];
/// let request = ConductorRequest {
///     circuit: CircuitClass::Dc,
///     candidates: &candidates,
///     protection_a: 20,
///     drop_current_a: 10.5,
///     length_m: 30.0,
///     reference_voltage_v: 615.0,
///     formula: DropFormula::DcLoop,
///     max_design_temp_c: 34.0,
///     bundle_size: 4,
///     in_conduit: false,
///     max_drop_pct: 3.0,
/// };
/// let selection = select_conductor(&request, CodeTables::standard()).unwrap();
/// assert_eq!(selection.gauge, "10 AWG");
/// ```
pub fn select_conductor(request: &ConductorRequest, tables: &CodeTables) -> SizingResult<ConductorSelection> {
    request.validate()?;

    let temperature_factor = tables.temperature_factor(request.max_design_temp_c);
    let grouping_factor = if request.in_conduit {
        tables.grouping_factor(request.bundle_size)
    } else {
        1.0
    };
    let protection = request.protection_a as f64;

    let mut rejected = Vec::new();
    let mut best_drop_pct: Option<f64> = None;

    for candidate in request.candidates {
        let corrected_ampacity_a = candidate.ampacity_a * temperature_factor * grouping_factor;
        if corrected_ampacity_a < protection {
            debug!(
                circuit = %request.circuit,
                gauge = %candidate.gauge,
                corrected_ampacity_a,
                protection_a = request.protection_a,
                "gauge rejected on ampacity"
            );
            rejected.push(RejectedGauge {
                gauge: candidate.gauge.clone(),
                reason: Rejection::Ampacity {
                    corrected_a: corrected_ampacity_a,
                },
            });
            continue;
        }

        let drop_pct = request.formula.drop_pct(
            candidate.ohm_per_m(),
            request.length_m,
            request.drop_current_a,
            request.reference_voltage_v,
        );

        if drop_pct < request.max_drop_pct {
            info!(
                circuit = %request.circuit,
                gauge = %candidate.gauge,
                drop_pct,
                corrected_ampacity_a,
                "conductor selected"
            );
            return Ok(ConductorSelection {
                gauge: candidate.gauge.clone(),
                base_ampacity_a: candidate.ampacity_a,
                temperature_factor,
                grouping_factor,
                corrected_ampacity_a,
                voltage_drop_pct: drop_pct,
                ohm_per_km: candidate.ohm_per_km,
                outer_diameter_mm: candidate.outer_diameter_mm,
                rejected,
            });
        }

        debug!(circuit = %request.circuit, gauge = %candidate.gauge, drop_pct, "gauge rejected on voltage drop");
        best_drop_pct = Some(best_drop_pct.map_or(drop_pct, |best| best.min(drop_pct)));
        rejected.push(RejectedGauge {
            gauge: candidate.gauge.clone(),
            reason: Rejection::VoltageDrop { drop_pct },
        });
    }

    let failure = if best_drop_pct.is_some() {
        ConductorFailure::DistanceTooLong
    } else {
        ConductorFailure::CurrentTooHigh
    };

    Err(SizingError::NoSuitableConductor {
        circuit: request.circuit,
        failure,
        protection_a: request.protection_a,
        best_drop_pct,
    })
}
