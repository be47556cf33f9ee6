//! # Component Specifications
//!
//! Electrical ratings of the catalog items the sizing stages consume:
//! PV modules, inverters and conductors. All values come from manufacturer
//! datasheets and are read-only once the catalog is built.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "model": "TSM-550DE19",
//!   "pmax_w": 550.0,
//!   "isc_a": 18.52,
//!   "imp_a": 17.33,
//!   "vmp_v": 31.7,
//!   "voc_v": 38.1
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{SizingError, SizingResult};
use crate::units::Millimeters;

/// PV module ratings at STC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    /// Catalog model identifier
    pub model: String,

    /// Rated power (W)
    pub pmax_w: f64,

    /// Short-circuit current Isc (A)
    pub isc_a: f64,

    /// Current at maximum power Imp (A)
    pub imp_a: f64,

    /// Voltage at maximum power Vmp (V)
    pub vmp_v: f64,

    /// Open-circuit voltage Voc (V), enables the cold-string voltage check
    #[serde(default)]
    pub voc_v: Option<f64>,
}

impl PanelSpec {
    /// Check datasheet values are physically meaningful.
    pub fn validate(&self) -> SizingResult<()> {
        let positive = [
            ("pmax_w", self.pmax_w),
            ("isc_a", self.isc_a),
            ("imp_a", self.imp_a),
            ("vmp_v", self.vmp_v),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(SizingError::invalid_input(
                    format!("panel[{}].{}", self.model, field),
                    value.to_string(),
                    "Must be positive",
                ));
            }
        }
        if self.imp_a > self.isc_a {
            return Err(SizingError::invalid_input(
                format!("panel[{}].imp_a", self.model),
                self.imp_a.to_string(),
                "Imp cannot exceed Isc",
            ));
        }
        Ok(())
    }
}

/// Grid-tie inverter ratings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverterSpec {
    /// Catalog model identifier
    pub model: String,

    /// Maximum continuous AC output current (A)
    pub max_ac_current_a: f64,

    /// Nominal AC voltage (V), line-to-line for three-phase units
    pub ac_voltage_v: f64,

    /// Number of AC phases
    #[serde(default = "default_phases")]
    pub phases: u8,

    /// Maximum DC input voltage (V)
    #[serde(default)]
    pub max_dc_voltage_v: Option<f64>,
}

fn default_phases() -> u8 {
    3
}

impl InverterSpec {
    /// True when `ac_voltage_v` is a line-to-line three-phase reference
    pub fn is_three_phase(&self) -> bool {
        self.phases == 3
    }

    /// Check datasheet values are physically meaningful.
    pub fn validate(&self) -> SizingResult<()> {
        if !(self.max_ac_current_a > 0.0) {
            return Err(SizingError::invalid_input(
                format!("inverter[{}].max_ac_current_a", self.model),
                self.max_ac_current_a.to_string(),
                "Must be positive",
            ));
        }
        if !(self.ac_voltage_v > 0.0) {
            return Err(SizingError::invalid_input(
                format!("inverter[{}].ac_voltage_v", self.model),
                self.ac_voltage_v.to_string(),
                "Must be positive",
            ));
        }
        if !matches!(self.phases, 1 | 3) {
            return Err(SizingError::invalid_input(
                format!("inverter[{}].phases", self.model),
                self.phases.to_string(),
                "Inverters are single- or three-phase",
            ));
        }
        Ok(())
    }
}

/// One conductor gauge from a cable catalog.
///
/// For the DC catalog `ohm_per_km` is the DC resistance; for the AC catalog it
/// is the effective impedance in steel conduit at typical power factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConductorSpec {
    /// Gauge designation, e.g. "10 AWG", "1/0 AWG"
    pub gauge: String,

    /// Base ampacity at 90 °C insulation rating (A)
    pub ampacity_a: f64,

    /// Resistance (DC) or impedance (AC) per kilometre (Ω/km)
    pub ohm_per_km: f64,

    /// Outer diameter including insulation (mm)
    pub outer_diameter_mm: f64,
}

impl ConductorSpec {
    /// Ω per metre, the unit used by the voltage-drop formulas
    pub fn ohm_per_m(&self) -> f64 {
        self.ohm_per_km / 1000.0
    }

    pub fn diameter(&self) -> Millimeters {
        Millimeters(self.outer_diameter_mm)
    }
}
