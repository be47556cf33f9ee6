//! # NOM-001-SEDE Code Tables
//!
//! Digitized tables from the Mexican electrical installation standard
//! (NOM-001-SEDE, harmonized with NEC) used by the sizing stages.
//!
//! ## Table Summary
//!
//! | Table            | Key                    | Value                  | Overflow        |
//! |------------------|------------------------|------------------------|-----------------|
//! | 310-15(b)(2)(a)  | ambient °C             | ampacity factor        | 0.41 sentinel   |
//! | 310-15(b)(3)(a)  | conductors in raceway  | ampacity factor        | last (0.35)     |
//! | 250-122          | protection A           | grounding gauge        | 1200 A sentinel |
//! | IMC 40 % fill    | occupied mm²           | trade size             | largest, flagged|
//! | Tray widths      | required mm            | commercial width mm    | largest, flagged|
//! | Breakers         | design A               | rating A               | fail            |
//! | 690-7            | min ambient °C         | Voc correction factor  | floor lookup    |
//!
//! The standard set is built once behind [`CodeTables::standard`]. Stages
//! receive tables by reference through the sizing context, so tests can
//! substitute their own.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::errors::{CircuitClass, SizingResult};
use crate::tables::{DerationTable, Overflow, ThresholdTable};

// ============================================================================
// NOM Code Section References
// ============================================================================

/// Code section references, used as table names and in alert messages.
pub mod nom_ref {
    /// Ampacity correction for ambient temperature (90 °C insulation)
    pub const TEMPERATURE: &str = "NOM 310-15(b)(2)(a)";
    /// Adjustment for more than three current-carrying conductors in a raceway
    pub const GROUPING: &str = "NOM 310-15(b)(3)(a)";
    /// Minimum equipment grounding conductor size
    pub const GROUNDING: &str = "NOM 250-122";
    /// IMC conduit, 40 % fill allowance
    pub const CONDUIT_IMC_40: &str = "NOM Ch.9 Table 4 (IMC 40%)";
    /// PV source circuit voltage correction for low temperature
    pub const VOLTAGE_CORRECTION: &str = "NOM 690-7";
    /// Continuous-duty sizing of overcurrent protection
    pub const PROTECTION: &str = "NOM 690-8 / 210-20";
    /// Commercial DC breaker ratings
    pub const DC_BREAKERS: &str = "DC breaker ratings";
    /// Commercial AC breaker ratings
    pub const AC_BREAKERS: &str = "AC breaker ratings";
    /// Commercial wire-mesh tray widths (DC)
    pub const DC_TRAY: &str = "DC tray widths";
    /// Commercial wire-mesh tray widths (AC)
    pub const AC_TRAY: &str = "AC tray widths";
}

/// Voc correction applies only below this ambient temperature
const VOLTAGE_CORRECTION_CEILING_C: f64 = 25.0;

static NOM_001: Lazy<CodeTables> =
    Lazy::new(|| CodeTables::nom_001().expect("built-in NOM tables satisfy table invariants"));

/// Complete set of code tables consumed by the sizing stages.
#[derive(Debug, Clone, Serialize)]
pub struct CodeTables {
    /// Standard DC breaker ratings (A)
    pub dc_breakers: ThresholdTable<u32>,
    /// Standard AC breaker ratings (A)
    pub ac_breakers: ThresholdTable<u32>,
    /// Ambient temperature → ampacity factor
    pub temperature_derating: DerationTable,
    /// Current-carrying conductors in raceway → ampacity factor
    pub grouping_derating: DerationTable,
    /// Protection rating → grounding conductor gauge
    pub grounding: ThresholdTable<String>,
    /// 40 % fill allowance (mm²) → IMC trade size
    pub conduit_fill: ThresholdTable<String>,
    /// Commercial tray widths for DC runs (mm)
    pub dc_tray_widths: ThresholdTable<u32>,
    /// Commercial tray widths for AC runs (mm)
    pub ac_tray_widths: ThresholdTable<u32>,
    /// Range lower bound (°C) → Voc correction factor
    pub voltage_correction: ThresholdTable<f64>,
}

impl CodeTables {
    /// Shared NOM-001-SEDE table set, built on first use.
    pub fn standard() -> &'static CodeTables {
        &NOM_001
    }

    /// Build the NOM-001-SEDE table set.
    pub fn nom_001() -> SizingResult<Self> {
        Ok(CodeTables {
            dc_breakers: breaker_table(nom_ref::DC_BREAKERS, &[10, 15, 20, 25, 30, 32, 40, 50, 63])?,
            ac_breakers: breaker_table(
                nom_ref::AC_BREAKERS,
                &[15, 20, 30, 40, 50, 60, 70, 80, 100, 125, 150, 175, 200, 225, 250, 400],
            )?,
            // The 1.04 uplift row below 30 °C is omitted: factors are capped at 1.00
            temperature_derating: DerationTable::derating(
                nom_ref::TEMPERATURE,
                vec![
                    (30.0, 1.00),
                    (35.0, 0.96),
                    (40.0, 0.91),
                    (45.0, 0.87),
                    (50.0, 0.82),
                    (55.0, 0.76),
                    (60.0, 0.71),
                ],
                Overflow::Sentinel {
                    key: 999.0,
                    value: 0.41,
                },
            )?,
            grouping_derating: DerationTable::derating(
                nom_ref::GROUPING,
                vec![
                    (6.0, 0.80),
                    (9.0, 0.70),
                    (20.0, 0.50),
                    (30.0, 0.45),
                    (40.0, 0.40),
                    (999.0, 0.35),
                ],
                Overflow::UseLast,
            )?,
            grounding: ThresholdTable::new(
                nom_ref::GROUNDING,
                vec![
                    (15.0, "14 AWG".to_string()),
                    (20.0, "12 AWG".to_string()),
                    (60.0, "10 AWG".to_string()),
                    (100.0, "8 AWG".to_string()),
                    (200.0, "6 AWG".to_string()),
                    (300.0, "4 AWG".to_string()),
                    (400.0, "2 AWG".to_string()),
                    (500.0, "2 AWG".to_string()),
                ],
                Overflow::Sentinel {
                    key: 1200.0,
                    value: "3/0 AWG".to_string(),
                },
            )?,
            conduit_fill: ThresholdTable::new(
                nom_ref::CONDUIT_IMC_40,
                vec![
                    (89.0, "1/2\"".to_string()),
                    (151.0, "3/4\"".to_string()),
                    (248.0, "1\"".to_string()),
                    (425.0, "1 1/4\"".to_string()),
                    (573.0, "1 1/2\"".to_string()),
                    (937.0, "2\"".to_string()),
                    (1323.0, "2 1/2\"".to_string()),
                    (2046.0, "3\"".to_string()),
                    (3490.0, "4\"".to_string()),
                ],
                Overflow::UseLast,
            )?,
            dc_tray_widths: width_table(nom_ref::DC_TRAY, &[100, 150, 200, 300, 400, 500, 600])?,
            ac_tray_widths: width_table(nom_ref::AC_TRAY, &[100, 150, 200, 300, 400, 500])?,
            voltage_correction: ThresholdTable::new(
                nom_ref::VOLTAGE_CORRECTION,
                vec![
                    (-20.0, 1.20),
                    (-15.0, 1.18),
                    (-10.0, 1.14),
                    (-5.0, 1.12),
                    (0.0, 1.10),
                    (5.0, 1.08),
                    (10.0, 1.06),
                    (15.0, 1.04),
                    (20.0, 1.02),
                ],
                Overflow::UseLast,
            )?,
        })
    }

    /// Breaker ratings for a circuit class
    pub fn breakers(&self, circuit: CircuitClass) -> &ThresholdTable<u32> {
        match circuit {
            CircuitClass::Dc => &self.dc_breakers,
            CircuitClass::Ac => &self.ac_breakers,
        }
    }

    /// Tray widths for a circuit class
    pub fn tray_widths(&self, circuit: CircuitClass) -> &ThresholdTable<u32> {
        match circuit {
            CircuitClass::Dc => &self.dc_tray_widths,
            CircuitClass::Ac => &self.ac_tray_widths,
        }
    }

    /// Ampacity factor for the maximum design temperature
    pub fn temperature_factor(&self, max_design_temp_c: f64) -> f64 {
        // Sentinel policy always answers
        self.temperature_derating.factor(max_design_temp_c).unwrap_or(1.0)
    }

    /// Ampacity factor for a raceway bundle of current-carrying conductors
    pub fn grouping_factor(&self, current_carrying: u32) -> f64 {
        self.grouping_derating.factor(current_carrying as f64).unwrap_or(1.0)
    }

    /// Voc multiplier for the minimum design temperature (690-7).
    ///
    /// Rows are 5 °C bands keyed by their lower bound. At or above 25 °C no
    /// correction applies; below the coldest row the coldest factor is used.
    pub fn voltage_correction_factor(&self, min_design_temp_c: f64) -> f64 {
        if min_design_temp_c >= VOLTAGE_CORRECTION_CEILING_C {
            return 1.0;
        }
        match self.voltage_correction.floor(min_design_temp_c) {
            Some((_, factor)) => *factor,
            None => self.voltage_correction.entries()[0].1,
        }
    }
}

fn breaker_table(name: &str, ratings: &[u32]) -> SizingResult<ThresholdTable<u32>> {
    ThresholdTable::new(name, ratings.iter().map(|r| (*r as f64, *r)).collect(), Overflow::Fail)
}

fn width_table(name: &str, widths_mm: &[u32]) -> SizingResult<ThresholdTable<u32>> {
    ThresholdTable::new(name, widths_mm.iter().map(|w| (*w as f64, *w)).collect(), Overflow::UseLast)
}
