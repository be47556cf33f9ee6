//! # Sizing Configuration
//!
//! Engineering policy values and commercial rates that are not part of the
//! code tables. Every field has a default, so an empty TOML document is a
//! valid configuration.
//!
//! ## TOML Example
//!
//! ```toml
//! max_voltage_drop_pct = 3.0
//! routing_overflow = "flag"
//!
//! [margins]
//! contingency_pct = 5.0
//! commission_pct = 3.0
//! profit_pct = 18.0
//!
//! [labor]
//! panel_install_usd = 15.0
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CircuitClass, SizingError, SizingResult};
use crate::project::MountingType;

/// What to do when a bundle does not fit the largest conduit or tray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoutingOverflowPolicy {
    /// Use the largest size, mark the material as overflowed and warn
    #[default]
    Flag,
    /// Fail the request with `RoutingOverflow`
    Reject,
}

/// Percentages stacked on top of direct cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginConfig {
    /// Applied to direct cost
    pub contingency_pct: f64,
    /// Applied to subtotal after fixed cost and contingency
    pub commission_pct: f64,
    /// Applied to subtotal after commission
    pub profit_pct: f64,
}

impl Default for MarginConfig {
    fn default() -> Self {
        MarginConfig {
            contingency_pct: 5.0,
            commission_pct: 3.0,
            profit_pct: 18.0,
        }
    }
}

/// Installation labor rates (USD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaborRates {
    pub panel_install_usd: f64,
    pub inverter_install_usd: f64,
    /// Per metre pulled: DC conductor metres plus AC route metres
    pub cable_pull_usd_per_m: f64,
}

impl Default for LaborRates {
    fn default() -> Self {
        LaborRates {
            panel_install_usd: 15.0,
            inverter_install_usd: 250.0,
            cable_pull_usd_per_m: 2.5,
        }
    }
}

/// Racking cost per installed watt, by mounting type (USD/W)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureRates {
    pub coplanar: f64,
    pub fix_tilt: f64,
    pub ground_mount: f64,
    pub carport: f64,
}

impl Default for StructureRates {
    fn default() -> Self {
        StructureRates {
            coplanar: 0.03,
            fix_tilt: 0.05,
            ground_mount: 0.08,
            carport: 0.12,
        }
    }
}

impl StructureRates {
    /// TOML key of the rate for a mounting type
    pub fn key(mounting: MountingType) -> &'static str {
        match mounting {
            MountingType::Coplanar => "structure.coplanar",
            MountingType::FixTilt => "structure.fix_tilt",
            MountingType::GroundMount => "structure.ground_mount",
            MountingType::Carport => "structure.carport",
        }
    }

    pub fn usd_per_watt(&self, mounting: MountingType) -> f64 {
        match mounting {
            MountingType::Coplanar => self.coplanar,
            MountingType::FixTilt => self.fix_tilt,
            MountingType::GroundMount => self.ground_mount,
            MountingType::Carport => self.carport,
        }
    }
}

/// Complete sizing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Multiplier on panel Isc for DC protection (1.25 continuous × 1.25 irradiance)
    pub dc_protection_multiplier: f64,

    /// Multiplier on inverter output current for AC protection (continuous duty)
    pub ac_protection_multiplier: f64,

    /// A gauge is accepted when its drop is strictly below this (%)
    pub max_voltage_drop_pct: f64,

    /// Spacing between trefoil bundles, in conductor diameters
    pub trefoil_spacing_factor: f64,

    /// DC ground diameter estimate when its gauge is not in the DC catalog
    pub dc_ground_diameter_ratio: f64,

    /// AC ground diameter estimate when its gauge is not in the AC catalog
    pub ac_ground_diameter_ratio: f64,

    pub routing_overflow: RoutingOverflowPolicy,

    pub margins: MarginConfig,

    pub labor: LaborRates,

    pub structure: StructureRates,
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig {
            dc_protection_multiplier: 1.56,
            ac_protection_multiplier: 1.25,
            max_voltage_drop_pct: 3.0,
            trefoil_spacing_factor: 2.15,
            dc_ground_diameter_ratio: 0.8,
            ac_ground_diameter_ratio: 0.7,
            routing_overflow: RoutingOverflowPolicy::Flag,
            margins: MarginConfig::default(),
            labor: LaborRates::default(),
            structure: StructureRates::default(),
        }
    }
}

impl SizingConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> SizingResult<Self> {
        let config: SizingConfig = toml::from_str(text).map_err(|e| SizingError::SerializationError {
            reason: format!("Invalid sizing config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Protection multiplier for a circuit class
    pub fn protection_multiplier(&self, circuit: CircuitClass) -> f64 {
        match circuit {
            CircuitClass::Dc => self.dc_protection_multiplier,
            CircuitClass::Ac => self.ac_protection_multiplier,
        }
    }

    /// Ground diameter ratio for a circuit class
    pub fn ground_diameter_ratio(&self, circuit: CircuitClass) -> f64 {
        match circuit {
            CircuitClass::Dc => self.dc_ground_diameter_ratio,
            CircuitClass::Ac => self.ac_ground_diameter_ratio,
        }
    }

    /// Reject values that would make the sizing math meaningless.
    pub fn validate(&self) -> SizingResult<()> {
        let positive = [
            ("dc_protection_multiplier", self.dc_protection_multiplier),
            ("ac_protection_multiplier", self.ac_protection_multiplier),
            ("max_voltage_drop_pct", self.max_voltage_drop_pct),
            ("trefoil_spacing_factor", self.trefoil_spacing_factor),
            ("dc_ground_diameter_ratio", self.dc_ground_diameter_ratio),
            ("ac_ground_diameter_ratio", self.ac_ground_diameter_ratio),
        ];
        for (key, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(SizingError::config(key, format!("must be positive, got {}", value)));
            }
        }

        let rates = [
            ("margins.contingency_pct", self.margins.contingency_pct),
            ("margins.commission_pct", self.margins.commission_pct),
            ("margins.profit_pct", self.margins.profit_pct),
            ("labor.panel_install_usd", self.labor.panel_install_usd),
            ("labor.inverter_install_usd", self.labor.inverter_install_usd),
            ("labor.cable_pull_usd_per_m", self.labor.cable_pull_usd_per_m),
        ];
        let structure = MountingType::ALL
            .iter()
            .map(|m| (StructureRates::key(*m), self.structure.usd_per_watt(*m)));
        for (key, value) in rates.into_iter().chain(structure) {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SizingError::config(key, format!("must be zero or positive, got {}", value)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SizingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.protection_multiplier(CircuitClass::Dc), 1.56);
        assert_eq!(config.protection_multiplier(CircuitClass::Ac), 1.25);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = SizingConfig::from_toml_str("").unwrap();
        assert_eq!(config, SizingConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let text = r#"
            max_voltage_drop_pct = 2.0
            routing_overflow = "reject"

            [margins]
            profit_pct = 25.0
        "#;
        let config = SizingConfig::from_toml_str(text).unwrap();
        assert_eq!(config.max_voltage_drop_pct, 2.0);
        assert_eq!(config.routing_overflow, RoutingOverflowPolicy::Reject);
        assert_eq!(config.margins.profit_pct, 25.0);
        // Untouched fields in the same table keep their defaults
        assert_eq!(config.margins.contingency_pct, 5.0);
    }

    #[test]
    fn test_rejects_negative_margin() {
        let err = SizingConfig::from_toml_str("[margins]\ncommission_pct = -1.0\n").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_rejects_negative_structure_rate() {
        let mut config = SizingConfig::default();
        config.structure.carport = -0.01;
        match config.validate().unwrap_err() {
            SizingError::ConfigError { key, .. } => assert_eq!(key, "structure.carport"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = SizingConfig::from_toml_str("max_voltage_drop_pct = \"three\"").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_structure_rates() {
        let rates = StructureRates::default();
        assert_eq!(rates.usd_per_watt(MountingType::Carport), 0.12);
        assert_eq!(rates.usd_per_watt(MountingType::Coplanar), 0.03);
    }
}
