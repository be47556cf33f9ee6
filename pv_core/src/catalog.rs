//! # Component & Price Catalog
//!
//! The read-only data store the sizing stages consume. A [`Catalog`] is built
//! once (typically from a JSON document via [`crate::file_io::load_catalog`])
//! and passed by reference to every request; nothing in the crate mutates it.
//!
//! Stages talk to the [`CatalogProvider`] trait rather than the concrete
//! type, so a service can back it with its own store.
//!
//! ## JSON Shape
//!
//! ```json
//! {
//!   "schema_version": "0.1.0",
//!   "panels": [ { "model": "P-550", "pmax_w": 550.0, "isc_a": 11.0, "imp_a": 10.5, "vmp_v": 41.0 } ],
//!   "inverters": [ { "model": "INV-50", "max_ac_current_a": 76.0, "ac_voltage_v": 480.0 } ],
//!   "dc_conductors": [ { "gauge": "10 AWG", "ampacity_a": 40.0, "ohm_per_km": 3.28, "outer_diameter_mm": 6.1 } ],
//!   "ac_conductors": [ { "gauge": "4 AWG", "ampacity_a": 95.0, "ohm_per_km": 0.86, "outer_diameter_mm": 8.9 } ],
//!   "prices": { "PANEL:P-550": 180.0 },
//!   "fixed_cost_curve": [[20.0, 1400.0], [40.0, 2300.0]]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::components::{ConductorSpec, InverterSpec, PanelSpec};
use crate::errors::{CircuitClass, SizingError, SizingResult};
use crate::tables::ScaleCostTable;

/// Current schema version for catalog documents
pub const CATALOG_SCHEMA_VERSION: &str = "0.1.0";

/// Read-only access to components, conductors, prices and the fixed-cost curve.
pub trait CatalogProvider: Send + Sync {
    /// PV module by model, or `UnknownCatalogEntry`
    fn panel(&self, model: &str) -> SizingResult<&PanelSpec>;

    /// Inverter by model, or `UnknownCatalogEntry`
    fn inverter(&self, model: &str) -> SizingResult<&InverterSpec>;

    /// Conductor candidates for a circuit class, ascending ampacity
    fn conductors(&self, class: CircuitClass) -> &[ConductorSpec];

    /// Unit price for a SKU; `None` when the SKU has no price
    fn price(&self, sku: &str) -> Option<f64>;

    /// Installed power (kW) → fixed engineering cost (USD)
    fn fixed_cost_curve(&self) -> &ScaleCostTable;

    /// Conductor of a given gauge within a class
    fn conductor(&self, class: CircuitClass, gauge: &str) -> Option<&ConductorSpec> {
        self.conductors(class).iter().find(|c| c.gauge == gauge)
    }
}

/// Stock-keeping unit keys used for price lookups.
pub mod sku {
    use crate::errors::CircuitClass;

    pub fn panel(model: &str) -> String {
        format!("PANEL:{}", model)
    }

    pub fn inverter(model: &str) -> String {
        format!("INVERTER:{}", model)
    }

    pub fn cable(class: CircuitClass, gauge: &str) -> String {
        format!("CABLE-{}:{}", class.display_name(), gauge)
    }

    pub fn ground(gauge: &str) -> String {
        format!("GROUND:{}", gauge)
    }

    pub fn breaker(class: CircuitClass, rating_a: u32) -> String {
        format!("BREAKER-{}:{}A", class.display_name(), rating_a)
    }

    pub fn conduit(trade_size: &str) -> String {
        format!("CONDUIT-IMC:{}", trade_size)
    }

    pub fn tray(width_mm: u32) -> String {
        format!("TRAY-MESH:{}mm", width_mm)
    }

    pub fn interconnection(point_code: &str) -> String {
        format!("INTERCONNECTION:{}", point_code)
    }
}

/// Serialized catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    /// Document schema version
    pub schema_version: String,

    pub panels: Vec<PanelSpec>,

    pub inverters: Vec<InverterSpec>,

    /// DC cable catalog (PV wire), ascending ampacity
    pub dc_conductors: Vec<ConductorSpec>,

    /// AC cable catalog, ascending ampacity
    pub ac_conductors: Vec<ConductorSpec>,

    /// SKU → unit price (USD)
    #[serde(default)]
    pub prices: BTreeMap<String, f64>,

    /// (kW, USD) fixed engineering cost breakpoints
    pub fixed_cost_curve: ScaleCostTable,
}

/// In-memory catalog, validated at construction.
#[derive(Debug, Clone)]
pub struct Catalog {
    panels: HashMap<String, PanelSpec>,
    inverters: HashMap<String, InverterSpec>,
    dc_conductors: Vec<ConductorSpec>,
    ac_conductors: Vec<ConductorSpec>,
    prices: HashMap<String, f64>,
    fixed_cost_curve: ScaleCostTable,
}

impl Catalog {
    /// Validate a catalog document and index it for lookups.
    ///
    /// Rejects duplicate models, invalid datasheet values, conductor lists
    /// that are empty or not ordered by ampacity, and negative prices.
    pub fn from_data(data: CatalogData) -> SizingResult<Self> {
        let mut panels = HashMap::with_capacity(data.panels.len());
        for panel in data.panels {
            panel.validate()?;
            let model = panel.model.clone();
            if panels.insert(model.clone(), panel).is_some() {
                return Err(SizingError::invalid_table("panels", format!("duplicate model '{}'", model)));
            }
        }

        let mut inverters = HashMap::with_capacity(data.inverters.len());
        for inverter in data.inverters {
            inverter.validate()?;
            let model = inverter.model.clone();
            if inverters.insert(model.clone(), inverter).is_some() {
                return Err(SizingError::invalid_table("inverters", format!("duplicate model '{}'", model)));
            }
        }

        validate_conductors("dc_conductors", &data.dc_conductors)?;
        validate_conductors("ac_conductors", &data.ac_conductors)?;

        if let Some((sku, price)) = data.prices.iter().find(|(_, p)| !p.is_finite() || **p < 0.0) {
            return Err(SizingError::invalid_table("prices", format!("price {} for '{}' is invalid", price, sku)));
        }

        Ok(Catalog {
            panels,
            inverters,
            dc_conductors: data.dc_conductors,
            ac_conductors: data.ac_conductors,
            prices: data.prices.into_iter().collect(),
            fixed_cost_curve: data.fixed_cost_curve,
        })
    }

    /// Number of priced SKUs
    pub fn price_count(&self) -> usize {
        self.prices.len()
    }
}

fn validate_conductors(table: &str, conductors: &[ConductorSpec]) -> SizingResult<()> {
    if conductors.is_empty() {
        return Err(SizingError::invalid_table(table, "no conductors listed"));
    }
    for c in conductors {
        if !(c.ampacity_a > 0.0 && c.ohm_per_km > 0.0 && c.outer_diameter_mm > 0.0) {
            return Err(SizingError::invalid_table(
                table,
                format!("'{}' needs positive ampacity, Ω/km and diameter", c.gauge),
            ));
        }
    }
    if let Some(w) = conductors.windows(2).find(|w| w[0].ampacity_a > w[1].ampacity_a) {
        return Err(SizingError::invalid_table(
            table,
            format!("'{}' listed after '{}' but has lower ampacity", w[1].gauge, w[0].gauge),
        ));
    }
    Ok(())
}

impl CatalogProvider for Catalog {
    fn panel(&self, model: &str) -> SizingResult<&PanelSpec> {
        self.panels
            .get(model)
            .ok_or_else(|| SizingError::unknown_entry("panel", model))
    }

    fn inverter(&self, model: &str) -> SizingResult<&InverterSpec> {
        self.inverters
            .get(model)
            .ok_or_else(|| SizingError::unknown_entry("inverter", model))
    }

    fn conductors(&self, class: CircuitClass) -> &[ConductorSpec] {
        match class {
            CircuitClass::Dc => &self.dc_conductors,
            CircuitClass::Ac => &self.ac_conductors,
        }
    }

    fn price(&self, sku: &str) -> Option<f64> {
        self.prices.get(sku).copied()
    }

    fn fixed_cost_curve(&self) -> &ScaleCostTable {
        &self.fixed_cost_curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    #[test]
    fn test_lookup_known_and_unknown() {
        let catalog = test_fixtures::catalog();
        assert_eq!(catalog.panel("P-550").unwrap().isc_a, 11.0);
        let err = catalog.inverter("NOPE").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CATALOG_ENTRY");
    }

    #[test]
    fn test_conductor_lookup() {
        let catalog = test_fixtures::catalog();
        assert_eq!(catalog.conductors(CircuitClass::Dc)[0].gauge, "12 AWG");
        assert!(catalog.conductor(CircuitClass::Ac, "3/0 AWG").is_some());
        assert!(catalog.conductor(CircuitClass::Ac, "12 AWG").is_none());
    }

    #[test]
    fn test_missing_price_is_none() {
        let catalog = test_fixtures::catalog();
        assert_eq!(catalog.price(&sku::panel("P-550")), Some(180.0));
        assert_eq!(catalog.price("CONDUIT-IMC:9\""), None);
    }

    #[test]
    fn test_rejects_unordered_conductors() {
        let mut data = test_fixtures::catalog_data();
        data.dc_conductors.swap(0, 1);
        let err = Catalog::from_data(data).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TABLE");
    }

    #[test]
    fn test_rejects_duplicate_models() {
        let mut data = test_fixtures::catalog_data();
        let dup = data.panels[0].clone();
        data.panels.push(dup);
        assert!(Catalog::from_data(data).is_err());
    }

    #[test]
    fn test_rejects_negative_price() {
        let mut data = test_fixtures::catalog_data();
        data.prices.insert("PANEL:P-550".to_string(), -1.0);
        assert!(Catalog::from_data(data).is_err());
    }

    #[test]
    fn test_sku_formats() {
        assert_eq!(sku::cable(CircuitClass::Dc, "10 AWG"), "CABLE-DC:10 AWG");
        assert_eq!(sku::breaker(CircuitClass::Ac, 150), "BREAKER-AC:150A");
        assert_eq!(sku::tray(200), "TRAY-MESH:200mm");
        assert_eq!(sku::conduit("3/4\""), "CONDUIT-IMC:3/4\"");
    }

    #[test]
    fn test_catalog_data_json() {
        let data = test_fixtures::catalog_data();
        let json = serde_json::to_string(&data).unwrap();
        let parsed: CatalogData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.panels.len(), data.panels.len());
        assert!(Catalog::from_data(parsed).is_ok());
    }
}
