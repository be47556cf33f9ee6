//! # Cost Rollup
//!
//! Turns the DC and AC engineering results into an itemized bill of
//! materials, prices it against the catalog, and stacks the commercial
//! margins.
//!
//! ## Margin stack
//!
//! ```text
//! direct     = materials + labor
//! subtotal_1 = direct + fixed + contingency% × direct
//! subtotal_2 = subtotal_1 + commission% × subtotal_1
//! capex      = subtotal_2 + profit% × subtotal_2
//! ```
//!
//! A SKU without a price never fails the rollup: its line is kept at zero,
//! flagged `priced: false`, and the SKU is reported.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::calculations::ac::AcResult;
use crate::calculations::dc::DcResult;
use crate::calculations::routing::RoutingMaterial;
use crate::calculations::{Alert, CircuitSizing, SizingContext};
use crate::catalog::{sku, CatalogProvider};
use crate::config::MarginConfig;
use crate::errors::CircuitClass;
use crate::project::{InterconnectionPoint, MountingType};
use crate::units::{Kilowatts, Watts};

/// BOM grouping used for subtotals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostCategory {
    Modules,
    Inverters,
    Structure,
    DcWiring,
    AcWiring,
    Grounding,
    Protection,
    Raceway,
    Interconnection,
    Labor,
}

impl CostCategory {
    pub const ALL: [CostCategory; 10] = [
        CostCategory::Modules,
        CostCategory::Inverters,
        CostCategory::Structure,
        CostCategory::DcWiring,
        CostCategory::AcWiring,
        CostCategory::Grounding,
        CostCategory::Protection,
        CostCategory::Raceway,
        CostCategory::Interconnection,
        CostCategory::Labor,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            CostCategory::Modules => "PV modules",
            CostCategory::Inverters => "Inverters",
            CostCategory::Structure => "Mounting structure",
            CostCategory::DcWiring => "DC wiring",
            CostCategory::AcWiring => "AC wiring",
            CostCategory::Grounding => "Grounding",
            CostCategory::Protection => "Protection",
            CostCategory::Raceway => "Conduit & tray",
            CostCategory::Interconnection => "Interconnection",
            CostCategory::Labor => "Labor",
        }
    }

    pub fn is_labor(&self) -> bool {
        matches!(self, CostCategory::Labor)
    }
}

/// One priced BOM line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub category: CostCategory,

    pub description: String,

    /// Catalog key; `None` for lines priced from configured rates
    #[serde(default)]
    pub sku: Option<String>,

    pub quantity: f64,

    /// "pc", "m" or "W"
    pub unit: String,

    pub unit_price_usd: f64,

    pub total_usd: f64,

    /// False when the SKU has no catalog price; the line is kept at zero
    pub priced: bool,
}

/// Total for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySubtotal {
    pub category: CostCategory,
    pub total_usd: f64,
}

/// Margin stack and CAPEX
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub materials_usd: f64,
    pub labor_usd: f64,
    /// Materials + labor
    pub direct_usd: f64,
    /// Engineering and permitting fixed cost from the scale curve
    pub fixed_usd: f64,
    pub contingency_usd: f64,
    pub commission_usd: f64,
    pub profit_usd: f64,
    pub capex_usd: f64,
    /// CAPEX per installed DC watt; zero for a zero-power project
    pub usd_per_watt: f64,
}

/// Complete cost rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub installed_power: Kilowatts,
    pub lines: Vec<BomLine>,
    /// Non-empty categories in [`CostCategory::ALL`] order
    pub subtotals: Vec<CategorySubtotal>,
    pub summary: CostSummary,
    /// SKUs with no catalog price, first occurrence order, no repeats
    pub unpriced_skus: Vec<String>,
    pub alerts: Vec<Alert>,
}

impl CostReport {
    pub fn is_fully_priced(&self) -> bool {
        self.unpriced_skus.is_empty()
    }

    pub fn subtotal(&self, category: CostCategory) -> f64 {
        self.subtotals
            .iter()
            .find(|s| s.category == category)
            .map_or(0.0, |s| s.total_usd)
    }
}

/// Commercial choices that affect cost but not engineering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommercialOptions {
    pub mounting: MountingType,
    pub interconnection: InterconnectionPoint,
}

// Accumulates BOM lines and remembers which SKUs had no price
struct BomBuilder<'a> {
    catalog: &'a dyn CatalogProvider,
    lines: Vec<BomLine>,
    unpriced: Vec<String>,
}

impl<'a> BomBuilder<'a> {
    fn new(catalog: &'a dyn CatalogProvider) -> Self {
        BomBuilder {
            catalog,
            lines: Vec::new(),
            unpriced: Vec::new(),
        }
    }

    fn catalog_line(&mut self, category: CostCategory, description: String, sku: String, quantity: f64, unit: &str) {
        let (unit_price_usd, priced) = match self.catalog.price(&sku) {
            Some(price) => (price, true),
            None => {
                warn!(%sku, "no catalog price, line kept at zero");
                if !self.unpriced.contains(&sku) {
                    self.unpriced.push(sku.clone());
                }
                (0.0, false)
            }
        };
        self.lines.push(BomLine {
            category,
            description,
            sku: Some(sku),
            quantity,
            unit: unit.to_string(),
            unit_price_usd,
            total_usd: quantity * unit_price_usd,
            priced,
        });
    }

    fn rated_line(&mut self, category: CostCategory, description: String, quantity: f64, unit: &str, rate: f64) {
        self.lines.push(BomLine {
            category,
            description,
            sku: None,
            quantity,
            unit: unit.to_string(),
            unit_price_usd: rate,
            total_usd: quantity * rate,
            priced: true,
        });
    }

    fn circuit_lines(&mut self, sizing: &CircuitSizing, circuits: u32) {
        let class = sizing.circuit;
        let wiring = match class {
            CircuitClass::Dc => CostCategory::DcWiring,
            CircuitClass::Ac => CostCategory::AcWiring,
        };

        self.catalog_line(
            wiring,
            format!("{} cable {}", class, sizing.conductor.gauge),
            sku::cable(class, &sizing.conductor.gauge),
            sizing.total_cable_m,
            "m",
        );
        self.catalog_line(
            CostCategory::Grounding,
            format!("{} grounding conductor {}", class, sizing.grounding.gauge),
            sku::ground(&sizing.grounding.gauge),
            sizing.ground_cable_m,
            "m",
        );
        self.catalog_line(
            CostCategory::Protection,
            format!("{} breaker {} A", class, sizing.protection_a),
            sku::breaker(class, sizing.protection_a),
            circuits as f64,
            "pc",
        );
        for material in &sizing.routing {
            self.routing_line(class, material);
        }
    }

    fn routing_line(&mut self, class: CircuitClass, material: &RoutingMaterial) {
        self.catalog_line(
            CostCategory::Raceway,
            format!("{} {} {}", class, material.label, material.specification),
            material.sku.clone(),
            material.length_m,
            "m",
        );
    }
}

/// Build, price and total the BOM for a sized project.
#[instrument(skip_all, fields(kw = dc.installed_power.value()))]
pub fn rollup_costs(ctx: &SizingContext, options: &CommercialOptions, dc: &DcResult, ac: &AcResult) -> CostReport {
    let config = ctx.config;
    let mut bom = BomBuilder::new(ctx.catalog);

    bom.catalog_line(
        CostCategory::Modules,
        format!("PV module {}", dc.panel_model),
        sku::panel(&dc.panel_model),
        dc.panel_count as f64,
        "pc",
    );
    bom.catalog_line(
        CostCategory::Inverters,
        format!("Inverter {}", ac.inverter_model),
        sku::inverter(&ac.inverter_model),
        ac.inverter_count as f64,
        "pc",
    );

    let installed_watts: Watts = dc.installed_power.into();
    bom.rated_line(
        CostCategory::Structure,
        format!("{} structure", options.mounting.display_name()),
        installed_watts.value(),
        "W",
        config.structure.usd_per_watt(options.mounting),
    );

    bom.circuit_lines(&dc.sizing, dc.string_count);
    bom.circuit_lines(&ac.sizing, ac.inverter_count);

    bom.catalog_line(
        CostCategory::Interconnection,
        options.interconnection.display_name().to_string(),
        sku::interconnection(options.interconnection.code()),
        1.0,
        "pc",
    );

    let labor = &config.labor;
    bom.rated_line(
        CostCategory::Labor,
        "Panel installation".to_string(),
        dc.panel_count as f64,
        "pc",
        labor.panel_install_usd,
    );
    bom.rated_line(
        CostCategory::Labor,
        "Inverter installation".to_string(),
        ac.inverter_count as f64,
        "pc",
        labor.inverter_install_usd,
    );
    // AC is pulled per raceway metre, the inverter circuits travel together
    bom.rated_line(
        CostCategory::Labor,
        "Cable pulling".to_string(),
        labor_cable_m(dc, ac),
        "m",
        labor.cable_pull_usd_per_m,
    );

    let BomBuilder { lines, unpriced, .. } = bom;

    let subtotals: Vec<CategorySubtotal> = CostCategory::ALL
        .iter()
        .filter(|c| lines.iter().any(|l| l.category == **c))
        .map(|c| CategorySubtotal {
            category: *c,
            total_usd: lines.iter().filter(|l| l.category == *c).map(|l| l.total_usd).sum(),
        })
        .collect();

    let labor_usd: f64 = lines.iter().filter(|l| l.category.is_labor()).map(|l| l.total_usd).sum();
    let materials_usd: f64 = lines.iter().filter(|l| !l.category.is_labor()).map(|l| l.total_usd).sum();
    let fixed_usd = ctx.catalog.fixed_cost_curve().cost_at(dc.installed_power);

    let summary = stack_margins(materials_usd, labor_usd, fixed_usd, &config.margins, installed_watts);

    let alerts = unpriced
        .iter()
        .map(|sku| Alert::warning("PRICE-MISSING", format!("No catalog price for {}; line costed at 0", sku)))
        .collect();

    info!(
        capex_usd = summary.capex_usd,
        usd_per_watt = summary.usd_per_watt,
        unpriced = unpriced.len(),
        "cost rollup complete"
    );

    CostReport {
        installed_power: dc.installed_power,
        lines,
        subtotals,
        summary,
        unpriced_skus: unpriced,
        alerts,
    }
}

/// Metres charged at the cable-pull rate: DC conductor metres plus AC route metres
pub fn labor_cable_m(dc: &DcResult, ac: &AcResult) -> f64 {
    dc.sizing.total_cable_m + ac.sizing.route_length_m
}

/// Apply the contingency → commission → profit stack.
///
/// # Example
///
/// ```rust
/// use pv_core::calculations::cost::stack_margins;
/// use pv_core::config::MarginConfig;
/// use pv_core::units::Watts;
///
/// let s = stack_margins(8000.0, 2000.0, 2000.0, &MarginConfig::default(), Watts(10_000.0));
/// assert!((s.capex_usd - 15192.5).abs() < 1e-9);
/// ```
pub fn stack_margins(
    materials_usd: f64,
    labor_usd: f64,
    fixed_usd: f64,
    margins: &MarginConfig,
    installed: Watts,
) -> CostSummary {
    let direct_usd = materials_usd + labor_usd;
    let contingency_usd = direct_usd * margins.contingency_pct / 100.0;
    let subtotal_1 = direct_usd + fixed_usd + contingency_usd;
    let commission_usd = subtotal_1 * margins.commission_pct / 100.0;
    let subtotal_2 = subtotal_1 + commission_usd;
    let profit_usd = subtotal_2 * margins.profit_pct / 100.0;
    let capex_usd = subtotal_2 + profit_usd;

    let usd_per_watt = if installed.value() > 0.0 {
        capex_usd / installed.value()
    } else {
        0.0
    };

    CostSummary {
        materials_usd,
        labor_usd,
        direct_usd,
        fixed_usd,
        contingency_usd,
        commission_usd,
        profit_usd,
        capex_usd,
        usd_per_watt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{size_ac_circuit, size_dc_circuit};
    use crate::catalog::Catalog;
    use crate::config::SizingConfig;
    use crate::test_fixtures;

    fn rollup_fixture(catalog: &Catalog, config: &SizingConfig) -> CostReport {
        let ctx = SizingContext::with_standard_tables(catalog, config);
        let project = test_fixtures::project();
        let climate = test_fixtures::climate();
        let dc = size_dc_circuit(&ctx, &project.components, &project.dc, &climate).unwrap();
        let ac = size_ac_circuit(&ctx, &project.components, &project.ac, &climate).unwrap();
        let options = CommercialOptions {
            mounting: project.components.mounting,
            interconnection: project.interconnection,
        };
        rollup_costs(&ctx, &options, &dc, &ac)
    }

    fn line<'r>(report: &'r CostReport, sku: &str) -> &'r BomLine {
        report
            .lines
            .iter()
            .find(|l| l.sku.as_deref() == Some(sku))
            .unwrap_or_else(|| panic!("no line for {}", sku))
    }

    #[test]
    fn test_quantities() {
        let report = rollup_fixture(&test_fixtures::catalog(), &SizingConfig::default());

        assert_eq!(line(&report, "PANEL:P-550").quantity, 60.0);
        assert_eq!(line(&report, "INVERTER:INV-50").quantity, 1.0);
        assert_eq!(line(&report, "CABLE-DC:12 AWG").quantity, 480.0);
        assert_eq!(line(&report, "GROUND:12 AWG").quantity, 60.0);
        assert_eq!(line(&report, "CABLE-AC:3/0 AWG").quantity, 200.0);
        assert_eq!(line(&report, "GROUND:6 AWG").quantity, 50.0);
        assert_eq!(line(&report, "BREAKER-DC:20A").quantity, 4.0);
        assert_eq!(line(&report, "BREAKER-AC:150A").quantity, 1.0);
        assert_eq!(line(&report, "TRAY-MESH:100mm").quantity, 40.0);
        assert_eq!(line(&report, "CONDUIT-IMC:1\"").quantity, 20.0);
        assert_eq!(line(&report, "CONDUIT-IMC:2\"").quantity, 50.0);
        assert_eq!(line(&report, "INTERCONNECTION:MAIN-PANEL").quantity, 1.0);
    }

    #[test]
    fn test_fully_priced_fixture() {
        let report = rollup_fixture(&test_fixtures::catalog(), &SizingConfig::default());
        assert!(report.is_fully_priced());
        assert!(report.alerts.is_empty());
        assert!(report.lines.iter().all(|l| l.priced));

        // 60 × 180
        assert_eq!(report.subtotal(CostCategory::Modules), 10_800.0);
        // 33 000 W × 0.03 (coplanar)
        assert!((report.subtotal(CostCategory::Structure) - 990.0).abs() < 1e-9);
        // 60 × 15 + 1 × 250 + (480 m DC + 50 m AC route) × 2.5
        assert!((report.subtotal(CostCategory::Labor) - 2475.0).abs() < 1e-9);
        // 33 kW between (20, 1400) and (40, 2300)
        assert!((report.summary.fixed_usd - 1985.0).abs() < 1e-9);
    }

    #[test]
    fn test_ac_cable_pull_charged_per_route_metre() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let mut project = test_fixtures::project();
        project.ac.inverter_count = 2;
        let climate = test_fixtures::climate();
        let dc = size_dc_circuit(&ctx, &project.components, &project.dc, &climate).unwrap();
        let ac = size_ac_circuit(&ctx, &project.components, &project.ac, &climate).unwrap();

        // 8 AC conductors over 50 m still count 50 m of pulling
        assert_eq!(ac.sizing.total_cable_m, 400.0);
        assert_eq!(labor_cable_m(&dc, &ac), 480.0 + 50.0);

        let options = CommercialOptions {
            mounting: project.components.mounting,
            interconnection: project.interconnection,
        };
        let report = rollup_costs(&ctx, &options, &dc, &ac);
        let pull = report
            .lines
            .iter()
            .find(|l| l.description == "Cable pulling")
            .unwrap();
        assert_eq!(pull.quantity, 530.0);
    }

    #[test]
    fn test_summary_is_consistent() {
        let report = rollup_fixture(&test_fixtures::catalog(), &SizingConfig::default());
        let s = &report.summary;
        let line_total: f64 = report.lines.iter().map(|l| l.total_usd).sum();
        let subtotal_total: f64 = report.subtotals.iter().map(|c| c.total_usd).sum();

        assert!((s.direct_usd - line_total).abs() < 1e-6);
        assert!((subtotal_total - line_total).abs() < 1e-6);
        assert!((s.usd_per_watt - s.capex_usd / 33_000.0).abs() < 1e-12);
        assert!(s.capex_usd > s.direct_usd + s.fixed_usd);
    }

    #[test]
    fn test_missing_price_degrades_softly() {
        let mut data = test_fixtures::catalog_data();
        data.prices.remove("CONDUIT-IMC:2\"");
        data.prices.remove("GROUND:12 AWG");
        let catalog = Catalog::from_data(data).unwrap();

        let report = rollup_fixture(&catalog, &SizingConfig::default());
        assert_eq!(report.unpriced_skus, vec!["GROUND:12 AWG".to_string(), "CONDUIT-IMC:2\"".to_string()]);
        assert_eq!(report.alerts.len(), 2);
        assert!(report.alerts.iter().all(|a| a.code == "PRICE-MISSING"));

        let conduit = line(&report, "CONDUIT-IMC:2\"");
        assert!(!conduit.priced);
        assert_eq!(conduit.total_usd, 0.0);
        assert_eq!(conduit.quantity, 50.0);
    }

    #[test]
    fn test_margin_stack_order() {
        // direct 10 000, fixed 2 000:
        // 10 000 + 2 000 + 500 = 12 500; × 1.03 = 12 875; × 1.18 = 15 192.5
        let s = stack_margins(8000.0, 2000.0, 2000.0, &MarginConfig::default(), Watts(10_000.0));
        assert_eq!(s.direct_usd, 10_000.0);
        assert!((s.contingency_usd - 500.0).abs() < 1e-9);
        assert!((s.commission_usd - 375.0).abs() < 1e-9);
        assert!((s.profit_usd - 2317.5).abs() < 1e-9);
        assert!((s.capex_usd - 15_192.5).abs() < 1e-9);
        assert!((s.usd_per_watt - 1.51925).abs() < 1e-9);
    }

    #[test]
    fn test_zero_power_has_no_usd_per_watt() {
        let s = stack_margins(100.0, 0.0, 0.0, &MarginConfig::default(), Watts(0.0));
        assert_eq!(s.usd_per_watt, 0.0);
    }

    #[test]
    fn test_rollup_is_deterministic() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        assert_eq!(rollup_fixture(&catalog, &config), rollup_fixture(&catalog, &config));
    }
}
