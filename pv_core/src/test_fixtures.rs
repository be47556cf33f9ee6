//! Shared fixtures for unit tests: a small catalog and a 33 kW rooftop project.

use std::collections::BTreeMap;

use crate::catalog::{Catalog, CatalogData, CATALOG_SCHEMA_VERSION};
use crate::climate::DesignClimate;
use crate::components::{ConductorSpec, InverterSpec, PanelSpec};
use crate::project::{
    AcDesign, ComponentSelection, DcDesign, InterconnectionPoint, MountingType, Placement, ProjectInput, RoutingKind,
    RoutingSegment, TrayMethod,
};
use crate::tables::ScaleCostTable;

fn conductor(gauge: &str, ampacity_a: f64, ohm_per_km: f64, outer_diameter_mm: f64) -> ConductorSpec {
    ConductorSpec {
        gauge: gauge.to_string(),
        ampacity_a,
        ohm_per_km,
        outer_diameter_mm,
    }
}

pub(crate) fn catalog_data() -> CatalogData {
    let prices: BTreeMap<String, f64> = [
        ("PANEL:P-550", 180.0),
        ("INVERTER:INV-50", 6500.0),
        ("INVERTER:INV-1PH", 1400.0),
        ("CABLE-DC:12 AWG", 1.2),
        ("CABLE-DC:10 AWG", 1.6),
        ("CABLE-AC:3/0 AWG", 14.5),
        ("CABLE-AC:1/0 AWG", 9.8),
        ("GROUND:12 AWG", 0.9),
        ("GROUND:6 AWG", 3.1),
        ("BREAKER-DC:20A", 12.0),
        ("BREAKER-AC:150A", 145.0),
        ("CONDUIT-IMC:1\"", 9.5),
        ("CONDUIT-IMC:2\"", 21.0),
        ("TRAY-MESH:100mm", 18.0),
        ("INTERCONNECTION:MAIN-PANEL", 850.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    CatalogData {
        schema_version: CATALOG_SCHEMA_VERSION.to_string(),
        panels: vec![PanelSpec {
            model: "P-550".to_string(),
            pmax_w: 550.0,
            isc_a: 11.0,
            imp_a: 10.5,
            vmp_v: 41.0,
            voc_v: Some(49.5),
        }],
        inverters: vec![
            InverterSpec {
                model: "INV-50".to_string(),
                max_ac_current_a: 104.0,
                ac_voltage_v: 480.0,
                phases: 3,
                max_dc_voltage_v: Some(1000.0),
            },
            InverterSpec {
                model: "INV-1PH".to_string(),
                max_ac_current_a: 32.0,
                ac_voltage_v: 240.0,
                phases: 1,
                max_dc_voltage_v: Some(600.0),
            },
        ],
        dc_conductors: vec![
            conductor("12 AWG", 30.0, 5.21, 5.5),
            conductor("10 AWG", 40.0, 3.28, 6.1),
            conductor("8 AWG", 55.0, 2.06, 7.4),
            conductor("6 AWG", 75.0, 1.30, 8.4),
            conductor("4 AWG", 95.0, 0.82, 9.6),
        ],
        ac_conductors: vec![
            conductor("4 AWG", 95.0, 0.86, 8.9),
            conductor("2 AWG", 130.0, 0.56, 10.2),
            conductor("1/0 AWG", 170.0, 0.36, 12.9),
            conductor("2/0 AWG", 195.0, 0.29, 14.0),
            conductor("3/0 AWG", 225.0, 0.24, 15.3),
            conductor("4/0 AWG", 260.0, 0.19, 16.8),
        ],
        prices,
        fixed_cost_curve: ScaleCostTable::new(vec![
            (20.0, 1400.0),
            (40.0, 2300.0),
            (60.0, 3200.0),
            (80.0, 4100.0),
            (100.0, 5000.0),
        ])
        .unwrap(),
    }
}

pub(crate) fn catalog() -> Catalog {
    Catalog::from_data(catalog_data()).unwrap()
}

/// 4 strings × 15 panels; DC 40 m tray + 20 m conduit; AC 50 m buried conduit
pub(crate) fn project() -> ProjectInput {
    ProjectInput {
        name: "Warehouse Roof".to_string(),
        coordinates: "20.6597, -103.3496".to_string(),
        components: ComponentSelection {
            panel_model: "P-550".to_string(),
            inverter_model: "INV-50".to_string(),
            mounting: MountingType::Coplanar,
        },
        dc: DcDesign {
            panels_per_string: 15,
            string_count: 4,
            segments: vec![
                RoutingSegment::new(RoutingKind::Tray, 40.0),
                RoutingSegment::new(RoutingKind::Conduit, 20.0),
            ],
            tray_method: TrayMethod::Linear,
        },
        ac: AcDesign {
            inverter_count: 1,
            segments: vec![RoutingSegment::new(RoutingKind::Conduit, 50.0).with_placement(Placement::Buried)],
            tray_method: TrayMethod::Trefoil,
        },
        interconnection: InterconnectionPoint::MainPanel,
    }
}

/// 2 °C coldest, 34 °C hottest
pub(crate) fn climate() -> DesignClimate {
    DesignClimate {
        min_design_temp_c: 2.0,
        max_design_temp_c: 34.0,
    }
}
