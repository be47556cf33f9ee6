//! # Project Report
//!
//! End-to-end sizing of a project: DC stage, AC stage, cost rollup, and a
//! report header. Only the header carries a timestamp; the engineering and
//! cost sections are a pure function of the inputs.
//!
//! Independent projects share nothing mutable, so [`size_projects`] fans
//! them out over a rayon pool when the `parallel` feature is enabled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::calculations::cost::{rollup_costs, CommercialOptions, CostReport};
use crate::calculations::{size_ac_circuit, size_dc_circuit, AcResult, Alert, AlertLevel, DcResult, SizingContext};
use crate::climate::{ClimateProvider, DesignClimate};
use crate::errors::SizingResult;
use crate::project::ProjectInput;

/// Overall outcome shown in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Sized and fully priced with no warnings
    Ok,
    /// Sized, but at least one warning was raised
    Warnings,
}

/// Report header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub project: String,
    pub coordinates: String,
    pub status: ReportStatus,
    pub generated_at: DateTime<Utc>,
    /// Crate version that produced the report
    pub engine_version: String,
}

/// Complete sizing and costing result for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub header: ReportHeader,
    pub climate: DesignClimate,
    pub dc: DcResult,
    pub ac: AcResult,
    pub cost: CostReport,
    /// DC, AC and cost alerts, in that order
    pub alerts: Vec<Alert>,
}

impl ProjectReport {
    pub fn warnings(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.level == AlertLevel::Warning)
    }
}

/// Size and cost one project for a resolved design climate.
pub fn size_project(ctx: &SizingContext, input: &ProjectInput, climate: &DesignClimate) -> SizingResult<ProjectReport> {
    let _span = info_span!("project", name = %input.name).entered();
    input.validate()?;

    let dc = size_dc_circuit(ctx, &input.components, &input.dc, climate)?;
    let ac = size_ac_circuit(ctx, &input.components, &input.ac, climate)?;
    let options = CommercialOptions {
        mounting: input.components.mounting,
        interconnection: input.interconnection,
    };
    let cost = rollup_costs(ctx, &options, &dc, &ac);

    let alerts: Vec<Alert> = dc
        .sizing
        .alerts
        .iter()
        .chain(&ac.sizing.alerts)
        .chain(&cost.alerts)
        .cloned()
        .collect();

    let status = if alerts.iter().any(|a| a.level == AlertLevel::Warning) {
        ReportStatus::Warnings
    } else {
        ReportStatus::Ok
    };

    info!(
        status = ?status,
        capex_usd = cost.summary.capex_usd,
        "project sized"
    );

    Ok(ProjectReport {
        header: ReportHeader {
            project: input.name.clone(),
            coordinates: input.coordinates.clone(),
            status,
            generated_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        climate: *climate,
        dc,
        ac,
        cost,
        alerts,
    })
}

/// Resolve the site climate through a provider, then size the project.
pub fn size_project_at_site(
    ctx: &SizingContext,
    input: &ProjectInput,
    climate: &dyn ClimateProvider,
) -> SizingResult<ProjectReport> {
    let site = input.site()?;
    let design = climate.resolve(&site)?;
    size_project(ctx, input, &design)
}

/// Size many independent projects, in parallel when the `parallel` feature is on.
///
/// Results keep the input order; one failing project does not affect the others.
pub fn size_projects(
    ctx: &SizingContext,
    inputs: &[ProjectInput],
    climate: &dyn ClimateProvider,
) -> Vec<SizingResult<ProjectReport>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        inputs
            .par_iter()
            .map(|input| size_project_at_site(ctx, input, climate))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        inputs
            .iter()
            .map(|input| size_project_at_site(ctx, input, climate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::climate::StaticClimate;
    use crate::config::SizingConfig;
    use crate::test_fixtures;

    #[test]
    fn test_fixture_report() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);

        let report = size_project(&ctx, &test_fixtures::project(), &test_fixtures::climate()).unwrap();
        assert_eq!(report.header.status, ReportStatus::Ok);
        assert_eq!(report.header.project, "Warehouse Roof");
        assert_eq!(report.alerts.len(), 2);
        assert_eq!(report.alerts[0].code, "DC-CALC-OK");
        assert_eq!(report.alerts[1].code, "AC-CALC-OK");
        assert_eq!(report.warnings().count(), 0);
    }

    #[test]
    fn test_warnings_set_status() {
        let mut data = test_fixtures::catalog_data();
        data.prices.remove("PANEL:P-550");
        let catalog = Catalog::from_data(data).unwrap();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);

        let report = size_project(&ctx, &test_fixtures::project(), &test_fixtures::climate()).unwrap();
        assert_eq!(report.header.status, ReportStatus::Warnings);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_sections_are_idempotent() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);
        let input = test_fixtures::project();

        let a = size_project(&ctx, &input, &test_fixtures::climate()).unwrap();
        let b = size_project(&ctx, &input, &test_fixtures::climate()).unwrap();
        assert_eq!(a.dc, b.dc);
        assert_eq!(a.ac, b.ac);
        assert_eq!(a.cost, b.cost);
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);

        let good = test_fixtures::project();
        let mut bad = test_fixtures::project();
        bad.name = "Unknown Panel".to_string();
        bad.components.panel_model = "P-000".to_string();
        let mut second = test_fixtures::project();
        second.name = "Second".to_string();

        let results = size_projects(&ctx, &[good, bad, second], &StaticClimate(test_fixtures::climate()));
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().error_code(), "UNKNOWN_CATALOG_ENTRY");
        assert_eq!(results[2].as_ref().unwrap().header.project, "Second");
    }

    #[test]
    fn test_report_serializes() {
        let catalog = test_fixtures::catalog();
        let config = SizingConfig::default();
        let ctx = SizingContext::with_standard_tables(&catalog, &config);

        let report = size_project(&ctx, &test_fixtures::project(), &test_fixtures::climate()).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let parsed: ProjectReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.cost.lines.len(), report.cost.lines.len());
        assert_eq!(parsed.dc.sizing.conductor.gauge, "12 AWG");
    }
}
