//! # PV Sizer CLI
//!
//! Sizes one or more project files against a catalog and prints the
//! resulting reports as JSON on stdout. Logs go to stderr (`RUST_LOG`
//! controls the level, default INFO).
//!
//! ```text
//! pv_cli size --catalog data/catalog.json --min-temp 2 --max-temp 34 data/project.json
//! pv_cli size --catalog data/catalog.json --climatology site.json --summary a.json b.json
//! pv_cli tables
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use pv_core::calculations::SizingContext;
use pv_core::climate::{ClimateProvider, DesignClimate, StaticClimate};
use pv_core::code_tables::CodeTables;
use pv_core::config::SizingConfig;
use pv_core::errors::{SizingError, SizingResult};
use pv_core::file_io::{load_catalog, load_climatology, load_config, load_project_input, save_json};
use pv_core::report::{size_projects, ProjectReport};
use pv_core::ProjectInput;

#[derive(Parser)]
#[command(name = "pv_cli", version, about = "PV circuit sizing and costing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Size and cost project files
    Size(SizeArgs),
    /// Print the built-in NOM-001-SEDE tables as JSON
    Tables,
}

#[derive(Args)]
struct SizeArgs {
    /// Catalog JSON (components, conductors, prices, fixed-cost curve)
    #[arg(long)]
    catalog: PathBuf,

    /// Sizing configuration TOML; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum design temperature (°C)
    #[arg(long, allow_hyphen_values = true, requires = "max_temp", conflicts_with = "climatology")]
    min_temp: Option<f64>,

    /// Maximum design temperature (°C)
    #[arg(long, allow_hyphen_values = true, requires = "min_temp")]
    max_temp: Option<f64>,

    /// Monthly climatology JSON (`t2m_min` / `t2m_max`) instead of explicit temperatures
    #[arg(long)]
    climatology: Option<PathBuf>,

    /// Project input files
    #[arg(required = true)]
    projects: Vec<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,

    /// Print a human-readable summary to stderr as well
    #[arg(long)]
    summary: bool,

    /// Also write each report to `<dir>/<project file stem>.report.json`
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

/// One entry of the JSON output array
#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome<'a> {
    Report(&'a ProjectReport),
    Error { file: String, error: &'a SizingError },
}

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Size(args) => run_size(&args),
        Command::Tables => print_json(CodeTables::standard(), true).map(|_| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(code = e.error_code(), "{}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!("{}", json);
            }
            ExitCode::from(2)
        }
    }
}

/// Returns Ok(false) when at least one project failed to size
fn run_size(args: &SizeArgs) -> SizingResult<bool> {
    info!("pv_cli v{}", env!("CARGO_PKG_VERSION"));

    let catalog = load_catalog(&args.catalog)?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SizingConfig::default(),
    };
    let climate = resolve_climate(args)?;
    let ctx = SizingContext::with_standard_tables(&catalog, &config);

    // Inputs that fail to load are reported alongside sizing failures
    let mut loaded: Vec<(usize, ProjectInput)> = Vec::new();
    let mut load_errors: Vec<(usize, SizingError)> = Vec::new();
    for (i, path) in args.projects.iter().enumerate() {
        match load_project_input(path) {
            Ok(project) => loaded.push((i, project)),
            Err(e) => load_errors.push((i, e)),
        }
    }

    let inputs: Vec<ProjectInput> = loaded.iter().map(|(_, p)| p.clone()).collect();
    let sized = size_projects(&ctx, &inputs, climate.as_ref());

    let mut results: Vec<(usize, SizingResult<ProjectReport>)> = loaded
        .iter()
        .map(|(i, _)| *i)
        .zip(sized)
        .chain(load_errors.into_iter().map(|(i, e)| (i, Err(e))))
        .collect();
    results.sort_by_key(|(i, _)| *i);

    let mut all_ok = true;
    let mut outcomes = Vec::with_capacity(results.len());
    for (i, result) in &results {
        let path = &args.projects[*i];
        match result {
            Ok(report) => {
                if args.summary {
                    print_summary(report);
                }
                if let Some(dir) = &args.output_dir {
                    save_json(report, &report_path(dir, path))?;
                }
                outcomes.push(Outcome::Report(report));
            }
            Err(e) => {
                all_ok = false;
                error!(file = %path.display(), code = e.error_code(), "{}", e);
                outcomes.push(Outcome::Error {
                    file: path.display().to_string(),
                    error: e,
                });
            }
        }
    }

    print_json(&outcomes, args.pretty)?;
    Ok(all_ok)
}

fn resolve_climate(args: &SizeArgs) -> SizingResult<Box<dyn ClimateProvider>> {
    if let Some(path) = &args.climatology {
        return Ok(Box::new(load_climatology(path)?));
    }
    match (args.min_temp, args.max_temp) {
        (Some(min), Some(max)) => Ok(Box::new(StaticClimate(DesignClimate::new(min, max)?))),
        _ => Err(SizingError::config(
            "climate",
            "pass --min-temp and --max-temp, or --climatology",
        )),
    }
}

fn report_path(dir: &Path, project_path: &Path) -> PathBuf {
    let stem = project_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    dir.join(format!("{}.report.json", stem))
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> SizingResult<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| SizingError::SerializationError { reason: e.to_string() })?;
    println!("{}", json);
    Ok(())
}

fn print_summary(report: &ProjectReport) {
    let dc = &report.dc.sizing;
    let ac = &report.ac.sizing;
    let cost = &report.cost.summary;

    eprintln!("═══════════════════════════════════════");
    eprintln!("  {}", report.header.project);
    eprintln!("═══════════════════════════════════════");
    eprintln!(
        "Climate:  {:.1} °C min / {:.1} °C max",
        report.climate.min_design_temp_c, report.climate.max_design_temp_c
    );
    eprintln!(
        "Array:    {} × {} W = {:.2} kW",
        report.dc.panel_count,
        report.dc.panel_model,
        report.dc.installed_power.value()
    );
    eprintln!();
    eprintln!("DC ({} strings):", report.dc.string_count);
    eprintln!("  Protection: {} A", dc.protection_a);
    eprintln!("  Conductor:  {} (Vdrop {:.2}%)", dc.gauge(), dc.voltage_drop_pct());
    eprintln!("  Ground:     {}", dc.grounding.gauge);
    for m in &dc.routing {
        eprintln!("  Routing:    {} {} × {:.1} m", m.label, m.specification, m.length_m);
    }
    eprintln!();
    eprintln!("AC ({} inverter(s)):", report.ac.inverter_count);
    eprintln!("  Protection: {} A", ac.protection_a);
    eprintln!("  Conductor:  {} (Vdrop {:.2}%)", ac.gauge(), ac.voltage_drop_pct());
    eprintln!("  Ground:     {}", ac.grounding.gauge);
    for m in &ac.routing {
        eprintln!("  Routing:    {} {} × {:.1} m", m.label, m.specification, m.length_m);
    }
    eprintln!();
    eprintln!("Cost:");
    eprintln!("  Direct:     {:>12.2} USD", cost.direct_usd);
    eprintln!("  Fixed:      {:>12.2} USD", cost.fixed_usd);
    eprintln!("  CAPEX:      {:>12.2} USD ({:.3} USD/W)", cost.capex_usd, cost.usd_per_watt);
    if !report.cost.unpriced_skus.is_empty() {
        eprintln!("  Unpriced:   {}", report.cost.unpriced_skus.join(", "));
    }
    for alert in report.warnings() {
        eprintln!("  [WARN] {}: {}", alert.code, alert.message);
    }
    eprintln!("═══════════════════════════════════════");
}
