//! # pv_core - PV Circuit Sizing & Costing Engine
//!
//! `pv_core` sizes the electrical balance of system of a grid-tied PV plant
//! and prices it. Given panel and inverter models, string and inverter
//! topology, routing segments and a design climate, it selects protection,
//! conductors, grounding and raceways per NOM-001-SEDE, then produces an
//! itemized bill of materials with a commercial margin stack.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions of inputs plus a read-only catalog
//! - **JSON-First**: All request and result types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Explicit tables**: Every lookup table validates its order and names its
//!   overflow behaviour
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pv_core::calculations::SizingContext;
//! use pv_core::climate::DesignClimate;
//! use pv_core::config::SizingConfig;
//! use pv_core::file_io::{load_catalog, load_project_input};
//! use pv_core::report::size_project;
//! use std::path::Path;
//!
//! let catalog = load_catalog(Path::new("data/catalog.json"))?;
//! let config = SizingConfig::default();
//! let ctx = SizingContext::with_standard_tables(&catalog, &config);
//!
//! let project = load_project_input(Path::new("data/project.json"))?;
//! let climate = DesignClimate::new(2.0, 34.0)?;
//! let report = size_project(&ctx, &project, &climate)?;
//! println!("CAPEX: {:.2} USD", report.cost.summary.capex_usd);
//! # Ok::<(), pv_core::errors::SizingError>(())
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Protection, conductor, grounding, routing, DC/AC stages, cost rollup
//! - [`code_tables`] - NOM-001-SEDE tables
//! - [`tables`] - Threshold and scale lookup tables
//! - [`catalog`] - Component, conductor and price catalog
//! - [`components`] - Panel, inverter and conductor specifications
//! - [`project`] - Project input types
//! - [`climate`] - Site coordinates and design temperatures
//! - [`config`] - Sizing policy and commercial rates
//! - [`report`] - End-to-end project report
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - Document loading and atomic report saves

pub mod calculations;
pub mod catalog;
pub mod climate;
pub mod code_tables;
pub mod components;
pub mod config;
pub mod errors;
pub mod file_io;
pub mod project;
pub mod report;
pub mod tables;
pub mod units;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export commonly used types at crate root for convenience
pub use calculations::{Alert, AlertLevel, SizingContext};
pub use catalog::{Catalog, CatalogProvider};
pub use climate::{ClimateProvider, DesignClimate};
pub use config::SizingConfig;
pub use errors::{SizingError, SizingResult};
pub use project::ProjectInput;
pub use report::{size_project, size_projects, ProjectReport};
