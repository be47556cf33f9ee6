//! # File I/O Module
//!
//! Loading of the documents a sizing run consumes, and saving of reports:
//!
//! | Document        | Format | Loader                   |
//! |-----------------|--------|--------------------------|
//! | Catalog         | JSON   | [`load_catalog`]         |
//! | Sizing config   | TOML   | [`load_config`]          |
//! | Project input   | JSON   | [`load_project_input`]   |
//! | Climatology     | JSON   | [`load_climatology`]     |
//!
//! Reports are written with an atomic save: write to `.tmp`, sync, rename,
//! so a crash never leaves a half-written report behind.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pv_core::file_io::{load_catalog, load_config, load_project_input};
//! use std::path::Path;
//!
//! let catalog = load_catalog(Path::new("data/catalog.json"))?;
//! let config = load_config(Path::new("data/sizing.toml"))?;
//! let project = load_project_input(Path::new("data/project.json"))?;
//! # Ok::<(), pv_core::errors::SizingError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogData, CATALOG_SCHEMA_VERSION};
use crate::climate::MonthlyClimatology;
use crate::config::SizingConfig;
use crate::errors::{SizingError, SizingResult};
use crate::project::ProjectInput;

/// Load and validate a catalog document.
///
/// # Returns
///
/// * `Ok(Catalog)` - Indexed, validated catalog
/// * `Err(SizingError::VersionMismatch)` - Schema version is incompatible
/// * `Err(SizingError::InvalidTable)` - Catalog content violates an invariant
/// * `Err(SizingError::SerializationError)` - Invalid JSON
/// * `Err(SizingError::FileError)` - I/O error
pub fn load_catalog(path: &Path) -> SizingResult<Catalog> {
    let data = load_catalog_data(path)?;
    let catalog = Catalog::from_data(data)?;
    info!(path = %path.display(), prices = catalog.price_count(), "catalog loaded");
    Ok(catalog)
}

/// Load a catalog document without indexing it.
pub fn load_catalog_data(path: &Path) -> SizingResult<CatalogData> {
    let data: CatalogData = read_json(path)?;
    validate_version(&data.schema_version, CATALOG_SCHEMA_VERSION)?;
    Ok(data)
}

/// Load a TOML sizing configuration.
pub fn load_config(path: &Path) -> SizingResult<SizingConfig> {
    let text = read_text(path)?;
    SizingConfig::from_toml_str(&text).map_err(|e| match e {
        SizingError::SerializationError { reason } => SizingError::SerializationError {
            reason: format!("{} ({})", reason, path.display()),
        },
        other => other,
    })
}

/// Load and validate a project input document.
pub fn load_project_input(path: &Path) -> SizingResult<ProjectInput> {
    let project: ProjectInput = read_json(path)?;
    project.validate()?;
    debug!(path = %path.display(), name = %project.name, "project loaded");
    Ok(project)
}

/// Load a monthly climatology document (`t2m_min` / `t2m_max` arrays).
pub fn load_climatology(path: &Path) -> SizingResult<MonthlyClimatology> {
    read_json(path)
}

/// Save any serializable value as pretty JSON with an atomic write.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> SizingResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| SizingError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension("json.tmp");

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| SizingError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| SizingError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .sync_all()
        .map_err(|e| SizingError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        SizingError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

fn read_text(path: &Path) -> SizingResult<String> {
    let mut file =
        File::open(path).map_err(|e| SizingError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| SizingError::file_error("read", path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> SizingResult<T> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents).map_err(|e| SizingError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Validate that a document version is compatible with the supported schema.
fn validate_version(file_version: &str, expected: &str) -> SizingResult<()> {
    let mismatch = || SizingError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: expected.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = expected.split('.').filter_map(|p| p.parse().ok()).collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions a newer minor may carry breaking changes
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogProvider;
    use crate::test_fixtures;
    use std::env::temp_dir;
    use std::path::PathBuf;

    fn temp_path(name: &str, ext: &str) -> PathBuf {
        temp_dir().join(format!("pv_sizer_test_{}.{}", name, ext))
    }

    #[test]
    fn test_catalog_roundtrip() {
        let path = temp_path("catalog_roundtrip", "json");
        save_json(&test_fixtures::catalog_data(), &path).unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.panel("P-550").unwrap().vmp_v, 41.0);
        assert_eq!(catalog.price("PANEL:P-550"), Some(180.0));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_catalog_version_mismatch() {
        let path = temp_path("catalog_version", "json");
        let mut data = test_fixtures::catalog_data();
        data.schema_version = "1.0.0".to_string();
        save_json(&data, &path).unwrap();

        let err = load_catalog(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_path("atomic", "json");
        save_json(&test_fixtures::project(), &path).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_project_roundtrip() {
        let path = temp_path("project_roundtrip", "json");
        let project = test_fixtures::project();
        save_json(&project, &path).unwrap();

        assert_eq!(load_project_input(&path).unwrap(), project);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_project_rejected_on_load() {
        let path = temp_path("project_invalid", "json");
        let mut project = test_fixtures::project();
        project.ac.inverter_count = 0;
        save_json(&project, &path).unwrap();

        assert_eq!(load_project_input(&path).unwrap_err().error_code(), "INVALID_INPUT");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_config_toml() {
        let path = temp_path("config", "toml");
        fs::write(&path, "max_voltage_drop_pct = 2.5\n[labor]\ncable_pull_usd_per_m = 3.0\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.max_voltage_drop_pct, 2.5);
        assert_eq!(config.labor.cable_pull_usd_per_m, 3.0);
        assert_eq!(config.labor.panel_install_usd, 15.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_climatology() {
        let path = temp_path("climatology", "json");
        fs::write(&path, r#"{ "t2m_min": [4.1, 5.0, 8.2], "t2m_max": [25.0, 31.4, 29.9] }"#).unwrap();

        let climate = load_climatology(&path).unwrap().design_climate().unwrap();
        assert_eq!(climate.min_design_temp_c, 2.1);
        assert_eq!(climate.max_design_temp_c, 31.4);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let err = load_project_input(Path::new("/nonexistent/project.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_invalid_json() {
        let path = temp_path("bad_json", "json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_catalog(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version("0.1.0", "0.1.0").is_ok());
        assert!(validate_version("0.0.9", "0.1.0").is_ok());
        assert!(validate_version("0.2.0", "0.1.0").is_err());
        assert!(validate_version("1.0.0", "0.1.0").is_err());
        assert!(validate_version("garbage", "0.1.0").is_err());
    }
}
