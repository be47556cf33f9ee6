//! # Error Types
//!
//! Structured error types for pv_core. Every variant carries enough context
//! for a caller (HTTP layer, CLI, LLM agent) to decide how to present it
//! without parsing message strings.
//!
//! ## Taxonomy
//!
//! | Variant                 | Meaning                                         |
//! |-------------------------|-------------------------------------------------|
//! | `InvalidInput`          | Malformed or out-of-range input                 |
//! | `NoStandardProtection`  | Design current exceeds the largest breaker      |
//! | `NoSuitableConductor`   | No gauge meets both ampacity and voltage drop   |
//! | `UnknownCatalogEntry`   | Referenced model or SKU not in the catalog      |
//! | `RoutingOverflow`       | Bundle exceeds the largest conduit/tray (strict)|
//! | `InvalidTable`          | A lookup table failed its ordering invariants   |
//!
//! A missing unit price is *not* an error: the cost rollup prices the line at
//! zero and reports the SKU instead.
//!
//! ## Example
//!
//! ```rust
//! use pv_core::errors::{SizingError, SizingResult};
//!
//! fn validate_length(length_m: f64) -> SizingResult<()> {
//!     if length_m < 0.0 {
//!         return Err(SizingError::invalid_input(
//!             "length_m",
//!             length_m.to_string(),
//!             "Length cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pv_core operations
pub type SizingResult<T> = Result<T, SizingError>;

/// Which circuit a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitClass {
    /// Panel strings to inverter
    Dc,
    /// Inverter to interconnection point
    Ac,
}

impl CircuitClass {
    pub fn display_name(&self) -> &'static str {
        match self {
            CircuitClass::Dc => "DC",
            CircuitClass::Ac => "AC",
        }
    }
}

impl std::fmt::Display for CircuitClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Why the conductor search ran out of candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductorFailure {
    /// Every candidate's corrected ampacity was below the protection rating
    CurrentTooHigh,
    /// Some candidates carried the current but all exceeded the drop limit
    DistanceTooLong,
}

impl ConductorFailure {
    /// Remediation hint for the person running the design
    pub fn suggestion(&self) -> &'static str {
        match self {
            ConductorFailure::CurrentTooHigh => {
                "Route the circuit in tray, split the circuit, or reduce the inverter size"
            }
            ConductorFailure::DistanceTooLong => {
                "Shorten the run, raise the system voltage, or add larger gauges to the catalog"
            }
        }
    }
}

impl std::fmt::Display for ConductorFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConductorFailure::CurrentTooHigh => write!(f, "current too high"),
            ConductorFailure::DistanceTooLong => write!(f, "distance too long"),
        }
    }
}

/// Structured error type for sizing operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum SizingError {
    /// An input value is invalid (out of range, inconsistent, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Design current is above every standard breaker rating
    #[error("{circuit} design current {design_current_a:.2} A exceeds the largest standard protection ({largest_rating_a} A)")]
    NoStandardProtection {
        circuit: CircuitClass,
        design_current_a: f64,
        largest_rating_a: u32,
    },

    /// No gauge in the candidate list satisfies ampacity and voltage drop
    #[error("No suitable {circuit} conductor: {failure} (protection {protection_a} A, best drop {best_drop_pct:?}%)")]
    NoSuitableConductor {
        circuit: CircuitClass,
        failure: ConductorFailure,
        protection_a: u32,
        /// Lowest drop among ampacity-sufficient candidates, if any
        best_drop_pct: Option<f64>,
    },

    /// Referenced model or SKU is not in the catalog
    #[error("Unknown {kind} in catalog: {key}")]
    UnknownCatalogEntry { kind: String, key: String },

    /// Conductor bundle does not fit the largest conduit or tray
    #[error("Routing overflow on segment {segment}: requires {required:.1}, largest available is {largest}")]
    RoutingOverflow {
        segment: usize,
        required: f64,
        largest: String,
    },

    /// A lookup table violates its construction invariants
    #[error("Invalid table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    /// Configuration value is out of range
    #[error("Configuration error: {key} - {reason}")]
    ConfigError { key: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Catalog schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl SizingError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        SizingError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownCatalogEntry error
    pub fn unknown_entry(kind: impl Into<String>, key: impl Into<String>) -> Self {
        SizingError::UnknownCatalogEntry {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Create an InvalidTable error
    pub fn invalid_table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        SizingError::InvalidTable {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConfigError
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        SizingError::ConfigError {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        SizingError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for failures caused by the submitted design (client errors),
    /// false for faults in catalogs, tables, configuration or the filesystem.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SizingError::InvalidInput { .. }
                | SizingError::NoStandardProtection { .. }
                | SizingError::NoSuitableConductor { .. }
                | SizingError::RoutingOverflow { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            SizingError::InvalidInput { .. } => "INVALID_INPUT",
            SizingError::NoStandardProtection { .. } => "NO_STANDARD_PROTECTION",
            SizingError::NoSuitableConductor { .. } => "NO_SUITABLE_CONDUCTOR",
            SizingError::UnknownCatalogEntry { .. } => "UNKNOWN_CATALOG_ENTRY",
            SizingError::RoutingOverflow { .. } => "ROUTING_OVERFLOW",
            SizingError::InvalidTable { .. } => "INVALID_TABLE",
            SizingError::ConfigError { .. } => "CONFIG_ERROR",
            SizingError::FileError { .. } => "FILE_ERROR",
            SizingError::SerializationError { .. } => "SERIALIZATION_ERROR",
            SizingError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}
