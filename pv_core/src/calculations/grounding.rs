//! # Grounding Conductor Selection
//!
//! Equipment grounding conductor per NOM 250-122: the first table breakpoint
//! at or above the protection rating decides the gauge. Ratings beyond the
//! table body resolve to the sentinel breakpoint, the largest grounding
//! conductor the table knows about.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{SizingError, SizingResult};
use crate::tables::ThresholdTable;

/// Selected grounding conductor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingSelection {
    /// Gauge designation, e.g. "10 AWG"
    pub gauge: String,
    /// Table breakpoint that produced the gauge (A)
    pub breakpoint_a: f64,
    /// True when the rating exceeded the table body and the sentinel answered
    pub sentinel: bool,
}

/// Look up the grounding conductor for a protection rating.
pub fn select_grounding(protection_a: u32, table: &ThresholdTable<String>) -> SizingResult<GroundingSelection> {
    let selection = table.select(protection_a as f64).ok_or_else(|| {
        SizingError::invalid_table(
            table.name(),
            format!("{} A exceeds every breakpoint and the table has no sentinel", protection_a),
        )
    })?;

    if selection.overflowed {
        warn!(
            protection_a,
            gauge = %selection.value,
            "protection exceeds grounding table, using sentinel breakpoint"
        );
    } else {
        debug!(protection_a, gauge = %selection.value, "grounding selected");
    }

    Ok(GroundingSelection {
        gauge: selection.value,
        breakpoint_a: selection.key,
        sentinel: selection.overflowed,
    })
}
