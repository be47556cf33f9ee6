//! # Protection Selection
//!
//! Overcurrent protection is sized for continuous duty:
//!
//! ```text
//! I_design = I_operating × multiplier
//! rating   = min { r ∈ standard ratings : r ≥ I_design }
//! ```
//!
//! DC uses panel Isc × 1.56 (1.25 continuous × 1.25 irradiance); AC uses the
//! inverter's maximum output current × 1.25. A design current above every
//! listed rating means the circuit needs non-standard equipment and fails
//! with `NoStandardProtection`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CircuitClass, SizingError, SizingResult};
use crate::tables::ThresholdTable;

/// Selected breaker for a circuit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectionSelection {
    /// Operating current × multiplier (A)
    pub design_current_a: f64,
    /// Standard rating (A)
    pub rating_a: u32,
}

/// Continuous-duty design current
pub fn design_current(operating_current_a: f64, multiplier: f64) -> f64 {
    operating_current_a * multiplier
}

/// Pick the smallest standard rating at or above the design current.
///
/// # Example
///
/// ```rust
/// use pv_core::calculations::protection::select_protection;
/// use pv_core::code_tables::CodeTables;
/// use pv_core::errors::CircuitClass;
///
/// let tables = CodeTables::standard();
/// let sel = select_protection(CircuitClass::Dc, 11.0, 1.56, &tables.dc_breakers).unwrap();
/// assert_eq!(sel.rating_a, 20);
/// ```
pub fn select_protection(
    circuit: CircuitClass,
    operating_current_a: f64,
    multiplier: f64,
    ratings: &ThresholdTable<u32>,
) -> SizingResult<ProtectionSelection> {
    if !operating_current_a.is_finite() || operating_current_a < 0.0 {
        return Err(SizingError::invalid_input(
            "operating_current_a",
            operating_current_a.to_string(),
            "Current must be zero or positive",
        ));
    }

    let design_current_a = design_current(operating_current_a, multiplier);

    match ratings.ceiling(design_current_a) {
        Some((_, rating)) => {
            debug!(%circuit, design_current_a, rating_a = *rating, "protection selected");
            Ok(ProtectionSelection {
                design_current_a,
                rating_a: *rating,
            })
        }
        None => Err(SizingError::NoStandardProtection {
            circuit,
            design_current_a,
            largest_rating_a: *ratings.last().1,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_tables::CodeTables;

    #[test]
    fn test_dc_scenario() {
        // Isc 11.0 A × 1.56 = 17.16 A → 20 A
        let tables = CodeTables::standard();
        let sel = select_protection(CircuitClass::Dc, 11.0, 1.56, &tables.dc_breakers).unwrap();
        assert!((sel.design_current_a - 17.16).abs() < 1e-9);
        assert_eq!(sel.rating_a, 20);
    }

    #[test]
    fn test_ac_scenario() {
        // 104 A × 1.25 = 130 A → 150 A
        let tables = CodeTables::standard();
        let sel = select_protection(CircuitClass::Ac, 104.0, 1.25, &tables.ac_breakers).unwrap();
        assert_eq!(sel.design_current_a, 130.0);
        assert_eq!(sel.rating_a, 150);
    }

    #[test]
    fn test_exact_rating_is_selected() {
        let tables = CodeTables::standard();
        let sel = select_protection(CircuitClass::Dc, 32.0, 1.0, &tables.dc_breakers).unwrap();
        assert_eq!(sel.rating_a, 32);
    }

    #[test]
    fn test_selection_is_min_of_sufficient_ratings() {
        let tables = CodeTables::standard();
        let ratings: Vec<u32> = tables.dc_breakers.entries().iter().map(|(_, r)| *r).collect();
        let max = *ratings.iter().max().unwrap() as f64;

        let mut current = 0.0;
        while current <= 70.0 {
            let expected = ratings.iter().copied().filter(|r| *r as f64 >= current).min();
            let result = select_protection(CircuitClass::Dc, current, 1.0, &tables.dc_breakers);
            match expected {
                Some(r) => assert_eq!(result.unwrap().rating_a, r, "current {}", current),
                None => {
                    assert!(current > max);
                    assert!(matches!(result, Err(SizingError::NoStandardProtection { .. })));
                }
            }
            current += 0.25;
        }
    }

    #[test]
    fn test_exceeding_largest_rating() {
        let tables = CodeTables::standard();
        let err = select_protection(CircuitClass::Ac, 400.0, 1.25, &tables.ac_breakers).unwrap_err();
        match err {
            SizingError::NoStandardProtection {
                circuit,
                design_current_a,
                largest_rating_a,
            } => {
                assert_eq!(circuit, CircuitClass::Ac);
                assert_eq!(design_current_a, 500.0);
                assert_eq!(largest_rating_a, 400);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_negative_current_rejected() {
        let tables = CodeTables::standard();
        assert!(select_protection(CircuitClass::Dc, -1.0, 1.56, &tables.dc_breakers).is_err());
    }
}
