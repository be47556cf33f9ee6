//! # Unit Types
//!
//! Lightweight newtype wrappers for the few quantities where a mix-up is easy:
//! conductor geometry (mm vs mm²) and installed power (kW vs W).
//!
//! Everything else in the crate is an `f64` whose field name carries the unit
//! (`length_m`, `ampacity_a`, `ohm_per_km`), which keeps JSON payloads flat.
//!
//! ## Example
//!
//! ```rust
//! use pv_core::units::{Kilowatts, Millimeters, Watts};
//!
//! let od = Millimeters(10.0);
//! assert!((od.circle_area().0 - 78.54).abs() < 0.01);
//!
//! let power: Watts = Kilowatts(12.5).into();
//! assert_eq!(power.0, 12_500.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Geometry
// ============================================================================

/// Length in millimetres (conductor diameters, tray widths)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Area in square millimetres (conduit fill)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqMm(pub f64);

impl Millimeters {
    /// Cross-section of a round conductor with this outer diameter: π(d/2)²
    pub fn circle_area(self) -> SqMm {
        let r = self.0 / 2.0;
        SqMm(std::f64::consts::PI * r * r)
    }
}

// ============================================================================
// Power
// ============================================================================

/// Power in kilowatts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilowatts(pub f64);

/// Power in watts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watts(pub f64);

impl From<Kilowatts> for Watts {
    fn from(kw: Kilowatts) -> Self {
        Watts(kw.0 * 1000.0)
    }
}

impl From<Watts> for Kilowatts {
    fn from(w: Watts) -> Self {
        Kilowatts(w.0 / 1000.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Millimeters);
impl_arithmetic!(SqMm);
impl_arithmetic!(Kilowatts);
impl_arithmetic!(Watts);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_area() {
        let area = Millimeters(2.0).circle_area();
        assert!((area.0 - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_kilowatts_to_watts() {
        let w: Watts = Kilowatts(1.5).into();
        assert_eq!(w.0, 1500.0);
        let kw: Kilowatts = Watts(250.0).into();
        assert_eq!(kw.0, 0.25);
    }

    #[test]
    fn test_arithmetic() {
        let a = SqMm(10.0);
        let b = SqMm(4.0);
        assert_eq!((a + b).0, 14.0);
        assert_eq!((a - b).0, 6.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).value(), 5.0);
    }

    #[test]
    fn test_serialization() {
        let d = Millimeters(7.4);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "7.4");
    }
}
