//! # Lookup Tables
//!
//! Sorted, immutable tables used for threshold search and interpolation.
//!
//! ## Threshold search
//!
//! Every code table in this crate (breaker ratings, derating factors,
//! grounding sizes, conduit fill, tray widths) answers the same question:
//! *which is the first breakpoint at or above the query?* A query that lands
//! exactly on a breakpoint selects that breakpoint.
//!
//! ```text
//! keys:     15   20   60   100  200
//! query 60  -------------^            -> 60
//! query 61  ------------------^       -> 100
//! query 250 -> past the last key      -> Overflow policy
//! ```
//!
//! What happens past the last key is an explicit [`Overflow`] policy chosen
//! when the table is built, never an implicit default.
//!
//! ## Scale interpolation
//!
//! [`ScaleCostTable`] interpolates fixed cost against installed power.

use serde::{Deserialize, Serialize};

use crate::errors::{SizingError, SizingResult};
use crate::units::Kilowatts;

/// Behaviour when a query exceeds the last breakpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Overflow<V> {
    /// No entry applies; the caller decides how to fail
    Fail,
    /// Clamp to the last entry (flagged as overflowed)
    UseLast,
    /// A dedicated breakpoint beyond the table body
    Sentinel { key: f64, value: V },
}

/// A value chosen from a [`ThresholdTable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection<V> {
    /// Breakpoint that produced the value
    pub key: f64,
    /// Selected value
    pub value: V,
    /// True when the query exceeded the table body and the overflow policy answered
    pub overflowed: bool,
}

/// Ascending breakpoint table with "first key >= query" selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdTable<V> {
    name: String,
    entries: Vec<(f64, V)>,
    overflow: Overflow<V>,
}

/// Breakpoint → multiplicative factor in (0, 1]
pub type DerationTable = ThresholdTable<f64>;

impl<V: Clone> ThresholdTable<V> {
    /// Build a table, checking that keys are finite and strictly ascending.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pv_core::tables::{Overflow, ThresholdTable};
    ///
    /// let breakers = ThresholdTable::new(
    ///     "breakers",
    ///     vec![(15.0, 15u32), (20.0, 20), (30.0, 30)],
    ///     Overflow::Fail,
    /// ).unwrap();
    ///
    /// assert_eq!(breakers.select(17.2).unwrap().value, 20);
    /// assert!(breakers.select(31.0).is_none());
    /// ```
    pub fn new(name: impl Into<String>, entries: Vec<(f64, V)>, overflow: Overflow<V>) -> SizingResult<Self> {
        let name = name.into();
        if entries.is_empty() {
            return Err(SizingError::invalid_table(name, "table has no entries"));
        }
        if entries.iter().any(|(k, _)| !k.is_finite()) {
            return Err(SizingError::invalid_table(name, "breakpoints must be finite"));
        }
        if entries.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(SizingError::invalid_table(name, "breakpoints must be strictly ascending"));
        }
        if let Overflow::Sentinel { key, .. } = &overflow {
            let last = entries[entries.len() - 1].0;
            if *key <= last {
                return Err(SizingError::invalid_table(
                    name,
                    format!("sentinel breakpoint {} must lie beyond the last key {}", key, last),
                ));
            }
        }
        Ok(ThresholdTable {
            name,
            entries,
            overflow,
        })
    }

    /// Table name used in logs and errors
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries in ascending key order
    pub fn entries(&self) -> &[(f64, V)] {
        &self.entries
    }

    /// Overflow policy
    pub fn overflow(&self) -> &Overflow<V> {
        &self.overflow
    }

    /// Largest entry of the table body (sentinel excluded)
    pub fn last(&self) -> (f64, &V) {
        // Construction guarantees at least one entry
        let (k, v) = &self.entries[self.entries.len() - 1];
        (*k, v)
    }

    /// First entry whose key is >= `query`, ignoring the overflow policy.
    pub fn ceiling(&self, query: f64) -> Option<(f64, &V)> {
        let idx = self.entries.partition_point(|(k, _)| *k < query);
        self.entries.get(idx).map(|(k, v)| (*k, v))
    }

    /// Last entry whose key is <= `query`.
    pub fn floor(&self, query: f64) -> Option<(f64, &V)> {
        let idx = self.entries.partition_point(|(k, _)| *k <= query);
        idx.checked_sub(1).map(|i| {
            let (k, v) = &self.entries[i];
            (*k, v)
        })
    }

    /// Threshold selection with the overflow policy applied.
    ///
    /// Returns `None` only for [`Overflow::Fail`] tables queried past their
    /// last key.
    pub fn select(&self, query: f64) -> Option<Selection<V>> {
        if let Some((key, value)) = self.ceiling(query) {
            return Some(Selection {
                key,
                value: value.clone(),
                overflowed: false,
            });
        }
        match &self.overflow {
            Overflow::Fail => None,
            Overflow::UseLast => {
                let (key, value) = self.last();
                Some(Selection {
                    key,
                    value: value.clone(),
                    overflowed: true,
                })
            }
            Overflow::Sentinel { key, value } => Some(Selection {
                key: *key,
                value: value.clone(),
                overflowed: true,
            }),
        }
    }
}

impl ThresholdTable<f64> {
    /// Build a derating table; every factor (sentinel included) must lie in (0, 1].
    pub fn derating(name: impl Into<String>, entries: Vec<(f64, f64)>, overflow: Overflow<f64>) -> SizingResult<Self> {
        let name = name.into();
        let in_range = |f: f64| f > 0.0 && f <= 1.0;
        if let Some((k, f)) = entries.iter().find(|(_, f)| !in_range(*f)) {
            return Err(SizingError::invalid_table(
                name,
                format!("factor {} at breakpoint {} is outside (0, 1]", f, k),
            ));
        }
        if let Overflow::Sentinel { value, .. } = &overflow {
            if !in_range(*value) {
                return Err(SizingError::invalid_table(name, "sentinel factor is outside (0, 1]"));
            }
        }
        ThresholdTable::new(name, entries, overflow)
    }

    /// Factor for `query`, `None` only for `Overflow::Fail` tables past the last key
    pub fn factor(&self, query: f64) -> Option<f64> {
        self.select(query).map(|s| s.value)
    }
}

/// Piecewise fixed-cost curve over installed power.
///
/// ```text
/// cost
///  |                 ....·  <- beyond last point: P × (C_last / P_last)
///  |            ·---·
///  |       ·---·
///  |·-----·               <- below first point: C_first
///  +------------------------ kW
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct ScaleCostTable {
    points: Vec<(f64, f64)>,
}

impl ScaleCostTable {
    /// Build the curve from `(power_kw, fixed_cost_usd)` points.
    pub fn new(points: Vec<(f64, f64)>) -> SizingResult<Self> {
        const NAME: &str = "fixed_cost_curve";
        if points.is_empty() {
            return Err(SizingError::invalid_table(NAME, "curve has no points"));
        }
        if points.iter().any(|(p, c)| !p.is_finite() || !c.is_finite()) {
            return Err(SizingError::invalid_table(NAME, "points must be finite"));
        }
        if points.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(SizingError::invalid_table(NAME, "power must be strictly ascending"));
        }
        if points[points.len() - 1].0 <= 0.0 {
            return Err(SizingError::invalid_table(NAME, "last breakpoint power must be positive"));
        }
        Ok(ScaleCostTable { points })
    }

    /// Curve points in ascending power order
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Fixed cost for the given installed power.
    ///
    /// Beyond the last breakpoint the curve switches to the unit rate of that
    /// breakpoint instead of continuing the last segment's slope.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pv_core::tables::ScaleCostTable;
    /// use pv_core::units::Kilowatts;
    ///
    /// let curve = ScaleCostTable::new(vec![(20.0, 1400.0), (40.0, 2300.0)]).unwrap();
    /// assert!((curve.cost_at(Kilowatts(30.0)) - 1850.0).abs() < 1e-9);
    /// ```
    pub fn cost_at(&self, power: Kilowatts) -> f64 {
        let p = power.value();
        let (p_first, c_first) = self.points[0];
        let (p_last, c_last) = self.points[self.points.len() - 1];

        // NaN falls back to the base cost instead of reaching the interpolation
        if p.is_nan() || p <= p_first {
            return c_first;
        }
        if p >= p_last {
            return p * (c_last / p_last);
        }

        // p_first < p < p_last, so 1 <= idx <= len - 1
        let idx = self.points.partition_point(|(pk, _)| *pk <= p);
        let (p_lo, c_lo) = self.points[idx - 1];
        let (p_hi, c_hi) = self.points[idx];
        let ratio = (p - p_lo) / (p_hi - p_lo);
        c_lo + ratio * (c_hi - c_lo)
    }
}

impl TryFrom<Vec<(f64, f64)>> for ScaleCostTable {
    type Error = SizingError;

    fn try_from(points: Vec<(f64, f64)>) -> Result<Self, Self::Error> {
        ScaleCostTable::new(points)
    }
}

impl From<ScaleCostTable> for Vec<(f64, f64)> {
    fn from(table: ScaleCostTable) -> Self {
        table.points
    }
}
