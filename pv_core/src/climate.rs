//! # Design Climate
//!
//! Site temperatures that drive two checks:
//!
//! - **Maximum design temperature** derates conductor ampacity (fire risk).
//! - **Minimum design temperature** raises string Voc (inverter overvoltage risk).
//!
//! Fetching climatology is the caller's job; the core only consumes the
//! resulting [`DesignClimate`] value. [`MonthlyClimatology`] turns a
//! twelve-month min/max series (e.g. NASA POWER `T2M_MIN` / `T2M_MAX`) into
//! design values using worst-month extremes.

use serde::{Deserialize, Serialize};

use crate::errors::{SizingError, SizingResult};

/// Extra margin subtracted from the coldest monthly minimum for cold snaps
pub const COLD_SNAP_MARGIN_C: f64 = 2.0;

/// Site coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Parse the `"lat, lon"` form used in project files.
    ///
    /// ```rust
    /// use pv_core::climate::Coordinates;
    ///
    /// let c = Coordinates::parse("20.6597, -103.3496").unwrap();
    /// assert_eq!(c.latitude, 20.6597);
    /// assert!(Coordinates::parse("95.0, 10.0").is_err());
    /// ```
    pub fn parse(text: &str) -> SizingResult<Self> {
        let mut parts = text.split(',').map(str::trim);
        let (lat, lon) = match (parts.next(), parts.next(), parts.next()) {
            (Some(lat), Some(lon), None) => (lat, lon),
            _ => {
                return Err(SizingError::invalid_input(
                    "coordinates",
                    text,
                    "Expected \"lat, lon\"",
                ))
            }
        };
        let parse = |field: &str, s: &str| {
            s.parse::<f64>()
                .map_err(|_| SizingError::invalid_input(field, s, "Not a number"))
        };
        let coords = Coordinates {
            latitude: parse("latitude", lat)?,
            longitude: parse("longitude", lon)?,
        };
        coords.validate()?;
        Ok(coords)
    }

    pub fn validate(&self) -> SizingResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SizingError::invalid_input(
                "latitude",
                self.latitude.to_string(),
                "Latitude must be within [-90, 90]",
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SizingError::invalid_input(
                "longitude",
                self.longitude.to_string(),
                "Longitude must be within [-180, 180]",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lat: {}, Lon: {}", self.latitude, self.longitude)
    }
}

/// Design temperatures for a site (°C)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignClimate {
    /// Used for the cold-weather Voc correction
    pub min_design_temp_c: f64,
    /// Used for conductor ampacity derating
    pub max_design_temp_c: f64,
}

impl DesignClimate {
    pub fn new(min_design_temp_c: f64, max_design_temp_c: f64) -> SizingResult<Self> {
        let climate = DesignClimate {
            min_design_temp_c,
            max_design_temp_c,
        };
        climate.validate()?;
        Ok(climate)
    }

    pub fn validate(&self) -> SizingResult<()> {
        if !self.min_design_temp_c.is_finite() || !self.max_design_temp_c.is_finite() {
            return Err(SizingError::invalid_input(
                "climate",
                format!("{:?}", self),
                "Design temperatures must be finite",
            ));
        }
        if self.min_design_temp_c > self.max_design_temp_c {
            return Err(SizingError::invalid_input(
                "climate.min_design_temp_c",
                self.min_design_temp_c.to_string(),
                "Minimum design temperature exceeds the maximum",
            ));
        }
        Ok(())
    }
}

/// Source of design temperatures for a location.
pub trait ClimateProvider: Send + Sync {
    fn resolve(&self, coordinates: &Coordinates) -> SizingResult<DesignClimate>;
}

/// Same design climate for every location (CLI flags, tests).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticClimate(pub DesignClimate);

impl ClimateProvider for StaticClimate {
    fn resolve(&self, _coordinates: &Coordinates) -> SizingResult<DesignClimate> {
        Ok(self.0)
    }
}

/// Monthly climatology for one site (°C), January through December.
///
/// Missing months may be encoded as any non-finite value (NASA POWER uses
/// `-999`; callers should map it to `NaN` or drop it before building this).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyClimatology {
    /// Monthly mean of daily minimum temperature
    pub t2m_min: Vec<f64>,
    /// Monthly mean of daily maximum temperature
    pub t2m_max: Vec<f64>,
}

impl MonthlyClimatology {
    /// Reduce to design values.
    ///
    /// - min = coldest monthly minimum − [`COLD_SNAP_MARGIN_C`]
    /// - max = hottest monthly maximum
    ///
    /// Both are rounded to two decimals.
    pub fn design_climate(&self) -> SizingResult<DesignClimate> {
        let coldest = self
            .t2m_min
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .reduce(f64::min)
            .ok_or_else(|| SizingError::invalid_input("t2m_min", "[]", "No valid monthly minimum"))?;
        let hottest = self
            .t2m_max
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .reduce(f64::max)
            .ok_or_else(|| SizingError::invalid_input("t2m_max", "[]", "No valid monthly maximum"))?;

        DesignClimate::new(round2(coldest - COLD_SNAP_MARGIN_C), round2(hottest))
    }
}

impl ClimateProvider for MonthlyClimatology {
    fn resolve(&self, _coordinates: &Coordinates) -> SizingResult<DesignClimate> {
        self.design_climate()
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let c = Coordinates::parse(" 19.43 ,-99.13 ").unwrap();
        assert_eq!(c.latitude, 19.43);
        assert_eq!(c.longitude, -99.13);
        assert!(Coordinates::parse("19.43").is_err());
        assert!(Coordinates::parse("19.43, -99.13, 5").is_err());
        assert!(Coordinates::parse("north, west").is_err());
        assert!(Coordinates::parse("10.0, 200.0").is_err());
    }

    #[test]
    fn test_monthly_reduction() {
        let clim = MonthlyClimatology {
            t2m_min: vec![4.12, 5.0, 8.0, 11.0, 14.0, 16.0, 16.0, 16.0, 15.0, 11.0, 7.0, 5.0],
            t2m_max: vec![24.0, 26.0, 29.0, 31.0, 33.457, 31.0, 28.0, 28.0, 27.0, 27.0, 26.0, 24.0],
        };
        let design = clim.design_climate().unwrap();
        assert!((design.min_design_temp_c - 2.12).abs() < 1e-9);
        assert!((design.max_design_temp_c - 33.46).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_ignores_missing() {
        let clim = MonthlyClimatology {
            t2m_min: vec![f64::NAN, 3.0],
            t2m_max: vec![30.0, f64::NAN],
        };
        let design = clim.design_climate().unwrap();
        assert_eq!(design.min_design_temp_c, 1.0);
        assert_eq!(design.max_design_temp_c, 30.0);

        let empty = MonthlyClimatology {
            t2m_min: vec![],
            t2m_max: vec![30.0],
        };
        assert!(empty.design_climate().is_err());
    }

    #[test]
    fn test_static_provider() {
        let provider = StaticClimate(DesignClimate::new(10.0, 34.0).unwrap());
        let coords = Coordinates::parse("20.0, -100.0").unwrap();
        assert_eq!(provider.resolve(&coords).unwrap().max_design_temp_c, 34.0);
    }

    #[test]
    fn test_inverted_climate_rejected() {
        assert!(DesignClimate::new(40.0, 30.0).is_err());
    }
}
