use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A (latitude, longitude) pair in degrees. Immutable value; replaced
/// wholesale on every selection, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("{axis} must be a finite number, got {value}")]
    NotFinite { axis: &'static str, value: f64 },

    #[error("{axis} {value} is outside the valid range {min}..={max}")]
    OutOfRange {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("expected \"<latitude>, <longitude>\", got {0:?}")]
    Malformed(String),
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        check_axis("latitude", latitude, 90.0)?;
        check_axis("longitude", longitude, 180.0)?;
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

fn check_axis(axis: &'static str, value: f64, bound: f64) -> Result<(), CoordinateError> {
    if !value.is_finite() {
        return Err(CoordinateError::NotFinite { axis, value });
    }
    if value < -bound || value > bound {
        return Err(CoordinateError::OutOfRange { axis, value, min: -bound, max: bound });
    }
    Ok(())
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    /// Parses `"48.8566, 2.3522"` (comma-separated, whitespace tolerated).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoordinateError::Malformed(s.to_string());

        let (lat, lon) = s.split_once(',').ok_or_else(malformed)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| malformed())?;

        Coordinate::new(latitude, longitude)
    }
}

/// One past selection. Entries are created on successful resolution and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: u64,
    pub coordinate: Coordinate,
    pub label: String,
    pub selected_at: DateTime<Utc>,
}

/// Read-only projection of a current-weather response for one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: u8,
    pub condition: String,
}

/// Maximum number of characters of an encyclopedic extract kept for display.
pub const DESCRIPTION_LIMIT: usize = 350;

/// Short encyclopedic blurb about the selected place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceDescription {
    text: String,
}

impl PlaceDescription {
    /// Truncates `extract` to [`DESCRIPTION_LIMIT`] characters and appends
    /// an ellipsis, counting characters so multi-byte text never splits.
    pub fn from_extract(extract: &str) -> Self {
        let mut text: String = extract.chars().take(DESCRIPTION_LIMIT).collect();
        text.push('…');
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for PlaceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        let err = Coordinate::new(90.5, 0.0).unwrap_err();
        assert!(matches!(err, CoordinateError::OutOfRange { axis: "latitude", .. }));

        let err = Coordinate::new(0.0, -180.01).unwrap_err();
        assert!(matches!(err, CoordinateError::OutOfRange { axis: "longitude", .. }));
    }

    #[test]
    fn coordinate_rejects_non_finite() {
        let err = Coordinate::new(f64::NAN, 0.0).unwrap_err();
        assert!(matches!(err, CoordinateError::NotFinite { axis: "latitude", .. }));

        let err = Coordinate::new(0.0, f64::INFINITY).unwrap_err();
        assert!(matches!(err, CoordinateError::NotFinite { axis: "longitude", .. }));
    }

    #[test]
    fn coordinate_parses_from_str() {
        let coord: Coordinate = "48.8566, 2.3522".parse().expect("valid coordinate");
        assert_eq!(coord.latitude(), 48.8566);
        assert_eq!(coord.longitude(), 2.3522);
    }

    #[test]
    fn coordinate_from_str_rejects_garbage() {
        assert!(matches!(
            "not a coordinate".parse::<Coordinate>(),
            Err(CoordinateError::Malformed(_))
        ));
        assert!(matches!(
            "48.85".parse::<Coordinate>(),
            Err(CoordinateError::Malformed(_))
        ));
    }

    #[test]
    fn description_truncates_long_extracts() {
        let extract = "x".repeat(1000);
        let description = PlaceDescription::from_extract(&extract);

        assert_eq!(description.as_str().chars().count(), DESCRIPTION_LIMIT + 1);
        assert!(description.as_str().ends_with('…'));
    }

    #[test]
    fn description_keeps_short_extracts_whole() {
        let description = PlaceDescription::from_extract("A small village.");
        assert_eq!(description.as_str(), "A small village.…");
    }

    #[test]
    fn description_respects_char_boundaries() {
        let extract = "é".repeat(400);
        let description = PlaceDescription::from_extract(&extract);
        assert_eq!(description.as_str().chars().count(), DESCRIPTION_LIMIT + 1);
    }
}
