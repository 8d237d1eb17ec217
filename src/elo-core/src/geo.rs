//! Geohash encoding and radius-to-precision mapping
//!
//! Proximity queries are answered by prefix matching on geohash strings: a
//! prefix of `P` characters names one rectangular cell, and every point whose
//! geohash starts with that prefix counts as "near". Points just across a cell
//! edge are missed; that is the accepted cost of a single-prefix lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

/// Geohash base-32 alphabet (no `a`, `i`, `l`, `o`)
pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Precision used when deriving the stored geohash of a point
pub const DEFAULT_PRECISION: usize = 9;

/// Approximate cell edge length in km for each geohash length
const CELL_KM: [(usize, f64); 9] = [
    (1, 5000.0),
    (2, 1250.0),
    (3, 156.0),
    (4, 39.1),
    (5, 4.89),
    (6, 1.22),
    (7, 0.153),
    (8, 0.0382),
    (9, 0.00477),
];

/// Pick the geohash length for a search radius.
///
/// Walks the table from the coarsest cell and returns the first length whose
/// cell is at least as large as the radius. Non-positive radii map to the
/// finest precision; radii larger than every cell fall back to precision 1.
pub fn precision_for_km(radius_km: f64) -> usize {
    if radius_km <= 0.0 {
        return DEFAULT_PRECISION;
    }

    CELL_KM
        .iter()
        .find(|(_, size_km)| *size_km >= radius_km)
        .map(|(precision, _)| *precision)
        .unwrap_or(1)
}

/// Encode a coordinate as a geohash of `precision` characters (minimum 1).
pub fn encode_geohash(lat: f64, lon: f64, precision: usize) -> String {
    const BITS: [u8; 5] = [16, 8, 4, 2, 1];

    let precision = precision.max(1);
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut geohash = String::with_capacity(precision);
    let mut bit = 0;
    let mut ch = 0u8;
    let mut even = true; // longitude first

    while geohash.len() < precision {
        let (value, range) = if even {
            (lon, &mut lon_range)
        } else {
            (lat, &mut lat_range)
        };

        let mid = (range.0 + range.1) / 2.0;
        if value >= mid {
            ch |= BITS[bit];
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even = !even;

        if bit < 4 {
            bit += 1;
        } else {
            geohash.push(BASE32[ch as usize] as char);
            bit = 0;
            ch = 0;
        }
    }

    geohash
}

/// GeoPoint parse failure
#[derive(Debug, thiserror::Error)]
pub enum GeoPointError {
    #[error("GeoPoint string must be 'lat,lon', got {0:?}")]
    Format(String),

    #[error("invalid coordinate {value:?}: {source}")]
    Coordinate {
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

/// A latitude/longitude pair. Textual form is `"<lat>,<lon>"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Full-precision geohash of this point
    pub fn geohash(&self) -> String {
        encode_geohash(self.lat, self.lon, DEFAULT_PRECISION)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl FromStr for GeoPoint {
    type Err = GeoPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| GeoPointError::Format(s.to_string()))?;

        Ok(Self {
            lat: parse_coordinate(lat)?,
            lon: parse_coordinate(lon)?,
        })
    }
}

fn parse_coordinate(value: &str) -> Result<f64, GeoPointError> {
    let value = value.trim();
    value.parse().map_err(|source| GeoPointError::Coordinate {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_known_points() {
        // Reference value from the geohash literature
        assert_eq!(encode_geohash(57.64911, 10.40744, 11), "u4pruydqqvj");
        assert_eq!(encode_geohash(0.0, 0.0, 9), "s00000000");

        // First cell of a few cities
        assert_eq!(encode_geohash(-23.5505, -46.6333, 1), "6");
        assert_eq!(encode_geohash(40.7128, -74.0060, 1), "d");
        assert_eq!(encode_geohash(-22.9068, -43.1729, 1), "7");
    }

    #[test]
    fn test_encode_prefix_is_stable() {
        let full = encode_geohash(-22.9068, -43.1729, 9);
        for precision in 1..=9 {
            assert_eq!(encode_geohash(-22.9068, -43.1729, precision), full[..precision]);
        }
    }

    #[test]
    fn test_encode_zero_precision_clamps_to_one() {
        assert_eq!(encode_geohash(10.0, 10.0, 0).len(), 1);
    }

    #[test]
    fn test_precision_for_km() {
        assert_eq!(precision_for_km(0.0), 9);
        assert_eq!(precision_for_km(-5.0), 9);
        assert_eq!(precision_for_km(10.0), 1);
        assert_eq!(precision_for_km(5000.0), 1);
        assert_eq!(precision_for_km(0.001), 1);
        assert_eq!(precision_for_km(20_000.0), 1);
    }

    #[test]
    fn test_geopoint_display_and_parse() {
        let point = GeoPoint::new(-22.9068, -43.1729);
        assert_eq!(point.to_string(), "-22.9068,-43.1729");
        assert_eq!("-22.9068, -43.1729".parse::<GeoPoint>().unwrap(), point);
        assert_eq!(point.geohash().len(), DEFAULT_PRECISION);
    }

    #[test]
    fn test_geopoint_parse_rejects_malformed() {
        assert!(matches!(
            "only-one-number".parse::<GeoPoint>(),
            Err(GeoPointError::Format(_))
        ));
        assert!(matches!(
            "abc,10".parse::<GeoPoint>(),
            Err(GeoPointError::Coordinate { .. })
        ));
        assert!(matches!(
            "1,2,3".parse::<GeoPoint>(),
            Err(GeoPointError::Coordinate { .. })
        ));
        assert!("".parse::<GeoPoint>().is_err());
    }

    proptest! {
        #[test]
        fn prop_encode_is_deterministic(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
            precision in 1usize..=12,
        ) {
            let first = encode_geohash(lat, lon, precision);
            prop_assert_eq!(first.len(), precision);
            prop_assert!(first.bytes().all(|b| BASE32.contains(&b)));
            prop_assert_eq!(first, encode_geohash(lat, lon, precision));
        }

        #[test]
        fn prop_smaller_radius_never_coarser(a in -10.0f64..10_000.0, b in -10.0f64..10_000.0) {
            let (small, large) = if a < b { (a, b) } else { (b, a) };
            prop_assert!(precision_for_km(small) >= precision_for_km(large));
        }

        #[test]
        fn prop_geopoint_round_trip(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let point = GeoPoint::new(lat, lon);
            prop_assert_eq!(point.to_string().parse::<GeoPoint>().unwrap(), point);
        }
    }
}
