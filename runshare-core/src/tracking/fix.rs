// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Positional Fix
//!
//! A single reading from the device positioning source.

use serde::{Deserialize, Deserializer, Serialize};

/// A single positional reading.
///
/// Produced by the positioning source and never mutated afterwards. The serde
/// field names match the `location` object of the relay protocol; the short
/// `lat`/`lon`/`alt` spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in degrees.
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude in degrees.
    #[serde(alias = "lon")]
    pub longitude: f64,
    /// Altitude in meters above the WGS84 ellipsoid.
    #[serde(default, alias = "alt", deserialize_with = "null_as_zero")]
    pub altitude: f64,
    /// Ground speed reported by the device, meters per second.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub speed: f64,
    /// Horizontal accuracy radius in meters (lower is better).
    #[serde(default, deserialize_with = "null_as_zero")]
    pub accuracy: f64,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

impl Fix {
    /// Creates a fix with zero altitude, speed and accuracy radius.
    pub fn new(latitude: f64, longitude: f64, timestamp: u64) -> Self {
        Fix {
            latitude,
            longitude,
            altitude: 0.0,
            speed: 0.0,
            accuracy: 0.0,
            timestamp,
        }
    }

    /// Sets the accuracy radius.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets the altitude.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// Sets the reported ground speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Replaces a non-finite altitude or speed with zero.
    ///
    /// JSON has no NaN or infinity; serde_json writes them as `null`.
    pub fn sanitized(mut self) -> Self {
        if !self.altitude.is_finite() {
            self.altitude = 0.0;
        }
        if !self.speed.is_finite() {
            self.speed = 0.0;
        }
        self
    }
}

/// Reads `null` (a non-finite value on the writing side) as zero.
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_accepts_short_field_names() {
        let json = r#"{"lat":40.0,"lon":-75.0,"alt":12.5,"timestamp":1000}"#;
        let fix: Fix = serde_json::from_str(json).unwrap();

        assert_eq!(fix.latitude, 40.0);
        assert_eq!(fix.longitude, -75.0);
        assert_eq!(fix.altitude, 12.5);
        assert_eq!(fix.accuracy, 0.0);
        assert_eq!(fix.timestamp, 1000);
    }

    #[test]
    fn test_fix_serializes_long_field_names() {
        let fix = Fix::new(1.0, 2.0, 3).with_accuracy(4.0);
        let value = serde_json::to_value(fix).unwrap();

        assert_eq!(value["latitude"], 1.0);
        assert_eq!(value["longitude"], 2.0);
        assert_eq!(value["accuracy"], 4.0);
    }

    #[test]
    fn test_sanitized_zeroes_non_finite_optionals() {
        let fix = Fix::new(40.0, -75.0, 0)
            .with_altitude(f64::NAN)
            .with_speed(f64::INFINITY)
            .with_accuracy(5.0)
            .sanitized();

        assert_eq!(fix.altitude, 0.0);
        assert_eq!(fix.speed, 0.0);
        assert_eq!(fix.accuracy, 5.0);
        assert_eq!(fix.latitude, 40.0);
    }

    #[test]
    fn test_null_optionals_read_as_zero() {
        let json = r#"{"latitude":1.0,"longitude":2.0,"altitude":null,"speed":null,"accuracy":null,"timestamp":7}"#;
        let fix: Fix = serde_json::from_str(json).unwrap();

        assert_eq!(fix, Fix::new(1.0, 2.0, 7));
    }
}
