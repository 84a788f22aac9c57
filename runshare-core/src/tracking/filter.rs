// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fix Filter
//!
//! Stateless plausibility check applied to every incoming fix before it can
//! touch the session. A fix rejected here is dropped entirely: it does not
//! become the current position and never enters the route.
//!
//! This is distinct from the speed check in [`super::DistanceEngine`], which
//! depends on the previous route point and only excludes a segment from the
//! distance total.

use thiserror::Error;

use super::fix::Fix;

/// Default accuracy cutoff in meters; fixes at or above it are rejected.
pub const DEFAULT_MAX_ACCURACY_METERS: f64 = 50.0;

/// Why a fix was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FixRejection {
    #[error("accuracy {0}m is not below the cutoff")]
    LowAccuracy(f64),

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Rejects physically implausible or low-confidence fixes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixFilter {
    max_accuracy_meters: f64,
}

impl Default for FixFilter {
    fn default() -> Self {
        FixFilter {
            max_accuracy_meters: DEFAULT_MAX_ACCURACY_METERS,
        }
    }
}

impl FixFilter {
    /// Creates a filter with a custom accuracy cutoff.
    pub fn new(max_accuracy_meters: f64) -> Self {
        FixFilter {
            max_accuracy_meters,
        }
    }

    /// Returns the accuracy cutoff in meters.
    pub fn max_accuracy_meters(&self) -> f64 {
        self.max_accuracy_meters
    }

    /// Checks a fix, returning the first failed condition.
    ///
    /// NaN accuracy or coordinates are rejected.
    pub fn check(&self, fix: &Fix) -> Result<(), FixRejection> {
        if fix.accuracy.is_nan() || fix.accuracy >= self.max_accuracy_meters {
            return Err(FixRejection::LowAccuracy(fix.accuracy));
        }
        if !(-90.0..=90.0).contains(&fix.latitude) {
            return Err(FixRejection::LatitudeOutOfRange(fix.latitude));
        }
        if !(-180.0..=180.0).contains(&fix.longitude) {
            return Err(FixRejection::LongitudeOutOfRange(fix.longitude));
        }
        Ok(())
    }

    /// Returns true if the fix passes every condition.
    pub fn accepts(&self, fix: &Fix) -> bool {
        self.check(fix).is_ok()
    }

    /// Keeps only the fixes that pass, preserving order.
    pub fn retain_valid(&self, fixes: &[Fix]) -> Vec<Fix> {
        fixes.iter().filter(|f| self.accepts(f)).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lon: f64, accuracy: f64) -> Fix {
        Fix::new(lat, lon, 0).with_accuracy(accuracy)
    }

    #[test]
    fn test_accepts_good_fix() {
        assert!(FixFilter::default().accepts(&fix(40.0, -75.0, 5.0)));
    }

    #[test]
    fn test_accuracy_cutoff_is_exclusive() {
        let filter = FixFilter::default();

        assert!(filter.accepts(&fix(0.0, 0.0, 49.99)));
        assert_eq!(
            filter.check(&fix(0.0, 0.0, 50.0)),
            Err(FixRejection::LowAccuracy(50.0))
        );
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let filter = FixFilter::default();

        assert!(filter.accepts(&fix(90.0, 180.0, 1.0)));
        assert!(filter.accepts(&fix(-90.0, -180.0, 1.0)));
        assert!(matches!(
            filter.check(&fix(90.0001, 0.0, 1.0)),
            Err(FixRejection::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            filter.check(&fix(0.0, -180.5, 1.0)),
            Err(FixRejection::LongitudeOutOfRange(_))
        ));
    }

    #[test]
    fn test_nan_is_rejected() {
        let filter = FixFilter::default();

        assert!(!filter.accepts(&fix(f64::NAN, 0.0, 1.0)));
        assert!(!filter.accepts(&fix(0.0, 0.0, f64::NAN)));
    }

    #[test]
    fn test_retain_valid_preserves_order() {
        let fixes = vec![
            fix(1.0, 1.0, 1.0),
            fix(2.0, 2.0, 80.0),
            fix(3.0, 3.0, 1.0),
            fix(95.0, 3.0, 1.0),
        ];

        let kept = FixFilter::default().retain_valid(&fixes);
        let lats: Vec<f64> = kept.iter().map(|f| f.latitude).collect();
        assert_eq!(lats, vec![1.0, 3.0]);
    }
}
