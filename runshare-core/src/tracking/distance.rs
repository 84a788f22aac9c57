//! Distance Engine
//!
//! Great-circle distance between fixes and incremental accumulation with
//! speed-outlier rejection.

use super::fix::Fix;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default implied-speed ceiling in meters per second.
pub const DEFAULT_MAX_SPEED_MPS: f64 = 100.0;

/// Haversine distance between two fixes in meters.
pub fn haversine_meters(a: &Fix, b: &Fix) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Sum of consecutive haversine deltas, without outlier rejection.
pub fn total_distance(route: &[Fix]) -> f64 {
    route
        .windows(2)
        .map(|pair| haversine_meters(&pair[0], &pair[1]))
        .sum()
}

/// Outcome of feeding one fix to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// First fix of the route; nothing to measure against.
    Origin,
    /// Segment counted towards the total.
    Counted {
        /// Segment length in meters.
        meters: f64,
    },
    /// Implied speed too high (or non-positive time step); the segment is
    /// excluded but the fix still becomes the new reference point.
    Jump {
        /// Segment length in meters.
        meters: f64,
        /// Implied speed, meters per second (infinite if `dt <= 0`).
        implied_speed: f64,
    },
}

/// Accumulates distance across a sequence of fixes.
///
/// The reference point is always the last fix fed in, whether or not its
/// segment counted.
#[derive(Debug, Clone)]
pub struct DistanceEngine {
    max_speed_mps: f64,
    reference: Option<Fix>,
    total_meters: f64,
}

impl Default for DistanceEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SPEED_MPS)
    }
}

impl DistanceEngine {
    /// Creates an engine with the given implied-speed ceiling.
    pub fn new(max_speed_mps: f64) -> Self {
        DistanceEngine {
            max_speed_mps,
            reference: None,
            total_meters: 0.0,
        }
    }

    /// Feeds the next fix and returns what happened to its segment.
    pub fn accumulate(&mut self, fix: &Fix) -> Segment {
        let segment = match self.reference {
            None => Segment::Origin,
            Some(last) => self.classify(&last, fix),
        };

        if let Segment::Counted { meters } = segment {
            self.total_meters += meters;
        }
        self.reference = Some(*fix);
        segment
    }

    /// Classifies the segment `last -> next` without mutating the engine.
    pub fn classify(&self, last: &Fix, next: &Fix) -> Segment {
        let meters = haversine_meters(last, next);
        let dt_secs = (next.timestamp as f64 - last.timestamp as f64) / 1000.0;

        if dt_secs > 0.0 && meters / dt_secs < self.max_speed_mps {
            Segment::Counted { meters }
        } else {
            let implied_speed = if dt_secs > 0.0 {
                meters / dt_secs
            } else {
                f64::INFINITY
            };
            Segment::Jump {
                meters,
                implied_speed,
            }
        }
    }

    /// Total counted distance in meters.
    pub fn total_meters(&self) -> f64 {
        self.total_meters
    }

    /// The current reference point.
    pub fn reference(&self) -> Option<&Fix> {
        self.reference.as_ref()
    }

    /// Forgets the reference point and zeroes the total.
    pub fn reset(&mut self) {
        self.reference = None;
        self.total_meters = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_milli_degree_latitude() {
        let a = Fix::new(40.0, -75.0, 0);
        let b = Fix::new(40.0009, -75.0, 10_000);

        let d = haversine_meters(&a, &b);
        assert!((d - 100.08).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_haversine_is_symmetric_and_zero_on_self() {
        let a = Fix::new(51.5, -0.12, 0);
        let b = Fix::new(48.85, 2.35, 0);

        assert_eq!(haversine_meters(&a, &a), 0.0);
        assert!((haversine_meters(&a, &b) - haversine_meters(&b, &a)).abs() < 1e-6);
    }

    #[test]
    fn test_first_fix_is_origin() {
        let mut engine = DistanceEngine::default();
        assert_eq!(engine.accumulate(&Fix::new(0.0, 0.0, 0)), Segment::Origin);
        assert_eq!(engine.total_meters(), 0.0);
    }

    #[test]
    fn test_jump_moves_reference() {
        let mut engine = DistanceEngine::default();
        engine.accumulate(&Fix::new(40.0, -75.0, 0));
        engine.accumulate(&Fix::new(40.0009, -75.0, 10_000));
        let before = engine.total_meters();

        let jump = engine.accumulate(&Fix::new(41.0, -75.0, 10_001));
        assert!(matches!(jump, Segment::Jump { .. }));
        assert_eq!(engine.total_meters(), before);
        assert_eq!(engine.reference().map(|f| f.latitude), Some(41.0));
    }

    #[test]
    fn test_zero_or_negative_time_step_is_a_jump() {
        let engine = DistanceEngine::default();
        let a = Fix::new(0.0, 0.0, 5_000);

        let same_time = engine.classify(&a, &Fix::new(0.0001, 0.0, 5_000));
        let backwards = engine.classify(&a, &Fix::new(0.0001, 0.0, 4_000));

        assert!(matches!(same_time, Segment::Jump { implied_speed, .. } if implied_speed.is_infinite()));
        assert!(matches!(backwards, Segment::Jump { .. }));
    }

    #[test]
    fn test_speed_ceiling_is_exclusive() {
        let engine = DistanceEngine::new(20.0);
        let a = Fix::new(0.0, 0.0, 0);
        let b = Fix::new(0.0009, 0.0, 10_000);
        let meters = haversine_meters(&a, &b);

        // Exactly at the ceiling counts as a jump.
        let at_ceiling = DistanceEngine::new(meters / 10.0);
        assert!(matches!(at_ceiling.classify(&a, &b), Segment::Jump { .. }));
        assert!(matches!(engine.classify(&a, &b), Segment::Counted { .. }));
    }

    #[test]
    fn test_total_distance_ignores_speed() {
        let route = vec![
            Fix::new(40.0, -75.0, 0),
            Fix::new(40.0009, -75.0, 10_000),
            Fix::new(41.0, -75.0, 10_001),
        ];
        let plain = total_distance(&route);
        assert!(plain > 100_000.0);
        assert_eq!(total_distance(&route[..1]), 0.0);
    }
}
