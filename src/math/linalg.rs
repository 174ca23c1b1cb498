//! Vector utilities for axis estimation.
//!
//! Averaging of per-experiment axis estimates and the comparison helpers
//! used by direction agreement checks.

use nalgebra::{Unit, Vector3};

/// Minimum norm for a mean vector to still define a direction.
pub const MIN_DIRECTION_NORM: f64 = 1e-12;

/// Mean of `samples`, renormalized to unit length.
///
/// Returns `None` for an empty slice or when the samples cancel out.
#[must_use]
pub fn mean_direction(samples: &[Vector3<f64>]) -> Option<Unit<Vector3<f64>>> {
    if samples.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = samples.iter().sum();
    let mean = sum / samples.len() as f64;
    Unit::try_new(mean, MIN_DIRECTION_NORM)
}

/// Angle in radians between two vectors, in `[0, π]`.
///
/// Zero vectors have no direction; the angle to them is reported as `π`.
#[must_use]
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < MIN_DIRECTION_NORM {
        return std::f64::consts::PI;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Largest angle between any sample and `reference`.
#[must_use]
pub fn max_angular_deviation(samples: &[Vector3<f64>], reference: &Unit<Vector3<f64>>) -> f64 {
    samples
        .iter()
        .map(|s| angle_between(s, reference))
        .fold(0.0, f64::max)
}

/// Largest absolute component difference between two vectors.
#[must_use]
pub fn max_component_difference(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).amax()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_mean_direction() {
        let samples = vec![Vector3::new(1.0, 0.1, 0.0), Vector3::new(1.0, -0.1, 0.0)];
        let mean = mean_direction(&samples).unwrap();
        assert_abs_diff_eq!(mean.into_inner(), Vector3::x(), epsilon = 1e-15);
    }

    #[test]
    fn test_mean_direction_is_unit() {
        let samples = vec![Vector3::new(3.0, 4.0, 0.0), Vector3::new(0.0, 4.0, 3.0)];
        let mean = mean_direction(&samples).unwrap();
        assert_relative_eq!(mean.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_direction_degenerate() {
        assert!(mean_direction(&[]).is_none());

        let cancelling = vec![Vector3::z(), -Vector3::z()];
        assert!(mean_direction(&cancelling).is_none());
    }

    #[test]
    fn test_angle_between() {
        assert_relative_eq!(angle_between(&Vector3::x(), &Vector3::y()), FRAC_PI_2);
        assert_relative_eq!(angle_between(&Vector3::x(), &(-Vector3::x())), PI);
        assert_relative_eq!(angle_between(&Vector3::x(), &(2.0 * Vector3::x())), 0.0);
        assert_relative_eq!(angle_between(&Vector3::x(), &Vector3::zeros()), PI);
    }

    #[test]
    fn test_max_angular_deviation() {
        let reference = Vector3::z_axis();
        let samples = vec![Vector3::z(), Vector3::new(0.0, 1.0, 1.0), Vector3::new(0.1, 0.0, 1.0)];
        let deviation = max_angular_deviation(&samples, &reference);
        assert_relative_eq!(deviation, FRAC_PI_2 / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_max_component_difference() {
        let a = Vector3::new(1.0, 0.0, 0.5);
        let b = Vector3::new(0.9, 0.2, 0.5);
        assert_relative_eq!(max_component_difference(&a, &b), 0.2, epsilon = 1e-12);
    }
}
