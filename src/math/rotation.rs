//! SO(3) operations on 3×3 rotation matrices.
//!
//! All functions are pure. Matrices follow the active convention: a matrix
//! multiplies column vectors from the left, and `R_a · R_b` applies `R_b`
//! first.
//!
//! # Axis Extraction
//!
//! A rotation by `θ` about unit axis `h` has antisymmetric part
//! `(R - Rᵀ) / 2 = sin θ · [h]ₓ`, so `h` can be read from the off-diagonal
//! differences once `θ` is known from the joint encoder:
//!
//! ```text
//! h = (R₂₁ - R₁₂, R₀₂ - R₂₀, R₁₀ - R₀₁) / (2 sin θ)
//! ```
//!
//! The division is ill-conditioned when `sin θ ≈ 0`; use
//! [`is_degenerate_angle`] before calling [`axis_from_rotation`].

use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Composition order of roll, pitch and yaw angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RpyOrder {
    /// `Rx(roll) · Ry(pitch) · Rz(yaw)`.
    Forward,
    /// `Rz(yaw) · Ry(pitch) · Rx(roll)`, the intrinsic Z-Y-X convention
    /// reported by most attitude sensors.
    #[default]
    Reverse,
}

/// Rotation about the x-axis.
#[must_use]
pub fn rot_x(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, c, -s, //
        0.0, s, c,
    )
}

/// Rotation about the y-axis.
#[must_use]
pub fn rot_y(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        c, 0.0, s, //
        0.0, 1.0, 0.0, //
        -s, 0.0, c,
    )
}

/// Rotation about the z-axis.
#[must_use]
pub fn rot_z(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        c, -s, 0.0, //
        s, c, 0.0, //
        0.0, 0.0, 1.0,
    )
}

/// Orientation matrix from roll, pitch and yaw angles.
#[must_use]
pub fn rot_rpy(roll: f64, pitch: f64, yaw: f64, order: RpyOrder) -> Matrix3<f64> {
    match order {
        RpyOrder::Forward => rot_x(roll) * rot_y(pitch) * rot_z(yaw),
        RpyOrder::Reverse => rot_z(yaw) * rot_y(pitch) * rot_x(roll),
    }
}

/// Roll, pitch and yaw angles of a rotation matrix.
///
/// Inverse of [`rot_rpy`] for the same `order`, with pitch in `[-π/2, π/2]`.
#[must_use]
pub fn rpy_from_rotation(rot: &Matrix3<f64>, order: RpyOrder) -> (f64, f64, f64) {
    match order {
        RpyOrder::Forward => {
            let roll = (-rot[(1, 2)]).atan2(rot[(2, 2)]);
            let pitch = rot[(0, 2)].atan2(rot[(1, 2)].hypot(rot[(2, 2)]));
            let yaw = (-rot[(0, 1)]).atan2(rot[(0, 0)]);
            (roll, pitch, yaw)
        }
        RpyOrder::Reverse => {
            let roll = rot[(2, 1)].atan2(rot[(2, 2)]);
            let pitch = (-rot[(2, 0)]).atan2(rot[(2, 1)].hypot(rot[(2, 2)]));
            let yaw = rot[(1, 0)].atan2(rot[(0, 0)]);
            (roll, pitch, yaw)
        }
    }
}

/// Rotation by `angle` about `axis` (Rodrigues' formula).
///
/// The axis is normalized first. A zero axis describes no rotation and
/// yields the identity.
#[must_use]
pub fn rot_angle_axis(angle: f64, axis: &Vector3<f64>) -> Matrix3<f64> {
    let Some(h) = axis.try_normalize(f64::EPSILON) else {
        return Matrix3::identity();
    };
    let (s, c) = angle.sin_cos();
    let v = 1.0 - c;
    Matrix3::new(
        h.x * h.x * v + c,
        h.x * h.y * v - h.z * s,
        h.x * h.z * v + h.y * s,
        h.x * h.y * v + h.z * s,
        h.y * h.y * v + c,
        h.y * h.z * v - h.x * s,
        h.x * h.z * v - h.y * s,
        h.y * h.z * v + h.x * s,
        h.z * h.z * v + c,
    )
}

/// Rotation axis of `rot`, assumed to be a pure rotation by `delta_theta`.
///
/// The result is unit length only when `rot` really rotates by
/// `delta_theta`; callers average and renormalize.
///
/// Precondition: `sin(delta_theta)` is not close to zero (see
/// [`is_degenerate_angle`]). Violating it yields huge or non-finite values.
#[must_use]
pub fn axis_from_rotation(rot: &Matrix3<f64>, delta_theta: f64) -> Vector3<f64> {
    let skew = Vector3::new(
        rot[(2, 1)] - rot[(1, 2)],
        rot[(0, 2)] - rot[(2, 0)],
        rot[(1, 0)] - rot[(0, 1)],
    );
    skew / (2.0 * delta_theta.sin())
}

/// Whether a rotation by `delta_theta` is too close to `0` or `π` for its axis
/// to be extracted.
#[must_use]
pub fn is_degenerate_angle(delta_theta: f64, sin_tolerance: f64) -> bool {
    let sin = delta_theta.sin().abs();
    sin.is_nan() || sin < sin_tolerance
}
