//! Sequential joint axis identification.
//!
//! Each experiment of joint `j` measures the sensor rotation caused by `j`
//! alone, but seen through every other joint of the chain. Joints already
//! identified earlier in the pass are rotated back out of the measurement,
//! which leaves a pure rotation about `j`'s axis in its own frame.
//!
//! # Kinematic Model
//!
//! With sensor orientation `R(q) = A · Rot(h_j, q_j) · B`, where `A` is the
//! product of the joints below `j` and `B` the product of those above:
//!
//! ```text
//! forward:   Aᵀ · R_after · R_beforeᵀ · A  = Rot(h_j, Δθ)
//! backward:  B · R_beforeᵀ · R_after · Bᵀ  = Rot(h_j, Δθ)
//! ```
//!
//! The forward pass (ascending joint order) knows `A` once joints
//! `0..j` are identified; the backward pass (descending order) knows `B`
//! once joints `j+1..N` are. The two paths are kept separate so each
//! composition order can be checked against the model on its own.

use nalgebra::{Matrix3, Matrix3xX, Unit, Vector3};
use tracing::{debug, info, warn};

use crate::config::IdentConfig;
use crate::error::{IdentError, Result};
use crate::experiments::{ExperimentPair, ExperimentSet};
use crate::math::{
    axis_from_rotation, is_degenerate_angle, linalg::max_angular_deviation, mean_direction,
    rot_angle_axis, RpyOrder,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Joint processing order of one identification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Ascending joint order, starting at the base.
    #[default]
    Forward,
    /// Descending joint order, starting at the sensor.
    Backward,
}

impl Direction {
    /// Joint indices in processing order.
    #[must_use]
    pub fn joint_order(self, n_joints: usize) -> Vec<usize> {
        match self {
            Self::Forward => (0..n_joints).collect(),
            Self::Backward => (0..n_joints).rev().collect(),
        }
    }

    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
        }
    }
}

/// Why a joint's axis could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unidentified {
    /// The joint was never observed moving on its own.
    NoExperiments,
    /// Every experiment had a rotation angle too close to `0` or `π`.
    AllDegenerate {
        /// Number of experiments dropped.
        dropped: usize,
    },
    /// The individual estimates cancelled out.
    Cancelled {
        /// Number of experiments averaged.
        experiments: usize,
    },
    /// An earlier joint in the pass is unidentified, so this joint's
    /// measurements cannot be corrected.
    BlockedBy {
        /// First unidentified joint of the pass.
        joint: usize,
    },
}

impl std::fmt::Display for Unidentified {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoExperiments => write!(f, "no experiments"),
            Self::AllDegenerate { dropped } => {
                write!(f, "all {dropped} experiments degenerate")
            }
            Self::Cancelled { experiments } => {
                write!(f, "{experiments} estimates cancel out")
            }
            Self::BlockedBy { joint } => write!(f, "blocked by unidentified joint {joint}"),
        }
    }
}

/// Outcome of identifying one joint.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisEstimate {
    /// A unit axis was produced.
    Identified {
        /// Rotation axis in the joint's local frame.
        axis: Unit<Vector3<f64>>,
        /// Experiments averaged into the axis.
        experiments: usize,
        /// Experiments dropped for a near-zero `sin Δθ`.
        degenerate: usize,
        /// Largest angle (rad) between a single-experiment estimate and the axis.
        spread: f64,
    },
    /// No axis could be produced.
    Unidentified(Unidentified),
}

impl AxisEstimate {
    /// The identified axis, if any.
    #[must_use]
    pub const fn axis(&self) -> Option<&Unit<Vector3<f64>>> {
        match self {
            Self::Identified { axis, .. } => Some(axis),
            Self::Unidentified(_) => None,
        }
    }

    /// Whether an axis was produced.
    #[must_use]
    pub const fn is_identified(&self) -> bool {
        matches!(self, Self::Identified { .. })
    }
}

/// Axes of every joint from one identification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisIdentification {
    direction: Direction,
    estimates: Vec<AxisEstimate>,
}

impl AxisIdentification {
    /// Direction of the pass.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of joints.
    #[must_use]
    pub fn n_joints(&self) -> usize {
        self.estimates.len()
    }

    /// Per-joint outcomes, indexed by joint.
    #[must_use]
    pub fn estimates(&self) -> &[AxisEstimate] {
        &self.estimates
    }

    /// Outcome for `joint`.
    ///
    /// # Panics
    ///
    /// Panics if `joint` is out of range.
    #[must_use]
    pub fn estimate(&self, joint: usize) -> &AxisEstimate {
        &self.estimates[joint]
    }

    /// Axis of `joint`, if identified.
    #[must_use]
    pub fn axis(&self, joint: usize) -> Option<Vector3<f64>> {
        self.estimates
            .get(joint)
            .and_then(AxisEstimate::axis)
            .map(|a| a.into_inner())
    }

    /// Joints without an axis.
    #[must_use]
    pub fn unidentified_joints(&self) -> Vec<usize> {
        self.estimates
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_identified())
            .map(|(joint, _)| joint)
            .collect()
    }

    /// Whether every joint has an axis.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.estimates.iter().all(AxisEstimate::is_identified)
    }

    /// Axes as a `3 × n_joints` matrix, one unit column per joint.
    ///
    /// # Errors
    ///
    /// Returns [`IdentError::InsufficientCoverage`] listing the joints
    /// without an axis; no column is ever filled with a placeholder.
    pub fn to_matrix(&self) -> Result<Matrix3xX<f64>> {
        let missing = self.unidentified_joints();
        if !missing.is_empty() {
            return Err(IdentError::insufficient_coverage(missing));
        }
        let columns: Vec<Vector3<f64>> = self
            .estimates
            .iter()
            .filter_map(AxisEstimate::axis)
            .map(|a| a.into_inner())
            .collect();
        Ok(Matrix3xX::from_columns(&columns))
    }
}

/// Working state for one joint while its experiments are processed.
#[derive(Debug, Default)]
struct JointAccumulator {
    estimates: Vec<Vector3<f64>>,
    degenerate: usize,
}

impl JointAccumulator {
    fn finish(self) -> AxisEstimate {
        if self.estimates.is_empty() {
            return AxisEstimate::Unidentified(if self.degenerate == 0 {
                Unidentified::NoExperiments
            } else {
                Unidentified::AllDegenerate {
                    dropped: self.degenerate,
                }
            });
        }
        match mean_direction(&self.estimates) {
            Some(axis) => AxisEstimate::Identified {
                spread: max_angular_deviation(&self.estimates, &axis),
                axis,
                experiments: self.estimates.len(),
                degenerate: self.degenerate,
            },
            None => AxisEstimate::Unidentified(Unidentified::Cancelled {
                experiments: self.estimates.len(),
            }),
        }
    }
}

/// Identify every joint's axis in the given `direction`.
#[must_use]
pub fn identify_axes(
    experiments: &ExperimentSet,
    direction: Direction,
    config: &IdentConfig,
) -> AxisIdentification {
    match direction {
        Direction::Forward => identify_forward(experiments, config),
        Direction::Backward => identify_backward(experiments, config),
    }
}

/// Identify axes in ascending joint order.
#[must_use]
pub fn identify_forward(experiments: &ExperimentSet, config: &IdentConfig) -> AxisIdentification {
    run_pass(experiments, config, Direction::Forward, forward_relative_rotation)
}

/// Identify axes in descending joint order.
#[must_use]
pub fn identify_backward(experiments: &ExperimentSet, config: &IdentConfig) -> AxisIdentification {
    run_pass(experiments, config, Direction::Backward, backward_relative_rotation)
}

/// Identify axes in both directions concurrently.
#[must_use]
pub fn identify_both(
    experiments: &ExperimentSet,
    config: &IdentConfig,
) -> (AxisIdentification, AxisIdentification) {
    rayon::join(
        || identify_forward(experiments, config),
        || identify_backward(experiments, config),
    )
}

/// Rotation attributable to the moving joint alone, forward pass.
///
/// `identified` holds the joints below the mover in ascending order; their
/// rotations are composed on the right to rebuild the chain `A` below it.
#[must_use]
pub fn forward_relative_rotation(
    pair: &ExperimentPair,
    identified: &[(usize, Unit<Vector3<f64>>)],
    order: RpyOrder,
) -> Matrix3<f64> {
    let below = identified.iter().fold(Matrix3::<f64>::identity(), |chain, (joint, axis)| {
        chain * rot_angle_axis(pair.after.joints[*joint], axis)
    });
    let r_before = pair.before.orientation(order);
    let r_after = pair.after.orientation(order);
    below.transpose() * r_after * r_before.transpose() * below
}

/// Rotation attributable to the moving joint alone, backward pass.
///
/// `identified` holds the joints above the mover in descending order; their
/// rotations are composed on the left to rebuild the chain `B` above it.
#[must_use]
pub fn backward_relative_rotation(
    pair: &ExperimentPair,
    identified: &[(usize, Unit<Vector3<f64>>)],
    order: RpyOrder,
) -> Matrix3<f64> {
    let above = identified.iter().fold(Matrix3::<f64>::identity(), |chain, (joint, axis)| {
        rot_angle_axis(pair.after.joints[*joint], axis) * chain
    });
    let r_before = pair.before.orientation(order);
    let r_after = pair.after.orientation(order);
    above * r_before.transpose() * r_after * above.transpose()
}

type RelativeRotation =
    fn(&ExperimentPair, &[(usize, Unit<Vector3<f64>>)], RpyOrder) -> Matrix3<f64>;

fn run_pass(
    experiments: &ExperimentSet,
    config: &IdentConfig,
    direction: Direction,
    relative_rotation: RelativeRotation,
) -> AxisIdentification {
    let n_joints = experiments.n_joints();
    let mut estimates = vec![AxisEstimate::Unidentified(Unidentified::NoExperiments); n_joints];
    let mut identified: Vec<(usize, Unit<Vector3<f64>>)> = Vec::with_capacity(n_joints);
    let mut blocked_by: Option<usize> = None;

    for joint in direction.joint_order(n_joints) {
        if let Some(blocker) = blocked_by {
            estimates[joint] = AxisEstimate::Unidentified(Unidentified::BlockedBy { joint: blocker });
            continue;
        }

        let mut accumulator = JointAccumulator::default();
        for pair in experiments.for_joint(joint) {
            let delta = pair.joint_delta(joint);
            if is_degenerate_angle(delta, config.degenerate_sin_tolerance) {
                debug!(joint, row = pair.row, delta, "Dropping degenerate experiment");
                accumulator.degenerate += 1;
                continue;
            }
            let rotation = relative_rotation(pair, &identified, config.rpy_order);
            accumulator.estimates.push(axis_from_rotation(&rotation, delta));
        }

        let estimate = accumulator.finish();
        match &estimate {
            AxisEstimate::Identified {
                axis,
                experiments,
                degenerate,
                spread,
            } => {
                debug!(
                    joint,
                    %direction,
                    x = axis.x,
                    y = axis.y,
                    z = axis.z,
                    experiments,
                    degenerate,
                    spread,
                    "Axis identified"
                );
                identified.push((joint, *axis));
            }
            AxisEstimate::Unidentified(reason) => {
                warn!(joint, %direction, %reason, "Axis could not be identified");
                blocked_by = Some(joint);
            }
        }
        estimates[joint] = estimate;
    }

    info!(
        %direction,
        identified = identified.len(),
        n_joints,
        "Identification pass complete"
    );
    AxisIdentification {
        direction,
        estimates,
    }
}
