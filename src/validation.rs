//! Agreement checks between identification passes.
//!
//! The forward and backward passes correct each experiment with disjoint
//! sets of joints. On consistent data they recover the same axes; a
//! disagreement points at sensor mounting offsets, noise, or a
//! misconfigured roll/pitch/yaw order.

use tracing::{info, warn};

use crate::error::{IdentError, Result};
use crate::identifier::AxisIdentification;
use crate::math::angle_between;
use crate::math::linalg::max_component_difference;

/// Comparison of one joint's axis across two passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAgreement {
    /// Joint index.
    pub joint: usize,
    /// Largest absolute component difference, if both passes identified the joint.
    pub max_difference: Option<f64>,
    /// Angle (rad) between the two axes, if both passes identified the joint.
    pub angle: Option<f64>,
}

/// Comparison of two identification passes.
#[derive(Debug, Clone, PartialEq)]
pub struct AgreementReport {
    /// Per-joint comparison, indexed by joint.
    pub joints: Vec<JointAgreement>,

    /// Largest component difference over all joints compared.
    pub max_difference: f64,

    /// Tolerance applied to `max_difference`.
    pub tolerance: f64,

    /// Whether every joint was identified by both passes within tolerance.
    pub agrees: bool,
}

impl AgreementReport {
    /// Joints whose axes differ by more than the tolerance, or that one
    /// pass failed to identify.
    #[must_use]
    pub fn disagreeing_joints(&self) -> Vec<usize> {
        self.joints
            .iter()
            .filter(|j| !matches!(j.max_difference, Some(d) if d <= self.tolerance))
            .map(|j| j.joint)
            .collect()
    }
}

/// Compare the axes of two passes joint by joint.
///
/// # Errors
///
/// Returns [`IdentError::InvalidInput`] if the passes cover different
/// numbers of joints.
pub fn compare_directions(
    a: &AxisIdentification,
    b: &AxisIdentification,
    tolerance: f64,
) -> Result<AgreementReport> {
    if a.n_joints() != b.n_joints() {
        return Err(IdentError::invalid_input(format!(
            "cannot compare passes over {} and {} joints",
            a.n_joints(),
            b.n_joints()
        )));
    }

    let joints: Vec<JointAgreement> = (0..a.n_joints())
        .map(|joint| match (a.axis(joint), b.axis(joint)) {
            (Some(x), Some(y)) => JointAgreement {
                joint,
                max_difference: Some(max_component_difference(&x, &y)),
                angle: Some(angle_between(&x, &y)),
            },
            _ => JointAgreement {
                joint,
                max_difference: None,
                angle: None,
            },
        })
        .collect();

    let max_difference = joints
        .iter()
        .filter_map(|j| j.max_difference)
        .fold(0.0, f64::max);
    let all_compared = joints.iter().all(|j| j.max_difference.is_some());
    let agrees = all_compared && max_difference <= tolerance;

    let report = AgreementReport {
        joints,
        max_difference,
        tolerance,
        agrees,
    };

    if agrees {
        info!(max_difference, tolerance, "Forward and backward axes agree");
    } else {
        warn!(
            max_difference,
            tolerance,
            joints = ?report.disagreeing_joints(),
            "Forward and backward axes disagree"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentConfig;
    use crate::experiments::{ExperimentPair, ExperimentSet};
    use crate::identifier::{identify_backward, identify_forward};
    use crate::math::{rot_angle_axis, rpy_from_rotation, RpyOrder};
    use crate::sample::Sample;
    use approx::assert_abs_diff_eq;
    use nalgebra::{DVector, Matrix3, Vector3};

    fn sample(axes: &[Vector3<f64>], q: &[f64], offset: &Matrix3<f64>) -> Sample {
        let rot = axes
            .iter()
            .zip(q)
            .fold(Matrix3::<f64>::identity(), |r, (h, &angle)| r * rot_angle_axis(angle, h))
            * offset;
        let (roll, pitch, yaw) = rpy_from_rotation(&rot, RpyOrder::Reverse);
        Sample {
            joints: DVector::from_column_slice(q),
            rpy: Vector3::new(roll, pitch, yaw),
        }
    }

    fn experiments(offset: &Matrix3<f64>) -> ExperimentSet {
        let axes = [Vector3::z(), Vector3::x()];
        let pair = |before: &[f64], after: &[f64]| ExperimentPair {
            row: 1,
            before: sample(&axes, before, offset),
            after: sample(&axes, after, offset),
        };
        ExperimentSet::new(vec![
            vec![pair(&[0.0, 0.0], &[0.5, 0.0])],
            vec![pair(&[0.5, 0.0], &[0.5, 0.7])],
        ])
    }

    #[test]
    fn test_consistent_passes_agree() {
        let set = experiments(&Matrix3::identity());
        let config = IdentConfig::default();
        let report = compare_directions(
            &identify_forward(&set, &config),
            &identify_backward(&set, &config),
            1e-9,
        )
        .unwrap();
        assert!(report.agrees);
        assert!(report.disagreeing_joints().is_empty());
        assert_eq!(report.joints.len(), 2);
        assert_abs_diff_eq!(report.max_difference, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sensor_offset_breaks_agreement() {
        // A sensor mounted at an angle leaves forward estimates intact but
        // rotates the backward ones.
        let offset = rot_angle_axis(0.6, &Vector3::y());
        let set = experiments(&offset);
        let config = IdentConfig::default();
        let forward = identify_forward(&set, &config);
        assert_abs_diff_eq!(forward.axis(1).unwrap(), Vector3::x(), epsilon = 1e-10);

        let report =
            compare_directions(&forward, &identify_backward(&set, &config), 1e-6).unwrap();
        assert!(!report.agrees);
        assert!(report.max_difference > 0.1);
        assert!(!report.disagreeing_joints().is_empty());
    }

    #[test]
    fn test_unidentified_joint_never_agrees() {
        let set = ExperimentSet::new(vec![
            experiments(&Matrix3::identity()).for_joint(0).to_vec(),
            Vec::new(),
        ]);
        let config = IdentConfig::default();
        let report = compare_directions(
            &identify_forward(&set, &config),
            &identify_backward(&set, &config),
            1.0,
        )
        .unwrap();
        assert!(!report.agrees);
        assert_eq!(report.joints[1].angle, None);
        assert_eq!(report.disagreeing_joints(), vec![0, 1]);
    }

    #[test]
    fn test_mismatched_joint_counts_rejected() {
        let config = IdentConfig::default();
        let two = identify_forward(&experiments(&Matrix3::identity()), &config);
        let one = identify_forward(
            &ExperimentSet::new(vec![experiments(&Matrix3::identity()).for_joint(0).to_vec()]),
            &config,
        );
        assert!(matches!(
            compare_directions(&two, &one, 1e-6),
            Err(IdentError::InvalidInput(_))
        ));
    }
}
