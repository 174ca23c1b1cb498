//! End-to-end joint axis identification.
//!
//! Chains classification, experiment grouping, one or both identification
//! passes and the agreement check into a single call.

use nalgebra::Matrix3xX;
use tracing::{info, info_span};

use crate::classifier::{LabeledTable, MotionClassifier};
use crate::config::{IdentConfig, Traversal};
use crate::error::{IdentError, Result};
use crate::experiments::ExperimentSet;
use crate::identifier::{identify_axes, identify_both, AxisIdentification, Direction};
use crate::sample::SampleTable;
use crate::validation::{compare_directions, AgreementReport};

/// Everything produced while identifying a chain's joint axes.
#[derive(Debug, Clone)]
pub struct CalibrationReport {
    /// Per-row motion labels.
    pub labeled: LabeledTable,
    /// Experiments grouped by joint.
    pub experiments: ExperimentSet,
    /// Forward pass result, if run.
    pub forward: Option<AxisIdentification>,
    /// Backward pass result, if run.
    pub backward: Option<AxisIdentification>,
    /// Forward/backward comparison, if both passes ran.
    pub agreement: Option<AgreementReport>,
}

impl CalibrationReport {
    /// Result of the pass run in `direction`.
    #[must_use]
    pub const fn identification(&self, direction: Direction) -> Option<&AxisIdentification> {
        match direction {
            Direction::Forward => self.forward.as_ref(),
            Direction::Backward => self.backward.as_ref(),
        }
    }

    /// Preferred result: the forward pass when run, otherwise the backward one.
    #[must_use]
    pub fn primary(&self) -> Option<&AxisIdentification> {
        self.forward.as_ref().or(self.backward.as_ref())
    }

    /// Axes of the preferred pass as a `3 × n_joints` matrix.
    ///
    /// # Errors
    ///
    /// Returns [`IdentError::InsufficientCoverage`] if any joint is
    /// unidentified.
    pub fn axes(&self) -> Result<Matrix3xX<f64>> {
        match self.primary() {
            Some(identification) => identification.to_matrix(),
            None => Err(IdentError::insufficient_coverage(
                (0..self.labeled.n_joints()).collect::<Vec<_>>(),
            )),
        }
    }
}

/// Identify every joint axis of `samples`.
///
/// Negative tolerances in `config` are corrected before use.
///
/// # Errors
///
/// Returns [`IdentError::InvalidConfig`] for an unusable configuration and
/// [`IdentError::InsufficientCoverage`] when the recording is not a valid
/// calibration dataset (the first row is not a rejection, or the highest
/// joint never moved alone).
pub fn identify_joint_axes(
    samples: &SampleTable,
    config: &IdentConfig,
) -> Result<CalibrationReport> {
    let _span = info_span!(
        "identify_joint_axes",
        rows = samples.n_rows(),
        joints = samples.n_joints()
    )
    .entered();

    let config = config.sanitized();
    config.validate()?;

    let labeled = MotionClassifier::from_config(&config).classify(samples);
    if !labeled.is_valid() {
        return Err(IdentError::insufficient_coverage(labeled.missing_joints()));
    }

    let experiments = ExperimentSet::split(&labeled);

    let (forward, backward) = match config.traversal {
        Traversal::Both => {
            let (f, b) = identify_both(&experiments, &config);
            (Some(f), Some(b))
        }
        Traversal::Forward => (
            Some(identify_axes(&experiments, Direction::Forward, &config)),
            None,
        ),
        Traversal::Backward => (
            None,
            Some(identify_axes(&experiments, Direction::Backward, &config)),
        ),
    };

    let agreement = match (&forward, &backward) {
        (Some(f), Some(b)) => Some(compare_directions(f, b, config.agreement_tolerance)?),
        _ => None,
    };

    info!(
        traversal = ?config.traversal,
        experiments = experiments.total(),
        complete = forward
            .as_ref()
            .or(backward.as_ref())
            .is_some_and(AxisIdentification::is_complete),
        "Joint axis identification finished"
    );

    Ok(CalibrationReport {
        labeled,
        experiments,
        forward,
        backward,
        agreement,
    })
}
