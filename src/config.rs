//! Configuration for joint axis identification.
//!
//! This module provides the [`IdentConfig`] struct which centralizes all
//! tunable parameters of motion classification and axis identification,
//! along with presets for clean and noisy recordings.
//!
//! # Example
//!
//! ```
//! use joint_axes::{IdentConfig, Traversal};
//!
//! // Use default configuration
//! let config = IdentConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // Start from a preset and override single fields
//! let imu = IdentConfig::imu()
//!     .with_stall_tolerance(5e-4)
//!     .with_traversal(Traversal::Forward);
//! ```

use tracing::warn;

use crate::error::{IdentError, Result};
use crate::identifier::Direction;
use crate::math::RpyOrder;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for joint axis identification.
///
/// # Classification Parameters
///
/// - `stall_tolerance`: Largest motion (rad) tolerated on joints that should stay still.
/// - `min_movement_tolerance`: Smallest motion (rad) of the moving joint for a row to count.
///
/// # Identification Parameters
///
/// - `degenerate_sin_tolerance`: Experiments with `|sin Δθ|` below this are dropped.
/// - `rpy_order`: Composition convention of the orientation sensor.
/// - `traversal`: Which joint processing orders to run.
/// - `agreement_tolerance`: Largest per-component difference accepted between directions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IdentConfig {
    /// Largest absolute encoder change (rad) allowed on any joint other than
    /// the mover. Rows exceeding it are rejected as multi-joint motions.
    pub stall_tolerance: f64,

    /// Smallest absolute encoder change (rad) of the mover. Rows below it
    /// are rejected as settling or duplicate samples.
    pub min_movement_tolerance: f64,

    /// Threshold on `|sin Δθ|` below which a single experiment carries no
    /// axis information (Δθ ≈ 0 or Δθ ≈ π).
    pub degenerate_sin_tolerance: f64,

    /// Composition order of the sensor's roll/pitch/yaw angles.
    pub rpy_order: RpyOrder,

    /// Joint processing orders to run.
    pub traversal: Traversal,

    /// Largest absolute per-component difference between the forward and
    /// backward estimate of the same axis.
    pub agreement_tolerance: f64,
}

/// Joint processing orders run by the identification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Traversal {
    /// Ascending joint order only.
    Forward,
    /// Descending joint order only.
    Backward,
    /// Both orders, followed by an agreement check.
    #[default]
    Both,
}

impl Traversal {
    /// Directions covered by this traversal, forward first.
    #[must_use]
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Self::Forward => &[Direction::Forward],
            Self::Backward => &[Direction::Backward],
            Self::Both => &[Direction::Forward, Direction::Backward],
        }
    }

    /// Whether `direction` is run.
    #[must_use]
    pub fn includes(self, direction: Direction) -> bool {
        self.directions().contains(&direction)
    }
}

impl Default for IdentConfig {
    fn default() -> Self {
        Self {
            stall_tolerance: 2e-4,
            min_movement_tolerance: 1e-3,
            degenerate_sin_tolerance: 1e-6,
            rpy_order: RpyOrder::Reverse,
            traversal: Traversal::Both,
            agreement_tolerance: 5e-5,
        }
    }
}

impl IdentConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// Negative tolerances are accepted here because [`Self::sanitized`]
    /// corrects them; only values without a safe correction are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is NaN or infinite, or if
    /// `degenerate_sin_tolerance` is not within `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        let tolerances = [
            ("stall_tolerance", self.stall_tolerance),
            ("min_movement_tolerance", self.min_movement_tolerance),
            ("degenerate_sin_tolerance", self.degenerate_sin_tolerance),
            ("agreement_tolerance", self.agreement_tolerance),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() {
                return Err(IdentError::invalid_config(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        let sin_tol = self.degenerate_sin_tolerance.abs();
        if sin_tol <= 0.0 || sin_tol >= 1.0 {
            return Err(IdentError::invalid_config(
                "degenerate_sin_tolerance must be within (0, 1)",
            ));
        }
        Ok(())
    }

    /// Copy of this configuration with every negative tolerance replaced by
    /// its magnitude. Each correction is reported with a warning.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            stall_tolerance: corrected_tolerance("stall_tolerance", self.stall_tolerance),
            min_movement_tolerance: corrected_tolerance(
                "min_movement_tolerance",
                self.min_movement_tolerance,
            ),
            degenerate_sin_tolerance: corrected_tolerance(
                "degenerate_sin_tolerance",
                self.degenerate_sin_tolerance,
            ),
            agreement_tolerance: corrected_tolerance(
                "agreement_tolerance",
                self.agreement_tolerance,
            ),
            ..self.clone()
        }
    }

    /// Preset for data generated from an exact kinematic model.
    #[must_use]
    pub fn synthetic() -> Self {
        Self {
            stall_tolerance: 1e-9,
            min_movement_tolerance: 1e-6,
            agreement_tolerance: 1e-9,
            ..Self::default()
        }
    }

    /// Preset for recordings from a real IMU with encoder jitter.
    #[must_use]
    pub fn imu() -> Self {
        Self {
            stall_tolerance: 1e-3,
            min_movement_tolerance: 1e-2,
            agreement_tolerance: 5e-3,
            ..Self::default()
        }
    }

    /// Set the stall tolerance.
    #[must_use]
    pub const fn with_stall_tolerance(mut self, tolerance: f64) -> Self {
        self.stall_tolerance = tolerance;
        self
    }

    /// Set the minimum movement tolerance.
    #[must_use]
    pub const fn with_min_movement_tolerance(mut self, tolerance: f64) -> Self {
        self.min_movement_tolerance = tolerance;
        self
    }

    /// Set the degenerate-angle tolerance.
    #[must_use]
    pub const fn with_degenerate_sin_tolerance(mut self, tolerance: f64) -> Self {
        self.degenerate_sin_tolerance = tolerance;
        self
    }

    /// Set the sensor's roll/pitch/yaw composition order.
    #[must_use]
    pub const fn with_rpy_order(mut self, order: RpyOrder) -> Self {
        self.rpy_order = order;
        self
    }

    /// Set which traversal directions run.
    #[must_use]
    pub const fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// Set the forward/backward agreement tolerance.
    #[must_use]
    pub const fn with_agreement_tolerance(mut self, tolerance: f64) -> Self {
        self.agreement_tolerance = tolerance;
        self
    }
}

/// Magnitude of `value`, warning when the sign had to be dropped.
pub(crate) fn corrected_tolerance(name: &str, value: f64) -> f64 {
    if value < 0.0 {
        warn!(
            parameter = name,
            supplied = value,
            corrected = -value,
            "Negative tolerance replaced by its magnitude"
        );
        -value
    } else {
        value
    }
}
