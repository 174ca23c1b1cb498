//! Joint Axes Library
//!
//! Identification of the physical rotation axis of every joint of a serial
//! kinematic chain from a calibration recording.
//!
//! A calibration recording moves the joints one at a time while logging
//! every encoder position together with the orientation reported by a
//! sensor mounted at the end of the chain. Each single-joint motion is an
//! experiment: the change in orientation, once the rotations of the other
//! joints are factored out, is a pure rotation about that joint's axis.
//!
//! # Pipeline
//!
//! 1. [`MotionClassifier`]: label each row with the single joint that moved
//!    since the previous row, or reject it.
//! 2. [`ExperimentSet`]: group adjacent `(before, after)` rows by joint.
//! 3. Identification: visit joints base-to-sensor ([`Direction::Forward`])
//!    or sensor-to-base ([`Direction::Backward`]), correcting each
//!    experiment with the axes identified so far.
//! 4. [`compare_directions`]: check both passes against each other.
//!
//! # Quick Start
//!
//! ```
//! use joint_axes::{identify_joint_axes, IdentConfig, SampleTable};
//!
//! // Joint 0 turns about z, joint 1 about x.
//! // Columns: q0, q1, roll, pitch, yaw
//! let rows = vec![
//!     vec![0.0, 0.0, 0.0, 0.0, 0.0],
//!     vec![0.4, 0.0, 0.0, 0.0, 0.4],
//!     vec![0.4, 0.5, 0.5, 0.0, 0.4],
//!     vec![0.8, 0.5, 0.5, 0.0, 0.8],
//!     vec![0.8, 0.9, 0.9, 0.0, 0.8],
//! ];
//! let samples = SampleTable::from_rows(&rows, 2)?;
//!
//! let report = identify_joint_axes(&samples, &IdentConfig::default())?;
//! let axes = report.axes()?;
//! assert!((axes[(2, 0)] - 1.0).abs() < 1e-9);
//! assert!((axes[(0, 1)] - 1.0).abs() < 1e-9);
//! # Ok::<(), joint_axes::IdentError>(())
//! ```
//!
//! # Presets
//!
//! ```
//! use joint_axes::IdentConfig;
//!
//! let exact = IdentConfig::synthetic();
//! let noisy = IdentConfig::imu();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod calibration;
pub mod classifier;
pub mod config;
pub mod error;
pub mod experiments;
pub mod identifier;
pub mod math;
pub mod parser;
pub mod sample;
pub mod validation;

// Re-exports for convenient access
pub use calibration::{identify_joint_axes, CalibrationReport};
pub use classifier::{
    classify_motion, LabeledTable, MotionClassifier, Rejection, RowLabel, INVALID_LABEL,
};
pub use config::{IdentConfig, Traversal};
pub use error::{IdentError, Result};
pub use experiments::{ExperimentPair, ExperimentSet};
pub use identifier::{
    backward_relative_rotation, forward_relative_rotation, identify_axes, identify_backward,
    identify_both, identify_forward, AxisEstimate, AxisIdentification, Direction, Unidentified,
};
pub use math::RpyOrder;
pub use parser::{load_samples, ReaderOptions, TableReader};
pub use sample::{Sample, SampleTable, MIN_ROWS, ORIENTATION_COLUMNS};
pub use validation::{compare_directions, AgreementReport, JointAgreement};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
