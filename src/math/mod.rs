//! Mathematical utilities for joint axis identification.
//!
//! This module provides:
//! - [`rotation`]: SO(3) construction, composition and axis extraction
//! - [`linalg`]: direction averaging and vector comparison

pub mod linalg;
pub mod rotation;

pub use linalg::{angle_between, max_angular_deviation, mean_direction};
pub use rotation::{
    axis_from_rotation, is_degenerate_angle, rot_angle_axis, rot_rpy, rot_x, rot_y, rot_z,
    rpy_from_rotation, RpyOrder,
};
