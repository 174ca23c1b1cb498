//! Calibration sample table.
//!
//! One row per calibration instant with the fixed column layout
//! `[q_0 .. q_{N-1}, roll, pitch, yaw]`, where `q_j` is joint `j`'s encoder
//! position in radians and the last three columns are the orientation
//! sensor's reading. A [`SampleTable`] is validated once on construction and
//! immutable afterwards.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use tracing::warn;

use crate::error::{IdentError, Result};
use crate::math::{rot_rpy, RpyOrder};

/// Number of orientation columns following the joint columns.
pub const ORIENTATION_COLUMNS: usize = 3;

/// Minimum number of rows: one motion needs a before and an after sample.
pub const MIN_ROWS: usize = 2;

/// Validated, immutable table of calibration samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    data: DMatrix<f64>,
    n_joints: usize,
}

impl SampleTable {
    /// Wrap a numeric matrix with `n_joints + 3` columns.
    ///
    /// # Errors
    ///
    /// Returns an error if `n_joints` is zero, the column count does not
    /// match, there are fewer than [`MIN_ROWS`] rows, or any value is NaN
    /// or infinite.
    pub fn new(data: DMatrix<f64>, n_joints: usize) -> Result<Self> {
        if n_joints == 0 {
            return Err(IdentError::invalid_input("at least one joint is required"));
        }
        let expected = n_joints + ORIENTATION_COLUMNS;
        if data.ncols() != expected {
            return Err(IdentError::column_mismatch(n_joints, expected, data.ncols()));
        }
        if data.nrows() < MIN_ROWS {
            return Err(IdentError::too_few_rows(MIN_ROWS, data.nrows()));
        }
        for row in 0..data.nrows() {
            for column in 0..data.ncols() {
                if !data[(row, column)].is_finite() {
                    return Err(IdentError::NonFinite { row, column });
                }
            }
        }
        if data.nrows() < n_joints + 1 {
            warn!(
                rows = data.nrows(),
                needed = n_joints + 1,
                "Not enough rows for every joint to move; not all axes will be identified"
            );
        }
        Ok(Self { data, n_joints })
    }

    /// Build a table from row vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows have different lengths, or for any
    /// reason listed in [`SampleTable::new`].
    pub fn from_rows(rows: &[Vec<f64>], n_joints: usize) -> Result<Self> {
        let n_cols = rows.first().map_or(0, Vec::len);
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(IdentError::RaggedRow {
                line: index + 1,
                expected: n_cols,
                actual: row.len(),
            });
        }
        let data = DMatrix::from_row_iterator(rows.len(), n_cols, rows.iter().flatten().copied());
        Self::new(data, n_joints)
    }

    /// Number of joints in the chain.
    #[must_use]
    pub const fn n_joints(&self) -> usize {
        self.n_joints
    }

    /// Number of samples.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Underlying matrix.
    #[must_use]
    pub const fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Encoder position of `joint` at `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `joint` is out of range.
    #[must_use]
    pub fn joint_position(&self, row: usize, joint: usize) -> f64 {
        assert!(joint < self.n_joints, "joint {joint} out of range");
        self.data[(row, joint)]
    }

    /// Encoder positions of every joint at `row`.
    #[must_use]
    pub fn joint_positions(&self, row: usize) -> DVector<f64> {
        DVector::from_iterator(self.n_joints, (0..self.n_joints).map(|j| self.data[(row, j)]))
    }

    /// `[roll, pitch, yaw]` reading at `row`.
    #[must_use]
    pub fn rpy(&self, row: usize) -> Vector3<f64> {
        let base = self.n_joints;
        Vector3::new(
            self.data[(row, base)],
            self.data[(row, base + 1)],
            self.data[(row, base + 2)],
        )
    }

    /// Owned copy of `row`.
    #[must_use]
    pub fn sample(&self, row: usize) -> Sample {
        Sample {
            joints: self.joint_positions(row),
            rpy: self.rpy(row),
        }
    }
}

/// A single calibration instant detached from its table.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Encoder positions, one per joint (rad).
    pub joints: DVector<f64>,
    /// Orientation sensor reading `[roll, pitch, yaw]` (rad).
    pub rpy: Vector3<f64>,
}

impl Sample {
    /// Sensor orientation as a rotation matrix.
    #[must_use]
    pub fn orientation(&self, order: RpyOrder) -> Matrix3<f64> {
        rot_rpy(self.rpy.x, self.rpy.y, self.rpy.z, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_joint_rows() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.5, 0.0, 0.0, 0.0, 0.5],
            vec![0.5, -0.25, -0.25, 0.0, 0.5],
        ]
    }

    #[test]
    fn test_from_rows() {
        let table = SampleTable::from_rows(&two_joint_rows(), 2).unwrap();
        assert_eq!(table.n_joints(), 2);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.joint_position(2, 1), -0.25);
        assert_eq!(table.joint_positions(1).as_slice(), &[0.5, 0.0]);
        assert_eq!(table.rpy(2), Vector3::new(-0.25, 0.0, 0.5));
    }

    #[test]
    fn test_sample_orientation() {
        let table = SampleTable::from_rows(&two_joint_rows(), 2).unwrap();
        let sample = table.sample(1);
        let expected = crate::math::rot_z(0.5);
        assert_abs_diff_eq!(sample.orientation(RpyOrder::Reverse), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_column_mismatch() {
        let err = SampleTable::from_rows(&two_joint_rows(), 3).unwrap_err();
        assert!(matches!(
            err,
            IdentError::ColumnMismatch {
                n_joints: 3,
                expected: 6,
                actual: 5
            }
        ));
    }

    #[test]
    fn test_too_few_rows() {
        let rows = vec![vec![0.0, 0.0, 0.0, 0.0]];
        let err = SampleTable::from_rows(&rows, 1).unwrap_err();
        assert!(matches!(err, IdentError::TooFewRows { min: 2, actual: 1 }));
    }

    #[test]
    fn test_zero_joints() {
        let rows = vec![vec![0.0, 0.0, 0.0]; 2];
        assert!(matches!(
            SampleTable::from_rows(&rows, 0),
            Err(IdentError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ragged_rows() {
        let rows = vec![vec![0.0, 0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]];
        let err = SampleTable::from_rows(&rows, 1).unwrap_err();
        assert!(matches!(err, IdentError::RaggedRow { line: 2, .. }));
    }

    #[test]
    fn test_non_finite() {
        let mut rows = two_joint_rows();
        rows[1][3] = f64::NAN;
        let err = SampleTable::from_rows(&rows, 2).unwrap_err();
        assert!(matches!(err, IdentError::NonFinite { row: 1, column: 3 }));
    }
}
