//! Motion classification.
//!
//! Decides, for every pair of consecutive samples, which single joint moved
//! between them. A row is labeled with the mover when exactly one joint
//! changed by at least `min_movement_tolerance` while every other joint
//! stayed within `stall_tolerance`; otherwise it is rejected with a reason.
//!
//! # Dataset Validity
//!
//! A labeled table is usable for identification when its first row is
//! rejected (it has no predecessor) and the highest joint index observed
//! moving is `n_joints - 1`. Lower joints that were never observed moving
//! are still reported through [`LabeledTable::missing_joints`].

use nalgebra::DVector;
use tracing::{debug, info, warn};

use crate::config::{corrected_tolerance, IdentConfig};
use crate::sample::SampleTable;

/// Integer code of a rejected row in [`LabeledTable::label_codes`].
pub const INVALID_LABEL: i64 = -1;

/// Why a row has no reliably identifiable single mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// First row of the dataset; there is nothing to compare against.
    Initial,
    /// No joint moved by at least the minimum movement tolerance.
    NoMotion,
    /// A second joint moved beyond the stall tolerance.
    MultipleJoints {
        /// Joint with the largest motion.
        primary: usize,
        /// Joint with the second largest motion.
        secondary: usize,
    },
}

/// Classification of a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLabel {
    /// Only this joint moved since the previous row.
    Moved(usize),
    /// The row cannot be attributed to a single joint.
    Invalid(Rejection),
}

impl RowLabel {
    /// The moving joint, if any.
    #[must_use]
    pub const fn moved_joint(self) -> Option<usize> {
        match self {
            Self::Moved(joint) => Some(joint),
            Self::Invalid(_) => None,
        }
    }

    /// Whether the row was rejected.
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Integer form: the joint index, or [`INVALID_LABEL`].
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Moved(joint) => i64::try_from(joint).unwrap_or(INVALID_LABEL),
            Self::Invalid(_) => INVALID_LABEL,
        }
    }
}

/// Sample table with one [`RowLabel`] per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    samples: SampleTable,
    labels: Vec<RowLabel>,
}

impl LabeledTable {
    /// The classified samples.
    #[must_use]
    pub const fn samples(&self) -> &SampleTable {
        &self.samples
    }

    /// One label per row.
    #[must_use]
    pub fn labels(&self) -> &[RowLabel] {
        &self.labels
    }

    /// Label of `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    #[must_use]
    pub fn label(&self, row: usize) -> RowLabel {
        self.labels[row]
    }

    /// Label column in integer form.
    #[must_use]
    pub fn label_codes(&self) -> Vec<i64> {
        self.labels.iter().map(|l| l.code()).collect()
    }

    /// Number of joints in the chain.
    #[must_use]
    pub const fn n_joints(&self) -> usize {
        self.samples.n_joints()
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Rows attributed to `joint`, in temporal order.
    pub fn rows_moving(&self, joint: usize) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(move |(_, l)| l.moved_joint() == Some(joint))
            .map(|(row, _)| row)
    }

    /// Rejected rows and their reasons.
    pub fn rejected_rows(&self) -> impl Iterator<Item = (usize, Rejection)> + '_ {
        self.labels.iter().enumerate().filter_map(|(row, l)| match l {
            RowLabel::Invalid(reason) => Some((row, *reason)),
            RowLabel::Moved(_) => None,
        })
    }

    /// Highest joint index observed moving.
    #[must_use]
    pub fn highest_observed_joint(&self) -> Option<usize> {
        self.labels.iter().filter_map(|l| l.moved_joint()).max()
    }

    /// Number of moves attributed to each joint.
    #[must_use]
    pub fn moves_per_joint(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_joints()];
        for joint in self.labels.iter().filter_map(|l| l.moved_joint()) {
            counts[joint] += 1;
        }
        counts
    }

    /// Number of distinct joints observed moving.
    #[must_use]
    pub fn observed_joints(&self) -> usize {
        self.moves_per_joint().iter().filter(|&&c| c > 0).count()
    }

    /// Joints never observed moving on their own.
    #[must_use]
    pub fn missing_joints(&self) -> Vec<usize> {
        self.moves_per_joint()
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == 0)
            .map(|(joint, _)| joint)
            .collect()
    }

    /// Whether the dataset can be used for identification.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let first_rejected = self.labels.first().is_some_and(|l| l.is_invalid());
        first_rejected && self.highest_observed_joint() == Some(self.n_joints() - 1)
    }
}

/// Row-by-row single-mover classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionClassifier {
    stall_tolerance: f64,
    min_movement_tolerance: f64,
}

impl MotionClassifier {
    /// Create a classifier. Negative tolerances are replaced by their
    /// magnitude with a warning.
    #[must_use]
    pub fn new(stall_tolerance: f64, min_movement_tolerance: f64) -> Self {
        Self {
            stall_tolerance: corrected_tolerance("stall_tolerance", stall_tolerance),
            min_movement_tolerance: corrected_tolerance(
                "min_movement_tolerance",
                min_movement_tolerance,
            ),
        }
    }

    /// Create a classifier from the tolerances in `config`.
    #[must_use]
    pub fn from_config(config: &IdentConfig) -> Self {
        Self::new(config.stall_tolerance, config.min_movement_tolerance)
    }

    /// Effective stall tolerance.
    #[must_use]
    pub const fn stall_tolerance(&self) -> f64 {
        self.stall_tolerance
    }

    /// Effective minimum movement tolerance.
    #[must_use]
    pub const fn min_movement_tolerance(&self) -> f64 {
        self.min_movement_tolerance
    }

    /// Label the motion from `previous` to `current` joint positions.
    ///
    /// Ties in the largest motion resolve to the lowest joint index.
    #[must_use]
    pub fn classify_step(&self, previous: &DVector<f64>, current: &DVector<f64>) -> RowLabel {
        let diff: Vec<f64> = current
            .iter()
            .zip(previous.iter())
            .map(|(c, p)| (c - p).abs())
            .collect();

        let Some((primary, peak)) = argmax(diff.iter().copied().enumerate()) else {
            return RowLabel::Invalid(Rejection::NoMotion);
        };
        if peak < self.min_movement_tolerance {
            return RowLabel::Invalid(Rejection::NoMotion);
        }

        let others = diff.iter().copied().enumerate().filter(|&(j, _)| j != primary);
        match argmax(others) {
            Some((secondary, stall)) if stall > self.stall_tolerance => {
                RowLabel::Invalid(Rejection::MultipleJoints { primary, secondary })
            }
            _ => RowLabel::Moved(primary),
        }
    }

    /// Label every row of `table`.
    #[must_use]
    pub fn classify(&self, table: &SampleTable) -> LabeledTable {
        let mut labels = Vec::with_capacity(table.n_rows());
        labels.push(RowLabel::Invalid(Rejection::Initial));

        let mut previous = table.joint_positions(0);
        for row in 1..table.n_rows() {
            let current = table.joint_positions(row);
            let label = self.classify_step(&previous, &current);
            if let RowLabel::Invalid(reason) = label {
                debug!(row, ?reason, "Row rejected");
            }
            labels.push(label);
            previous = current;
        }

        let labeled = LabeledTable {
            samples: table.clone(),
            labels,
        };

        let rejected = labeled.rejected_rows().count();
        info!(
            rows = labeled.n_rows(),
            rejected,
            observed_joints = labeled.observed_joints(),
            n_joints = labeled.n_joints(),
            "Motion classification complete"
        );
        if !labeled.is_valid() {
            warn!(
                highest_observed = ?labeled.highest_observed_joint(),
                missing = ?labeled.missing_joints(),
                "Dataset does not observe the last joint moving; it cannot be used"
            );
        }
        labeled
    }
}

/// Label every row of `table` with the tolerances from `config`.
#[must_use]
pub fn classify_motion(table: &SampleTable, config: &IdentConfig) -> LabeledTable {
    MotionClassifier::from_config(config).classify(table)
}

/// Index and value of the largest entry; the first one wins ties.
fn argmax(values: impl Iterator<Item = (usize, f64)>) -> Option<(usize, f64)> {
    values.fold(None, |best, (i, v)| match best {
        Some((_, b)) if v <= b => best,
        _ => Some((i, v)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(values: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(values)
    }

    fn table(rows: &[&[f64]], n_joints: usize) -> SampleTable {
        let rows: Vec<Vec<f64>> = rows
            .iter()
            .map(|q| {
                let mut row = q.to_vec();
                row.extend_from_slice(&[0.0, 0.0, 0.0]);
                row
            })
            .collect();
        SampleTable::from_rows(&rows, n_joints).unwrap()
    }

    #[test]
    fn test_single_mover() {
        let classifier = MotionClassifier::new(2e-4, 1e-3);
        let label = classifier.classify_step(&positions(&[0.0, 0.0, 0.0]), &positions(&[0.0, 0.3, 1e-4]));
        assert_eq!(label, RowLabel::Moved(1));
    }

    #[test]
    fn test_negative_motion_counts() {
        let classifier = MotionClassifier::new(2e-4, 1e-3);
        let label = classifier.classify_step(&positions(&[0.5, 0.0]), &positions(&[0.1, 0.0]));
        assert_eq!(label, RowLabel::Moved(0));
    }

    #[test]
    fn test_no_motion() {
        let classifier = MotionClassifier::new(2e-4, 1e-3);
        let label = classifier.classify_step(&positions(&[0.0, 0.0]), &positions(&[5e-4, 0.0]));
        assert_eq!(label, RowLabel::Invalid(Rejection::NoMotion));
    }

    #[test]
    fn test_multiple_movers() {
        let classifier = MotionClassifier::new(2e-4, 1e-3);
        let label =
            classifier.classify_step(&positions(&[0.0, 0.0, 0.0]), &positions(&[0.01, 0.0, 0.3]));
        assert_eq!(
            label,
            RowLabel::Invalid(Rejection::MultipleJoints {
                primary: 2,
                secondary: 0
            })
        );
    }

    #[test]
    fn test_tie_resolves_to_lowest_index() {
        let classifier = MotionClassifier::new(0.5, 1e-3);
        let label = classifier.classify_step(&positions(&[0.0, 0.0, 0.0]), &positions(&[0.0, 0.2, 0.2]));
        assert_eq!(label, RowLabel::Moved(1));
    }

    #[test]
    fn test_single_joint_chain() {
        let classifier = MotionClassifier::new(2e-4, 1e-3);
        let label = classifier.classify_step(&positions(&[0.0]), &positions(&[0.2]));
        assert_eq!(label, RowLabel::Moved(0));
    }

    #[test]
    fn test_negative_tolerances_corrected() {
        let classifier = MotionClassifier::new(-2e-4, -1e-3);
        assert_eq!(classifier, MotionClassifier::new(2e-4, 1e-3));
        assert_eq!(classifier.stall_tolerance(), 2e-4);
        assert_eq!(classifier.min_movement_tolerance(), 1e-3);
    }

    #[test]
    fn test_classify_table() {
        let samples = table(
            &[
                &[0.0, 0.0],
                &[0.2, 0.0],
                &[0.2, 0.0],
                &[0.2, 0.3],
                &[0.5, 0.7],
                &[0.1, 0.7],
            ],
            2,
        );
        let labeled = MotionClassifier::new(2e-4, 1e-3).classify(&samples);

        assert_eq!(
            labeled.labels(),
            &[
                RowLabel::Invalid(Rejection::Initial),
                RowLabel::Moved(0),
                RowLabel::Invalid(Rejection::NoMotion),
                RowLabel::Moved(1),
                RowLabel::Invalid(Rejection::MultipleJoints {
                    primary: 1,
                    secondary: 0
                }),
                RowLabel::Moved(0),
            ]
        );
        assert_eq!(labeled.label_codes(), vec![-1, 0, -1, 1, -1, 0]);
        assert_eq!(labeled.rows_moving(0).collect::<Vec<_>>(), vec![1, 5]);
        assert_eq!(labeled.moves_per_joint(), vec![2, 1]);
        assert_eq!(labeled.observed_joints(), 2);
        assert!(labeled.missing_joints().is_empty());
        assert!(labeled.is_valid());
    }

    #[test]
    fn test_invalid_when_last_joint_never_moves() {
        let samples = table(&[&[0.0, 0.0, 0.0], &[0.3, 0.0, 0.0], &[0.3, 0.4, 0.0]], 3);
        let labeled = MotionClassifier::new(2e-4, 1e-3).classify(&samples);
        assert_eq!(labeled.highest_observed_joint(), Some(1));
        assert_eq!(labeled.missing_joints(), vec![2]);
        assert!(!labeled.is_valid());
    }

    #[test]
    fn test_valid_with_gap_reports_missing() {
        let samples = table(&[&[0.0, 0.0, 0.0], &[0.3, 0.0, 0.0], &[0.3, 0.0, 0.4]], 3);
        let labeled = MotionClassifier::new(2e-4, 1e-3).classify(&samples);
        assert!(labeled.is_valid());
        assert_eq!(labeled.missing_joints(), vec![1]);
        assert_eq!(labeled.observed_joints(), 2);
    }

    #[test]
    fn test_first_row_always_invalid() {
        let samples = table(&[&[0.0], &[0.0]], 1);
        let labeled = MotionClassifier::new(0.0, 0.0).classify(&samples);
        assert_eq!(labeled.label(0), RowLabel::Invalid(Rejection::Initial));
        // With zero tolerances even a still joint counts as the mover.
        assert_eq!(labeled.label(1), RowLabel::Moved(0));
    }

    #[test]
    #[should_panic]
    fn test_label_out_of_range_panics() {
        let samples = table(&[&[0.0], &[0.3]], 1);
        let labeled = MotionClassifier::new(2e-4, 1e-3).classify(&samples);
        assert_eq!(labeled.label(1), RowLabel::Moved(0));
        let _ = labeled.label(2);
    }
}
