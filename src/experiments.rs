//! Per-joint experiment tables.
//!
//! Regroups a [`LabeledTable`] into, for each joint, the ordered list of
//! `(before, after)` sample pairs in which that joint alone moved. Pairs are
//! always two adjacent rows in original temporal order.
//!
//! A rejected row never produces a pair. Its sample may still be the
//! `before` state of the next row: the label describes how a row was
//! reached, not whether its reading is trustworthy.

use tracing::{info, warn};

use crate::classifier::LabeledTable;
use crate::sample::Sample;

/// One calibration event: a single joint moved from `before` to `after`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentPair {
    /// Row index of `after` in the labeled table (`before` is the row above).
    pub row: usize,
    /// Sample preceding the motion.
    pub before: Sample,
    /// Sample following the motion.
    pub after: Sample,
}

impl ExperimentPair {
    /// Encoder change of `joint` across the event.
    #[must_use]
    pub fn joint_delta(&self, joint: usize) -> f64 {
        self.after.joints[joint] - self.before.joints[joint]
    }
}

/// Experiment pairs grouped by moving joint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExperimentSet {
    per_joint: Vec<Vec<ExperimentPair>>,
}

impl ExperimentSet {
    /// Build from explicit per-joint pair lists (index = joint).
    #[must_use]
    pub fn new(per_joint: Vec<Vec<ExperimentPair>>) -> Self {
        Self { per_joint }
    }

    /// Split a labeled table into per-joint experiments.
    #[must_use]
    pub fn split(labeled: &LabeledTable) -> Self {
        let samples = labeled.samples();
        let mut per_joint = vec![Vec::new(); labeled.n_joints()];

        for (row, label) in labeled.labels().iter().enumerate().skip(1) {
            if let Some(joint) = label.moved_joint() {
                per_joint[joint].push(ExperimentPair {
                    row,
                    before: samples.sample(row - 1),
                    after: samples.sample(row),
                });
            }
        }

        let set = Self { per_joint };
        info!(
            experiments = set.total(),
            per_joint = ?set.counts(),
            "Experiments grouped by joint"
        );
        let empty = set.empty_joints();
        if !empty.is_empty() {
            warn!(joints = ?empty, "Joints without experiments cannot be identified");
        }
        set
    }

    /// Number of joints.
    #[must_use]
    pub fn n_joints(&self) -> usize {
        self.per_joint.len()
    }

    /// Experiments of `joint`; empty for an unknown joint.
    #[must_use]
    pub fn for_joint(&self, joint: usize) -> &[ExperimentPair] {
        self.per_joint.get(joint).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of experiments per joint.
    #[must_use]
    pub fn counts(&self) -> Vec<usize> {
        self.per_joint.iter().map(Vec::len).collect()
    }

    /// Total number of experiments.
    #[must_use]
    pub fn total(&self) -> usize {
        self.per_joint.iter().map(Vec::len).sum()
    }

    /// Joints with zero experiments.
    #[must_use]
    pub fn empty_joints(&self) -> Vec<usize> {
        self.per_joint
            .iter()
            .enumerate()
            .filter(|(_, pairs)| pairs.is_empty())
            .map(|(joint, _)| joint)
            .collect()
    }

    /// Whether every joint has at least one experiment.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.per_joint.iter().all(|pairs| !pairs.is_empty())
    }
}
