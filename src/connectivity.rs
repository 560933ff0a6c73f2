use nalgebra::{DMatrix, DVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ModelError;

pub type RegionId = usize;

/// Ground-truth generative structure for one scenario.
///
/// `connectivity[(i, j)]` is the linear influence of region j's prior state
/// on region i's next state (the diagonal carries self-connections);
/// `input_gain[i]` maps the scalar stimulus to region i's state increment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroundTruth {
    pub connectivity: DMatrix<f64>,
    pub input_gain: DVector<f64>,
}

impl GroundTruth {
    pub fn new(connectivity: DMatrix<f64>, input_gain: DVector<f64>) -> Result<Self, ModelError> {
        let n = connectivity.nrows();
        if n == 0 {
            return Err(ModelError::InvalidInput(
                "connectivity matrix must have at least one region".to_string(),
            ));
        }
        if connectivity.ncols() != n {
            return Err(ModelError::InvalidInput(format!(
                "connectivity matrix must be square, got {}x{}",
                n,
                connectivity.ncols()
            )));
        }
        if input_gain.len() != n {
            return Err(ModelError::InvalidInput(format!(
                "input gain has {} entries for {} regions",
                input_gain.len(),
                n
            )));
        }
        Ok(Self {
            connectivity,
            input_gain,
        })
    }

    /// The fixed three-region chain scenario: each region decays toward its
    /// own prior state, region 1 feeds region 2, region 2 feeds region 3,
    /// and only region 1 is driven by the stimulus.
    pub fn chain_three() -> Self {
        let connectivity = DMatrix::from_row_slice(
            3,
            3,
            &[
                0.9, 0.0, 0.0, //
                0.3, 0.8, 0.0, //
                0.0, 0.25, 0.85,
            ],
        );
        let input_gain = DVector::from_column_slice(&[1.0, 0.0, 0.0]);
        Self {
            connectivity,
            input_gain,
        }
    }

    pub fn region_count(&self) -> usize {
        self.connectivity.nrows()
    }
}

/// Boolean adjacency hypothesis.
///
/// An admitted `(source, target)` pair means the source region's prior state
/// is an allowed predictor of the target region's next state. Every
/// hypothesis built here admits each region as its own predictor; arbitrary
/// masks without a true diagonal are accepted by the fitter but are outside
/// the intended use.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectivityMask {
    regions: usize,
    // Row-major: entry [target * regions + source].
    admitted: Vec<bool>,
}

impl ConnectivityMask {
    /// Mask admitting only self-connections (the diagonal).
    pub fn self_only(regions: usize) -> Self {
        let mut admitted = vec![false; regions * regions];
        for r in 0..regions {
            admitted[r * regions + r] = true;
        }
        Self { regions, admitted }
    }

    /// The mask that matches a ground truth exactly: every nonzero
    /// connectivity entry becomes an admitted edge, and the diagonal is
    /// admitted regardless.
    pub fn from_truth(truth: &GroundTruth) -> Self {
        let n = truth.region_count();
        let mut mask = Self::self_only(n);
        for target in 0..n {
            for source in 0..n {
                if truth.connectivity[(target, source)] != 0.0 {
                    mask.admitted[target * n + source] = true;
                }
            }
        }
        mask
    }

    /// Admit a directed edge from `source` to `target`.
    pub fn with_edge(mut self, source: RegionId, target: RegionId) -> Self {
        self.set(source, target, true);
        self
    }

    /// Remove a directed edge from `source` to `target`.
    pub fn without_edge(mut self, source: RegionId, target: RegionId) -> Self {
        self.set(source, target, false);
        self
    }

    pub fn set(&mut self, source: RegionId, target: RegionId, admitted: bool) {
        self.admitted[target * self.regions + source] = admitted;
    }

    pub fn admits(&self, source: RegionId, target: RegionId) -> bool {
        self.admitted[target * self.regions + source]
    }

    pub fn regions(&self) -> usize {
        self.regions
    }

    /// Admissible predictor regions for `target`, in ascending order.
    pub fn parents(&self, target: RegionId) -> Vec<RegionId> {
        (0..self.regions)
            .filter(|&source| self.admits(source, target))
            .collect()
    }

    /// Total number of admitted entries (diagonal included).
    pub fn edge_count(&self) -> usize {
        self.admitted.iter().filter(|&&a| a).count()
    }
}

/// A named candidate structure, ready for fitting and comparison.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hypothesis {
    pub name: String,
    pub mask: ConnectivityMask,
}

impl Hypothesis {
    pub fn new(name: impl Into<String>, mask: ConnectivityMask) -> Self {
        Self {
            name: name.into(),
            mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_only_admits_exactly_the_diagonal() {
        let mask = ConnectivityMask::self_only(4);
        for target in 0..4 {
            for source in 0..4 {
                assert_eq!(mask.admits(source, target), source == target);
            }
        }
        assert_eq!(mask.edge_count(), 4);
    }

    #[test]
    fn edge_builders_toggle_single_entries() {
        let mask = ConnectivityMask::self_only(3).with_edge(0, 2);
        assert!(mask.admits(0, 2));
        assert!(!mask.admits(2, 0), "edges are directed");

        let mask = mask.without_edge(0, 2);
        assert!(!mask.admits(0, 2));
        assert_eq!(mask, ConnectivityMask::self_only(3));
    }

    #[test]
    fn parents_lists_admitted_sources_in_order() {
        let mask = ConnectivityMask::self_only(3).with_edge(0, 2).with_edge(1, 2);
        assert_eq!(mask.parents(0), vec![0]);
        assert_eq!(mask.parents(1), vec![1]);
        assert_eq!(mask.parents(2), vec![0, 1, 2]);
    }

    #[test]
    fn from_truth_admits_nonzero_entries_and_diagonal() {
        let truth = GroundTruth::chain_three();
        let mask = ConnectivityMask::from_truth(&truth);
        assert!(mask.admits(0, 1), "chain edge 1->2");
        assert!(mask.admits(1, 2), "chain edge 2->3");
        assert!(!mask.admits(2, 0));
        assert!(!mask.admits(0, 2));
        assert_eq!(mask.edge_count(), 5);
    }

    #[test]
    fn chain_three_matches_the_published_scenario() {
        let truth = GroundTruth::chain_three();
        assert_eq!(truth.region_count(), 3);
        assert_eq!(truth.connectivity[(0, 0)], 0.9);
        assert_eq!(truth.connectivity[(1, 0)], 0.3);
        assert_eq!(truth.connectivity[(2, 1)], 0.25);
        assert_eq!(truth.connectivity[(2, 2)], 0.85);
        assert_eq!(truth.input_gain[0], 1.0);
        assert_eq!(truth.input_gain[1], 0.0);
    }

    #[test]
    fn ground_truth_rejects_mismatched_shapes() {
        let a = DMatrix::zeros(2, 3);
        let c = DVector::zeros(2);
        assert!(GroundTruth::new(a, c).is_err());

        let a = DMatrix::zeros(2, 2);
        let c = DVector::zeros(3);
        assert!(GroundTruth::new(a, c).is_err());

        let a = DMatrix::zeros(0, 0);
        let c = DVector::zeros(0);
        assert!(GroundTruth::new(a, c).is_err());
    }
}
