use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::connectivity::ConnectivityMask;
use crate::ModelError;

/// Smallest admissible residual variance. A perfect fit is clamped here so
/// the log-likelihood stays finite.
pub const VARIANCE_FLOOR: f64 = 1e-8;

/// Singular values at or below this cutoff are treated as zero when solving
/// the per-region systems, which makes the solution the minimum-norm one on
/// rank-deficient designs.
const SVD_EPS: f64 = 1e-12;

/// Result of fitting one hypothesis mask against a simulated run.
///
/// `connectivity` is nonzero only where the mask admits an edge. The fitted
/// stimulus-gain coefficient is used for residual computation only and is
/// not reported; the estimate covers state-to-state influence alone.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FittedModel {
    pub connectivity: DMatrix<f64>,
    pub log_likelihood: f64,
    pub param_count: usize,
    pub sample_count: usize,
}

struct RegionFit {
    region: usize,
    parents: Vec<usize>,
    // One coefficient per parent; the trailing stimulus gain is dropped.
    coefficients: Vec<f64>,
    rss: f64,
}

/// Fit a connectivity hypothesis by constrained least squares.
///
/// Each region is regressed independently: the design matrix holds the
/// lagged observations of its admitted parents plus the lagged stimulus,
/// the target is the region's next observation. The per-region problems are
/// independent because each target depends only on its own masked
/// predictors and an i.i.d. residual, so the joint likelihood factorizes.
///
/// Rank-deficient designs are not errors; the solver returns the
/// minimum-norm solution.
pub fn fit(
    observations: &DMatrix<f64>,
    stimulus: &DVector<f64>,
    mask: &ConnectivityMask,
) -> Result<FittedModel, ModelError> {
    let steps = observations.nrows();
    let regions = observations.ncols();
    if regions < 1 {
        return Err(ModelError::InvalidInput(
            "fit requires at least one region".to_string(),
        ));
    }
    if steps < 2 {
        return Err(ModelError::InvalidInput(format!(
            "fit requires at least 2 time steps, got {}",
            steps
        )));
    }
    if mask.regions() != regions {
        return Err(ModelError::InvalidInput(format!(
            "mask covers {} regions but observations have {}",
            mask.regions(),
            regions
        )));
    }
    if stimulus.len() != steps {
        return Err(ModelError::InvalidInput(format!(
            "stimulus has {} steps but observations have {}",
            stimulus.len(),
            steps
        )));
    }

    let fits = fit_regions(observations, stimulus, mask);

    let mut connectivity = DMatrix::zeros(regions, regions);
    let mut rss = 0.0;
    let mut param_count = 0;
    for f in &fits {
        for (idx, &source) in f.parents.iter().enumerate() {
            connectivity[(f.region, source)] = f.coefficients[idx];
        }
        rss += f.rss;
        param_count += f.parents.len() + 1;
    }

    let sample_count = regions * (steps - 1);
    let sigma2 = (rss / sample_count as f64).max(VARIANCE_FLOOR);
    let log_likelihood = -0.5 * sample_count as f64 * ((2.0 * PI * sigma2).ln() + 1.0);

    Ok(FittedModel {
        connectivity,
        log_likelihood,
        param_count,
        sample_count,
    })
}

#[cfg(feature = "parallel")]
fn fit_regions(
    observations: &DMatrix<f64>,
    stimulus: &DVector<f64>,
    mask: &ConnectivityMask,
) -> Vec<RegionFit> {
    (0..mask.regions())
        .into_par_iter()
        .map(|region| fit_region(observations, stimulus, mask, region))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn fit_regions(
    observations: &DMatrix<f64>,
    stimulus: &DVector<f64>,
    mask: &ConnectivityMask,
) -> Vec<RegionFit> {
    (0..mask.regions())
        .map(|region| fit_region(observations, stimulus, mask, region))
        .collect()
}

fn fit_region(
    observations: &DMatrix<f64>,
    stimulus: &DVector<f64>,
    mask: &ConnectivityMask,
    region: usize,
) -> RegionFit {
    let rows = observations.nrows() - 1;
    let parents = mask.parents(region);
    let cols = parents.len() + 1;

    let mut design = DMatrix::zeros(rows, cols);
    for t in 0..rows {
        for (c, &source) in parents.iter().enumerate() {
            design[(t, c)] = observations[(t, source)];
        }
        design[(t, cols - 1)] = stimulus[t];
    }
    let target = DVector::from_fn(rows, |t, _| observations[(t + 1, region)]);

    let svd = design.clone().svd(true, true);
    let beta = svd
        .solve(&target, SVD_EPS)
        .expect("SVD solve with U and V computed");

    let residual = &target - &design * &beta;
    let rss = residual.norm_squared();

    let coefficients = beta.iter().take(parents.len()).copied().collect();
    RegionFit {
        region,
        parents,
        coefficients,
        rss,
    }
}
