#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::connectivity::Hypothesis;
use crate::evidence::{bic_log_evidence, Evidence};
use crate::fit::{fit, FittedModel};
use crate::simulate::Simulation;
use crate::ModelError;

/// One hypothesis fitted and scored against a simulated run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HypothesisScore {
    pub name: String,
    pub fitted: FittedModel,
    pub evidence: Evidence,
}

/// Fit and score every hypothesis against the same simulated run.
///
/// Fits read only the shared run and write only their own score, so under
/// the `parallel` feature they are evaluated concurrently with identical
/// numeric results. Output order follows input order either way.
pub fn score_hypotheses(
    sim: &Simulation,
    hypotheses: &[Hypothesis],
) -> Result<Vec<HypothesisScore>, ModelError> {
    score_all(sim, hypotheses)
}

#[cfg(feature = "parallel")]
fn score_all(
    sim: &Simulation,
    hypotheses: &[Hypothesis],
) -> Result<Vec<HypothesisScore>, ModelError> {
    hypotheses
        .par_iter()
        .map(|h| score_one(sim, h))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn score_all(
    sim: &Simulation,
    hypotheses: &[Hypothesis],
) -> Result<Vec<HypothesisScore>, ModelError> {
    hypotheses.iter().map(|h| score_one(sim, h)).collect()
}

fn score_one(sim: &Simulation, hypothesis: &Hypothesis) -> Result<HypothesisScore, ModelError> {
    let fitted = fit(&sim.observations, &sim.stimulus, &hypothesis.mask)?;
    let evidence = bic_log_evidence(fitted.log_likelihood, fitted.param_count, fitted.sample_count);
    Ok(HypothesisScore {
        name: hypothesis.name.clone(),
        fitted,
        evidence,
    })
}

/// Softmax over log-evidences, stabilized by subtracting the maximum.
///
/// Assumes equal prior probability across hypotheses. The output is
/// non-negative and sums to 1; an empty input yields an empty output.
pub fn posterior_probabilities(log_evidences: &[f64]) -> Vec<f64> {
    if log_evidences.is_empty() {
        return Vec::new();
    }
    let max = log_evidences
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = log_evidences.iter().map(|le| (le - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Posterior model probabilities for named log-evidences, under equal
/// priors. Input order is preserved so reports stay deterministic.
pub fn compare<S: AsRef<str>>(scored: &[(S, f64)]) -> Vec<(String, f64)> {
    let log_evidences: Vec<f64> = scored.iter().map(|(_, le)| *le).collect();
    let posterior = posterior_probabilities(&log_evidences);
    scored
        .iter()
        .zip(posterior)
        .map(|((name, _), p)| (name.as_ref().to_string(), p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn posteriors_sum_to_one() {
        let p = posterior_probabilities(&[-1200.5, -1187.0, -1260.25]);
        let total: f64 = p.iter().sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        for &v in &p {
            assert!(v >= 0.0);
        }
    }

    #[test]
    fn shifting_every_log_evidence_leaves_posteriors_unchanged() {
        let le = [-1200.5, -1187.0, -1260.25];
        let shifted: Vec<f64> = le.iter().map(|v| v + 1e6).collect();

        let a = posterior_probabilities(&le);
        let b = posterior_probabilities(&shifted);
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn higher_log_evidence_gets_higher_posterior() {
        let p = posterior_probabilities(&[-10.0, -5.0, -20.0]);
        assert!(p[1] > p[0]);
        assert!(p[0] > p[2]);
    }

    #[test]
    fn extreme_log_evidences_stay_finite() {
        // Unstabilized softmax would overflow here.
        let p = posterior_probabilities(&[-1e300, -1e300 + 5.0]);
        assert!(p.iter().all(|v| v.is_finite()));
        assert!(p[1] > p[0]);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(posterior_probabilities(&[]).is_empty());

        let single = posterior_probabilities(&[-42.0]);
        assert_abs_diff_eq!(single[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn compare_preserves_names_and_order() {
        let scored = [("m1", -10.0), ("m2", -5.0), ("m3", -20.0)];
        let posterior = compare(&scored);

        assert_eq!(posterior.len(), 3);
        assert_eq!(posterior[0].0, "m1");
        assert_eq!(posterior[1].0, "m2");
        assert_eq!(posterior[2].0, "m3");

        let total: f64 = posterior.iter().map(|(_, p)| p).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        assert!(posterior[1].1 > posterior[0].1);
    }
}
