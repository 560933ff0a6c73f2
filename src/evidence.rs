#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// BIC and the derived approximate log model evidence for one fitted model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Evidence {
    pub log_evidence: f64,
    pub bic: f64,
}

/// Laplace/BIC approximation to the log marginal likelihood:
/// `bic = k*ln(N) - 2*log_likelihood`, `log_evidence = -bic/2`.
///
/// Prior-density terms are ignored, so the value is only meaningful for
/// comparing models fitted on the same N, not as absolute evidence.
pub fn bic_log_evidence(log_likelihood: f64, param_count: usize, sample_count: usize) -> Evidence {
    let bic = param_count as f64 * (sample_count as f64).ln() - 2.0 * log_likelihood;
    Evidence {
        log_evidence: -0.5 * bic,
        bic,
    }
}
