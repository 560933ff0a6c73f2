use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::connectivity::GroundTruth;
use crate::ModelError;

/// Horizon, stimulus, and noise settings for one simulated run.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Number of time steps T (at least 2).
    pub steps: usize,
    pub stimulus_amplitude: f64,
    pub process_noise_std: f64,
    pub observation_noise_std: f64,
    /// Seed for the pseudo-random stream; equal seeds give bit-identical runs.
    pub seed: u64,
}

/// One simulated run, shared read-only across all hypothesis fits.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Simulation {
    /// Latent states, T x n.
    pub states: DMatrix<f64>,
    /// Noisy observations, T x n.
    pub observations: DMatrix<f64>,
    /// Stimulus trace, length T.
    pub stimulus: DVector<f64>,
}

/// Piecewise-constant two-pulse stimulus: `amplitude` on `[T/4, T/2)` and
/// `[3T/4, T)` (floor division), zero elsewhere.
pub fn stimulus_pulses(steps: usize, amplitude: f64) -> DVector<f64> {
    let mut u = DVector::zeros(steps);
    for t in steps / 4..steps / 2 {
        u[t] = amplitude;
    }
    for t in 3 * steps / 4..steps {
        u[t] = amplitude;
    }
    u
}

/// Simulate the linear state recursion `x[t+1] = A*x[t] + C*u[t] + w_t` with
/// observations `y[t] = x[t] + v_t`, starting from `x[0] = 0`.
///
/// The random stream is consumed in a fixed order: all T-1 process-noise
/// draws first (n values per step, increasing t), then all T
/// observation-noise draws (n values per step, increasing t). Zero noise
/// standard deviations still consume their draws, so the stimulus/state
/// layout never depends on the noise settings and a noiseless run is an
/// exact linear recursion with `y == x`.
///
/// No stability check is applied to `A`; a spectral radius at or above one
/// is the caller's problem.
pub fn simulate(truth: &GroundTruth, cfg: &SimulationConfig) -> Result<Simulation, ModelError> {
    let n = truth.region_count();
    if n < 1 {
        return Err(ModelError::InvalidInput(
            "simulation requires at least one region".to_string(),
        ));
    }
    if cfg.steps < 2 {
        return Err(ModelError::InvalidInput(format!(
            "simulation requires at least 2 steps, got {}",
            cfg.steps
        )));
    }
    if cfg.process_noise_std < 0.0 || cfg.observation_noise_std < 0.0 {
        return Err(ModelError::InvalidInput(
            "noise standard deviations must be non-negative".to_string(),
        ));
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(cfg.seed);

    let stimulus = stimulus_pulses(cfg.steps, cfg.stimulus_amplitude);
    let mut states = DMatrix::zeros(cfg.steps, n);

    for t in 0..cfg.steps - 1 {
        for i in 0..n {
            let mut drive = truth.input_gain[i] * stimulus[t];
            for j in 0..n {
                drive += truth.connectivity[(i, j)] * states[(t, j)];
            }
            let w: f64 = rng.sample(StandardNormal);
            states[(t + 1, i)] = drive + cfg.process_noise_std * w;
        }
    }

    let mut observations = states.clone();
    for t in 0..cfg.steps {
        for i in 0..n {
            let v: f64 = rng.sample(StandardNormal);
            observations[(t, i)] += cfg.observation_noise_std * v;
        }
    }

    Ok(Simulation {
        states,
        observations,
        stimulus,
    })
}
