use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

use super::assets::{cholesky_lower, AssetParameters};
use super::types::{
    SimulationError, SimulationRequest, SimulationResult, YearProjection, ASSET_CLASS_COUNT,
    MAX_HORIZON_YEARS,
};

const MONTHS_PER_YEAR: u32 = 12;

/// Monte Carlo projection engine for a multi-asset portfolio.
///
/// Construction validates the parameter table and factorizes the correlation
/// matrix once; the factor is reused by every trial of every run. A simulator
/// holds no per-run state, so one instance can serve many requests.
pub struct Simulator {
    monthly_mean: [f64; ASSET_CLASS_COUNT],
    monthly_vol: [f64; ASSET_CLASS_COUNT],
    chol: [[f64; ASSET_CLASS_COUNT]; ASSET_CLASS_COUNT],
}

impl Simulator {
    /// Simulator over the built-in asset-class assumptions.
    pub fn new() -> Result<Self, SimulationError> {
        Self::with_parameters(AssetParameters::default())
    }

    pub fn with_parameters(params: AssetParameters) -> Result<Self, SimulationError> {
        params.validate()?;
        let chol =
            cholesky_lower(&params.correlations).ok_or(SimulationError::NotPositiveDefinite)?;

        let mut monthly_mean = [0.0; ASSET_CLASS_COUNT];
        let mut monthly_vol = [0.0; ASSET_CLASS_COUNT];
        for i in 0..ASSET_CLASS_COUNT {
            let annual_return = params.expected_return[i] / 100.0;
            monthly_mean[i] = (1.0 + annual_return).powf(1.0 / 12.0) - 1.0;
            monthly_vol[i] = params.volatility[i] / 100.0 / (MONTHS_PER_YEAR as f64).sqrt();
        }

        Ok(Self {
            monthly_mean,
            monthly_vol,
            chol,
        })
    }

    /// Run with fresh entropy.
    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationResult, SimulationError> {
        self.run_inner(request, rand::random(), None)
    }

    /// Run reproducibly: the same seed yields bit-identical projections,
    /// independent of how trials are scheduled across threads.
    pub fn run_seeded(
        &self,
        request: &SimulationRequest,
        seed: u64,
    ) -> Result<SimulationResult, SimulationError> {
        self.run_inner(request, seed, None)
    }

    /// Run with a cancellation flag checked before each trial. A cancelled
    /// run returns an error and never partial results.
    pub fn run_cancellable(
        &self,
        request: &SimulationRequest,
        seed: Option<u64>,
        cancel: &AtomicBool,
    ) -> Result<SimulationResult, SimulationError> {
        self.run_inner(request, seed.unwrap_or_else(rand::random), Some(cancel))
    }

    fn run_inner(
        &self,
        request: &SimulationRequest,
        base_seed: u64,
        cancel: Option<&AtomicBool>,
    ) -> Result<SimulationResult, SimulationError> {
        validate_request(request)?;
        let fractions = request.allocation.fractions()?;

        debug!(
            "simulating {} trials over {} years",
            request.trial_count, request.years
        );

        let paths: Vec<Vec<f64>> = (0..request.trial_count)
            .into_par_iter()
            .map(|trial| {
                if let Some(flag) = cancel {
                    if flag.load(Ordering::Relaxed) {
                        return Err(SimulationError::Cancelled);
                    }
                }
                let mut rng = StdRng::seed_from_u64(derive_trial_seed(base_seed, trial));
                self.simulate_trial(request, &fractions, &mut rng)
            })
            .collect::<Result<_, _>>()?;

        let mut projections = Vec::with_capacity(request.years as usize + 1);
        for year in 0..=request.years {
            let mut values: Vec<f64> = paths.iter().map(|path| path[year as usize]).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            let mean = values.iter().sum::<f64>() / values.len() as f64;

            projections.push(YearProjection {
                year,
                percentile5: percentile_sorted(&values, 5.0),
                percentile25: percentile_sorted(&values, 25.0),
                percentile50: percentile_sorted(&values, 50.0),
                percentile75: percentile_sorted(&values, 75.0),
                percentile95: percentile_sorted(&values, 95.0),
                mean,
            });
        }

        Ok(SimulationResult { projections })
    }

    /// One portfolio trajectory: contributions land at target weights each
    /// month and existing balances drift with returns (no rebalancing).
    fn simulate_trial<R: Rng>(
        &self,
        request: &SimulationRequest,
        fractions: &[f64; ASSET_CLASS_COUNT],
        rng: &mut R,
    ) -> Result<Vec<f64>, SimulationError> {
        let mut holdings = [0.0; ASSET_CLASS_COUNT];
        for i in 0..ASSET_CLASS_COUNT {
            holdings[i] = request.initial_investment * fractions[i];
        }

        let mut path = Vec::with_capacity(request.years as usize + 1);
        path.push(request.initial_investment);

        let mut returns = [0.0; ASSET_CLASS_COUNT];
        for month in 1..=request.years * MONTHS_PER_YEAR {
            for i in 0..ASSET_CLASS_COUNT {
                holdings[i] += request.monthly_contribution * fractions[i];
            }

            self.sample_monthly_returns(rng, &mut returns);
            for i in 0..ASSET_CLASS_COUNT {
                // A sleeve cannot lose more than its full value in one month.
                holdings[i] *= (1.0 + returns[i]).max(0.0);
            }

            if month % MONTHS_PER_YEAR == 0 {
                let year = month / MONTHS_PER_YEAR;
                let total: f64 = holdings.iter().sum();
                if !total.is_finite() {
                    return Err(SimulationError::NonFiniteValue { year });
                }
                path.push(total);
            }
        }

        Ok(path)
    }

    /// One month of correlated returns: independent standard normals pushed
    /// through the Cholesky factor, then scaled and shifted per class. Zero
    /// volatility collapses to the deterministic monthly mean.
    fn sample_monthly_returns<R: Rng>(&self, rng: &mut R, returns: &mut [f64; ASSET_CLASS_COUNT]) {
        let mut shocks = [0.0; ASSET_CLASS_COUNT];
        for shock in &mut shocks {
            *shock = rng.sample(StandardNormal);
        }

        for i in 0..ASSET_CLASS_COUNT {
            let mut correlated = 0.0;
            for j in 0..=i {
                correlated += self.chol[i][j] * shocks[j];
            }
            returns[i] = self.monthly_mean[i] + self.monthly_vol[i] * correlated;
        }
    }
}

/// Project a portfolio with the built-in assumptions and fresh entropy.
pub fn run_simulation(request: &SimulationRequest) -> Result<SimulationResult, SimulationError> {
    Simulator::new()?.run(request)
}

fn validate_request(request: &SimulationRequest) -> Result<(), SimulationError> {
    if request.years == 0 || request.years > MAX_HORIZON_YEARS {
        return Err(SimulationError::InvalidHorizon(request.years));
    }
    if request.trial_count == 0 {
        return Err(SimulationError::InvalidTrialCount);
    }
    for (field, value) in [
        ("initial investment", request.initial_investment),
        ("monthly contribution", request.monthly_contribution),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::InvalidAmount { field, value });
        }
    }
    Ok(())
}

fn derive_trial_seed(base_seed: u64, trial: u32) -> u64 {
    let mixed = base_seed ^ ((trial as u64) << 32) ^ trial as u64;
    splitmix64(mixed)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Interpolated percentile over an ascending-sorted slice.
fn percentile_sorted(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
