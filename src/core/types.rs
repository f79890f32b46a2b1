use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Number of asset classes the engine models.
pub const ASSET_CLASS_COUNT: usize = 11;

/// Longest supported projection horizon, in years.
pub const MAX_HORIZON_YEARS: u32 = 50;

/// The fixed menu of asset classes a portfolio can be allocated across.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    UsLargeCap,
    UsSmallCap,
    InternationalStocks,
    EmergingMarkets,
    CanadianStocks,
    Reits,
    HighYieldBonds,
    UsBonds,
    InternationalBonds,
    Gold,
    Cash,
}

impl AssetClass {
    pub const ALL: [AssetClass; ASSET_CLASS_COUNT] = [
        AssetClass::UsLargeCap,
        AssetClass::UsSmallCap,
        AssetClass::InternationalStocks,
        AssetClass::EmergingMarkets,
        AssetClass::CanadianStocks,
        AssetClass::Reits,
        AssetClass::HighYieldBonds,
        AssetClass::UsBonds,
        AssetClass::InternationalBonds,
        AssetClass::Gold,
        AssetClass::Cash,
    ];

    /// Position of this class in parameter tables and allocation arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetClass::UsLargeCap => "us-large-cap",
            AssetClass::UsSmallCap => "us-small-cap",
            AssetClass::InternationalStocks => "international-stocks",
            AssetClass::EmergingMarkets => "emerging-markets",
            AssetClass::CanadianStocks => "canadian-stocks",
            AssetClass::Reits => "reits",
            AssetClass::HighYieldBonds => "high-yield-bonds",
            AssetClass::UsBonds => "us-bonds",
            AssetClass::InternationalBonds => "international-bonds",
            AssetClass::Gold => "gold",
            AssetClass::Cash => "cash",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetClass::ALL
            .iter()
            .copied()
            .find(|class| class.name() == s)
            .ok_or_else(|| format!("unknown asset class {s:?}"))
    }
}

/// Percentage weights per asset class.
///
/// The engine treats weights proportionally and never checks that they sum to
/// 100; validating the percentage total is the caller's job.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetAllocation {
    weights: [f64; ASSET_CLASS_COUNT],
}

impl AssetAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, class: AssetClass, percent: f64) -> Self {
        self.weights[class.index()] = percent;
        self
    }

    pub fn set(&mut self, class: AssetClass, percent: f64) {
        self.weights[class.index()] = percent;
    }

    pub fn weight(&self, class: AssetClass) -> f64 {
        self.weights[class.index()]
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Per-class fractions of every invested unit of money.
    ///
    /// Rejects negative or non-finite weights and an allocation with no
    /// positive weight at all.
    pub(crate) fn fractions(&self) -> Result<[f64; ASSET_CLASS_COUNT], SimulationError> {
        for class in AssetClass::ALL {
            let weight = self.weights[class.index()];
            if !weight.is_finite() || weight < 0.0 {
                return Err(SimulationError::InvalidWeight {
                    class,
                    value: weight,
                });
            }
        }

        let total = self.total();
        if total <= 0.0 {
            return Err(SimulationError::EmptyAllocation);
        }

        let mut fractions = [0.0; ASSET_CLASS_COUNT];
        for i in 0..ASSET_CLASS_COUNT {
            fractions[i] = self.weights[i] / total;
        }
        Ok(fractions)
    }
}

/// One user-triggered projection run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationRequest {
    pub allocation: AssetAllocation,
    pub initial_investment: f64,
    pub monthly_contribution: f64,
    pub years: u32,
    pub trial_count: u32,
}

impl SimulationRequest {
    pub const DEFAULT_TRIAL_COUNT: u32 = 1_000;

    pub fn new(
        allocation: AssetAllocation,
        initial_investment: f64,
        monthly_contribution: f64,
        years: u32,
    ) -> Self {
        Self {
            allocation,
            initial_investment,
            monthly_contribution,
            years,
            trial_count: Self::DEFAULT_TRIAL_COUNT,
        }
    }
}

/// Distribution of portfolio value across trials at one year boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct YearProjection {
    pub year: u32,
    pub percentile5: f64,
    pub percentile25: f64,
    pub percentile50: f64,
    pub percentile75: f64,
    pub percentile95: f64,
    pub mean: f64,
}

/// Ordered per-year percentile records, year 0 through the horizon.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationResult {
    pub projections: Vec<YearProjection>,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimulationError {
    #[error("projection horizon must be between 1 and {MAX_HORIZON_YEARS} years, got {0}")]
    InvalidHorizon(u32),
    #[error("trial count must be at least 1")]
    InvalidTrialCount,
    #[error("{field} must be a non-negative amount, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error("allocation weight for {class} must be a non-negative percentage, got {value}")]
    InvalidWeight { class: AssetClass, value: f64 },
    #[error("allocation has no positive weights")]
    EmptyAllocation,
    #[error("invalid asset parameters: {0}")]
    InvalidParameters(&'static str),
    #[error("correlation matrix is not positive definite")]
    NotPositiveDefinite,
    #[error("simulation produced a non-finite portfolio value in year {year}")]
    NonFiniteValue { year: u32 },
    #[error("simulation cancelled")]
    Cancelled,
}
