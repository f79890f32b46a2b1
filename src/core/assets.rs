use super::types::{AssetClass, SimulationError, ASSET_CLASS_COUNT};

/// Statistical assumptions for the asset-class menu.
///
/// Returns and volatilities are nominal annual percentages; correlations are
/// pairwise coefficients in [-1, 1]. The table ships with the engine, but
/// callers may substitute their own (deterministic oracle tests do).
#[derive(Clone, Debug, PartialEq)]
pub struct AssetParameters {
    pub expected_return: [f64; ASSET_CLASS_COUNT],
    pub volatility: [f64; ASSET_CLASS_COUNT],
    pub correlations: [[f64; ASSET_CLASS_COUNT]; ASSET_CLASS_COUNT],
}

/// Long-run nominal annual return assumptions, percent.
const DEFAULT_EXPECTED_RETURN: [f64; ASSET_CLASS_COUNT] = [
    10.0, // us-large-cap
    11.0, // us-small-cap
    8.5,  // international-stocks
    9.5,  // emerging-markets
    8.8,  // canadian-stocks
    9.0,  // reits
    6.5,  // high-yield-bonds
    4.0,  // us-bonds
    3.5,  // international-bonds
    5.0,  // gold
    2.0,  // cash
];

/// Annual return volatility assumptions, percent. Cash is riskless here.
const DEFAULT_VOLATILITY: [f64; ASSET_CLASS_COUNT] = [
    15.5, 19.5, 17.0, 22.5, 16.5, 19.0, 10.0, 5.5, 7.0, 18.0, 0.0,
];

/// Pairwise return correlations, same class order as the tables above.
const DEFAULT_CORRELATIONS: [[f64; ASSET_CLASS_COUNT]; ASSET_CLASS_COUNT] = [
    [1.00, 0.81, 0.80, 0.74, 0.78, 0.65, 0.61, 0.12, 0.08, 0.10, 0.00],
    [0.81, 1.00, 0.77, 0.70, 0.74, 0.62, 0.57, 0.07, 0.04, 0.09, 0.00],
    [0.80, 0.77, 1.00, 0.70, 0.73, 0.62, 0.58, 0.11, 0.08, 0.09, 0.00],
    [0.74, 0.70, 0.70, 1.00, 0.67, 0.56, 0.52, 0.06, 0.04, 0.08, 0.00],
    [0.78, 0.74, 0.73, 0.67, 1.00, 0.60, 0.56, 0.11, 0.08, 0.09, 0.00],
    [0.65, 0.62, 0.62, 0.56, 0.60, 1.00, 0.50, 0.18, 0.14, 0.09, 0.01],
    [0.61, 0.57, 0.58, 0.52, 0.56, 0.50, 1.00, 0.31, 0.24, 0.11, 0.02],
    [0.12, 0.07, 0.11, 0.06, 0.11, 0.18, 0.31, 1.00, 0.60, 0.14, 0.04],
    [0.08, 0.04, 0.08, 0.04, 0.08, 0.14, 0.24, 0.60, 1.00, 0.11, 0.04],
    [0.10, 0.09, 0.09, 0.08, 0.09, 0.09, 0.11, 0.14, 0.11, 1.00, 0.01],
    [0.00, 0.00, 0.00, 0.00, 0.00, 0.01, 0.02, 0.04, 0.04, 0.01, 1.00],
];

impl Default for AssetParameters {
    fn default() -> Self {
        Self {
            expected_return: DEFAULT_EXPECTED_RETURN,
            volatility: DEFAULT_VOLATILITY,
            correlations: DEFAULT_CORRELATIONS,
        }
    }
}

impl AssetParameters {
    /// Check finiteness, volatility sign, and the correlation-matrix
    /// invariants: symmetric, unit diagonal, coefficients in [-1, 1].
    pub fn validate(&self) -> Result<(), SimulationError> {
        const TOL: f64 = 1e-12;

        for class in AssetClass::ALL {
            let i = class.index();
            if !self.expected_return[i].is_finite() || self.expected_return[i] <= -100.0 {
                return Err(SimulationError::InvalidParameters(
                    "expected return must be finite and above -100%",
                ));
            }
            if !self.volatility[i].is_finite() || self.volatility[i] < 0.0 {
                return Err(SimulationError::InvalidParameters(
                    "volatility must be finite and non-negative",
                ));
            }
        }

        for i in 0..ASSET_CLASS_COUNT {
            if (self.correlations[i][i] - 1.0).abs() > TOL {
                return Err(SimulationError::InvalidParameters(
                    "correlation matrix diagonal must be 1",
                ));
            }
            for j in 0..ASSET_CLASS_COUNT {
                let c = self.correlations[i][j];
                if !c.is_finite() || c < -1.0 || c > 1.0 {
                    return Err(SimulationError::InvalidParameters(
                        "correlation coefficients must lie in [-1, 1]",
                    ));
                }
                if (c - self.correlations[j][i]).abs() > TOL {
                    return Err(SimulationError::InvalidParameters(
                        "correlation matrix must be symmetric",
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Lower-triangular Cholesky factor of a correlation matrix, or `None` when
/// the matrix is not positive definite.
pub(crate) fn cholesky_lower(
    matrix: &[[f64; ASSET_CLASS_COUNT]; ASSET_CLASS_COUNT],
) -> Option<[[f64; ASSET_CLASS_COUNT]; ASSET_CLASS_COUNT]> {
    const TOL: f64 = 1e-12;
    let mut lower = [[0.0; ASSET_CLASS_COUNT]; ASSET_CLASS_COUNT];

    for i in 0..ASSET_CLASS_COUNT {
        for j in 0..=i {
            let mut sum = matrix[i][j];
            for k in 0..j {
                sum -= lower[i][k] * lower[j][k];
            }

            if i == j {
                if sum <= TOL {
                    return None;
                }
                lower[i][j] = sum.sqrt();
            } else {
                lower[i][j] = sum / lower[j][j];
            }
        }
    }

    Some(lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_are_valid() {
        AssetParameters::default().validate().unwrap();
    }

    #[test]
    fn default_correlations_are_symmetric_with_unit_diagonal() {
        let params = AssetParameters::default();
        for i in 0..ASSET_CLASS_COUNT {
            assert_eq!(params.correlations[i][i], 1.0);
            for j in 0..ASSET_CLASS_COUNT {
                assert_eq!(params.correlations[i][j], params.correlations[j][i]);
            }
        }
    }

    #[test]
    fn default_correlations_factorize_and_reproduce_the_matrix() {
        let params = AssetParameters::default();
        let lower = cholesky_lower(&params.correlations).unwrap();

        for i in 0..ASSET_CLASS_COUNT {
            for j in 0..ASSET_CLASS_COUNT {
                let mut product = 0.0;
                for k in 0..ASSET_CLASS_COUNT {
                    product += lower[i][k] * lower[j][k];
                }
                assert!(
                    (product - params.correlations[i][j]).abs() < 1e-9,
                    "L*L^T mismatch at ({i}, {j}): {product} vs {}",
                    params.correlations[i][j]
                );
            }
        }
    }

    #[test]
    fn cholesky_rejects_non_positive_definite_matrix() {
        let mut correlations = [[0.0; ASSET_CLASS_COUNT]; ASSET_CLASS_COUNT];
        for i in 0..ASSET_CLASS_COUNT {
            correlations[i][i] = 1.0;
        }
        // a~b and b~c strongly positive while a~c is strongly negative
        correlations[0][1] = 0.9;
        correlations[1][0] = 0.9;
        correlations[1][2] = 0.9;
        correlations[2][1] = 0.9;
        correlations[0][2] = -0.9;
        correlations[2][0] = -0.9;

        assert!(cholesky_lower(&correlations).is_none());
    }

    #[test]
    fn validate_rejects_asymmetric_matrix() {
        let mut params = AssetParameters::default();
        params.correlations[0][1] = 0.5;
        assert!(matches!(
            params.validate(),
            Err(SimulationError::InvalidParameters(_))
        ));
    }

    #[test]
    fn validate_rejects_non_unit_diagonal() {
        let mut params = AssetParameters::default();
        params.correlations[3][3] = 0.99;
        assert!(matches!(
            params.validate(),
            Err(SimulationError::InvalidParameters(_))
        ));
    }

    #[test]
    fn validate_rejects_negative_volatility() {
        let mut params = AssetParameters::default();
        params.volatility[2] = -1.0;
        assert!(matches!(
            params.validate(),
            Err(SimulationError::InvalidParameters(_))
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_correlation() {
        let mut params = AssetParameters::default();
        params.correlations[0][1] = 1.2;
        params.correlations[1][0] = 1.2;
        assert!(matches!(
            params.validate(),
            Err(SimulationError::InvalidParameters(_))
        ));
    }
}
