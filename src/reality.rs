//! The scalar factor that scales the coupling of the update rule.
//!
//! The three inputs are opaque multipliers; the factor is their product.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// The three inputs of the reality factor.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealityInputs {
    pub conscious_energy: f64,
    pub information: f64,
    pub will: f64,
}

impl Default for RealityInputs {
    fn default() -> Self {
        RealityInputs {
            conscious_energy: 1.,
            information: 1.,
            will: 1.,
        }
    }
}

impl RealityInputs {
    pub fn new(conscious_energy: f64, information: f64, will: f64) -> Self {
        RealityInputs {
            conscious_energy,
            information,
            will,
        }
    }

    /// See [`compute_reality_factor`].
    pub fn factor(&self) -> Result<f64> {
        compute_reality_factor(self.conscious_energy, self.information, self.will)
    }
}

/// Returns `c * i * phi`.
///
/// Fails with `NumericDomain` (step 0) if any input is NaN or infinite.
pub fn compute_reality_factor(c: f64, i: f64, phi: f64) -> Result<f64> {
    for (name, x) in [("conscious energy", c), ("information", i), ("will", phi)] {
        if !x.is_finite() {
            return Err(SolverError::domain(0, format!("reality input `{}` is {}", name, x)));
        }
    }
    Ok(c * i * phi)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn product_of_inputs() {
        assert_eq!(compute_reality_factor(2., 3., 5.), Ok(30.));
        assert_eq!(RealityInputs::new(0.5, 4., -1.).factor(), Ok(-2.));
        assert_eq!(RealityInputs::default().factor(), Ok(1.));
    }

    #[test]
    fn zero_annihilates() {
        for &(x, y) in &[(1., 2.), (-7.5, 1e300), (0., 0.), (f64::MIN_POSITIVE, -3.)] {
            let k = compute_reality_factor(0., x, y).unwrap();
            assert_eq!(k, 0.);
        }
    }

    #[test]
    fn rejects_non_finite() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(compute_reality_factor(bad, 1., 1.),
                             Err(SolverError::NumericDomain { step: 0, .. })));
            assert!(matches!(compute_reality_factor(1., bad, 1.),
                             Err(SolverError::NumericDomain { .. })));
            assert!(matches!(compute_reality_factor(1., 1., bad),
                             Err(SolverError::NumericDomain { .. })));
        }
    }
}
