//! Error types of the solver.

use thiserror::Error;

/// Everything that can stop a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Malformed or inconsistent setup parameters. Raised before any computation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A non-finite value reached the reality factor or the update rule.
    ///
    /// `step` is the index of the snapshot being produced, 0 during setup.
    #[error("non-finite value at step {step}: {detail}")]
    NumericDomain { step: usize, detail: String },

    /// The scheme is outside its stability bound and the run is strict.
    #[error("unstable scheme at step {step}: courant number {courant}, coupling {coupling}")]
    Unstable {
        step: usize,
        courant: f64,
        coupling: f64,
    },
}

impl SolverError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn domain(step: usize, detail: impl Into<String>) -> Self {
        Self::NumericDomain {
            step,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
