//! Run configuration.
//!
//! A `Config` is built once, either in code or deserialized from JSON, and is
//! never modified by the solver. Validation happens in [`crate::initialize`].

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::grid::Grid;
use crate::reality::RealityInputs;

/// What happens at indices 0 and N-1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// The edge samples keep their initial values.
    #[default]
    Dirichlet,
    /// Zero Neumann data: the missing neighbour of an edge sample is the edge
    /// sample itself, and the stencil is applied everywhere.
    Reflecting,
}

/// A generator of the field as a function of position `x = i * dx`.
#[derive(Clone)]
pub struct Profile(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl Profile {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Profile(Arc::new(f))
    }

    pub fn eval(&self, x: f64) -> f64 {
        (self.0)(x)
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Profile(..)")
    }
}

/// How a grid is filled at the start of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialCondition {
    /// Explicit samples, exactly one per grid point.
    Values(Vec<f64>),
    Zero,
    /// `amplitude * exp(-((x - center) / width)^2)`.
    Gaussian {
        center: f64,
        width: f64,
        amplitude: f64,
    },
    /// `amplitude * sin(mode * pi * i / (N - 1))`, vanishing at both edges.
    Sine { mode: u32, amplitude: f64 },
    /// Any function of position. Not serializable.
    #[serde(skip)]
    Function(Profile),
}

impl InitialCondition {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        InitialCondition::Function(Profile::new(f))
    }

    /// Materializes the condition on a grid of `n` points spaced `dx` apart.
    ///
    /// Only checks shape; finiteness of the samples is checked by the caller.
    pub fn build(&self, n: usize, dx: f64) -> Result<Grid> {
        let x = |i: usize| i as f64 * dx;
        let grid = match *self {
            InitialCondition::Values(ref v) => {
                if v.len() != n {
                    return Err(SolverError::config(format!(
                        "initial sequence has {} values, grid has {}",
                        v.len(),
                        n
                    )));
                }
                Grid::from(v.clone())
            }
            InitialCondition::Zero => Grid::zeros(n),
            InitialCondition::Gaussian {
                center,
                width,
                amplitude,
            } => {
                if !(width > 0.) {
                    return Err(SolverError::config(format!(
                        "gaussian width must be positive, got {}",
                        width
                    )));
                }
                Grid::from_fn(n, |i| {
                    let s = (x(i) - center) / width;
                    amplitude * (-s * s).exp()
                })
            }
            InitialCondition::Sine { mode, amplitude } => {
                if n < 2 {
                    Grid::zeros(n)
                } else {
                    let k = mode as f64 * PI / (n - 1) as f64;
                    Grid::from_fn(n, |i| amplitude * (k * i as f64).sin())
                }
            }
            InitialCondition::Function(ref p) => Grid::from_fn(n, |i| p.eval(x(i))),
        };
        Ok(grid)
    }
}

/// Periodic source term `amplitude * sin(2 pi t / period + phase)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forcing {
    pub amplitude: f64,
    pub period: f64,
    #[serde(default)]
    pub phase: f64,
}

impl Forcing {
    pub fn new(amplitude: f64, period: f64, phase: f64) -> Self {
        Forcing {
            amplitude,
            period,
            phase,
        }
    }

    pub fn at(&self, t: f64) -> f64 {
        self.amplitude * (2. * PI * t / self.period + self.phase).sin()
    }

    fn validate(&self) -> Result<()> {
        if !(self.amplitude.is_finite() && self.phase.is_finite()) {
            return Err(SolverError::config("forcing amplitude and phase must be finite"));
        }
        if !(self.period.is_finite() && self.period > 0.) {
            return Err(SolverError::config(format!(
                "forcing period must be positive, got {}",
                self.period
            )));
        }
        Ok(())
    }
}

fn default_wave_speed() -> f64 {
    1.
}

/// Everything a run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of grid points N.
    pub grid_size: usize,
    /// Spatial step.
    pub dx: f64,
    /// Time step.
    pub dt: f64,
    #[serde(default = "default_wave_speed")]
    pub wave_speed: f64,
    #[serde(default)]
    pub reality: RealityInputs,
    /// Number of steps after the initial snapshot.
    #[serde(default)]
    pub steps: usize,
    pub initial: InitialCondition,
    /// Snapshot before the initial one. `None` starts at rest.
    #[serde(default)]
    pub previous: Option<InitialCondition>,
    #[serde(default)]
    pub boundary: BoundaryPolicy,
    #[serde(default)]
    pub forcing: Option<Forcing>,
    /// Turn stability warnings into errors.
    #[serde(default)]
    pub strict: bool,
}

impl Config {
    pub fn new(grid_size: usize, dx: f64, dt: f64, steps: usize, initial: InitialCondition) -> Self {
        Config {
            grid_size,
            dx,
            dt,
            wave_speed: default_wave_speed(),
            reality: RealityInputs::default(),
            steps,
            initial,
            previous: None,
            boundary: BoundaryPolicy::default(),
            forcing: None,
            strict: false,
        }
    }

    pub fn with_wave_speed(mut self, c: f64) -> Self {
        self.wave_speed = c;
        self
    }

    pub fn with_reality(mut self, reality: RealityInputs) -> Self {
        self.reality = reality;
        self
    }

    pub fn with_previous(mut self, previous: InitialCondition) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_forcing(mut self, forcing: Forcing) -> Self {
        self.forcing = Some(forcing);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// `(c * dt / dx)^2`. Meaningful only for a valid configuration.
    pub fn courant_number(&self) -> f64 {
        let nu = self.wave_speed * self.dt / self.dx;
        nu * nu
    }

    /// Checks the scalar parameters. Initial conditions are checked when built.
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(SolverError::config("grid size must be positive"));
        }
        if !(self.dx.is_finite() && self.dx > 0.) {
            return Err(SolverError::config(format!("dx must be positive, got {}", self.dx)));
        }
        if !(self.dt.is_finite() && self.dt > 0.) {
            return Err(SolverError::config(format!("dt must be positive, got {}", self.dt)));
        }
        if !self.wave_speed.is_finite() {
            return Err(SolverError::config(format!(
                "wave speed must be finite, got {}",
                self.wave_speed
            )));
        }
        if let Some(ref f) = self.forcing {
            f.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn base() -> Config {
        Config::new(5, 1., 0.5, 3, InitialCondition::Zero)
    }

    #[test]
    fn defaults_from_json() {
        let cfg: Config = serde_json::from_str(
            r#"{ "grid_size": 4, "dx": 0.1, "dt": 0.05, "initial": { "values": [0, 1, 1, 0] } }"#,
        )
        .unwrap();
        assert_eq!(cfg.wave_speed, 1.);
        assert_eq!(cfg.steps, 0);
        assert_eq!(cfg.boundary, BoundaryPolicy::Dirichlet);
        assert_eq!(cfg.reality, RealityInputs::default());
        assert!(cfg.previous.is_none());
        assert!(cfg.forcing.is_none());
        assert!(!cfg.strict);
        cfg.validate().unwrap();
    }

    #[test]
    fn full_json() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "grid_size": 16, "dx": 1.0, "dt": 0.5, "wave_speed": 1.5, "steps": 10,
                "reality": { "conscious_energy": 2.0, "information": 0.5 },
                "initial": { "gaussian": { "center": 8.0, "width": 2.0, "amplitude": 1.0 } },
                "previous": "zero",
                "boundary": "reflecting",
                "forcing": { "amplitude": 0.1, "period": 4.0 },
                "strict": true
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.reality, RealityInputs::new(2., 0.5, 1.));
        assert_eq!(cfg.boundary, BoundaryPolicy::Reflecting);
        assert_eq!(cfg.forcing, Some(Forcing::new(0.1, 4., 0.)));
        assert!(matches!(cfg.previous, Some(InitialCondition::Zero)));
        assert!(cfg.strict);
        assert_eq!(cfg.courant_number(), 0.5625);
    }

    #[test]
    fn rejects_bad_scalars() {
        let cases = vec![
            Config { grid_size: 0, ..base() },
            Config { dx: 0., ..base() },
            Config { dx: -1., ..base() },
            Config { dx: f64::NAN, ..base() },
            Config { dt: 0., ..base() },
            Config { dt: f64::INFINITY, ..base() },
            Config { wave_speed: f64::NAN, ..base() },
            base().with_forcing(Forcing::new(1., 0., 0.)),
            base().with_forcing(Forcing::new(f64::NAN, 1., 0.)),
        ];
        for cfg in cases {
            assert!(matches!(cfg.validate(), Err(SolverError::InvalidConfiguration(_))),
                    "{:?} should be rejected",
                    cfg);
        }
        base().validate().unwrap();
    }

    #[test]
    fn build_profiles() {
        let g = InitialCondition::Sine { mode: 1, amplitude: 2. }.build(3, 0.1).unwrap();
        assert_eq!(g[0], 0.);
        assert_eq!(g[1], 2.);
        assert!(g[2].abs() < 1e-15);

        let g = InitialCondition::Gaussian { center: 1., width: 1., amplitude: 3. }
            .build(3, 1.)
            .unwrap();
        assert_eq!(g[1], 3.);
        assert_eq!(g[0], g[2]);

        let g = InitialCondition::function(|x| 2. * x).build(4, 0.5).unwrap();
        assert_eq!(g.as_slice(), &[0., 1., 2., 3.]);

        assert_eq!(InitialCondition::Sine { mode: 3, amplitude: 1. }.build(1, 1.).unwrap()[0], 0.);
    }

    #[test]
    fn build_rejects_shape() {
        let r = InitialCondition::Values(vec![1., 2.]).build(3, 1.);
        assert!(matches!(r, Err(SolverError::InvalidConfiguration(_))));
        let r = InitialCondition::Gaussian { center: 0., width: 0., amplitude: 1. }.build(3, 1.);
        assert!(matches!(r, Err(SolverError::InvalidConfiguration(_))));
    }

    #[test]
    fn function_profile_is_not_serialized() {
        assert!(serde_json::to_string(&InitialCondition::function(|x| x)).is_err());
        assert_eq!(serde_json::to_string(&InitialCondition::Zero).unwrap(), r#""zero""#);
    }

    #[test]
    fn forcing_value() {
        let f = Forcing::new(2., 4., 0.);
        assert_eq!(f.at(0.), 0.);
        assert_eq!(f.at(1.), 2.);
    }
}
