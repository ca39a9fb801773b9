//! Time stepping: setup, the single step and the run loop.

use std::cmp::min;
use std::fmt;
use std::iter::FusedIterator;
use std::mem;

use log::{debug, trace, warn};

use crate::config::{BoundaryPolicy, Config, Forcing};
use crate::error::{Result, SolverError};
use crate::grid::Grid;
use crate::wave_step;

/// The scheme is outside its stability bound. Reported, not fatal unless the
/// run is strict.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StabilityWarning {
    /// `(c dt / dx)²`
    pub courant: f64,
    /// Courant number times the reality factor; the coefficient actually used.
    /// Informational only, the warning is keyed on `courant`.
    pub coupling: f64,
}

impl fmt::Display for StabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "courant number {} exceeds 1 (coupling {}), the explicit scheme may diverge",
               self.courant,
               self.coupling)
    }
}

/// Scalars derived once from a validated [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct Constants {
    dx: f64,
    dt: f64,
    wave_speed: f64,
    reality_factor: f64,
    courant: f64,
    coupling: f64,
    boundary: BoundaryPolicy,
    forcing: Option<Forcing>,
    strict: bool,
}

impl Constants {
    pub fn from_config(config: &Config) -> Result<Constants> {
        config.validate()?;
        let reality_factor = config.reality.factor()?;
        let courant = config.courant_number();
        let coupling = reality_factor * courant;
        if !coupling.is_finite() {
            return Err(SolverError::domain(0,
                                           format!("coupling is {} (courant number {}, reality factor {})",
                                                   coupling,
                                                   courant,
                                                   reality_factor)));
        }
        Ok(Constants {
            dx: config.dx,
            dt: config.dt,
            wave_speed: config.wave_speed,
            reality_factor,
            courant,
            coupling,
            boundary: config.boundary,
            forcing: config.forcing,
            strict: config.strict,
        })
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn wave_speed(&self) -> f64 {
        self.wave_speed
    }

    pub fn reality_factor(&self) -> f64 {
        self.reality_factor
    }

    pub fn courant(&self) -> f64 {
        self.courant
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// CFL check: warns when `(c dt / dx)² > 1`, whatever the reality factor.
    pub fn stability(&self) -> Option<StabilityWarning> {
        if self.courant > 1. {
            Some(StabilityWarning {
                courant: self.courant,
                coupling: self.coupling,
            })
        } else {
            None
        }
    }

    /// Source term for the step leaving snapshot `index`, premultiplied by dt².
    pub fn source_at(&self, index: usize) -> f64 {
        match self.forcing {
            Some(ref f) => self.dt * self.dt * f.at(index as f64 * self.dt),
            None => 0.,
        }
    }
}

/// The two snapshots seeding the recurrence, plus the run constants.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub constants: Constants,
    /// Snapshot at index 0.
    pub current: Grid,
    /// Snapshot before index 0. Equal to `current` for a start at rest.
    pub previous: Grid,
}

fn check_finite(grid: &Grid, step: usize, what: &str) -> Result<()> {
    match grid.first_non_finite() {
        Some(i) => Err(SolverError::domain(step, format!("{} sample {} is {}", what, i, grid[i]))),
        None => Ok(()),
    }
}

/// Validates `config` and builds the initial and previous grids.
pub fn initialize(config: &Config) -> Result<InitialState> {
    let constants = Constants::from_config(config)?;
    let n = config.grid_size;

    let current = config.initial.build(n, config.dx)?;
    check_finite(&current, 0, "initial")?;
    let previous = match config.previous {
        Some(ref p) => {
            let g = p.build(n, config.dx)?;
            check_finite(&g, 0, "previous")?;
            g
        }
        None => current.clone(),
    };

    debug!("initialized grid of {} points: courant number {}, reality factor {}, coupling {}, {:?} boundary",
           n,
           constants.courant,
           constants.reality_factor,
           constants.coupling,
           constants.boundary);

    Ok(InitialState {
        constants,
        current,
        previous,
    })
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq)]
pub struct Stepped {
    pub grid: Grid,
    pub warning: Option<StabilityWarning>,
}

/// Computes the snapshot after `current`, whose time index is `index`.
///
/// Neither input is modified. Errors carry the index of the produced snapshot.
pub fn step(previous: &Grid, current: &Grid, constants: &Constants, index: usize) -> Result<Stepped> {
    let n = current.len();
    if previous.len() != n {
        return Err(SolverError::config(format!("previous grid has {} points, current has {}",
                                               previous.len(),
                                               n)));
    }
    let target = index + 1;
    check_finite(previous, target, "previous")?;
    check_finite(current, target, "current")?;

    let warning = constants.stability();
    if let (Some(w), true) = (warning, constants.strict) {
        return Err(SolverError::Unstable {
            step: target,
            courant: w.courant,
            coupling: w.coupling,
        });
    }

    let mut next = Grid::zeros(n);
    wave_step(previous.as_slice(),
              current.as_slice(),
              next.as_slice_mut(),
              constants.coupling,
              constants.boundary,
              constants.source_at(index));
    check_finite(&next, target, "updated")?;

    trace!("step {}: peak {}", target, next.peak());
    Ok(Stepped {
        grid: next,
        warning,
    })
}

/// Where a [`Simulation`] is in its run. A run that does not exist yet is
/// uninitialized; building a `Simulation` moves it to `Initialized`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// The initial snapshot has not been emitted yet.
    Initialized,
    /// Steps remain.
    Stepping,
    /// The step budget is exhausted or a step failed.
    Completed,
}

/// A lazy run, yielding the initial snapshot and then one snapshot per step.
///
/// Only the two most recent snapshots are kept. After an error nothing more is
/// yielded. To replay, build a new `Simulation` from the same config.
#[derive(Debug, Clone)]
pub struct Simulation {
    constants: Constants,
    previous: Grid,
    current: Grid,
    index: usize,
    steps: usize,
    phase: Phase,
    warning: Option<StabilityWarning>,
}

impl Simulation {
    pub fn new(config: &Config) -> Result<Simulation> {
        Simulation::from_state(initialize(config)?, config.steps)
    }

    /// Starts from an already initialized state. In strict mode an unstable
    /// scheme is rejected here, at step 0.
    pub fn from_state(state: InitialState, steps: usize) -> Result<Simulation> {
        let warning = state.constants.stability();
        if let Some(w) = warning {
            if state.constants.strict {
                return Err(SolverError::Unstable {
                    step: 0,
                    courant: w.courant,
                    coupling: w.coupling,
                });
            }
            warn!("{}", w);
        }
        Ok(Simulation {
            constants: state.constants,
            previous: state.previous,
            current: state.current,
            index: 0,
            steps,
            phase: Phase::Initialized,
            warning,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Time index of the current snapshot.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn current(&self) -> &Grid {
        &self.current
    }

    pub fn previous(&self) -> &Grid {
        &self.previous
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn warning(&self) -> Option<StabilityWarning> {
        self.warning
    }

    /// Snapshots still to be emitted, assuming no step fails.
    pub fn remaining(&self) -> usize {
        match self.phase {
            Phase::Initialized => self.steps.saturating_add(1),
            Phase::Stepping => self.steps - self.index,
            Phase::Completed => 0,
        }
    }

    /// Emits the next snapshot by reference: the initial one first, then the
    /// result of one step per call.
    pub fn advance(&mut self) -> Option<Result<&Grid>> {
        match self.phase {
            Phase::Initialized => {
                self.phase = if self.steps == 0 {
                    Phase::Completed
                } else {
                    Phase::Stepping
                };
                Some(Ok(&self.current))
            }
            Phase::Stepping => {
                match step(&self.previous, &self.current, &self.constants, self.index) {
                    Ok(next) => {
                        self.previous = mem::replace(&mut self.current, next.grid);
                        self.index += 1;
                        if self.index >= self.steps {
                            self.phase = Phase::Completed;
                        }
                        Some(Ok(&self.current))
                    }
                    Err(e) => {
                        self.phase = Phase::Completed;
                        Some(Err(e))
                    }
                }
            }
            Phase::Completed => None,
        }
    }
}

impl Iterator for Simulation {
    type Item = Result<Grid>;

    fn next(&mut self) -> Option<Result<Grid>> {
        self.advance().map(|r| r.map(Grid::clone))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl FusedIterator for Simulation {}

/// All snapshots of a run in temporal order, starting with the initial one.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    snapshots: Vec<Grid>,
    warnings: Vec<StabilityWarning>,
}

impl History {
    /// Number of snapshots, `steps + 1`.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Never true for a history produced by [`run`].
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Grid> {
        self.snapshots.get(index)
    }

    pub fn snapshots(&self) -> &[Grid] {
        &self.snapshots
    }

    pub fn iter(&self) -> std::slice::Iter<Grid> {
        self.snapshots.iter()
    }

    pub fn first(&self) -> &Grid {
        &self.snapshots[0]
    }

    pub fn last(&self) -> &Grid {
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn warnings(&self) -> &[StabilityWarning] {
        &self.warnings
    }

    pub fn into_snapshots(self) -> Vec<Grid> {
        self.snapshots
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Grid;
    type IntoIter = std::slice::Iter<'a, Grid>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

/// Upper bound on the snapshots reserved up front by [`run`].
const PREALLOCATED_SNAPSHOTS: usize = 1024;

/// Runs `config` to completion, keeping every snapshot.
pub fn run(config: &Config) -> Result<History> {
    let mut sim = Simulation::new(config)?;
    let mut snapshots = Vec::with_capacity(min(sim.remaining(), PREALLOCATED_SNAPSHOTS));
    for grid in &mut sim {
        snapshots.push(grid?);
    }
    debug!("run completed: {} snapshots of {} points", snapshots.len(), config.grid_size);
    Ok(History {
        snapshots,
        warnings: sim.warning.into_iter().collect(),
    })
}

/// Outcome of a run that kept only the last two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalState {
    /// Snapshot at index `steps`.
    pub grid: Grid,
    pub steps: usize,
    /// Largest absolute sample over the whole run.
    pub peak: f64,
    pub warnings: Vec<StabilityWarning>,
}

/// Runs `config` to completion in O(N) memory.
pub fn run_final(config: &Config) -> Result<FinalState> {
    let mut sim = Simulation::new(config)?;
    let mut peak = 0f64;
    while let Some(grid) = sim.advance() {
        peak = peak.max(grid?.peak());
    }
    debug!("run completed: {} steps, peak {}", sim.index, peak);
    Ok(FinalState {
        steps: sim.index,
        peak,
        warnings: sim.warning.into_iter().collect(),
        grid: sim.current,
    })
}

/// Runs independent configurations, in parallel with the `parallel` feature.
///
/// Results are in the order of `configs`.
#[cfg(feature = "parallel")]
pub fn run_batch(configs: &[Config]) -> Vec<Result<History>> {
    use rayon::prelude::*;
    configs.par_iter().map(run).collect()
}

/// Runs independent configurations, in parallel with the `parallel` feature.
///
/// Results are in the order of `configs`.
#[cfg(not(feature = "parallel"))]
pub fn run_batch(configs: &[Config]) -> Vec<Result<History>> {
    configs.iter().map(run).collect()
}
