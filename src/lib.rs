//! Finite difference method for the 1D wave equation with a scaled coupling term.
//!
//! The field is advanced with the standard explicit scheme, central second order
//! differences in space and time:
//!
//! ```text
//! w[i] = 2 v[i] - u[i] + mu (v[i-1] - 2 v[i] + v[i+1]) + dt² s(t)
//! ```
//!
//! where `u`, `v`, `w` are the snapshots at steps `n - 1`, `n`, `n + 1`,
//! `mu = K (c dt / dx)²` is the Courant number scaled by the reality factor `K`
//! and `s` an optional periodic source.
//!
//! [`run`] produces the whole history eagerly, [`Simulation`] lazily, and
//! [`run_final`] keeps only the last two snapshots.
//!
//! ```
//! use fdm_wave::{run, Config, InitialCondition};
//!
//! let config = Config::new(5, 1., 0.5, 1, InitialCondition::Values(vec![0., 1., 0., 0., 0.]));
//! let history = run(&config).unwrap();
//! assert_eq!(history.len(), 2);
//! assert_eq!(history.last()[1], 0.5);
//! ```

use std::cmp::min;

pub mod config;
pub mod error;
pub mod grid;
pub mod reality;
pub mod solver;

pub use config::{BoundaryPolicy, Config, Forcing, InitialCondition, Profile};
pub use error::{Result, SolverError};
pub use grid::Grid;
pub use reality::{compute_reality_factor, RealityInputs};
pub use solver::{
    initialize, run, run_batch, run_final, step, Constants, FinalState, History, InitialState, Phase,
    Simulation, StabilityWarning, Stepped,
};

/// Performs one step of the finite difference scheme.
///
/// - `u`: value at step `n - 1`
/// - `v`: value at step `n`
/// - `w`: computed value at step `n + 1`
/// - `mu`: coupling, `K c² τ² / h²` where τ is the time step and h the space step
/// - `boundary`: with `Dirichlet` the edge values of `v` are copied, with
///   `Reflecting` the stencil runs at the edges with the outside neighbour
///   replaced by the edge sample (zero Neumann data)
/// - `source`: added to every updated sample, already multiplied by τ²
pub fn wave_step(u: &[f64], v: &[f64], w: &mut [f64], mu: f64, boundary: BoundaryPolicy, source: f64) {
    let n = v.len();
    assert_eq!(u.len(), n);
    assert_eq!(w.len(), n);
    if n == 0 {
        return;
    }

    let (start, end) = match boundary {
        BoundaryPolicy::Dirichlet => (1, n - 1),
        BoundaryPolicy::Reflecting => (0, n),
    };

    for i in start..end {
        let il = i.saturating_sub(1);
        let ir = min(i + 1, n - 1);
        w[i] = 2. * v[i] - u[i] + mu * (v[il] + v[ir] - 2. * v[i]) + source;
    }

    if boundary == BoundaryPolicy::Dirichlet {
        w[0] = v[0];
        w[n - 1] = v[n - 1];
    }
}

#[cfg(test)]
mod test {
    use ndarray::Array1;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use super::*;

    /// Reference implementation with explicit ghost values.
    fn wave_step_reference(u: &Array1<f64>,
                           v: &Array1<f64>,
                           w: &mut Array1<f64>,
                           mu: f64,
                           boundary: BoundaryPolicy,
                           source: f64) {
        let n = v.len();
        for i in 0..n {
            let on_edge = i == 0 || i == n - 1;
            if on_edge && boundary == BoundaryPolicy::Dirichlet {
                w[i] = v[i];
                continue;
            }
            let vc = v[i];
            let vl = if i == 0 { vc } else { v[i - 1] };
            let vr = if i == n - 1 { vc } else { v[i + 1] };
            w[i] = 2. * vc - u[i] + mu * (vl + vr - 2. * vc) + source;
        }
    }

    fn test_len(n: usize, boundary: BoundaryPolicy) {
        let mu = 0.81;
        let source = 0.03;
        let u = Array1::random(n, Uniform::new(0., 1.));
        let v = Array1::random(n, Uniform::new(0., 1.));
        let mut w_ref = Array1::zeros(n);

        wave_step_reference(&u, &v, &mut w_ref, mu, boundary, source);

        let mut w = Array1::zeros(n);
        wave_step(u.as_slice().unwrap(),
                  v.as_slice().unwrap(),
                  w.as_slice_mut().unwrap(),
                  mu,
                  boundary,
                  source);

        let d = &w - &w_ref;
        let err = (&d * &d).sum();
        if err > 1e-10 {
            println!("{}\n", w);
            println!("{}\n", w_ref);
            panic!("Error too big: {}", err);
        }
    }

    #[test]
    fn test_equal() {
        for &boundary in &[BoundaryPolicy::Dirichlet, BoundaryPolicy::Reflecting] {
            test_len(1, boundary);
            test_len(2, boundary);
            test_len(3, boundary);
            test_len(20, boundary);
            test_len(4096, boundary);
        }
    }

    #[test]
    fn solver_step_matches_reference() {
        let n = 64;
        let u = Grid::from(Array1::random(n, Uniform::new(-1., 1.)));
        let v = Grid::from(Array1::random(n, Uniform::new(-1., 1.)));
        let config = Config::new(n, 0.1, 0.05, 1, InitialCondition::Zero)
            .with_wave_speed(1.5)
            .with_reality(RealityInputs::new(0.5, 2., 0.8))
            .with_boundary(BoundaryPolicy::Reflecting)
            .with_forcing(Forcing::new(0.2, 0.3, 0.1));
        let constants = Constants::from_config(&config).unwrap();
        let index = 3;

        let next = step(&u, &v, &constants, index).unwrap().grid;

        let mut w_ref = Array1::zeros(n);
        wave_step_reference(&u.to_array(),
                            &v.to_array(),
                            &mut w_ref,
                            constants.coupling(),
                            constants.boundary(),
                            constants.source_at(index));
        let d = &next.view() - &w_ref;
        let err = (&d * &d).sum();
        if err > 1e-10 {
            println!("{}\n", next.view());
            println!("{}\n", w_ref);
            panic!("Error too big: {}", err);
        }
        assert_eq!(Grid::from(w_ref), next);
    }

    #[test]
    fn single_bump() {
        let v = [0., 1., 0., 0., 0.];
        let mut w = [0.; 5];
        wave_step(&v, &v, &mut w, 0.25, BoundaryPolicy::Dirichlet, 0.);
        assert_eq!(w, [0., 0.5, 0.25, 0., 0.]);
    }

    #[test]
    fn reflecting_edges_use_clamped_neighbour() {
        let u = [1., 1., 1.];
        let v = [2., 0., 0.];
        let mut w = [0.; 3];
        wave_step(&u, &v, &mut w, 0.5, BoundaryPolicy::Reflecting, 0.);
        // w[0] = 4 - 1 + 0.5 (2 + 0 - 4)
        assert_eq!(w, [2., 0., -1.]);
    }

    #[test]
    fn empty_is_noop() {
        let mut w: [f64; 0] = [];
        wave_step(&[], &[], &mut w, 1., BoundaryPolicy::Reflecting, 1.);
    }

    #[test]
    #[should_panic]
    fn length_mismatch_panics() {
        let mut w = [0.; 3];
        wave_step(&[0.; 2], &[0.; 3], &mut w, 1., BoundaryPolicy::Dirichlet, 0.);
    }
}
