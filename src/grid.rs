//! One time-step snapshot of the field.

use std::ops::Index;

use ndarray::{Array1, ArrayView1};

/// Samples of the field at one time step, indexed `0..len()`.
///
/// Storage is a plain contiguous buffer so the stencil kernel can work on slices;
/// [`Grid::view`] exposes it as an `ndarray` view.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Vec<f64>,
}

impl Grid {
    pub fn zeros(n: usize) -> Self {
        Grid { data: vec![0.; n] }
    }

    /// Samples `f(i)` for `i` in `0..n`.
    pub fn from_fn<F: FnMut(usize) -> f64>(n: usize, f: F) -> Self {
        Grid { data: (0..n).map(f).collect() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn view(&self) -> ArrayView1<f64> {
        ArrayView1::from(&self.data[..])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_slice_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(self.data.clone())
    }

    /// Values at indices 0 and `len() - 1`.
    pub fn edges(&self) -> Option<(f64, f64)> {
        match (self.data.first(), self.data.last()) {
            (Some(&l), Some(&r)) => Some((l, r)),
            _ => None,
        }
    }

    /// Index of the first NaN or infinite sample.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.data.iter().position(|x| !x.is_finite())
    }

    /// Largest absolute sample, 0 for an empty grid.
    pub fn peak(&self) -> f64 {
        self.data.iter().fold(0., |m, x| f64::max(m, x.abs()))
    }
}

impl From<Vec<f64>> for Grid {
    fn from(v: Vec<f64>) -> Self {
        Grid { data: v }
    }
}

impl From<Array1<f64>> for Grid {
    fn from(data: Array1<f64>) -> Self {
        Grid { data: data.iter().cloned().collect() }
    }
}

impl Index<usize> for Grid {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}
