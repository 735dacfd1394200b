//! Validated container for the simulated trajectory ensemble.
//!
//! The ensemble arrives from the data-generation collaborator already
//! normalized in state space; this module only checks structure, it never
//! rescales states.

use crate::{Error, Result};
use ndarray::{Array1, Array2, Array4};

/// A simulated trajectory ensemble for a parametric family of systems.
///
/// Immutable once constructed. `sols` is indexed `(M, T, N, D)` =
/// (parameter instance, time step, particle, state dimension); `mus` holds
/// one parameter vector per instance, in the same order as the `M` axis;
/// `t` holds the simulation time of each step.
#[derive(Debug, Clone)]
pub struct TrajectoryDataset {
    pub sols: Array4<f32>,
    pub mus: Array2<f32>,
    pub t: Array1<f32>,
}

impl TrajectoryDataset {
    /// Validate shapes and time structure.
    ///
    /// Requires at least one instance/particle/dimension, at least two time
    /// steps, `mus.nrows() == M`, `t.len() == T`, and `t` finite, strictly
    /// increasing, starting at or after 0.
    pub fn new(sols: Array4<f32>, mus: Array2<f32>, t: Array1<f32>) -> Result<Self> {
        let (m_len, t_len, n_len, d_len) = sols.dim();
        if m_len == 0 || n_len == 0 || d_len == 0 {
            return Err(Error::Shape("sols must have at least one instance, particle and dimension"));
        }
        if t_len < 2 {
            return Err(Error::Shape("sols must have at least two time steps"));
        }
        if mus.nrows() != m_len {
            return Err(Error::Shape("mus rows must match the instance axis of sols"));
        }
        if mus.ncols() == 0 {
            return Err(Error::Shape("mus must have at least one column"));
        }
        if t.len() != t_len {
            return Err(Error::Shape("t length must match the time axis of sols"));
        }
        if t.iter().any(|x| !x.is_finite()) {
            return Err(Error::Domain("t must be finite"));
        }
        if t[0] < 0.0 {
            return Err(Error::Domain("t must start at or after 0"));
        }
        for i in 1..t_len {
            if t[i] <= t[i - 1] {
                return Err(Error::Domain("t must be strictly increasing"));
            }
        }
        Ok(Self { sols, mus, t })
    }

    /// `(M, T, N, D)`.
    pub fn dims(&self) -> (usize, usize, usize, usize) {
        self.sols.dim()
    }

    /// Time coordinates rescaled so the final one is exactly 1.0.
    pub fn normalized_time(&self) -> Array1<f32> {
        let last = self.t[self.t.len() - 1];
        self.t.mapv(|x| x / last)
    }
}
