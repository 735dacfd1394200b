//! Time-axis resampling of trajectory ensembles.
//!
//! Only the time axis ever moves: particle and state-dimension axes pass
//! through untouched, so re-evaluating the ensemble at new time coordinates
//! is linear interpolation between the two bracketing time slices.
//!
//! Requests outside the span of the original coordinates are an error, not
//! extrapolation: they indicate a node count misconfigured relative to the
//! raw data resolution, and must surface at preprocessing time.

use crate::{Error, Result};
use ndarray::{Array4, ArrayView1, ArrayView4};

/// Re-evaluate `sols[M, T, N, D]` at `new_t`, producing `[M, T', N, D]`.
///
/// `old_t` must be strictly increasing with length `T`; every entry of
/// `new_t` must lie within `[old_t[0], old_t[T-1]]`. Pure transform; returns
/// a new array. Resampling onto `old_t` itself reproduces the input exactly.
pub fn resample_in_t(
    sols: &ArrayView4<f32>,
    old_t: &ArrayView1<f32>,
    new_t: &ArrayView1<f32>,
) -> Result<Array4<f32>> {
    let (m_len, t_len, n_len, d_len) = sols.dim();
    if old_t.len() != t_len {
        return Err(Error::Shape("old_t length must match the time axis of sols"));
    }
    if t_len < 2 {
        return Err(Error::Domain("resampling needs at least two time steps"));
    }
    if old_t.iter().any(|x| !x.is_finite()) || new_t.iter().any(|x| !x.is_finite()) {
        return Err(Error::Domain("time coordinates must be finite"));
    }
    let ot: Vec<f32> = old_t.to_vec();
    for i in 1..t_len {
        if ot[i] <= ot[i - 1] {
            return Err(Error::Domain("old_t must be strictly increasing"));
        }
    }
    let (lo, hi) = (ot[0], ot[t_len - 1]);
    if new_t.iter().any(|&x| x < lo || x > hi) {
        return Err(Error::Domain(
            "new_t outside the span of old_t (no extrapolation)",
        ));
    }

    let mut out = Array4::<f32>::zeros((m_len, new_t.len(), n_len, d_len));
    for (j, &tc) in new_t.iter().enumerate() {
        // First index with old_t > tc; bracket is [i0, i0+1].
        let k = ot.partition_point(|&x| x <= tc);
        let i1 = k.clamp(1, t_len - 1);
        let i0 = i1 - 1;
        let w = (tc - ot[i0]) / (ot[i1] - ot[i0]);

        for mi in 0..m_len {
            for ni in 0..n_len {
                for di in 0..d_len {
                    out[[mi, j, ni, di]] =
                        (1.0 - w) * sols[[mi, i0, ni, di]] + w * sols[[mi, i1, ni, di]];
                }
            }
        }
    }

    Ok(out)
}
