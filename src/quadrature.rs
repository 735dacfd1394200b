//! Gauss–Legendre quadrature rules on arbitrary intervals.
//!
//! The time-integral in the surrogate loss is estimated as
//! \(\int_a^b f(t)\,dt \approx \sum_i w_i f(t_i)\). The rule here is the
//! classical Gauss–Legendre one: `count` nodes strictly inside `(a, b)`,
//! exact for polynomials of degree `<= 2*count - 1`.
//!
//! Node solves run in `f64` (Newton on the Legendre recurrence) and the
//! result is returned `f32`, keeping the public surface `f32`-first.

use crate::{Error, Result};
use ndarray::Array1;

/// Legendre \(P_n(x)\) and \(P_n'(x)\) via the three-term recurrence.
///
/// Valid for `n >= 1` and `x` strictly inside `(-1, 1)` (the derivative
/// identity divides by `1 - x^2`).
fn legendre_and_deriv(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0f64; // P_0
    let mut p = x; // P_1
    for k in 2..=n {
        let kf = k as f64;
        let p_next = ((2.0 * kf - 1.0) * x * p - (kf - 1.0) * p_prev) / kf;
        p_prev = p;
        p = p_next;
    }
    let dp = (n as f64) * (p_prev - x * p) / (1.0 - x * x);
    (p, dp)
}

/// Gauss–Legendre rule with `count` nodes on `(a, b)`.
///
/// Returns `(nodes, weights)` with nodes strictly inside the open interval,
/// sorted ascending, and weights summing to `b - a`. Deterministic; no
/// randomness, no side effects.
///
/// Errors: `count < 1`, a non-finite interval, or `a >= b`.
pub fn gauss_legendre(count: usize, a: f32, b: f32) -> Result<(Array1<f32>, Array1<f32>)> {
    if count < 1 {
        return Err(Error::Domain("quadrature node count must be >= 1"));
    }
    if !a.is_finite() || !b.is_finite() {
        return Err(Error::Domain("quadrature interval must be finite"));
    }
    if a >= b {
        return Err(Error::Domain("quadrature interval must satisfy a < b"));
    }

    let n = count;
    let mut xs = vec![0.0f64; n];
    let mut ws = vec![0.0f64; n];

    // Roots of P_n come in +/- pairs; solve the nonnegative half and mirror.
    let half_n = n.div_ceil(2);
    for i in 0..half_n {
        // Tricomi initial guess for the i-th largest root, then Newton.
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..64 {
            let (p, dp) = legendre_and_deriv(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre_and_deriv(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        // i-th largest root is x > 0 (or 0 at the middle of an odd rule).
        xs[n - 1 - i] = x;
        xs[i] = -x;
        ws[n - 1 - i] = w;
        ws[i] = w;
    }

    // Affine map [-1, 1] -> [a, b]; weights pick up the Jacobian b-a over 2.
    let half = 0.5 * (f64::from(b) - f64::from(a));
    let mid = 0.5 * (f64::from(a) + f64::from(b));
    let nodes = Array1::from_iter(xs.iter().map(|&x| (mid + half * x) as f32));
    let weights = Array1::from_iter(ws.iter().map(|&w| (half * w) as f32));

    Ok((nodes, weights))
}
