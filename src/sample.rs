//! Batch construction: time-scheme selection and the batch sampler.
//!
//! The pipeline has exactly one preprocessing transition: given a validated
//! ensemble and a [`SampleConfig`], [`BatchSampler::prepare`] resolves the
//! configured schemes, optionally resamples the dataset onto a canonical
//! time grid (fixed quadrature / piecewise quadrature / equispaced), and
//! returns a sampler. From then on every training step calls
//! [`BatchSampler::sample`] with a fresh key and a progress scalar.
//!
//! The contract that matters most here: whichever time indices a batch
//! draws, the returned time coordinates (and quadrature weights, when the
//! canonical grid carries any) are gathered through the *same* index set,
//! in the same order. Getting this wrong silently corrupts the loss.

use crate::dataset::TrajectoryDataset;
use crate::quadrature::gauss_legendre;
use crate::resample::resample_in_t;
use crate::{Error, Result};
use ndarray::{Array1, Array2, Array3, Array4};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::str::FromStr;

/// How training time points are produced.
///
/// `Gauss`, `Piece` and `Equi` resample the dataset once onto a canonical
/// grid at preparation time; every batch then uses the full grid. `Rand` and
/// `Seq` keep the original grid and subsample it per batch. `Raw` uses the
/// original grid untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeScheme {
    /// Fixed Gauss–Legendre nodes on `[0,1]` plus both boundaries.
    Gauss,
    /// Per-segment Gauss–Legendre rules over a partition of the original grid.
    Piece,
    /// Evenly spaced canonical grid, no quadrature weights.
    Equi,
    /// Per-batch random interior subsample of the original grid.
    Rand,
    /// Progressive (curriculum) subsample: early batches draw from an early
    /// time window that widens as training progresses.
    Seq,
    /// Original grid, no subsampling.
    Raw,
}

impl FromStr for TimeScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gauss" => Ok(Self::Gauss),
            "piece" => Ok(Self::Piece),
            "equi" => Ok(Self::Equi),
            "rand" => Ok(Self::Rand),
            "seq" => Ok(Self::Seq),
            "raw" => Ok(Self::Raw),
            other => Err(Error::Config(format!(
                "unrecognized time scheme {other:?} (expected gauss|piece|equi|rand|seq|raw)"
            ))),
        }
    }
}

/// How particle indices are drawn within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleScheme {
    /// A fresh particle subset per selected time step.
    Independent,
    /// One particle subset shared across all selected time steps.
    Shared,
}

impl FromStr for ParticleScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rand" => Ok(Self::Independent),
            "traj" => Ok(Self::Shared),
            other => Err(Error::Config(format!(
                "unrecognized particle scheme {other:?} (expected rand|traj)"
            ))),
        }
    }
}

/// Batch-construction configuration.
///
/// `bs_t` and `bs_n` are requests, not demands: they clamp to what the
/// dataset actually holds (over-requesting is a common sweep mistake and is
/// harmless). Scheme names from a config file should go through `FromStr`
/// so unknown names fail before training starts.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Requested particles per batch.
    pub bs_n: usize,
    /// Requested interior time points per batch.
    pub bs_t: usize,
    pub scheme_t: TimeScheme,
    pub scheme_n: ParticleScheme,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            bs_n: 256,
            bs_t: 256,
            scheme_t: TimeScheme::Gauss,
            scheme_n: ParticleScheme::Shared,
        }
    }
}

/// One training batch: a single parameter instance, a set of time points
/// and a particle subset.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Gathered states, `(T_b, N_b, D)`.
    pub states: Array3<f32>,
    /// Parameter vector of the chosen instance.
    pub mu: Array1<f32>,
    /// Time coordinates matching the leading axis of `states`, ascending.
    pub t: Array1<f32>,
    /// Quadrature weights aligned 1:1 with the interior entries of `t`
    /// (positions `1..len-1`), present only under quadrature schemes.
    pub weights: Option<Array1<f32>>,
}

// ChaCha streams for the independent random decisions of one draw. The
// particle stream is a base: under `ParticleScheme::Independent`, step k
// uses stream `STREAM_N + k`.
const STREAM_MU: u64 = 0;
const STREAM_T: u64 = 1;
const STREAM_N: u64 = 2;

/// Usable upper time index under the curriculum at a given training progress.
///
/// Ten discrete thresholds, evenly spaced from 20% to 100% of the interior
/// range; `progress` snaps to the closest threshold. Non-decreasing in
/// `progress`, equals `t_len - 1` at `progress = 1.0`.
pub fn curriculum_bound(progress: f32, t_len: usize) -> usize {
    let last = t_len.saturating_sub(1).max(1);
    let mut closest = 0.2f32;
    let mut best = f32::INFINITY;
    for k in 0..10 {
        let g = 0.2 + 0.8 * (k as f32) / 9.0;
        let dist = (g - progress).abs();
        if dist < best {
            best = dist;
            closest = g;
        }
    }
    (((last as f32) * closest).floor() as usize).clamp(1, last)
}

/// Contiguous near-equal index partition of `0..len` into `segs` chunks
/// (first `len % segs` chunks get one extra element). Returns inclusive
/// `(start, end)` index pairs.
fn split_segments(len: usize, segs: usize) -> Vec<(usize, usize)> {
    let base = len / segs;
    let rem = len % segs;
    let mut out = Vec::with_capacity(segs);
    let mut start = 0usize;
    for k in 0..segs {
        let size = base + usize::from(k < rem);
        out.push((start, start + size - 1));
        start += size;
    }
    out
}

/// Draws training batches from a (possibly resampled) trajectory ensemble.
///
/// Construction resolves the configured schemes once; [`Self::sample`] never
/// mutates the sampler, so it is safe to call from several threads without
/// coordination. Each call is an independent stochastic draw keyed by the
/// caller.
#[derive(Debug, Clone)]
pub struct BatchSampler {
    sols: Array4<f32>,
    mus: Array2<f32>,
    t: Array1<f32>,
    weights: Option<Array1<f32>>,
    bs_t: usize,
    bs_n: usize,
    scheme_t: TimeScheme,
    scheme_n: ParticleScheme,
}

impl BatchSampler {
    /// Run the one-time time-scheme selection and build the sampler.
    ///
    /// Time coordinates are first normalized so the final one is 1.0 (raw
    /// simulation times are accepted as-is). Under `Gauss`/`Piece`/`Equi`
    /// the dataset is resampled here onto the canonical grid; the original
    /// arrays are dropped. Under the other schemes the dataset passes
    /// through untouched.
    ///
    /// Setup is the only place this subsystem can fail: zero batch sizes,
    /// quadrature grids that exceed the raw data span, and degenerate
    /// partitions all surface as errors before training starts.
    pub fn prepare(dataset: TrajectoryDataset, cfg: &SampleConfig) -> Result<Self> {
        let (_m_len, t_len, n_len, _d_len) = dataset.dims();
        if cfg.bs_t == 0 || cfg.bs_n == 0 {
            return Err(Error::Domain("bs_t and bs_n must be >= 1"));
        }
        let bs_t = cfg.bs_t.min(t_len);
        let bs_n = cfg.bs_n.min(n_len);

        let t = dataset.normalized_time();
        let TrajectoryDataset { sols, mus, .. } = dataset;

        let (sols, t, weights) = match cfg.scheme_t {
            TimeScheme::Gauss => {
                let (nodes, w) = gauss_legendre(bs_t, 0.0, 1.0)?;
                let grid = with_boundaries(&nodes);
                let sols = resample_in_t(&sols.view(), &t.view(), &grid.view())?;
                (sols, grid, Some(w))
            }
            TimeScheme::Piece => {
                // Points-per-segment currently equals bs_t, so the floor-divided
                // segment count is one. The split machinery is exercised
                // regardless; a multi-segment rule only changes these two lines.
                let pts_per_seg = bs_t;
                let segs = bs_t / pts_per_seg;

                let mut nodes: Vec<f32> = Vec::with_capacity(bs_t);
                let mut w_all: Vec<f32> = Vec::with_capacity(bs_t);
                for (start, end) in split_segments(t.len(), segs) {
                    if start == end {
                        return Err(Error::Domain(
                            "piecewise scheme produced a single-point segment",
                        ));
                    }
                    let (seg_nodes, seg_w) = gauss_legendre(pts_per_seg, t[start], t[end])?;
                    nodes.extend(seg_nodes.iter());
                    w_all.extend(seg_w.iter());
                }

                let grid = with_boundaries(&Array1::from_vec(nodes));
                let sols = resample_in_t(&sols.view(), &t.view(), &grid.view())?;
                (sols, grid, Some(Array1::from_vec(w_all)))
            }
            TimeScheme::Equi => {
                let grid = Array1::linspace(0.0f32, 1.0, bs_t + 2);
                let sols = resample_in_t(&sols.view(), &t.view(), &grid.view())?;
                (sols, grid, None)
            }
            TimeScheme::Rand | TimeScheme::Seq | TimeScheme::Raw => (sols, t, None),
        };

        log::info!(
            "prepared sampler: scheme_t={:?} scheme_n={:?} grid_len={} bs_t={} bs_n={}",
            cfg.scheme_t,
            cfg.scheme_n,
            t.len(),
            bs_t,
            bs_n
        );

        Ok(Self {
            sols,
            mus,
            t,
            weights,
            bs_t,
            bs_n,
            scheme_t: cfg.scheme_t,
            scheme_n: cfg.scheme_n,
        })
    }

    /// The canonical time grid batches draw from.
    pub fn time_grid(&self) -> &Array1<f32> {
        &self.t
    }

    /// Canonical quadrature weights, if the selected scheme produced any.
    pub fn quad_weights(&self) -> Option<&Array1<f32>> {
        self.weights.as_ref()
    }

    /// Effective (clamped) `(bs_t, bs_n)`.
    pub fn batch_sizes(&self) -> (usize, usize) {
        (self.bs_t, self.bs_n)
    }

    /// `(M, T, N, D)` of the dataset the sampler holds (post-resampling).
    pub fn dims(&self) -> (usize, usize, usize, usize) {
        self.sols.dim()
    }

    fn stream(&self, key: u64, stream: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(key);
        rng.set_stream(stream);
        rng
    }

    /// Time indices for one batch, sorted ascending with no duplicates.
    ///
    /// Boundary indices are unioned in and may collide with a drawn index;
    /// duplicates are dropped rather than redrawn, so the selected count can
    /// be smaller than `bs_t + 2` but the draw stays bounded in time.
    fn select_time_indices(&self, key: u64, progress: f32) -> Vec<usize> {
        let t_len = self.t.len();
        match self.scheme_t {
            TimeScheme::Rand => {
                let mut rng = self.stream(key, STREAM_T);
                let interior = t_len.saturating_sub(2);
                let take = self.bs_t.min(interior);
                let mut idx: Vec<usize> = index::sample(&mut rng, interior, take)
                    .into_iter()
                    .map(|i| i + 1)
                    .collect();
                idx.push(0);
                idx.push(t_len - 1);
                idx.sort_unstable();
                idx.dedup();
                idx
            }
            TimeScheme::Seq => {
                let bound = curriculum_bound(progress, t_len);
                let mut rng = self.stream(key, STREAM_T);
                let take = self.bs_t.min(bound);
                let mut idx: Vec<usize> = index::sample(&mut rng, bound, take)
                    .into_iter()
                    .map(|i| i + 1)
                    .collect();
                idx.push(0);
                idx.push(bound);
                idx.sort_unstable();
                idx.dedup();
                idx
            }
            TimeScheme::Gauss | TimeScheme::Piece | TimeScheme::Equi | TimeScheme::Raw => {
                (0..t_len).collect()
            }
        }
    }

    /// Draw one batch.
    ///
    /// Same `key` reproduces the batch bit for bit; distinct keys are
    /// statistically independent (parameter, time and particle decisions run
    /// on separate ChaCha streams of the key). `progress` must be the overall
    /// training completion in `[0,1]`; only `TimeScheme::Seq` consumes it.
    pub fn sample(&self, key: u64, progress: f32) -> Result<Batch> {
        let (m_len, _t_len, n_len, d_len) = self.sols.dim();

        let mut rng_m = self.stream(key, STREAM_MU);
        let m_idx = rng_m.random_range(0..m_len);

        let t_idx = self.select_time_indices(key, progress);
        let n_take = self.bs_n.min(n_len);

        let mut states = Array3::<f32>::zeros((t_idx.len(), n_take, d_len));
        match self.scheme_n {
            ParticleScheme::Shared => {
                let mut rng = self.stream(key, STREAM_N);
                let n_idx = index::sample(&mut rng, n_len, n_take);
                for (k, &ti) in t_idx.iter().enumerate() {
                    for (j, ni) in n_idx.iter().enumerate() {
                        for di in 0..d_len {
                            states[[k, j, di]] = self.sols[[m_idx, ti, ni, di]];
                        }
                    }
                }
            }
            ParticleScheme::Independent => {
                for (k, &ti) in t_idx.iter().enumerate() {
                    let mut rng = self.stream(key, STREAM_N + k as u64);
                    let n_idx = index::sample(&mut rng, n_len, n_take);
                    for (j, ni) in n_idx.iter().enumerate() {
                        for di in 0..d_len {
                            states[[k, j, di]] = self.sols[[m_idx, ti, ni, di]];
                        }
                    }
                }
            }
        }

        let t_vals = Array1::from_iter(t_idx.iter().map(|&i| self.t[i]));

        // Canonical schemes select the full grid, so the canonical weights
        // are already aligned with the interior of `t_vals`. Subsampling
        // schemes never carry weights (the scheme enum makes the misaligned
        // combination unrepresentable).
        let weights = self.weights.clone();

        Ok(Batch {
            states,
            mu: self.mus.row(m_idx).to_owned(),
            t: t_vals,
            weights,
        })
    }
}

fn with_boundaries(nodes: &Array1<f32>) -> Array1<f32> {
    let mut grid = Vec::with_capacity(nodes.len() + 2);
    grid.push(0.0f32);
    grid.extend(nodes.iter());
    grid.push(1.0f32);
    Array1::from_vec(grid)
}
