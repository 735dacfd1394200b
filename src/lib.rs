//! # pflow
//!
//! Batch construction for parametric probability-flow surrogates.
//!
//! A surrogate of a time-evolving probability flow (particle/plasma dynamics,
//! SDE trajectory ensembles) is trained against a dense simulated dataset
//! indexed by (parameter instance, time step, particle, state dimension).
//! This crate owns the part of that pipeline where correctness is easy to
//! lose silently: turning the dataset into minibatches whose temporal
//! structure matches the time-integral estimator the loss uses.
//!
//! This crate is intentionally small:
//!
//! - it implements **time-scheme selection** (one-time preprocessing that may
//!   resample the dataset onto a canonical time grid) and **batch drawing**,
//! - it does not solve ODEs/SDEs, build networks, or run experiments
//!   (those belong to the collaborators up- and downstream).
//!
//! ## Public invariants (must not change)
//!
//! - **Determinism knobs are explicit**: every batch draw takes a `u64` key;
//!   the same key reproduces the batch bit for bit, distinct keys give
//!   independent draws. No hidden global RNG state.
//! - **Boundary coverage**: every time grid handed to a batch contains its
//!   boundary times (the time-integral estimator downstream is ill-posed
//!   without them).
//! - **Weights stay aligned**: quadrature weights returned with a batch are
//!   aligned 1:1 with the interior nodes of that batch's time grid, in order.
//! - **Oversized batch requests clamp silently**; unrecognized scheme names
//!   fail at setup, never per call.
//!
//! ## Module map
//!
//! - `dataset`: validated container for the simulated trajectory ensemble
//! - `quadrature`: Gauss–Legendre rules on arbitrary intervals
//! - `resample`: time-axis linear resampling of the ensemble
//! - `sample`: time/particle schemes, the one-time selector, and [`sample::BatchSampler`]

pub mod dataset;
pub mod quadrature;
pub mod resample;
pub mod sample;

/// pflow error variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("shape mismatch: {0}")]
    Shape(&'static str),
    #[error("domain error: {0}")]
    Domain(&'static str),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
