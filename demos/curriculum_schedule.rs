//! Curriculum (progressive) time-sampling demo.
//!
//! Prints the curriculum bound schedule across training progress, then draws
//! batches through a simulated run to show the widening time window.

use ndarray::{Array1, Array2, Array4};
use pflow::dataset::TrajectoryDataset;
use pflow::sample::{curriculum_bound, BatchSampler, ParticleScheme, SampleConfig, TimeScheme};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

fn make_ensemble(t: usize, n: usize, seed: u64) -> TrajectoryDataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let ts = Array1::linspace(0.0f32, 1.0, t);
    let dt = 1.0 / (t as f32 - 1.0);
    let mut sols = Array4::<f32>::zeros((3, t, n, 1));
    let mut mus = Array2::<f32>::zeros((3, 1));
    for mi in 0..3 {
        let mu = 1.0 + 0.5 * mi as f32;
        mus[[mi, 0]] = mu;
        for ni in 0..n {
            let mut x: f32 = StandardNormal.sample(&mut rng);
            sols[[mi, 0, ni, 0]] = x;
            for ti in 1..t {
                let kick: f32 = StandardNormal.sample(&mut rng);
                x += dt * (-mu * x) + 0.2 * dt.sqrt() * kick;
                sols[[mi, ti, ni, 0]] = x;
            }
        }
    }
    TrajectoryDataset::new(sols, mus, ts).unwrap()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let t_count = 100usize;

    println!("curriculum bound schedule (T={t_count}):");
    for k in 0..=10 {
        let progress = k as f32 / 10.0;
        let bound = curriculum_bound(progress, t_count);
        println!(
            "  progress={progress:.1}  bound={bound:3}  ({:.0}% of interior range)",
            100.0 * bound as f32 / (t_count as f32 - 1.0)
        );
    }
    println!();

    let ds = make_ensemble(t_count, 256, 7);
    let cfg = SampleConfig {
        bs_n: 32,
        bs_t: 6,
        scheme_t: TimeScheme::Seq,
        scheme_n: ParticleScheme::Shared,
    };
    let sampler = BatchSampler::prepare(ds, &cfg)?;

    let steps = 10usize;
    println!("simulated run, one batch per step:");
    for step in 0..steps {
        let progress = step as f32 / (steps as f32 - 1.0);
        let batch = sampler.sample(step as u64, progress)?;
        println!(
            "  step={step:2}  progress={progress:.2}  mu={:.2}  t_window=[{:.3}, {:.3}]  points={}",
            batch.mu[0],
            batch.t[0],
            batch.t[batch.t.len() - 1],
            batch.t.len(),
        );
    }

    Ok(())
}
