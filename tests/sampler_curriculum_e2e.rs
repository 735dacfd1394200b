use ndarray::{Array1, Array2, Array4};
use pflow::dataset::TrajectoryDataset;
use pflow::sample::{curriculum_bound, BatchSampler, ParticleScheme, SampleConfig, TimeScheme};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

fn make_ensemble(t_count: usize, n_count: usize, seed: u64) -> TrajectoryDataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let ts = Array1::linspace(0.0f32, 1.0, t_count);
    let dt = 1.0 / (t_count as f32 - 1.0);
    let mut sols = Array4::<f32>::zeros((2, t_count, n_count, 1));
    let mut mus = Array2::<f32>::zeros((2, 1));
    for mi in 0..2 {
        let mu = 1.0 + mi as f32;
        mus[[mi, 0]] = mu;
        for ni in 0..n_count {
            let mut x: f32 = StandardNormal.sample(&mut rng);
            sols[[mi, 0, ni, 0]] = x;
            for ti in 1..t_count {
                let kick: f32 = StandardNormal.sample(&mut rng);
                x += dt * (-mu * x) + 0.2 * dt.sqrt() * kick;
                sols[[mi, ti, ni, 0]] = x;
            }
        }
    }
    TrajectoryDataset::new(sols, mus, ts).unwrap()
}

#[test]
fn curriculum_widens_monotonically_over_a_training_run() {
    let t_count = 80usize;
    let ds = make_ensemble(t_count, 32, 11);
    let cfg = SampleConfig {
        bs_n: 8,
        bs_t: 6,
        scheme_t: TimeScheme::Seq,
        scheme_n: ParticleScheme::Shared,
    };
    let sampler = BatchSampler::prepare(ds, &cfg).unwrap();

    // Simulated training loop: one batch per step, progress = step / steps.
    let steps = 200usize;
    let mut prev_bound = 0usize;
    let mut prev_last_t = 0.0f32;
    for step in 0..steps {
        let progress = step as f32 / (steps as f32 - 1.0);
        let bound = curriculum_bound(progress, t_count);
        assert!(bound >= prev_bound, "bound shrank at step {step}");
        prev_bound = bound;

        let batch = sampler.sample(step as u64, progress).unwrap();
        let last_t = batch.t[batch.t.len() - 1];
        assert_eq!(
            last_t,
            sampler.time_grid()[bound],
            "batch must end at the curriculum bound"
        );
        // The reachable window never shrinks across the run.
        assert!(last_t >= prev_last_t, "window shrank at step {step}");
        prev_last_t = last_t;

        assert_eq!(batch.t[0], 0.0, "boundary time 0.0 must always be present");
        for i in 1..batch.t.len() {
            assert!(batch.t[i] > batch.t[i - 1]);
        }
    }

    // End of training: full interior range.
    assert_eq!(prev_bound, t_count - 1);
    assert_eq!(prev_last_t, 1.0);
}

#[test]
fn curriculum_endpoints_match_the_threshold_table() {
    let t_count = 80usize;
    // progress = 0 snaps to the smallest threshold (20% of the interior).
    let expect_low = ((t_count as f32 - 1.0) * 0.2).floor() as usize;
    assert_eq!(curriculum_bound(0.0, t_count), expect_low);
    assert_eq!(curriculum_bound(1.0, t_count), t_count - 1);
}

#[test]
fn progressive_batches_stay_deterministic_under_fixed_key_and_progress() {
    let ds = make_ensemble(40, 24, 5);
    let cfg = SampleConfig {
        bs_n: 6,
        bs_t: 5,
        scheme_t: TimeScheme::Seq,
        scheme_n: ParticleScheme::Independent,
    };
    let sampler = BatchSampler::prepare(ds, &cfg).unwrap();

    for &progress in &[0.0f32, 0.3, 0.55, 1.0] {
        let b1 = sampler.sample(77, progress).unwrap();
        let b2 = sampler.sample(77, progress).unwrap();
        assert_eq!(b1.states.dim(), b2.states.dim());
        for (a, b) in b1.states.iter().zip(b2.states.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        for (a, b) in b1.t.iter().zip(b2.t.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
