use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::{Binomial, Distribution, Normal};
use rayon::prelude::*;

use radsim_core::utils::SeedStream;

use crate::errors::PcrError;

/// Trials simulated by one worker before results are merged.
pub const TRIAL_BATCH_SIZE: usize = 10_000;

// rejection draws for the duplication probability before giving up
const MAX_EFFICIENCY_DRAWS: usize = 10_000;

///
/// Draw a per-clone duplication probability from `Normal(mu, sigma)`,
/// redrawing until it falls in `(0, 1]`.
///
pub fn draw_efficiency<R: Rng + ?Sized>(
    normal: &Normal<f64>,
    rng: &mut R,
) -> Result<f64, PcrError> {
    for _ in 0..MAX_EFFICIENCY_DRAWS {
        let p = normal.sample(rng);
        if p > 0.0 && p <= 1.0 {
            return Ok(p);
        }
    }
    Err(PcrError::EfficiencyOutOfRange(normal.mean(), normal.std_dev()))
}

///
/// Size of one amplified clone: starting from a single molecule, every
/// cycle duplicates each molecule with the clone's probability.
///
pub fn simulate_clone_size<R: Rng + ?Sized>(
    normal: &Normal<f64>,
    cycles: u32,
    rng: &mut R,
) -> Result<u64, PcrError> {
    let p = draw_efficiency(normal, rng)?;
    let mut molecules: u64 = 1;
    for _ in 0..cycles {
        let new = Binomial::new(molecules, p)
            .map_err(|e| PcrError::InvalidDistribution(e.to_string()))?
            .sample(rng);
        molecules += new;
    }
    Ok(molecules)
}

///
/// Empirical distribution of amplified clone sizes (size -> probability)
/// from `n_sims` independent clones. Trials run in parallel batches, each
/// with its own generator from the clone size stream of `seed`.
///
pub fn clone_size_distribution(
    mu: f64,
    sigma: f64,
    cycles: u32,
    n_sims: usize,
    seed: u64,
) -> Result<BTreeMap<u64, f64>, PcrError> {
    let normal =
        Normal::new(mu, sigma).map_err(|e| PcrError::InvalidDistribution(e.to_string()))?;
    let n_batches = n_sims.div_ceil(TRIAL_BATCH_SIZE);

    let counts = (0..n_batches)
        .into_par_iter()
        .map(|batch| {
            let mut rng = SeedStream::CloneSizes.rng(seed, batch as u64);
            let trials = TRIAL_BATCH_SIZE.min(n_sims - batch * TRIAL_BATCH_SIZE);
            let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
            for _ in 0..trials {
                let size = simulate_clone_size(&normal, cycles, &mut rng)?;
                *counts.entry(size).or_default() += 1;
            }
            Ok::<_, PcrError>(counts)
        })
        .try_reduce(BTreeMap::new, |mut acc, counts| {
            for (size, n) in counts {
                *acc.entry(size).or_default() += n;
            }
            Ok(acc)
        })?;

    Ok(counts
        .into_iter()
        .map(|(size, n)| (size, n as f64 / n_sims as f64))
        .collect())
}
