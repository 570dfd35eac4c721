//! Polymerase errors inside one amplified clone.
//!
//! A clone of `a` molecules is a tree with `a - 1` duplication edges. The
//! chance that no edge introduced an error over both reads is computed
//! exactly; how many molecules inherit an error when one does occur is
//! estimated by simulating the lineage.

use rand::Rng;
use rayon::prelude::*;

use radsim_core::utils::SeedStream;

use crate::binning::LogBins;

///
/// Probability that a clone of `clone_size` molecules carries no polymerase
/// error over both mates of a read pair.
///
pub fn prob_no_error(clone_size: usize, read_len: usize, pol_error: f64) -> f64 {
    if clone_size <= 1 {
        return 1.0;
    }
    let exponent = ((clone_size - 1) * 2 * read_len) as f64;
    (1.0 - pol_error).powf(exponent)
}

///
/// Number of molecules descending from a single mutated duplication in a
/// clone of `n_nodes` molecules.
///
/// The mutation hits one of the `n_nodes - 1` edges uniformly; every later
/// molecule copies a mutated template with probability equal to the
/// current mutated fraction.
///
pub fn mutated_node_count<R: Rng + ?Sized>(n_nodes: usize, rng: &mut R) -> usize {
    if n_nodes < 2 {
        return 0;
    }
    let edge = rng.random_range(0..n_nodes - 1);
    let mut clean = 1 + edge;
    let mut mutated = 1;
    while clean + mutated < n_nodes {
        let p = mutated as f64 / (clean + mutated) as f64;
        if rng.random::<f64>() < p {
            mutated += 1;
        } else {
            clean += 1;
        }
    }
    mutated
}

/// Sparse distribution over the number of mutated molecules in a clone.
pub type ErrorDistribution = Vec<(usize, f64)>;

///
/// Empirical distribution of [`mutated_node_count`] over `iterations` runs,
/// as `(n_mutated, probability)` pairs in increasing order.
///
pub fn mutated_node_distribution<R: Rng + ?Sized>(
    n_nodes: usize,
    iterations: usize,
    rng: &mut R,
) -> ErrorDistribution {
    let mut counts = vec![0usize; n_nodes + 1];
    for _ in 0..iterations {
        counts[mutated_node_count(n_nodes, rng)] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .filter(|(_, c)| *c > 0)
        .map(|(n, c)| (n, c as f64 / iterations as f64))
        .collect()
}

///
/// Per size class, the distribution of mutated molecules with its zero
/// bucket replaced by the exact error-free probability and the remaining
/// mass rescaled to match. Empty classes are `None`.
///
pub fn adjusted_error_distributions(
    bins: &LogBins,
    n_classes: usize,
    read_len: usize,
    pol_error: f64,
    iterations: usize,
    seed: u64,
) -> Vec<Option<ErrorDistribution>> {
    (0..n_classes)
        .into_par_iter()
        .map(|class| {
            let size = bins.representative(class)?;
            if size < 2 {
                return Some(vec![(0, 1.0)]);
            }
            let p_clean = prob_no_error(size, read_len, pol_error);
            let mut rng = SeedStream::Lineage.rng(seed, class as u64);
            let mut dist: ErrorDistribution = vec![(0, p_clean)];
            dist.extend(
                mutated_node_distribution(size, iterations, &mut rng)
                    .into_iter()
                    .filter(|(n, _)| *n > 0)
                    .map(|(n, p)| (n, p * (1.0 - p_clean))),
            );
            Some(dist)
        })
        .collect()
}
