use statrs::distribution::{Binomial, Discrete, Poisson};

use crate::binning::LogBins;
use crate::errors::PcrError;
use crate::lineage::ErrorDistribution;

///
/// Mean amplified clone size, using each class's representative size.
///
pub fn amplification_factor(bins: &LogBins, class_probs: &[f64]) -> f64 {
    class_probs
        .iter()
        .enumerate()
        .filter_map(|(class, p)| bins.representative(class).map(|a| a as f64 * p))
        .sum()
}

/// Amplified size class prepared for the fusion loop.
struct ClassTerm<'a> {
    size: usize,
    prob: f64,
    depth: Poisson,
    errors: &'a ErrorDistribution,
}

///
/// Joint distribution of sequenced clone size `s` and mutated reads `r`.
///
/// Row `s` holds `p(S = s, R = r)` for `r` in `0..=s`. Clones with no
/// sequenced read are removed and the rest rescaled. Rows stop once a row's
/// mass falls below `epsilon`, or at `max_s`.
///
/// `ratio` is the number of reads per template.
///
pub fn sequenced_clone_matrix(
    bins: &LogBins,
    class_probs: &[f64],
    errors: &[Option<ErrorDistribution>],
    ratio: f64,
    max_s: usize,
    epsilon: f64,
) -> Result<Vec<Vec<f64>>, PcrError> {
    let ampl_factor = amplification_factor(bins, class_probs);
    if ampl_factor <= 0.0 {
        return Err(PcrError::EmptyDistribution);
    }
    let reads_per_molecule = ratio / ampl_factor;

    let mut terms = Vec::new();
    for (class, &prob) in class_probs.iter().enumerate() {
        let (Some(size), Some(Some(errors))) = (bins.representative(class), errors.get(class))
        else {
            continue;
        };
        if prob <= 0.0 {
            continue;
        }
        let depth = Poisson::new(reads_per_molecule * size as f64)
            .map_err(|e| PcrError::InvalidDistribution(e.to_string()))?;
        terms.push(ClassTerm {
            size,
            prob,
            depth,
            errors,
        });
    }

    let mut matrix: Vec<Vec<f64>> = Vec::new();
    let mut p_s0 = 0.0;
    for s in 0..max_s {
        let mut row = vec![0.0; s + 1];
        for term in &terms {
            let weight = term.prob * term.depth.pmf(s as u64);
            if weight == 0.0 {
                continue;
            }
            for &(e, p_e) in term.errors {
                let resample = Binomial::new(e as f64 / term.size as f64, s as u64)
                    .map_err(|err| PcrError::InvalidDistribution(err.to_string()))?;
                for (r, cell) in row.iter_mut().enumerate() {
                    *cell += weight * p_e * resample.pmf(r as u64);
                }
            }
        }

        if s == 0 {
            p_s0 = row[0];
            row[0] = 0.0;
            matrix.push(row);
            continue;
        }
        let scale = 1.0 - p_s0;
        row.iter_mut().for_each(|p| *p /= scale);
        let row_mass: f64 = row.iter().sum();
        matrix.push(row);
        if row_mass < epsilon {
            break;
        }
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_amplification_factor() {
        let bins = LogBins::new(2f64.powf(0.1));
        // sizes 1 and 2 with equal mass
        let mut probs = vec![0.0; 11];
        probs[0] = 0.5;
        probs[10] = 0.5;
        assert!((amplification_factor(&bins, &probs) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_unamplified_clones_have_no_errors() {
        let bins = LogBins::new(2f64.powf(0.1));
        let probs = vec![1.0];
        let errors = vec![Some(vec![(0, 1.0)])];
        let matrix = sequenced_clone_matrix(&bins, &probs, &errors, 0.25, 1000, 1e-6).unwrap();

        assert_eq!(matrix[0], vec![0.0]);
        // only r = 0 carries mass
        assert!(matrix.iter().skip(1).all(|row| row[1..].iter().all(|&p| p == 0.0)));
        let total: f64 = matrix.iter().flatten().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(matrix.len() < 1000);
    }

    #[test]
    fn test_empty_classes_rejected() {
        let bins = LogBins::new(2f64.powf(0.1));
        let err = sequenced_clone_matrix(&bins, &[], &[], 0.25, 10, 1e-6);
        assert!(matches!(err, Err(PcrError::EmptyDistribution)));
    }
}
