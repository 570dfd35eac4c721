use rand::Rng;

use radsim_core::models::MutationModel;

///
/// Copy `seq` with per-position sequencing errors. Position `i` mutates to
/// a different base when a uniform draw falls below `error_probs[i]`.
/// Positions past the end of `error_probs` are left untouched.
///
pub fn sequencing_errors<R: Rng + ?Sized>(seq: &[u8], error_probs: &[f64], rng: &mut R) -> Vec<u8> {
    seq.iter()
        .zip(error_probs.iter().chain(std::iter::repeat(&0.0)))
        .map(|(&base, &p)| {
            if rng.random::<f64>() < p {
                MutationModel::random_mutation(base, rng)
            } else {
                base
            }
        })
        .collect()
}

///
/// Copy of `template` carrying a single polymerase error inside one of the
/// two read windows, `[0, read_len)` or `[insert_len - read_len, insert_len)`.
/// Overlapping windows weigh the shared positions twice.
///
pub fn pcr_mutation<R: Rng + ?Sized>(
    template: &[u8],
    insert_len: usize,
    read_len: usize,
    rng: &mut R,
) -> Vec<u8> {
    let mut mutated = template.to_vec();
    if template.is_empty() || read_len == 0 {
        return mutated;
    }
    let forward = read_len.min(template.len());
    let reverse_end = insert_len.min(template.len());
    let reverse_start = insert_len.saturating_sub(read_len).min(reverse_end);
    let reverse = reverse_end - reverse_start;

    let k = rng.random_range(0..forward + reverse);
    let pos = if k < forward { k } else { reverse_start + (k - forward) };
    mutated[pos] = MutationModel::random_mutation(template[pos], rng);
    mutated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    #[test]
    fn test_no_errors_at_zero_rate() {
        let mut rng = StdRng::seed_from_u64(1);
        let seq = b"ACGTACGTAC";
        assert_eq!(sequencing_errors(seq, &[0.0; 10], &mut rng), seq.to_vec());
    }

    #[test]
    fn test_all_errors_at_full_rate() {
        let mut rng = StdRng::seed_from_u64(1);
        let seq = b"ACGTACGTAC";
        let noisy = sequencing_errors(seq, &[1.0; 10], &mut rng);
        assert!(noisy.iter().zip(seq).all(|(a, b)| a != b));
    }

    #[test]
    fn test_n_stays_n() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sequencing_errors(b"NNN", &[1.0; 3], &mut rng), b"NNN".to_vec());
    }

    #[rstest]
    #[case(40, 10)]
    #[case(15, 10)]
    fn test_pcr_mutation_in_read_windows(#[case] insert_len: usize, #[case] read_len: usize) {
        let template = b"ACGT".repeat(15);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..300 {
            let mutated = pcr_mutation(&template, insert_len, read_len, &mut rng);
            let diffs: Vec<usize> = (0..template.len())
                .filter(|&i| mutated[i] != template[i])
                .collect();
            assert_eq!(diffs.len(), 1);
            let pos = diffs[0];
            assert!(pos < read_len || (insert_len - read_len..insert_len).contains(&pos));
        }
    }
}
