use std::io::prelude::*;
use std::path::Path;

use anyhow::Result;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use radsim_core::utils::create_writer;

use crate::errors::PcrError;

/// Header of the sequenced clone distribution file.
pub const CLONE_TABLE_HEADER: &str = "clone_size\tn_errors\tclone_prob";

///
/// Immutable lookup table over `(sequenced clone size, mutated reads)`.
///
#[derive(Debug, Clone)]
pub struct CloneErrorTable {
    entries: Vec<(usize, usize)>,
    probs: Vec<f64>,
    index: WeightedIndex<f64>,
    truncated_mass: f64,
    percent_duplicates: f64,
}

impl CloneErrorTable {
    ///
    /// Build from explicit entries. Probabilities summing to less than 1 are
    /// renormalized and the missing mass recorded as truncated.
    ///
    pub fn new(entries: Vec<(usize, usize)>, probs: Vec<f64>) -> Result<Self, PcrError> {
        if entries.is_empty() || entries.len() != probs.len() {
            return Err(PcrError::EmptyDistribution);
        }
        let total: f64 = probs.iter().sum();
        if !(total > 0.0) {
            return Err(PcrError::EmptyDistribution);
        }
        let (probs, truncated_mass) = if total < 1.0 {
            (probs.iter().map(|p| p / total).collect(), 1.0 - total)
        } else {
            (probs, 0.0)
        };

        let mean_size: f64 = entries
            .iter()
            .zip(&probs)
            .map(|(&(s, _), p)| s as f64 * p)
            .sum();
        let index = WeightedIndex::new(&probs)
            .map_err(|e| PcrError::InvalidDistribution(e.to_string()))?;

        Ok(CloneErrorTable {
            entries,
            probs,
            index,
            truncated_mass,
            percent_duplicates: 1.0 - 1.0 / mean_size,
        })
    }

    ///
    /// Flatten a sequenced clone matrix (row `s`, column `r`) into a table.
    ///
    pub fn from_matrix(matrix: &[Vec<f64>]) -> Result<Self, PcrError> {
        let mut entries = Vec::new();
        let mut probs = Vec::new();
        for (s, row) in matrix.iter().enumerate() {
            for (r, &p) in row.iter().enumerate() {
                entries.push((s, r));
                probs.push(p);
            }
        }
        Self::new(entries, probs)
    }

    /// The table without PCR: every template is read exactly once.
    pub fn no_pcr() -> Result<Self, PcrError> {
        Self::new(vec![(0, 0), (1, 0)], vec![0.0, 1.0])
    }

    /// Draw `(clone_size, mutated_reads)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        self.entries[self.index.sample(rng)]
    }

    pub fn entries(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.entries.iter().copied().zip(self.probs.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probability mass cut off before renormalization.
    pub fn truncated_mass(&self) -> f64 {
        self.truncated_mass
    }

    /// Fraction of reads that are PCR duplicates, `1 - 1/E[clone size]`.
    pub fn percent_duplicates(&self) -> f64 {
        self.percent_duplicates
    }

    /// Mass per sequenced clone size, indexed by size.
    pub fn clone_size_distribution(&self) -> Vec<f64> {
        let max = self.entries.iter().map(|(s, _)| *s).max().unwrap_or(0);
        let mut dist = vec![0.0; max + 1];
        for ((s, _), p) in self.entries() {
            dist[s] += p;
        }
        dist
    }

    ///
    /// Write the table as TSV with six significant digits.
    ///
    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        let mut writer = create_writer(path)?;
        writeln!(writer, "{}", CLONE_TABLE_HEADER)?;
        for ((s, r), p) in self.entries() {
            writeln!(writer, "{}\t{}\t{}", s, r, format_general(p, 6))?;
        }
        writer.flush()?;
        Ok(())
    }
}

///
/// Format `value` with `precision` significant digits, trailing zeros
/// removed, switching to scientific notation for very small or large
/// magnitudes (`%g`).
///
pub fn format_general(value: f64, precision: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= precision as i32 {
        let formatted = format!("{:.*e}", precision.saturating_sub(1), value);
        let (mantissa, exp) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let mantissa = trim_zeros(mantissa);
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, "0")]
    #[case(1.0, "1")]
    #[case(0.5, "0.5")]
    #[case(0.123456789, "0.123457")]
    #[case(0.000123456789, "0.000123457")]
    #[case(1.5e-7, "1.5e-07")]
    #[case(2.5e-12, "2.5e-12")]
    fn test_format_general(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_general(value, 6), expected);
    }

    #[test]
    fn test_no_pcr_table() {
        let table = CloneErrorTable::no_pcr().unwrap();
        let entries: Vec<_> = table.entries().collect();
        assert_eq!(entries, vec![((0, 0), 0.0), ((1, 0), 1.0)]);
        assert_eq!(table.percent_duplicates(), 0.0);

        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            assert_eq!(table.sample(&mut rng), (1, 0));
        }
    }

    #[test]
    fn test_renormalizes_truncated_mass() {
        let table = CloneErrorTable::new(vec![(1, 0), (2, 0), (2, 1)], vec![0.5, 0.3, 0.1]).unwrap();
        assert!((table.truncated_mass() - 0.1).abs() < 1e-12);
        let total: f64 = table.entries().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
        // E[s] = (0.5 + 2 * 0.4) / 0.9
        let expected = 1.0 - 0.9 / 1.3;
        assert!((table.percent_duplicates() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_write_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clones.tsv");
        CloneErrorTable::no_pcr().unwrap().write_tsv(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "clone_size\tn_errors\tclone_prob\n0\t0\t0\n1\t0\t1\n");
    }

    #[test]
    fn test_invalid_tables() {
        assert!(CloneErrorTable::new(vec![], vec![]).is_err());
        assert!(CloneErrorTable::new(vec![(1, 0)], vec![0.0]).is_err());
    }
}
