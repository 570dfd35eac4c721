use std::fmt::{self, Display};

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_distr::Poisson;

use crate::config::MutationConfig;
use crate::errors::ConfigError;

const NUCLEOTIDES: [u8; 4] = *b"ACGT";

fn base_index(base: u8) -> Option<usize> {
    NUCLEOTIDES.iter().position(|&b| b == base)
}

/// Outcome drawn for a reference base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationKind {
    Substitution(u8),
    Insertion,
    Deletion,
}

///
/// Random mutation model: substitutions weighted by a 4x4 matrix, plus
/// insertions and deletions with Poisson-distributed sizes.
///
#[derive(Debug, Clone)]
pub struct MutationModel {
    pub indel_prob: f64,
    pub ins_del_ratio: f64,
    pub indel_lambda: f64,
    // one distribution per reference base over [3 substitutions, ins, del]
    outcomes: Vec<(Vec<MutationKind>, WeightedIndex<f64>)>,
    indel_size: Poisson<f64>,
}

impl MutationModel {
    pub fn new(config: &MutationConfig) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&config.indel_prob) {
            return Err(ConfigError::InvalidParameter(
                "indel_prob".to_string(),
                format!("{} is not a probability", config.indel_prob),
            ));
        }
        if config.ins_del_ratio < 0.0 {
            return Err(ConfigError::InvalidParameter(
                "ins_del_ratio".to_string(),
                format!("{} is negative", config.ins_del_ratio),
            ));
        }
        let sub_p = 1.0 - config.indel_prob;
        let del_p = config.indel_prob / (1.0 + config.ins_del_ratio);
        let ins_p = config.indel_prob - del_p;

        let mut outcomes = Vec::with_capacity(4);
        for (r, row) in config.substitution_matrix.iter().enumerate() {
            let mut kinds = Vec::with_capacity(5);
            let mut weights = Vec::with_capacity(5);
            for (j, &alt) in NUCLEOTIDES.iter().enumerate() {
                if j != r {
                    kinds.push(MutationKind::Substitution(alt));
                    weights.push(row[j] * sub_p);
                }
            }
            kinds.push(MutationKind::Insertion);
            weights.push(ins_p);
            kinds.push(MutationKind::Deletion);
            weights.push(del_p);

            let dist = WeightedIndex::new(&weights).map_err(|e| {
                ConfigError::InvalidParameter("substitution_matrix".to_string(), e.to_string())
            })?;
            outcomes.push((kinds, dist));
        }

        let indel_size = Poisson::new(config.indel_lambda).map_err(|e| {
            ConfigError::InvalidParameter("indel_lambda".to_string(), e.to_string())
        })?;

        Ok(MutationModel {
            indel_prob: config.indel_prob,
            ins_del_ratio: config.ins_del_ratio,
            indel_lambda: config.indel_lambda,
            outcomes,
            indel_size,
        })
    }

    ///
    /// A base different from `base`, chosen uniformly. `N` (or anything
    /// outside `ACGT`) mutates to `N`.
    ///
    pub fn random_mutation<R: Rng + ?Sized>(base: u8, rng: &mut R) -> u8 {
        match base_index(base) {
            Some(i) => {
                let j = rng.random_range(0..3);
                NUCLEOTIDES[if j >= i { j + 1 } else { j }]
            }
            None => b'N',
        }
    }

    fn sample_indel_size<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        loop {
            let size = self.indel_size.sample(rng) as usize;
            if size > 0 {
                return size;
            }
        }
    }

    ///
    /// Draw reference and alternative alleles for a new variant at
    /// `position` of `sequence`. Returns `("N", "N")` on an `N` base.
    ///
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        position: usize,
        sequence: &[u8],
        rng: &mut R,
    ) -> (String, String) {
        let ref_base = sequence[position];
        let Some(r) = base_index(ref_base) else {
            return ("N".to_string(), "N".to_string());
        };
        let (kinds, dist) = &self.outcomes[r];
        let ref_str = (ref_base as char).to_string();

        match kinds[dist.sample(rng)] {
            MutationKind::Substitution(alt) => (ref_str, (alt as char).to_string()),
            MutationKind::Insertion => {
                let size = self.sample_indel_size(rng);
                let mut insert = ref_str.clone();
                for _ in 0..size {
                    insert.push(NUCLEOTIDES[rng.random_range(0..4)] as char);
                }
                (ref_str, insert)
            }
            MutationKind::Deletion => {
                let size = self.sample_indel_size(rng);
                if position == sequence.len() - 1 {
                    // nothing left to delete, fall back to a substitution
                    let alt = Self::random_mutation(ref_base, rng);
                    return (ref_str, (alt as char).to_string());
                }
                let del_end = (position + size + 1).min(sequence.len());
                let deleted = String::from_utf8_lossy(&sequence[position..del_end]).into_owned();
                (deleted, ref_str)
            }
        }
    }
}

impl Display for MutationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mutation options:")?;
        writeln!(f, "    indel probability : {}", self.indel_prob)?;
        write!(f, "    insertion/deletion ratio : {}", self.ins_del_ratio)
    }
}
