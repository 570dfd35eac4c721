use rand::Rng;
use rand::seq::IndexedRandom;
use rand_distr::{Distribution, Normal};

use radsim_core::models::{LibraryOptions, LibraryProtocol};

use crate::alleles::SampleAllele;

// insert length draws for one allele before another allele is tried
const MAX_INSERT_DRAWS: usize = 1_000;
// alleles tried before the sampler gives up
const MAX_ALLELE_DRAWS: usize = 1_000;

/// A sheared fragment: which allele it comes from and how long it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub allele: usize,
    pub insert_len: usize,
}

#[derive(Debug, Clone)]
enum Strategy {
    /// Alleles at least one read long; insert drawn from a normal.
    Sheared {
        alleles: Vec<usize>,
        insert: Normal<f64>,
    },
    /// Alleles with second-enzyme cuts, paired with their insert lengths.
    Digested { alleles: Vec<(usize, Vec<usize>)> },
}

///
/// Draws sequencing templates from a sample's alleles.
///
/// Alleles that can never produce a template are filtered out up front, so
/// drawing uniformly among the rest matches redrawing until a usable
/// allele comes up.
///
#[derive(Debug, Clone)]
pub struct TemplateSampler {
    read_len: usize,
    strategy: Strategy,
}

impl TemplateSampler {
    ///
    /// Build a sampler over `alleles`. `None` when no allele can yield a
    /// template under the library protocol.
    ///
    pub fn new(alleles: &[SampleAllele], opts: &LibraryOptions) -> Option<Self> {
        let read_len = opts.read_len;
        let strategy = match &opts.protocol {
            LibraryProtocol::SingleDigest => {
                let usable: Vec<usize> = alleles
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| a.len() >= read_len)
                    .map(|(i, _)| i)
                    .collect();
                if usable.is_empty() {
                    return None;
                }
                Strategy::Sheared {
                    alleles: usable,
                    insert: Normal::new(opts.insert_mu, opts.insert_sigma).ok()?,
                }
            }
            LibraryProtocol::DoubleDigest { renz_2, .. } => {
                let rem_len = renz_2.remainder.len();
                let usable: Vec<(usize, Vec<usize>)> = alleles
                    .iter()
                    .enumerate()
                    .filter_map(|(i, a)| {
                        let seq = std::str::from_utf8(&a.seq).ok()?;
                        let inserts: Vec<usize> = opts
                            .protocol
                            .second_digest(seq)?
                            .into_iter()
                            .map(|cut| cut + rem_len)
                            .filter(|&ins| ins >= read_len && ins <= a.len())
                            .collect();
                        (!inserts.is_empty()).then_some((i, inserts))
                    })
                    .collect();
                if usable.is_empty() {
                    return None;
                }
                Strategy::Digested { alleles: usable }
            }
        };
        Some(TemplateSampler { read_len, strategy })
    }

    /// Number of alleles that can produce templates.
    pub fn usable_alleles(&self) -> usize {
        match &self.strategy {
            Strategy::Sheared { alleles, .. } => alleles.len(),
            Strategy::Digested { alleles } => alleles.len(),
        }
    }

    ///
    /// Draw one template. For sheared libraries the insert length is
    /// `trunc(Normal(mu, sigma))` redrawn until it fits between one read
    /// and the allele length.
    ///
    pub fn sample<R: Rng + ?Sized>(
        &self,
        alleles: &[SampleAllele],
        rng: &mut R,
    ) -> Option<Template> {
        match &self.strategy {
            Strategy::Sheared {
                alleles: usable,
                insert,
            } => {
                for _ in 0..MAX_ALLELE_DRAWS {
                    let &allele = usable.choose(rng)?;
                    let max = alleles[allele].len();
                    for _ in 0..MAX_INSERT_DRAWS {
                        let draw = insert.sample(rng).trunc();
                        if draw >= self.read_len as f64 && draw <= max as f64 {
                            return Some(Template {
                                allele,
                                insert_len: draw as usize,
                            });
                        }
                    }
                }
                None
            }
            Strategy::Digested { alleles: usable } => {
                let (allele, inserts) = usable.choose(rng)?;
                let &insert_len = inserts.choose(rng)?;
                Some(Template {
                    allele: *allele,
                    insert_len,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use radsim_core::config::{LibraryConfig, ProtocolConfig};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn allele(name: &str, seq: &str) -> SampleAllele {
        SampleAllele {
            name: name.to_string(),
            cigar: format!("{}M", seq.len()),
            seq: seq.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_sheared_inserts_in_range() {
        let opts = LibraryConfig {
            insert_mu: 30,
            insert_sigma: 10.0,
            read_len: 10,
            barcode_len: 2,
            base_locus_length: 40,
            ..Default::default()
        }
        .build()
        .unwrap();
        let alleles = vec![
            allele("t0n:s:a1", "ACGT"),
            allele("t0p:s:a1", &"ACGT".repeat(10)),
        ];
        let sampler = TemplateSampler::new(&alleles, &opts).unwrap();
        assert_eq!(sampler.usable_alleles(), 1);

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let t = sampler.sample(&alleles, &mut rng).unwrap();
            assert_eq!(t.allele, 1);
            assert!((10..=40).contains(&t.insert_len));
        }
    }

    #[test]
    fn test_short_alleles_unusable() {
        let opts = LibraryConfig::default().build().unwrap();
        let alleles = vec![allele("t0n:s:a1", "ACGT")];
        assert!(TemplateSampler::new(&alleles, &opts).is_none());
    }

    #[test]
    fn test_digested_inserts_at_cuts() {
        let opts = LibraryConfig {
            protocol: ProtocolConfig::Ddrad {
                renz_2: "MspI".to_string(),
                insert_min: Some(12),
                insert_max: Some(30),
            },
            insert_mu: 20,
            read_len: 10,
            barcode_len: 2,
            base_locus_length: 40,
            ..Default::default()
        }
        .build()
        .unwrap();
        // MspI C/CGG at 20, insert ends after its remainder
        let seq = format!("{}CCGG{}", "A".repeat(20), "A".repeat(16));
        let alleles = vec![allele("t0p:s:a1", &seq), allele("t1p:s:a1", &"A".repeat(40))];
        let sampler = TemplateSampler::new(&alleles, &opts).unwrap();
        assert_eq!(sampler.usable_alleles(), 1);

        let mut rng = StdRng::seed_from_u64(3);
        let t = sampler.sample(&alleles, &mut rng).unwrap();
        assert_eq!(t, Template { allele: 0, insert_len: 23 });
    }
}
