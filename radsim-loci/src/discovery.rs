use std::collections::BTreeMap;
use std::io::prelude::*;
use std::path::Path;

use anyhow::Result;
use rayon::prelude::*;

use radsim_core::models::{Chromosome, Genome, LibraryOptions, LibraryProtocol};
use radsim_core::utils::{create_gz_writer, digits, find_sites, finish_gz_writer, rev_comp};

use crate::consts::STATS_HEADER;
use crate::models::{DiscoveryRecord, Direction, LocusStatus, ReferenceRadLocus, locus_id};

/// Genome window assigned to a candidate before any filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    start: i64,
    end: i64,
    has_second_digest: bool,
}

/// Discovery result for one chromosome, before ids are assigned.
#[derive(Debug, Clone, Default)]
pub struct ChromosomeLoci {
    pub records: Vec<DiscoveryRecord>,
    pub kept: Vec<ReferenceRadLocus>,
}

///
/// Scans chromosomes for first-enzyme cut sites and builds one candidate
/// locus per direction per cut.
///
pub struct LocusDiscovery<'a> {
    opts: &'a LibraryOptions,
}

impl<'a> LocusDiscovery<'a> {
    pub fn new(opts: &'a LibraryOptions) -> Self {
        LocusDiscovery { opts }
    }

    fn place(&self, seq: &str, cut: usize, direction: Direction) -> Placement {
        let enz = &self.opts.renz_1;
        let base_len = self.opts.base_len as i64;
        let cut = cut as i64;

        let (start, end) = match direction {
            Direction::Positive => {
                let start = cut + enz.lead_len() as i64;
                (start, start + base_len - 1)
            }
            Direction::Negative => {
                let end = cut + enz.remainder.len() as i64 - 1;
                (end - base_len + 1, end)
            }
        };

        let LibraryProtocol::DoubleDigest { renz_2, .. } = &self.opts.protocol else {
            return Placement {
                start,
                end,
                has_second_digest: true,
            };
        };

        // the digest only sees the part of the window inside the chromosome
        let lo = start.max(0) as usize;
        let hi = end.min(seq.len() as i64 - 1);
        if hi < lo as i64 {
            return Placement {
                start,
                end,
                has_second_digest: false,
            };
        }
        let window = &seq[lo..=hi as usize];
        let site_len = renz_2.cutsite.len() as i64;

        match direction {
            Direction::Positive => match self.opts.protocol.second_digest(window) {
                Some(cuts) => {
                    let far = cuts.into_iter().max().unwrap_or_default() as i64;
                    Placement {
                        start,
                        end: start + far + site_len - 1,
                        has_second_digest: true,
                    }
                }
                None => Placement {
                    start,
                    end,
                    has_second_digest: false,
                },
            },
            Direction::Negative => match self.opts.protocol.second_digest(&rev_comp(window)) {
                Some(cuts) => {
                    let far = cuts.into_iter().max().unwrap_or_default() as i64;
                    Placement {
                        start: end - far - site_len + 1,
                        end,
                        has_second_digest: true,
                    }
                }
                None => Placement {
                    start,
                    end,
                    has_second_digest: false,
                },
            },
        }
    }

    fn evaluate(
        &self,
        chrom: &Chromosome,
        cuts: &[usize],
        i: usize,
        direction: Direction,
        placement: &Placement,
    ) -> LocusStatus {
        if !placement.has_second_digest {
            return LocusStatus::NoSecondDigest;
        }

        let margin = self.opts.protocol.chrom_end_margin(self.opts.base_len) as i64;
        let off_end = match direction {
            Direction::Negative => placement.start <= margin,
            Direction::Positive => placement.end + 1 >= chrom.len() as i64,
        };
        if off_end {
            return LocusStatus::ChromEnd;
        }

        let min_gap = self.opts.min_dist as i64 - self.opts.renz_1.overlap_len();
        let cut = cuts[i] as i64;
        if i > 0 && cut - (cuts[i - 1] as i64) < min_gap {
            return LocusStatus::TooClose;
        }
        if i + 1 < cuts.len() && (cuts[i + 1] as i64) - cut < min_gap {
            return LocusStatus::TooClose;
        }

        LocusStatus::Kept
    }

    ///
    /// Evaluate every candidate locus of one chromosome. Directions are
    /// processed negative first for each cut, in cut order.
    ///
    pub fn find_loci(&self, chrom: &Chromosome) -> ChromosomeLoci {
        let cuts = find_sites(&chrom.seq, &self.opts.renz_1.cutsite);
        let mut result = ChromosomeLoci::default();

        for (i, &cut) in cuts.iter().enumerate() {
            for direction in [Direction::Negative, Direction::Positive] {
                let placement = self.place(&chrom.seq, cut, direction);
                let mut status = self.evaluate(chrom, &cuts, i, direction, &placement);

                if status == LocusStatus::Kept {
                    let (start, end) = (placement.start as usize, placement.end as usize);
                    let window = &chrom.seq[start..=end];
                    let seq = match direction {
                        Direction::Positive => window.to_string(),
                        Direction::Negative => rev_comp(window),
                    };
                    if seq.contains('N') {
                        status = LocusStatus::AmbiguousBase;
                    } else {
                        result.kept.push(ReferenceRadLocus {
                            id: String::new(),
                            number: 0,
                            chrom: chrom.id.clone(),
                            cut,
                            start,
                            end,
                            seq,
                            direction,
                        });
                    }
                }

                result.records.push(DiscoveryRecord {
                    chrom: chrom.id.clone(),
                    cut,
                    direction,
                    status,
                });
            }
        }

        log::debug!(
            "{}: {} cut sites, {} loci kept",
            chrom.id,
            cuts.len(),
            result.kept.len()
        );
        result
    }

    ///
    /// Discover loci on every chromosome in parallel and number the kept
    /// ones globally in chromosome order.
    ///
    pub fn run(&self, genome: &Genome) -> LocusCatalog {
        let chroms: Vec<&Chromosome> = genome.chromosomes().collect();
        let per_chrom: Vec<ChromosomeLoci> =
            chroms.par_iter().map(|c| self.find_loci(c)).collect();
        LocusCatalog::from_chromosomes(per_chrom)
    }
}

///
/// All kept loci of a genome, keyed by chromosome, plus the discovery log.
///
#[derive(Debug, Clone, Default)]
pub struct LocusCatalog {
    loci: BTreeMap<String, Vec<ReferenceRadLocus>>,
    records: Vec<DiscoveryRecord>,
}

impl LocusCatalog {
    ///
    /// Assemble the catalog from per-chromosome results given in
    /// chromosome order, assigning ids `t{n}{p|n}`.
    ///
    pub fn from_chromosomes(per_chrom: Vec<ChromosomeLoci>) -> Self {
        let total: usize = per_chrom.iter().map(|c| c.kept.len()).sum();
        let width = digits(total);

        let mut catalog = LocusCatalog::default();
        let mut number = 0;
        for chrom_loci in per_chrom {
            catalog.records.extend(chrom_loci.records);
            for mut locus in chrom_loci.kept {
                locus.number = number;
                locus.id = locus_id(number, width, locus.direction);
                number += 1;
                catalog
                    .loci
                    .entry(locus.chrom.clone())
                    .or_default()
                    .push(locus);
            }
        }
        log::info!("Extracted {} loci", total);
        catalog
    }

    /// Kept loci in chromosome, then id order.
    pub fn iter(&self) -> impl Iterator<Item = &ReferenceRadLocus> {
        self.loci.values().flatten()
    }

    pub fn chromosome(&self, chrom: &str) -> &[ReferenceRadLocus] {
        self.loci.get(chrom).map(|v| v.as_slice()).unwrap_or_default()
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = (&String, &Vec<ReferenceRadLocus>)> {
        self.loci.iter()
    }

    pub fn records(&self) -> &[DiscoveryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.loci.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    ///
    /// Write the kept loci as gzipped FASTA.
    ///
    pub fn write_fasta(&self, path: &Path) -> Result<()> {
        let mut writer = create_gz_writer(path)?;
        for locus in self.iter() {
            writeln!(writer, ">{}\n{}", locus.fasta_header(), locus.seq)?;
        }
        finish_gz_writer(writer)
    }

    ///
    /// Write the per-candidate discovery log as gzipped TSV.
    ///
    pub fn write_stats(&self, path: &Path) -> Result<()> {
        let mut writer = create_gz_writer(path)?;
        writeln!(writer, "{}", STATS_HEADER)?;
        for record in &self.records {
            writeln!(writer, "{}", record)?;
        }
        finish_gz_writer(writer)
    }
}
