//! Read-level allele dropout.
//!
//! An allele can be kept during extraction and still end up with too few
//! independent templates in the sequenced library. Counting distinct clones
//! per allele in the mate-1 files tells which alleles a genotyper would
//! miss.

use std::collections::BTreeMap;
use std::io::prelude::*;
use std::path::Path;

use anyhow::{Context, Result};
use fxhash::FxHashMap;
use rayon::prelude::*;

use radsim_core::consts::{DROPPED_READS_LOG, PLOIDY, READS1_SUFFIX};
use radsim_core::utils::{create_writer, get_dynamic_reader};
use radsim_loci::models::normalize_locus_id;

use crate::errors::SeqError;

/// Minimum distinct clones for an allele to count as sequenced.
pub const DEFAULT_MIN_COV: usize = 3;

///
/// Fields of a read name `{locus}:{sample}:a{h}:{clone}[:{duplicate}]/{mate}`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadName {
    /// Locus id without zero padding.
    pub locus: String,
    pub sample: String,
    /// 0-based haplotype.
    pub haplotype: usize,
    pub clone: usize,
    pub duplicate: Option<usize>,
}

impl ReadName {
    pub fn parse(header: &str) -> Result<Self, SeqError> {
        let malformed = || SeqError::MalformedReadHeader(header.to_string());
        let name = header.trim_start_matches('>');
        let name = name.split_once('/').map_or(name, |(n, _)| n);
        let fields: Vec<&str> = name.split(':').collect();
        if fields.len() != 4 && fields.len() != 5 {
            return Err(malformed());
        }

        let locus = normalize_locus_id(fields[0]).ok_or_else(malformed)?;
        let haplotype: usize = fields[2]
            .strip_prefix('a')
            .and_then(|h| h.parse().ok())
            .filter(|h| (1..=PLOIDY).contains(h))
            .ok_or_else(malformed)?;
        let clone = fields[3].parse().map_err(|_| malformed())?;
        let duplicate = match fields.get(4) {
            Some(d) => Some(d.parse().map_err(|_| malformed())?),
            None => None,
        };
        Ok(ReadName {
            locus,
            sample: fields[1].to_string(),
            haplotype: haplotype - 1,
            clone,
            duplicate,
        })
    }
}

///
/// Distinct clones per locus and haplotype in one sample's mate-1 file.
///
/// Reads of one clone are written together, so a clone is counted when its
/// index differs from the previous read's.
///
pub fn count_sample_clones(
    reads_dir: &Path,
    sample: &str,
) -> Result<FxHashMap<String, [usize; PLOIDY]>> {
    let path = reads_dir.join(format!("{}{}", sample, READS1_SUFFIX));
    let reader = get_dynamic_reader(&path)?;

    let mut counts: FxHashMap<String, [usize; PLOIDY]> = FxHashMap::default();
    let mut last_clone: Option<usize> = None;
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed reading line {} of {:?}", i + 1, path))?;
        if !line.starts_with('>') {
            continue;
        }
        let read = ReadName::parse(&line)
            .with_context(|| format!("Line {} of {:?}", i + 1, path))?;
        let new_clone = match read.duplicate {
            Some(dup) => dup == 1,
            None => last_clone != Some(read.clone),
        };
        last_clone = Some(read.clone);
        if new_clone {
            counts.entry(read.locus).or_default()[read.haplotype] += 1;
        }
    }
    Ok(counts)
}

///
/// Clone coverage of every allele across samples. Only loci with at least
/// one read in some sample are present.
///
#[derive(Debug, Clone, Default)]
pub struct ReadDropout {
    samples: Vec<String>,
    /// locus -> haplotype -> per-sample clone count
    coverage: BTreeMap<String, [Vec<usize>; PLOIDY]>,
}

impl ReadDropout {
    ///
    /// Count clones in `{reads_dir}/{sample}.1.fa.gz` for every sample.
    ///
    pub fn from_reads(samples: &[String], reads_dir: &Path) -> Result<Self> {
        let per_sample = samples
            .par_iter()
            .map(|sample| count_sample_clones(reads_dir, sample))
            .collect::<Result<Vec<_>>>()?;

        let mut coverage: BTreeMap<String, [Vec<usize>; PLOIDY]> = BTreeMap::new();
        for (s, counts) in per_sample.into_iter().enumerate() {
            for (locus, haps) in counts {
                let entry = coverage
                    .entry(locus)
                    .or_insert_with(|| std::array::from_fn(|_| vec![0; samples.len()]));
                for (h, n) in haps.into_iter().enumerate() {
                    entry[h][s] = n;
                }
            }
        }
        Ok(ReadDropout {
            samples: samples.to_vec(),
            coverage,
        })
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn n_loci(&self) -> usize {
        self.coverage.len()
    }

    /// Clone count of `locus`, haplotype `hap` (0-based), sample index `sample`.
    pub fn clones(&self, locus: &str, hap: usize, sample: usize) -> Option<usize> {
        self.coverage.get(locus)?.get(hap)?.get(sample).copied()
    }

    /// Number of (allele, sample) pairs under `min_cov` clones.
    pub fn dropped(&self, min_cov: usize) -> usize {
        self.coverage
            .values()
            .flatten()
            .flatten()
            .filter(|&&n| n < min_cov)
            .count()
    }

    ///
    /// Write the dropout matrix: `allele_id` then one `0|1` column per
    /// sample, `1` meaning fewer than `min_cov` clones.
    ///
    pub fn write(&self, path: &Path, min_cov: usize) -> Result<()> {
        let mut writer = create_writer(path)?;
        writeln!(writer, "allele_id\t{}", self.samples.join("\t"))?;
        for (locus, haps) in &self.coverage {
            for (h, counts) in haps.iter().enumerate() {
                let flags: Vec<&str> = counts
                    .iter()
                    .map(|&n| if n < min_cov { "1" } else { "0" })
                    .collect();
                writeln!(writer, "{}_a{}\t{}", locus, h + 1, flags.join("\t"))?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

///
/// Compute read-level dropout for `samples` and write
/// `dropped_alleles_reads.tsv` into `out_dir`.
///
pub fn write_read_dropout_log(
    samples: &[String],
    reads_dir: &Path,
    out_dir: &Path,
    min_cov: usize,
) -> Result<ReadDropout> {
    let dropout = ReadDropout::from_reads(samples, reads_dir)?;
    dropout.write(&out_dir.join(DROPPED_READS_LOG), min_cov)?;
    log::info!(
        "{} of {} sequenced alleles below {} clones",
        dropout.dropped(min_cov),
        dropout.n_loci() * PLOIDY * samples.len(),
        min_cov
    );
    Ok(dropout)
}
