use std::fmt::{self, Display};
use std::fs;
use std::io::prelude::*;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use rayon::prelude::*;

use radsim_core::consts::{PLOIDY, READS1_SUFFIX, READS2_SUFFIX};
use radsim_core::models::LibraryOptions;
use radsim_core::utils::{
    SeedStream, complement_base, create_gz_writer, finish_gz_writer, progress_bar,
};
use radsim_pcr::PcrModel;

use crate::alleles::{SampleAllele, load_sample_alleles};
use crate::errors::SeqError;
use crate::noise::{pcr_mutation, sequencing_errors};
use crate::template::TemplateSampler;

/// Read pairs needed to cover every locus of a diploid sample `coverage` times.
pub fn target_reads(n_alleles: usize, coverage: usize) -> usize {
    (n_alleles / PLOIDY) * coverage
}

/// Mate 1 and mate 2 of one sequenced fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub forward: Vec<u8>,
    pub reverse: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSummary {
    pub sample: String,
    pub alleles: usize,
    pub clones: usize,
    pub read_pairs: usize,
    /// Pairs sequenced from a PCR-mutated template.
    pub mutated_pairs: usize,
    pub skipped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LibrarySummary {
    pub samples: Vec<SampleSummary>,
}

impl LibrarySummary {
    pub fn read_pairs(&self) -> usize {
        self.samples.iter().map(|s| s.read_pairs).sum()
    }

    pub fn clones(&self) -> usize {
        self.samples.iter().map(|s| s.clones).sum()
    }

    pub fn skipped(&self) -> usize {
        self.samples.iter().filter(|s| s.skipped).count()
    }
}

impl Display for LibrarySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self.read_pairs();
        let clones = self.clones();
        writeln!(f, "Sequenced {} samples:", self.samples.len() - self.skipped())?;
        writeln!(f, "    read pairs : {}", pairs)?;
        write!(f, "    clones : {}", clones)?;
        if pairs > 0 {
            write!(
                f,
                "\n    observed duplicates : {:.2}%",
                100.0 * (1.0 - clones as f64 / pairs as f64)
            )?;
        }
        Ok(())
    }
}

///
/// Simulates paired-end sequencing of a sample's alleles: templates are
/// sheared (or digested), amplified into clones by the PCR model and read
/// with a position-dependent error rate.
///
pub struct SequencingSimulator<'a> {
    opts: &'a LibraryOptions,
    pcr: &'a PcrModel,
}

impl<'a> SequencingSimulator<'a> {
    pub fn new(opts: &'a LibraryOptions, pcr: &'a PcrModel) -> Self {
        SequencingSimulator { opts, pcr }
    }

    ///
    /// Sequence one fragment: the forward read starts at the cutsite end,
    /// the reverse read is the reverse complement of the last `read_len`
    /// bases of the insert. Barcode lengths are trimmed off the 3' ends.
    ///
    pub fn read_pair<R: Rng + ?Sized>(
        &self,
        template: &[u8],
        insert_len: usize,
        rng: &mut R,
    ) -> ReadPair {
        let rlen = self.opts.read_len;
        let probs = &self.opts.error_probs;

        let fw_end = rlen.min(template.len());
        let mut forward = sequencing_errors(&template[..fw_end], probs, rng);
        forward.truncate(rlen - self.opts.barcode_len);

        let rv_end = insert_len.min(template.len());
        let rv_start = insert_len.saturating_sub(rlen).min(rv_end);
        let mut reverse: Vec<u8> = sequencing_errors(&template[rv_start..rv_end], probs, rng)
            .into_iter()
            .rev()
            .map(complement_base)
            .collect();
        reverse.truncate(rlen - self.opts.barcode2_len);

        ReadPair { forward, reverse }
    }

    ///
    /// Sequence one sample until its target read count is met, writing
    /// mate 1 and mate 2 records to the two writers.
    ///
    /// Each clone emits its error-free pairs first, then the pairs from a
    /// single PCR-mutated copy of the template. The last clone may overshoot
    /// the target.
    ///
    pub fn sequence_sample<W: Write, R: Rng + ?Sized>(
        &self,
        sample: &str,
        alleles: &[SampleAllele],
        reads1: &mut W,
        reads2: &mut W,
        rng: &mut R,
    ) -> Result<SampleSummary> {
        let mut summary = SampleSummary {
            sample: sample.to_string(),
            alleles: alleles.len(),
            ..Default::default()
        };
        let target = target_reads(alleles.len(), self.opts.coverage);
        if target == 0 {
            return Ok(summary);
        }
        let sampler = TemplateSampler::new(alleles, self.opts)
            .ok_or_else(|| SeqError::NoTemplate(sample.to_string()))?;

        let mut remaining = target as i64;
        while remaining > 0 {
            let template = sampler
                .sample(alleles, rng)
                .ok_or_else(|| SeqError::NoTemplate(sample.to_string()))?;
            let allele = &alleles[template.allele];
            let (clone_size, n_mutated) = self.pcr.sample(rng);
            summary.clones += 1;
            let name = format!("{}:{}", allele.name, summary.clones);

            for _ in 0..clone_size - n_mutated {
                let pair = self.read_pair(&allele.seq, template.insert_len, rng);
                write_pair(&name, &pair, reads1, reads2)?;
            }
            if n_mutated > 0 {
                let mutated =
                    pcr_mutation(&allele.seq, template.insert_len, self.opts.read_len, rng);
                for _ in 0..n_mutated {
                    let pair = self.read_pair(&mutated, template.insert_len, rng);
                    write_pair(&name, &pair, reads1, reads2)?;
                }
            }
            summary.read_pairs += clone_size;
            summary.mutated_pairs += n_mutated;
            remaining -= clone_size as i64;
        }
        Ok(summary)
    }

    ///
    /// Sequence every sample in parallel. Reads go to
    /// `{out_dir}/{sample}.1.fa.gz` and `{out_dir}/{sample}.2.fa.gz`; each
    /// sample draws from its own generator in the sequencing stream of
    /// `seed`, apart from the generators the PCR model was built with.
    ///
    /// Samples whose alleles cannot produce a template get empty read files
    /// and a warning.
    ///
    pub fn sequence_library(
        &self,
        samples: &[String],
        alleles_dir: &Path,
        out_dir: &Path,
        seed: u64,
    ) -> Result<LibrarySummary> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create directory: {:?}", out_dir))?;
        log::info!("Sequencing {} samples", samples.len());
        let pb = progress_bar(samples.len(), "samples")?;

        let summaries = samples
            .par_iter()
            .enumerate()
            .map(|(i, sample)| -> Result<SampleSummary> {
                let alleles = load_sample_alleles(alleles_dir, sample)?;
                let mut rng = SeedStream::Sequencing.rng(seed, i as u64);
                let mut reads1 =
                    create_gz_writer(&out_dir.join(format!("{}{}", sample, READS1_SUFFIX)))?;
                let mut reads2 =
                    create_gz_writer(&out_dir.join(format!("{}{}", sample, READS2_SUFFIX)))?;

                let summary = match self.sequence_sample(
                    sample,
                    &alleles,
                    &mut reads1,
                    &mut reads2,
                    &mut rng,
                ) {
                    Ok(summary) => summary,
                    Err(e) => match e.downcast::<SeqError>() {
                        Ok(SeqError::NoTemplate(_)) => {
                            log::warn!("Skipping sample {}: no allele yields a template", sample);
                            SampleSummary {
                                sample: sample.clone(),
                                alleles: alleles.len(),
                                skipped: true,
                                ..Default::default()
                            }
                        }
                        Ok(other) => return Err(other.into()),
                        Err(e) => return Err(e),
                    },
                };

                finish_gz_writer(reads1)?;
                finish_gz_writer(reads2)
                    .with_context(|| format!("Failed to write reads for sample {}", sample))?;
                log::debug!(
                    "Sample {}: {} read pairs from {} clones",
                    sample,
                    summary.read_pairs,
                    summary.clones
                );
                pb.inc(1);
                Ok(summary)
            })
            .collect::<Result<Vec<_>>>()?;
        pb.finish_and_clear();

        let summary = LibrarySummary { samples: summaries };
        log::info!("{}", summary);
        Ok(summary)
    }
}

fn write_pair<W: Write>(name: &str, pair: &ReadPair, reads1: &mut W, reads2: &mut W) -> Result<()> {
    writeln!(reads1, ">{}/1", name)?;
    reads1.write_all(&pair.forward)?;
    reads1.write_all(b"\n")?;
    writeln!(reads2, ">{}/2", name)?;
    reads2.write_all(&pair.reverse)?;
    reads2.write_all(b"\n")?;
    Ok(())
}
