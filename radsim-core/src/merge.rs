//! Merge per-chromosome, genotype-only VCFs into one genome-wide VCF with
//! reference and alternative alleles drawn from a [`MutationModel`].

use std::fmt::{self, Display};
use std::io::prelude::*;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;

use crate::models::{Genome, MutationModel};
use crate::utils::{create_gz_writer, digits, finish_gz_writer};
use crate::vcf::{FIRST_SAMPLE_COLUMN, VcfReader};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub samples: usize,
    pub written: usize,
    /// Variants starting inside a previous indel.
    pub overlapping: usize,
    /// Variants on an `N` reference base.
    pub ambiguous: usize,
    /// Chromosomes whose VCF ran past the reference end.
    pub truncated_chroms: usize,
}

impl Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Merged variants for {} samples:", self.samples)?;
        writeln!(f, "    written : {}", self.written)?;
        writeln!(f, "    overlapping an indel : {}", self.overlapping)?;
        write!(f, "    on N bases : {}", self.ambiguous)
    }
}

/// Sample names `msp_{i}` zero-padded to the largest index.
pub fn sample_names(n_samples: usize) -> Vec<String> {
    let pad = digits(n_samples.saturating_sub(1));
    (0..n_samples)
        .map(|i| format!("msp_{:0width$}", i, width = pad))
        .collect()
}

fn write_header<W: Write>(writer: &mut W, genome: &Genome, samples: &[String]) -> Result<()> {
    writeln!(writer, "##fileformat=VCFv4.2")?;
    writeln!(writer, "##source=radsim version {} - merge-vcf", VERSION)?;
    writeln!(writer, "##FILTER=<ID=PASS,Description=\"All filters passed\">")?;
    for chrom in genome.chromosomes() {
        writeln!(writer, "##contig=<ID={},length={}>", chrom.id, chrom.len())?;
    }
    writeln!(writer, "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">")?;
    writeln!(
        writer,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}",
        samples.join("\t")
    )?;
    Ok(())
}

///
/// Merge `{vcf_dir}/{chrom}.vcf.gz` for every chromosome of `genome` into a
/// gzipped VCF at `out_path`.
///
/// Samples are renamed `msp_{i}` after the first chromosome's header. Per
/// chromosome, a variant is skipped when it starts at or before the end of
/// the previous indel (or at position 0), the chromosome ends at the first
/// variant past its sequence, and variants on `N` are dropped.
///
pub fn merge_vcfs<R: Rng + ?Sized>(
    genome: &Genome,
    vcf_dir: &Path,
    out_path: &Path,
    model: &MutationModel,
    rng: &mut R,
) -> Result<MergeSummary> {
    let mut writer = create_gz_writer(out_path)?;
    let mut summary = MergeSummary::default();
    let mut header_written = false;

    for chrom in genome.chromosomes() {
        let path = vcf_dir.join(format!("{}.vcf.gz", chrom.id));
        let mut reader = VcfReader::from_path(&path)
            .with_context(|| format!("Missing VCF for chromosome {}", chrom.id))?;
        if !header_written {
            summary.samples = reader.samples().len();
            write_header(&mut writer, genome, &sample_names(summary.samples))?;
            header_written = true;
        }

        let seq = chrom.seq.as_bytes();
        let mut prev_end = 0usize;
        while let Some(mut record) = reader.next_record()? {
            if record.pos >= seq.len() {
                summary.truncated_chroms += 1;
                log::warn!(
                    "VCF for {} runs past the chromosome end at {}",
                    chrom.id,
                    record.pos + 1
                );
                break;
            }
            if record.pos <= prev_end {
                summary.overlapping += 1;
                continue;
            }
            let (ref_allele, alt_allele) = model.mutate(record.pos, seq, rng);
            if ref_allele.len() > 1 || alt_allele.len() > 1 {
                prev_end = record.pos + ref_allele.len();
            }
            if ref_allele == "N" {
                summary.ambiguous += 1;
                continue;
            }

            record.fields[0] = chrom.id.clone();
            record.fields[3] = ref_allele;
            record.fields[4] = alt_allele;
            if record.fields.len() > FIRST_SAMPLE_COLUMN + summary.samples {
                record.fields.truncate(FIRST_SAMPLE_COLUMN + summary.samples);
            }
            writeln!(writer, "{}", record.to_line())?;
            summary.written += 1;
        }
    }

    finish_gz_writer(writer)?;
    log::info!("{}", summary);
    Ok(summary)
}
