use std::fmt::{self, Display};
use std::fs;
use std::io::prelude::*;
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;

use radsim_core::consts::{ALLELES_SUFFIX, DROPPED_ALLELES_LOG, PLOIDY};
use radsim_core::models::LibraryOptions;
use radsim_core::utils::{create_gz_writer, finish_gz_writer, progress_bar};

use crate::consts::DROPPED_ALLELES_HEADER;
use crate::discovery::LocusCatalog;
use crate::models::{RadVariant, ReferenceRadLocus};
use crate::projector::ProjectedVariants;

/// Why an allele never makes it into the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The haplotype carries a variant inside the recognition site.
    CutsiteVariant,
    /// The reconstructed sequence no longer starts with the remainder.
    CutsiteMismatch,
    /// No second-enzyme cut inside the insert window (ddRAD only).
    NoSecondDigest,
}

impl Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::CutsiteVariant => "cutsite_variant",
            DropReason::CutsiteMismatch => "cutsite_mismatch",
            DropReason::NoSecondDigest => "no_dd_cuts",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlleleOutcome {
    Kept { seq: String, cigar: String },
    Dropped(DropReason),
}

impl AlleleOutcome {
    pub fn is_kept(&self) -> bool {
        matches!(self, AlleleOutcome::Kept { .. })
    }
}

///
/// Builds per-haplotype allele sequences from a reference locus and the
/// variants projected onto it.
///
pub struct AlleleReconstructor<'a> {
    opts: &'a LibraryOptions,
}

impl<'a> AlleleReconstructor<'a> {
    pub fn new(opts: &'a LibraryOptions) -> Self {
        AlleleReconstructor { opts }
    }

    ///
    /// Reconstruct haplotype `haplotype` of sample `sample`.
    ///
    /// Edits are applied in column order to a copy of the reference. Each
    /// edit replaces the columns its reference allele covers with the
    /// alternative allele, truncated at the end of the locus (see
    /// [`RadVariant::edit`]). Edits starting inside an earlier edit are
    /// skipped.
    ///
    pub fn reconstruct(
        &self,
        locus: &ReferenceRadLocus,
        variants: &[RadVariant],
        sample: usize,
        haplotype: usize,
    ) -> AlleleOutcome {
        let reference = locus.seq.as_str();
        let mut edits: Vec<(usize, usize, &str)> = Vec::new();
        for variant in variants {
            if variant.genotype(sample, haplotype) != 1 {
                continue;
            }
            if variant.cut_variant {
                return AlleleOutcome::Dropped(DropReason::CutsiteVariant);
            }
            edits.extend(variant.edit(reference.len()));
        }
        edits.sort_by_key(|&(start, _, _)| start);

        let mut seq = String::with_capacity(reference.len());
        let mut cursor = 0;
        for (start, end, alt) in edits {
            if start < cursor {
                continue;
            }
            seq.push_str(&reference[cursor..start]);
            seq.push_str(alt);
            cursor = end;
        }
        seq.push_str(&reference[cursor..]);

        if !seq.starts_with(&self.opts.renz_1.remainder) {
            return AlleleOutcome::Dropped(DropReason::CutsiteMismatch);
        }
        if self.opts.protocol.is_double_digest() && self.opts.protocol.second_digest(&seq).is_none()
        {
            return AlleleOutcome::Dropped(DropReason::NoSecondDigest);
        }

        // descriptor of the reference window only, indels are not encoded
        AlleleOutcome::Kept {
            seq,
            cigar: format!("{}M", locus.len()),
        }
    }
}

/// Counts from one allele extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlleleSummary {
    pub kept: usize,
    pub cutsite_variant: usize,
    pub cutsite_mismatch: usize,
    pub no_second_digest: usize,
}

impl AlleleSummary {
    fn record(&mut self, outcome: &AlleleOutcome) {
        match outcome {
            AlleleOutcome::Kept { .. } => self.kept += 1,
            AlleleOutcome::Dropped(DropReason::CutsiteVariant) => self.cutsite_variant += 1,
            AlleleOutcome::Dropped(DropReason::CutsiteMismatch) => self.cutsite_mismatch += 1,
            AlleleOutcome::Dropped(DropReason::NoSecondDigest) => self.no_second_digest += 1,
        }
    }

    fn merge(mut self, other: AlleleSummary) -> AlleleSummary {
        self.kept += other.kept;
        self.cutsite_variant += other.cutsite_variant;
        self.cutsite_mismatch += other.cutsite_mismatch;
        self.no_second_digest += other.no_second_digest;
        self
    }

    pub fn dropped(&self) -> usize {
        self.cutsite_variant + self.cutsite_mismatch + self.no_second_digest
    }
}

impl Display for AlleleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} alleles kept, {} dropped ({} cutsite variants, {} cutsite mismatches, {} without second digest)",
            self.kept,
            self.dropped(),
            self.cutsite_variant,
            self.cutsite_mismatch,
            self.no_second_digest
        )
    }
}

///
/// Column of each popmap sample in the VCF genotype matrix. Samples not in
/// the VCF fall back to their popmap position.
///
fn genotype_columns(samples: &[String], vcf_samples: &[String]) -> Vec<usize> {
    samples
        .iter()
        .enumerate()
        .map(|(i, s)| match vcf_samples.iter().position(|v| v == s) {
            Some(col) => col,
            None => {
                if !vcf_samples.is_empty() {
                    log::warn!("Sample {} not in VCF, using genotype column {}", s, i);
                }
                i
            }
        })
        .collect()
}

///
/// Reconstruct and write the alleles of every sample.
///
/// Writes `{sample}.alleles.fa.gz` per sample and a drop matrix
/// (`dropped_alleles.tsv.gz`) to `out_dir`. Samples are processed in
/// parallel.
///
pub fn extract_alleles(
    catalog: &LocusCatalog,
    variants: &ProjectedVariants,
    samples: &[String],
    out_dir: &Path,
    opts: &LibraryOptions,
) -> Result<AlleleSummary> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory: {:?}", out_dir))?;

    let reconstructor = AlleleReconstructor::new(opts);
    let columns = genotype_columns(samples, &variants.samples);
    let pb = progress_bar(samples.len(), "samples")?;

    // per sample: (summary, dropped flags in catalog order x haplotype)
    let results: Vec<(AlleleSummary, Vec<bool>)> = samples
        .par_iter()
        .zip(columns.par_iter())
        .map(|(sample, &column)| -> Result<(AlleleSummary, Vec<bool>)> {
            let path = out_dir.join(format!("{}{}", sample, ALLELES_SUFFIX));
            let mut writer = create_gz_writer(&path)?;
            let mut summary = AlleleSummary::default();
            let mut dropped = Vec::with_capacity(catalog.len() * PLOIDY);

            for locus in catalog.iter() {
                let locus_vars = variants.for_locus(&locus.id);
                for hap in 0..PLOIDY {
                    let outcome = reconstructor.reconstruct(locus, locus_vars, column, hap);
                    summary.record(&outcome);
                    dropped.push(!outcome.is_kept());
                    if let AlleleOutcome::Kept { seq, cigar } = outcome {
                        writeln!(
                            writer,
                            ">{}:{}:a{} cig={}\n{}",
                            locus.id,
                            sample,
                            hap + 1,
                            cigar,
                            seq
                        )?;
                    }
                }
            }
            finish_gz_writer(writer)
                .with_context(|| format!("Failed to write alleles for sample {}", sample))?;
            pb.inc(1);
            Ok((summary, dropped))
        })
        .collect::<Result<Vec<_>>>()?;
    pb.finish_and_clear();

    write_drop_matrix(
        catalog,
        samples,
        &results.iter().map(|(_, d)| d.as_slice()).collect::<Vec<_>>(),
        &out_dir.join(DROPPED_ALLELES_LOG),
    )?;

    let summary = results
        .into_iter()
        .map(|(s, _)| s)
        .fold(AlleleSummary::default(), AlleleSummary::merge);
    log::info!("{}", summary);
    Ok(summary)
}

fn write_drop_matrix(
    catalog: &LocusCatalog,
    samples: &[String],
    dropped: &[&[bool]],
    path: &Path,
) -> Result<()> {
    let mut writer = create_gz_writer(path)?;
    writeln!(writer, "{}\t{}", DROPPED_ALLELES_HEADER, samples.join("\t"))?;
    for (l, locus) in catalog.iter().enumerate() {
        for hap in 0..PLOIDY {
            let row = l * PLOIDY + hap;
            let flags: Vec<&str> = dropped
                .iter()
                .map(|d| if d[row] { "1" } else { "0" })
                .collect();
            writeln!(writer, "{}\ta{}\t{}", locus.id, hap + 1, flags.join("\t"))?;
        }
    }
    finish_gz_writer(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, VariantKind};
    use pretty_assertions::assert_eq;
    use radsim_core::config::{LibraryConfig, ProtocolConfig};
    use rstest::*;

    #[fixture]
    fn opts() -> LibraryOptions {
        LibraryConfig::default().build().unwrap()
    }

    #[fixture]
    fn locus() -> ReferenceRadLocus {
        ReferenceRadLocus {
            id: "t0p".to_string(),
            number: 0,
            chrom: "chr1".to_string(),
            cut: 0,
            start: 2,
            end: 17,
            seq: "TGCAGGACGTACGTAC".to_string(),
            direction: Direction::Positive,
        }
    }

    fn variant(column: i64, r: &str, a: &str, genotypes: Vec<u8>, cut: bool) -> RadVariant {
        RadVariant {
            locus_id: "t0p".to_string(),
            direction: Direction::Positive,
            column,
            ref_allele: r.to_string(),
            alt_allele: a.to_string(),
            kind: VariantKind::classify(r, a),
            genotypes,
            cut_variant: cut,
        }
    }

    fn kept_seq(outcome: AlleleOutcome) -> String {
        match outcome {
            AlleleOutcome::Kept { seq, .. } => seq,
            AlleleOutcome::Dropped(reason) => panic!("allele dropped: {}", reason),
        }
    }

    #[rstest]
    fn test_reference_allele(opts: LibraryOptions, locus: ReferenceRadLocus) {
        let rec = AlleleReconstructor::new(&opts);
        let outcome = rec.reconstruct(&locus, &[], 0, 0);
        assert_eq!(
            outcome,
            AlleleOutcome::Kept {
                seq: locus.seq.clone(),
                cigar: "16M".to_string()
            }
        );
    }

    #[rstest]
    #[case(vec![variant(8, "G", "C", vec![0, 1], false)], 1, "TGCAGGACCTACGTAC")]
    #[case(vec![variant(8, "G", "C", vec![0, 1], false)], 0, "TGCAGGACGTACGTAC")]
    #[case(vec![variant(7, "C", "CTT", vec![1, 1], false)], 0, "TGCAGGACTTGTACGTAC")]
    #[case(vec![variant(7, "CGT", "C", vec![1, 1], false)], 1, "TGCAGGACACGTAC")]
    #[case(vec![variant(14, "ACG", "A", vec![1, 1], false)], 0, "TGCAGGACGTACGTA")]
    #[case(
        vec![
            variant(12, "G", "T", vec![1, 1], false),
            variant(7, "CGT", "C", vec![1, 1], false),
            variant(8, "G", "A", vec![1, 1], false),
        ],
        0,
        "TGCAGGACACTTAC"
    )]
    fn test_apply_edits(
        opts: LibraryOptions,
        locus: ReferenceRadLocus,
        #[case] variants: Vec<RadVariant>,
        #[case] hap: usize,
        #[case] expected: &str,
    ) {
        let rec = AlleleReconstructor::new(&opts);
        assert_eq!(kept_seq(rec.reconstruct(&locus, &variants, 0, hap)), expected);
    }

    #[rstest]
    fn test_cut_variant_always_discards(opts: LibraryOptions, locus: ReferenceRadLocus) {
        let rec = AlleleReconstructor::new(&opts);
        let variants = vec![
            variant(8, "G", "C", vec![1, 1], false),
            variant(-1, "C", "A", vec![0, 1], true),
            variant(10, "G", "T", vec![1, 1], false),
        ];
        assert!(rec.reconstruct(&locus, &variants, 0, 0).is_kept());
        assert_eq!(
            rec.reconstruct(&locus, &variants, 0, 1),
            AlleleOutcome::Dropped(DropReason::CutsiteVariant)
        );
    }

    #[rstest]
    fn test_remainder_mismatch(opts: LibraryOptions, locus: ReferenceRadLocus) {
        let rec = AlleleReconstructor::new(&opts);
        // a non-cut variant that still rewrites the remainder
        let variants = vec![variant(0, "TGCAGGA", "T", vec![1, 1], false)];
        assert_eq!(
            rec.reconstruct(&locus, &variants, 0, 0),
            AlleleOutcome::Dropped(DropReason::CutsiteMismatch)
        );
    }

    #[rstest]
    fn test_double_digest_requires_second_cut(locus: ReferenceRadLocus) {
        let config = LibraryConfig {
            protocol: ProtocolConfig::Ddrad {
                renz_2: "MspI".to_string(),
                insert_min: Some(8),
                insert_max: Some(12),
            },
            insert_mu: 10,
            insert_sigma: 1.0,
            read_len: 4,
            barcode_len: 2,
            base_locus_length: 20,
            min_distance: 5,
            ..LibraryConfig::default()
        };
        let opts = config.build().unwrap();
        let rec = AlleleReconstructor::new(&opts);

        // CCGG at column 9 of the allele
        let mut with_site = locus.clone();
        with_site.seq = "TGCAGGACGCCGGTAC".to_string();
        assert!(rec.reconstruct(&with_site, &[], 0, 0).is_kept());
        assert_eq!(
            rec.reconstruct(&locus, &[], 0, 0),
            AlleleOutcome::Dropped(DropReason::NoSecondDigest)
        );
    }
}
