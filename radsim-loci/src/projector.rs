use std::path::Path;

use anyhow::{Context, Result};
use fxhash::FxHashMap;

use radsim_core::models::LibraryOptions;
use radsim_core::utils::rev_comp;
use radsim_core::vcf::{VcfReader, VcfRecord};

use crate::discovery::LocusCatalog;
use crate::index::PositionIndex;
use crate::models::{Direction, RadVariant, ReferenceRadLocus, VariantKind};

/// Projected variants grouped by locus id, with the VCF sample order.
#[derive(Debug, Clone, Default)]
pub struct ProjectedVariants {
    pub samples: Vec<String>,
    pub by_locus: FxHashMap<String, Vec<RadVariant>>,
}

impl ProjectedVariants {
    pub fn for_locus(&self, locus_id: &str) -> &[RadVariant] {
        self.by_locus
            .get(locus_id)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Total number of projected variants.
    pub fn len(&self) -> usize {
        self.by_locus.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

///
/// Maps genome-coordinate variants onto locus-local columns.
///
pub struct VariantProjector<'a> {
    opts: &'a LibraryOptions,
    index: PositionIndex<'a>,
}

impl<'a> VariantProjector<'a> {
    pub fn new(catalog: &'a LocusCatalog, opts: &'a LibraryOptions) -> Self {
        VariantProjector {
            opts,
            index: PositionIndex::new(catalog, opts),
        }
    }

    ///
    /// Project one variant at 0-based genome position `pos` onto `locus`.
    ///
    /// On a negative locus the column is `end - pos` and both alleles are
    /// reverse complemented. The variant is a cut variant when the columns
    /// its reference allele covers touch the recognition site.
    ///
    pub fn project(
        &self,
        locus: &ReferenceRadLocus,
        pos: usize,
        ref_allele: &str,
        alt_allele: &str,
        genotypes: Vec<u8>,
    ) -> RadVariant {
        let (column, ref_allele, alt_allele) = match locus.direction {
            Direction::Positive => (
                pos as i64 - locus.start as i64,
                ref_allele.to_string(),
                alt_allele.to_string(),
            ),
            Direction::Negative => (
                locus.end as i64 - pos as i64,
                rev_comp(ref_allele),
                rev_comp(alt_allele),
            ),
        };
        let (site_first, site_last) = self.opts.cutsite_columns();

        let mut variant = RadVariant {
            locus_id: locus.id.clone(),
            direction: locus.direction,
            column,
            kind: VariantKind::classify(&ref_allele, &alt_allele),
            ref_allele,
            alt_allele,
            genotypes,
            cut_variant: false,
        };
        let (first, last) = variant.span();
        variant.cut_variant = first <= site_last && last >= site_first;
        variant
    }

    ///
    /// One variant per locus overlapping the record's reference allele.
    /// Empty when the record falls outside every locus.
    ///
    pub fn project_record(&self, record: &VcfRecord) -> Result<Vec<RadVariant>> {
        let last = record.pos + record.ref_allele.len().saturating_sub(1);
        let loci = self.index.query_span(&record.chrom, record.pos, last);
        if loci.is_empty() {
            return Ok(Vec::new());
        }
        let genotypes = record.genotypes()?;
        Ok(loci
            .into_iter()
            .map(|locus| {
                self.project(
                    locus,
                    record.pos,
                    &record.ref_allele,
                    &record.alt_allele,
                    genotypes.clone(),
                )
            })
            .collect())
    }

    ///
    /// Stream a VCF and collect the variants falling in any locus.
    ///
    pub fn project_vcf(&self, path: &Path) -> Result<ProjectedVariants> {
        let mut reader = VcfReader::from_path(path)?;
        let mut projected = ProjectedVariants {
            samples: reader.samples().to_vec(),
            by_locus: FxHashMap::default(),
        };

        let mut n_records = 0;
        while let Some(record) = reader
            .next_record()
            .with_context(|| format!("Failed to parse VCF: {:?}", path))?
        {
            n_records += 1;
            if !self.index.contains_chrom(&record.chrom) {
                continue;
            }
            for variant in self.project_record(&record)? {
                projected
                    .by_locus
                    .entry(variant.locus_id.clone())
                    .or_default()
                    .push(variant);
            }
        }

        log::info!(
            "Projected {} of {} variants onto {} loci",
            projected.len(),
            n_records,
            projected.by_locus.len()
        );
        Ok(projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alleles::{AlleleOutcome, AlleleReconstructor};
    use crate::discovery::ChromosomeLoci;
    use pretty_assertions::assert_eq;
    use radsim_core::config::LibraryConfig;
    use rstest::*;

    fn catalog() -> LocusCatalog {
        let neg = ReferenceRadLocus {
            id: String::new(),
            number: 0,
            chrom: "chr1".to_string(),
            cut: 1000,
            start: 6,
            end: 1005,
            seq: "A".repeat(1000),
            direction: Direction::Negative,
        };
        let pos = ReferenceRadLocus {
            start: 1002,
            end: 2001,
            direction: Direction::Positive,
            ..neg.clone()
        };
        LocusCatalog::from_chromosomes(vec![ChromosomeLoci {
            records: Vec::new(),
            kept: vec![neg, pos],
        }])
    }

    #[rstest]
    #[case(1500, 498, false)]
    #[case(1002, 0, true)]
    #[case(1000, -2, true)]
    #[case(1007, 5, true)]
    #[case(1008, 6, false)]
    fn test_project_positive(#[case] pos: usize, #[case] column: i64, #[case] cut: bool) {
        let opts = LibraryConfig::default().build().unwrap();
        let catalog = catalog();
        let projector = VariantProjector::new(&catalog, &opts);
        let locus = catalog.chromosome("chr1")[1].clone();

        let var = projector.project(&locus, pos, "A", "T", vec![0, 1]);
        assert_eq!(var.column, column);
        assert_eq!(var.cut_variant, cut);
        assert_eq!(var.alt_allele, "T");
    }

    #[rstest]
    #[case(500, 505, false)]
    #[case(1005, 0, true)]
    #[case(1007, -2, true)]
    #[case(1000, 5, true)]
    #[case(999, 6, false)]
    fn test_project_negative(#[case] pos: usize, #[case] column: i64, #[case] cut: bool) {
        let opts = LibraryConfig::default().build().unwrap();
        let catalog = catalog();
        let projector = VariantProjector::new(&catalog, &opts);
        let locus = catalog.chromosome("chr1")[0].clone();

        let var = projector.project(&locus, pos, "A", "C", vec![1, 1]);
        assert_eq!(var.column, column);
        assert_eq!(var.column, locus.end as i64 - pos as i64);
        assert_eq!(var.cut_variant, cut);
        assert_eq!(var.ref_allele, "T");
        assert_eq!(var.alt_allele, "G");
        assert_eq!(var.kind, VariantKind::Substitution);
    }

    #[rstest]
    #[case("A", "ACG", "T", "CGT", VariantKind::Insertion, (505, 505))]
    #[case("AC", "A", "GT", "T", VariantKind::Deletion, (504, 505))]
    #[case("ACGT", "A", "ACGT", "T", VariantKind::Deletion, (502, 505))]
    fn test_project_negative_indel(
        #[case] r: &str,
        #[case] a: &str,
        #[case] locus_ref: &str,
        #[case] locus_alt: &str,
        #[case] kind: VariantKind,
        #[case] span: (i64, i64),
    ) {
        let opts = LibraryConfig::default().build().unwrap();
        let catalog = catalog();
        let projector = VariantProjector::new(&catalog, &opts);
        let locus = catalog.chromosome("chr1")[0].clone();

        let var = projector.project(&locus, 500, r, a, vec![1, 1]);
        assert_eq!(var.column, 505);
        assert_eq!(var.ref_allele, locus_ref);
        assert_eq!(var.alt_allele, locus_alt);
        assert_eq!(var.kind, kind);
        assert_eq!(var.span(), span);
        assert!(!var.cut_variant);
    }

    #[rstest]
    // window ACGTTAGCATCCTGCA, SbfI site CCTGCAGG at 10
    #[case(4, "T", "TGA")]
    #[case(8, "A", "ACG")]
    #[case(5, "AGC", "A")]
    #[case(1, "CG", "C")]
    #[case(6, "G", "C")]
    fn test_negative_indels_reconstruct_in_locus_orientation(
        #[case] pos: usize,
        #[case] r: &str,
        #[case] a: &str,
    ) {
        let opts = LibraryConfig::default().build().unwrap();
        let window = "ACGTTAGCATCCTGCA";
        let locus = ReferenceRadLocus {
            id: "t0n".to_string(),
            number: 0,
            chrom: "chr1".to_string(),
            cut: 10,
            start: 0,
            end: 15,
            seq: rev_comp(window),
            direction: Direction::Negative,
        };
        let catalog = LocusCatalog::from_chromosomes(vec![ChromosomeLoci {
            records: Vec::new(),
            kept: vec![locus.clone()],
        }]);
        let projector = VariantProjector::new(&catalog, &opts);
        assert_eq!(&window[pos..pos + r.len()], r);

        let var = projector.project(&locus, pos, r, a, vec![1, 1]);
        assert!(!var.cut_variant);
        let edited = format!("{}{}{}", &window[..pos], a, &window[pos + r.len()..]);
        let outcome = AlleleReconstructor::new(&opts).reconstruct(&locus, &[var], 0, 0);
        match outcome {
            AlleleOutcome::Kept { seq, .. } => assert_eq!(seq, rev_comp(&edited)),
            AlleleOutcome::Dropped(reason) => panic!("allele dropped: {}", reason),
        }
    }

    #[test]
    fn test_deletion_into_site_is_a_cut_variant() {
        let opts = LibraryConfig::default().build().unwrap();
        let catalog = catalog();
        let projector = VariantProjector::new(&catalog, &opts);

        // anchored one base before the cut of t1p, deleting the first site base
        let record = VcfRecord::parse(1, "chr1\t1000\t.\tGC\tG\t.\t.\t.\tGT\t1|1").unwrap();
        let vars = projector.project_record(&record).unwrap();
        let pos = vars.iter().find(|v| v.locus_id == "t1p").unwrap();
        assert_eq!(pos.column, -3);
        assert_eq!(pos.span(), (-3, -2));
        assert!(pos.cut_variant);

        // a substitution at the same position misses the site
        let record = VcfRecord::parse(2, "chr1\t1000\t.\tG\tC\t.\t.\t.\tGT\t1|1").unwrap();
        let vars = projector.project_record(&record).unwrap();
        assert!(vars.iter().all(|v| v.locus_id != "t1p"));
    }

    #[test]
    fn test_project_record_overlapping_loci() {
        let opts = LibraryConfig::default().build().unwrap();
        let catalog = catalog();
        let projector = VariantProjector::new(&catalog, &opts);

        let record = VcfRecord::parse(1, "chr1\t1004\t.\tG\tC\t.\t.\t.\tGT\t0|1").unwrap();
        let mut vars = projector.project_record(&record).unwrap();
        vars.sort_by(|a, b| a.locus_id.cmp(&b.locus_id));

        assert_eq!(vars.len(), 2);
        assert_eq!((vars[0].locus_id.as_str(), vars[0].column), ("t0n", 2));
        assert_eq!((vars[1].locus_id.as_str(), vars[1].column), ("t1p", 1));
        assert!(vars.iter().all(|v| v.cut_variant));

        let outside = VcfRecord::parse(2, "chr1\t3\t.\tG\tC\t.\t.\t.\tGT\t0|1").unwrap();
        assert!(projector.project_record(&outside).unwrap().is_empty());
    }
}
