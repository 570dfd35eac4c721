use std::fmt::{self, Display};

///
/// Orientation of a locus relative to the cut site. Negative loci extend
/// upstream of the cut and are stored reverse complemented.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Negative,
    Positive,
}

impl Direction {
    /// Trailing marker used in locus ids.
    pub fn marker(&self) -> char {
        match self {
            Direction::Negative => 'n',
            Direction::Positive => 'p',
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Direction::Negative => "neg",
            Direction::Positive => "pos",
        }
    }

    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            'n' => Some(Direction::Negative),
            'p' => Some(Direction::Positive),
            _ => None,
        }
    }
}

/// Outcome of evaluating one candidate locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocusStatus {
    Kept,
    ChromEnd,
    TooClose,
    NoSecondDigest,
    AmbiguousBase,
}

impl Display for LocusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocusStatus::Kept => "kept",
            LocusStatus::ChromEnd => "rm_chrom_end",
            LocusStatus::TooClose => "rm_too_close",
            LocusStatus::NoSecondDigest => "rm_no_dd_cuts",
            LocusStatus::AmbiguousBase => "rm_ambiguous_base",
        };
        write!(f, "{}", s)
    }
}

///
/// Diagnostic record for every candidate locus evaluated during discovery.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    pub chrom: String,
    pub cut: usize,
    pub direction: Direction,
    pub status: LocusStatus,
}

impl Display for DiscoveryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.chrom,
            self.cut,
            self.direction.short_name(),
            self.status
        )
    }
}

///
/// A kept reference RAD locus. `start` and `end` are 0-based inclusive
/// genome coordinates; `seq` reads 5' to 3' from the cut site, so it is the
/// reverse complement of the genome window for negative loci.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRadLocus {
    pub id: String,
    pub number: usize,
    pub chrom: String,
    pub cut: usize,
    pub start: usize,
    pub end: usize,
    pub seq: String,
    pub direction: Direction,
}

impl ReferenceRadLocus {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// FASTA header, without the leading `>`.
    pub fn fasta_header(&self) -> String {
        format!(
            "{} ref_pos={}:{}-{}",
            self.id,
            self.chrom,
            self.start + 1,
            self.end + 1
        )
    }
}

impl Display for ReferenceRadLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.id, self.chrom, self.cut, self.start, self.end
        )
    }
}

/// Locus id for the `number`-th kept locus, zero padded to `width`.
pub fn locus_id(number: usize, width: usize, direction: Direction) -> String {
    format!("t{:0width$}{}", number, direction.marker(), width = width)
}

///
/// Strip the zero padding of a locus id: `t007n` becomes `t7n`.
///
pub fn normalize_locus_id(id: &str) -> Option<String> {
    let body = id.strip_prefix('t')?;
    let marker = body.chars().last()?;
    Direction::from_marker(marker)?;
    let number: usize = body[..body.len() - 1].parse().ok()?;
    Some(format!("t{}{}", number, marker))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Substitution,
    Insertion,
    Deletion,
}

impl VariantKind {
    pub fn classify(ref_allele: &str, alt_allele: &str) -> Self {
        if ref_allele.len() == alt_allele.len() {
            VariantKind::Substitution
        } else if ref_allele.len() > 1 {
            VariantKind::Deletion
        } else {
            VariantKind::Insertion
        }
    }
}

///
/// A variant projected onto one locus. `column` is the locus-local column of
/// the VCF position and may be negative for variants in the recognition site
/// upstream of the remainder.
///
/// Alleles are written in locus orientation, reverse complemented on a
/// negative locus. There the shared anchor base is the last base of each
/// allele, so the reference allele ends at `column` instead of starting
/// there.
///
#[derive(Debug, Clone, PartialEq)]
pub struct RadVariant {
    pub locus_id: String,
    pub direction: Direction,
    pub column: i64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub kind: VariantKind,
    /// Flattened haplotype calls, `[s0a0, s0a1, s1a0, ...]`.
    pub genotypes: Vec<u8>,
    pub cut_variant: bool,
}

impl RadVariant {
    /// First and last locus column covered by the reference allele.
    pub fn span(&self) -> (i64, i64) {
        let extra = self.ref_allele.len().saturating_sub(1) as i64;
        match self.direction {
            Direction::Positive => (self.column, self.column + extra),
            Direction::Negative => (self.column - extra, self.column),
        }
    }

    ///
    /// The edit this variant makes to a locus of `locus_len` bases, as the
    /// replaced columns `start..end` and the bases written over them.
    ///
    /// A reference allele running past the end of the locus is truncated,
    /// and so are the alternative bases aligned to the cut-off part. `None`
    /// when the reference allele starts outside the locus.
    ///
    pub fn edit(&self, locus_len: usize) -> Option<(usize, usize, &str)> {
        let (first, last) = self.span();
        if first < 0 || first >= locus_len as i64 {
            return None;
        }
        let start = first as usize;
        let ref_len = (last - first + 1) as usize;
        let end = (start + ref_len).min(locus_len);
        let overflow = start + ref_len - end;

        let alt_len = self.alt_allele.len();
        let keep = match self.direction {
            // alleles share their first base
            Direction::Positive => alt_len.min(ref_len - overflow),
            // alleles share their last base
            Direction::Negative => alt_len.saturating_sub(overflow),
        };
        Some((start, end, &self.alt_allele[..keep]))
    }

    pub fn genotype(&self, sample: usize, haplotype: usize) -> u8 {
        self.genotypes
            .get(sample * 2 + haplotype)
            .copied()
            .unwrap_or(0)
    }
}

impl Display for RadVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geno: String = self.genotypes.iter().map(|g| (b'0' + g) as char).collect();
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.locus_id, self.column, self.ref_allele, self.alt_allele, geno, self.cut_variant
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(7, 3, Direction::Negative, "t007n")]
    #[case(12, 2, Direction::Positive, "t12p")]
    fn test_locus_id(
        #[case] n: usize,
        #[case] width: usize,
        #[case] dir: Direction,
        #[case] expected: &str,
    ) {
        assert_eq!(locus_id(n, width, dir), expected);
    }

    #[rstest]
    #[case("t007n", Some("t7n"))]
    #[case("t000p", Some("t0p"))]
    #[case("t12x", None)]
    #[case("x12p", None)]
    fn test_normalize_locus_id(#[case] id: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_locus_id(id).as_deref(), expected);
    }

    #[rstest]
    #[case("A", "T", VariantKind::Substitution)]
    #[case("ACG", "A", VariantKind::Deletion)]
    #[case("A", "ATT", VariantKind::Insertion)]
    fn test_variant_kind(#[case] r: &str, #[case] a: &str, #[case] kind: VariantKind) {
        assert_eq!(VariantKind::classify(r, a), kind);
    }

    fn variant(direction: Direction, column: i64, r: &str, a: &str) -> RadVariant {
        RadVariant {
            locus_id: "t0n".to_string(),
            direction,
            column,
            ref_allele: r.to_string(),
            alt_allele: a.to_string(),
            kind: VariantKind::classify(r, a),
            genotypes: vec![1, 1],
            cut_variant: false,
        }
    }

    #[rstest]
    #[case(Direction::Positive, 5, "ACG", "A", (5, 7))]
    #[case(Direction::Negative, 5, "GCT", "T", (3, 5))]
    #[case(Direction::Negative, 5, "T", "CGT", (5, 5))]
    fn test_variant_span(
        #[case] dir: Direction,
        #[case] column: i64,
        #[case] r: &str,
        #[case] a: &str,
        #[case] span: (i64, i64),
    ) {
        assert_eq!(variant(dir, column, r, a).span(), span);
    }

    #[rstest]
    // deletion reaching past the end keeps its anchor on a positive locus
    #[case(Direction::Positive, 8, "ACGT", "A", Some((8, 10, "A")))]
    // the anchor lies past the end on a negative locus
    #[case(Direction::Negative, 11, "GCAT", "T", Some((8, 10, "")))]
    #[case(Direction::Negative, 4, "GCAT", "T", Some((1, 5, "T")))]
    #[case(Direction::Negative, 9, "GG", "CC", Some((8, 10, "CC")))]
    #[case(Direction::Negative, 12, "GCAT", "T", Some((9, 10, "")))]
    #[case(Direction::Negative, 2, "GCAT", "T", None)]
    #[case(Direction::Positive, 10, "A", "T", None)]
    fn test_variant_edit(
        #[case] dir: Direction,
        #[case] column: i64,
        #[case] r: &str,
        #[case] a: &str,
        #[case] expected: Option<(usize, usize, &str)>,
    ) {
        assert_eq!(variant(dir, column, r, a).edit(10), expected);
    }

    #[test]
    fn test_record_display() {
        let rec = DiscoveryRecord {
            chrom: "chr1".to_string(),
            cut: 250,
            direction: Direction::Negative,
            status: LocusStatus::TooClose,
        };
        assert_eq!(rec.to_string(), "chr1\t250\tneg\trm_too_close");
    }
}
