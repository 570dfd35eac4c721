use fxhash::FxHashMap;

use radsim_core::models::LibraryOptions;

use crate::discovery::LocusCatalog;
use crate::models::{Direction, ReferenceRadLocus};

/// Genome interval, inclusive on both ends, owned by one locus.
#[derive(Debug, Clone, Copy)]
struct LocusSpan<'a> {
    start: usize,
    end: usize,
    locus: &'a ReferenceRadLocus,
}

#[derive(Debug, Default)]
struct ChromSpans<'a> {
    // sorted by start
    spans: Vec<LocusSpan<'a>>,
    longest: usize,
}

///
/// Genome position to locus lookup, built once per catalog.
///
/// Each locus is indexed over its sequence window plus the full
/// first-enzyme recognition site, so variants that destroy the site are
/// still found.
///
#[derive(Debug, Default)]
pub struct PositionIndex<'a> {
    chroms: FxHashMap<String, ChromSpans<'a>>,
}

impl<'a> PositionIndex<'a> {
    pub fn new(catalog: &'a LocusCatalog, opts: &LibraryOptions) -> Self {
        let site_len = opts.renz_1.cutsite.len();
        let mut chroms: FxHashMap<String, ChromSpans<'a>> = FxHashMap::default();

        for (chrom, loci) in catalog.chromosomes() {
            let mut spans: Vec<LocusSpan<'a>> = loci
                .iter()
                .map(|locus| match locus.direction {
                    Direction::Positive => LocusSpan {
                        start: locus.cut.min(locus.start),
                        end: locus.end,
                        locus,
                    },
                    Direction::Negative => LocusSpan {
                        start: locus.start,
                        end: locus.end.max(locus.cut + site_len - 1),
                        locus,
                    },
                })
                .collect();
            spans.sort_by_key(|s| (s.start, s.end));
            let longest = spans.iter().map(|s| s.end - s.start + 1).max().unwrap_or(0);
            chroms.insert(chrom.clone(), ChromSpans { spans, longest });
        }

        PositionIndex { chroms }
    }

    ///
    /// Every locus whose span contains `pos` on `chrom`.
    ///
    pub fn query(&self, chrom: &str, pos: usize) -> Vec<&'a ReferenceRadLocus> {
        self.query_span(chrom, pos, pos)
    }

    ///
    /// Every locus whose span overlaps `first..=last` on `chrom`.
    ///
    pub fn query_span(&self, chrom: &str, first: usize, last: usize) -> Vec<&'a ReferenceRadLocus> {
        let Some(chrom_spans) = self.chroms.get(chrom) else {
            return Vec::new();
        };
        // only spans starting within `longest` of first can reach it
        let lo = first.saturating_sub(chrom_spans.longest);
        let lower = chrom_spans.spans.partition_point(|s| s.start < lo);
        let upper = chrom_spans.spans.partition_point(|s| s.start <= last);

        chrom_spans.spans[lower..upper]
            .iter()
            .filter(|s| s.end >= first)
            .map(|s| s.locus)
            .collect()
    }

    pub fn contains_chrom(&self, chrom: &str) -> bool {
        self.chroms.contains_key(chrom)
    }

    /// Number of indexed loci.
    pub fn len(&self) -> usize {
        self.chroms.values().map(|c| c.spans.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ChromosomeLoci;
    use pretty_assertions::assert_eq;
    use radsim_core::config::LibraryConfig;
    use rstest::*;

    fn locus(chrom: &str, cut: usize, start: usize, end: usize, dir: Direction) -> ReferenceRadLocus {
        ReferenceRadLocus {
            id: String::new(),
            number: 0,
            chrom: chrom.to_string(),
            cut,
            start,
            end,
            seq: "A".repeat(end - start + 1),
            direction: dir,
        }
    }

    #[fixture]
    fn catalog() -> LocusCatalog {
        // SbfI: CCTGCAGG, remainder TGCAGG, lead 2
        let kept = vec![
            locus("chr1", 1000, 6, 1005, Direction::Negative),
            locus("chr1", 1000, 1002, 2001, Direction::Positive),
        ];
        LocusCatalog::from_chromosomes(vec![ChromosomeLoci {
            records: Vec::new(),
            kept,
        }])
    }

    #[rstest]
    #[case(5, vec![])]
    #[case(6, vec!["t0n"])]
    #[case(999, vec!["t0n"])]
    #[case(1000, vec!["t0n", "t1p"])]
    #[case(1007, vec!["t0n", "t1p"])]
    #[case(1008, vec!["t1p"])]
    #[case(2001, vec!["t1p"])]
    #[case(2002, vec![])]
    fn test_query(catalog: LocusCatalog, #[case] pos: usize, #[case] expected: Vec<&str>) {
        let opts = LibraryConfig::default().build().unwrap();
        let index = PositionIndex::new(&catalog, &opts);
        let mut ids: Vec<&str> = index
            .query("chr1", pos)
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        ids.sort();
        assert_eq!(ids, expected);
    }

    #[rstest]
    #[case(990, 999, vec!["t0n"])]
    #[case(995, 1001, vec!["t0n", "t1p"])]
    #[case(2000, 2100, vec!["t1p"])]
    #[case(2002, 2100, vec![])]
    #[case(0, 5, vec![])]
    fn test_query_span(
        catalog: LocusCatalog,
        #[case] first: usize,
        #[case] last: usize,
        #[case] expected: Vec<&str>,
    ) {
        let opts = LibraryConfig::default().build().unwrap();
        let index = PositionIndex::new(&catalog, &opts);
        let mut ids: Vec<&str> = index
            .query_span("chr1", first, last)
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        ids.sort();
        assert_eq!(ids, expected);
    }

    #[rstest]
    fn test_unknown_chrom(catalog: LocusCatalog) {
        let opts = LibraryConfig::default().build().unwrap();
        let index = PositionIndex::new(&catalog, &opts);
        assert!(index.query("chr2", 1000).is_empty());
        assert!(!index.contains_chrom("chr2"));
        assert_eq!(index.len(), 2);
    }
}
