use std::fmt::{self, Display};

use crate::errors::EnzymeError;
use crate::utils::find_sites;

/// Known restriction enzymes and their cut patterns, `/` marks the cut.
pub const KNOWN_ENZYMES: &[(&str, &str)] = &[
    // 4 cutters
    ("AluI", "AG/CT"),
    ("BfaI", "C/TAG"),
    ("BfuCI", "/GATC"),
    ("Csp6I", "G/TAC"),
    ("CviQI", "G/TAC"),
    ("DpnII", "/GATC"),
    ("HaeIII", "GG/CC"),
    ("HinP1I", "G/CGC"),
    ("HpaII", "C/CGG"),
    ("MluCI", "/AATT"),
    ("MseI", "T/TAA"),
    ("MspI", "C/CGG"),
    ("NlaIII", "/CATG"),
    ("RsaI", "GT/AC"),
    ("Sau3AI", "/GATC"),
    ("TaqI", "T/CGA"),
    // 6 cutters
    ("AgeI", "A/CCGGT"),
    ("AseI", "AT/TAAT"),
    ("BamHI", "G/GATCC"),
    ("BglII", "A/GATCT"),
    ("BspDI", "AT/CGAT"),
    ("ClaI", "AT/CGAT"),
    ("EcoRI", "G/AATTC"),
    ("EcoRV", "GAT/ATC"),
    ("EcoT22I", "A/TGCAT"),
    ("HinDIII", "A/AGCTT"),
    ("KpnI", "G/GTACC"),
    ("NcoI", "C/CATGG"),
    ("NdeI", "CA/TATG"),
    ("NheI", "G/CTAGC"),
    ("NsiI", "A/TGCAT"),
    ("PstI", "C/TGCAG"),
    ("SacI", "G/AGCTC"),
    ("SphI", "G/CATGC"),
    ("SpeI", "A/CTAGT"),
    ("XbaI", "T/CTAGA"),
    ("XhoI", "C/TCGAG"),
    // 8 cutters
    ("NotI", "GC/GGCCGC"),
    ("SbfI", "CC/TGCAGG"),
];

///
/// A restriction enzyme: its recognition site and the part of the site
/// retained on the fragment after cutting (the remainder).
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionEnzyme {
    pub name: String,
    pub cut_pattern: String,
    pub cutsite: String,
    pub remainder: String,
}

impl RestrictionEnzyme {
    ///
    /// Look an enzyme up by name, case-insensitively.
    ///
    pub fn from_name(name: &str) -> Result<Self, EnzymeError> {
        let (known_name, pattern) = KNOWN_ENZYMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .ok_or_else(|| EnzymeError::UnknownEnzyme(name.to_string(), known_enzyme_names()))?;
        Ok(Self::from_pattern(known_name, pattern))
    }

    ///
    /// Build an enzyme from a cut pattern such as `CC/TGCAGG`.
    ///
    pub fn from_pattern(name: &str, pattern: &str) -> Self {
        let cutsite = pattern.replace('/', "");
        let remainder_len = pattern.split('/').map(|part| part.len()).max().unwrap_or(0);
        let remainder = cutsite[cutsite.len() - remainder_len..].to_string();
        RestrictionEnzyme {
            name: name.to_string(),
            cut_pattern: pattern.to_string(),
            cutsite,
            remainder,
        }
    }

    /// Bases shared by the two fragments produced by one cut.
    pub fn overlap_len(&self) -> i64 {
        2 * self.remainder.len() as i64 - self.cutsite.len() as i64
    }

    /// Bases of the cutsite lost from the fragment, upstream of the remainder.
    pub fn lead_len(&self) -> usize {
        self.cutsite.len() - self.remainder.len()
    }

    ///
    /// Positions of this enzyme's cutsite in `sequence` within `[min, max]`.
    /// `None` when no site falls in the window.
    ///
    pub fn digest(&self, sequence: &str, min: usize, max: usize) -> Option<Vec<usize>> {
        let cuts: Vec<usize> = find_sites(sequence, &self.cutsite)
            .into_iter()
            .filter(|&c| c >= min && c <= max)
            .collect();
        if cuts.is_empty() { None } else { Some(cuts) }
    }
}

impl Display for RestrictionEnzyme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.cut_pattern)
    }
}

/// Space separated list of the known enzyme names, sorted case-insensitively.
pub fn known_enzyme_names() -> String {
    let mut names: Vec<&str> = KNOWN_ENZYMES.iter().map(|(n, _)| *n).collect();
    names.sort_by_key(|n| n.to_lowercase());
    names.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("SbfI", "CCTGCAGG", "TGCAGG", 4)]
    #[case("sbfi", "CCTGCAGG", "TGCAGG", 4)]
    #[case("MspI", "CCGG", "CGG", 2)]
    #[case("EcoRI", "GAATTC", "AATTC", 4)]
    #[case("NlaIII", "CATG", "CATG", 4)]
    #[case("EcoRV", "GATATC", "ATC", 0)]
    #[case("NotI", "GCGGCCGC", "GGCCGC", 4)]
    fn test_enzyme_lookup(
        #[case] name: &str,
        #[case] cutsite: &str,
        #[case] remainder: &str,
        #[case] olap: i64,
    ) {
        let enz = RestrictionEnzyme::from_name(name).unwrap();
        assert_eq!(enz.cutsite, cutsite);
        assert_eq!(enz.remainder, remainder);
        assert_eq!(enz.overlap_len(), olap);
    }

    #[test]
    fn test_unknown_enzyme() {
        let err = RestrictionEnzyme::from_name("FooI").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("FooI"));
        assert!(msg.contains("SbfI"));
    }

    #[test]
    fn test_remainder_round_trips_for_all_enzymes() {
        for (name, _) in KNOWN_ENZYMES {
            let enz = RestrictionEnzyme::from_name(name).unwrap();
            assert!(enz.remainder.len() <= enz.cutsite.len());
            // the cutsite length is recovered from the remainder and the overlap
            let lead = enz.remainder.len() as i64 - enz.overlap_len();
            assert_eq!(lead as usize, enz.lead_len());
            let rebuilt = format!("{}{}", &enz.cutsite[..lead as usize], enz.remainder);
            assert_eq!(rebuilt, enz.cutsite);
        }
    }

    #[test]
    fn test_digest_window() {
        let enz = RestrictionEnzyme::from_name("MspI").unwrap();
        let seq = "AACCGGAAAAACCGGAAAAAAAAACCGG";
        assert_eq!(enz.digest(seq, 0, 100), Some(vec![2, 11, 24]));
        assert_eq!(enz.digest(seq, 5, 20), Some(vec![11]));
        assert_eq!(enz.digest(seq, 12, 20), None);
    }
}
