use std::fmt::{self, Display};

use super::enzyme::RestrictionEnzyme;

///
/// Library protocol: a single digest with one enzyme, or a double digest
/// where a second enzyme defines the far end of each fragment and the
/// fragment must fall in a size window.
///
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryProtocol {
    SingleDigest,
    DoubleDigest {
        renz_2: RestrictionEnzyme,
        ins_min: usize,
        ins_max: usize,
    },
}

impl LibraryProtocol {
    pub fn name(&self) -> &'static str {
        match self {
            LibraryProtocol::SingleDigest => "sdRAD",
            LibraryProtocol::DoubleDigest { .. } => "ddRAD",
        }
    }

    pub fn is_double_digest(&self) -> bool {
        matches!(self, LibraryProtocol::DoubleDigest { .. })
    }

    ///
    /// Distance from a chromosome start under which a negative locus is
    /// rejected.
    ///
    pub fn chrom_end_margin(&self, base_len: usize) -> usize {
        match self {
            LibraryProtocol::SingleDigest => base_len,
            LibraryProtocol::DoubleDigest { ins_max, .. } => *ins_max,
        }
    }

    ///
    /// Second-enzyme sites in `sequence` inside the insert window. Always
    /// `None` for a single digest.
    ///
    pub fn second_digest(&self, sequence: &str) -> Option<Vec<usize>> {
        match self {
            LibraryProtocol::SingleDigest => None,
            LibraryProtocol::DoubleDigest {
                renz_2,
                ins_min,
                ins_max,
            } => renz_2.digest(sequence, *ins_min, *ins_max),
        }
    }
}

///
/// Validated, immutable library options. Built from
/// [`crate::config::LibraryConfig::build`] and passed by reference to every
/// stage of the simulation.
///
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryOptions {
    pub protocol: LibraryProtocol,
    pub renz_1: RestrictionEnzyme,
    pub insert_mu: f64,
    pub insert_sigma: f64,
    pub ins_min: usize,
    pub ins_max: usize,
    pub coverage: usize,
    pub read_len: usize,
    pub barcode_len: usize,
    pub barcode2_len: usize,
    pub min_dist: usize,
    pub base_len: usize,
    pub ierr: f64,
    pub ferr: f64,
    /// Per-position sequencing error probability along a read.
    pub error_probs: Vec<f64>,
}

impl LibraryOptions {
    ///
    /// Linear ramp of error probabilities from `ierr` at the 5' end to
    /// `ferr` at the 3' end of a read of length `read_len`.
    ///
    pub fn error_ramp(ierr: f64, ferr: f64, read_len: usize) -> Vec<f64> {
        if read_len < 2 {
            return vec![ierr; read_len];
        }
        let step = (ferr - ierr) / (read_len - 1) as f64;
        (0..read_len).map(|i| ierr + step * i as f64).collect()
    }

    /// Inclusive range of locus columns covered by the first enzyme's
    /// recognition site. Column 0 is the first remainder base.
    pub fn cutsite_columns(&self) -> (i64, i64) {
        let first = -(self.renz_1.lead_len() as i64);
        (first, first + self.renz_1.cutsite.len() as i64 - 1)
    }
}

impl Display for LibraryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RAD Library Options:")?;
        writeln!(f, "    library type : {}", self.protocol.name())?;
        match &self.protocol {
            LibraryProtocol::SingleDigest => {
                writeln!(f, "    restriction enzyme : {}", self.renz_1)?;
                writeln!(f, "    insert size mean : {} bp", self.insert_mu)?;
                writeln!(f, "    insert size std dev : {} bp", self.insert_sigma)?;
            }
            LibraryProtocol::DoubleDigest {
                renz_2,
                ins_min,
                ins_max,
            } => {
                writeln!(f, "    restriction enzyme 1 : {}", self.renz_1)?;
                writeln!(f, "    restriction enzyme 2 : {}", renz_2)?;
                writeln!(f, "    insert size mean : {} bp", self.insert_mu)?;
                writeln!(f, "    insert size min : {} bp", ins_min)?;
                writeln!(f, "    insert size max : {} bp", ins_max)?;
            }
        }
        writeln!(f, "    read length : {} bp", self.read_len)?;
        write!(f, "    sequencing coverage : {} X", self.coverage)
    }
}
