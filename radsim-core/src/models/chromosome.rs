use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::{self, Display};
use std::io::prelude::*;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::consts::ALLOWED_BASES;
use crate::errors::GenomeError;
use crate::utils::{create_gz_writer, finish_gz_writer, get_dynamic_reader};

///
/// Chromosome struct, one named reference sequence
///
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    pub id: String,
    pub seq: String,
    pub rec_rate: Option<f64>,
}

impl Chromosome {
    pub fn new(id: &str, seq: &str) -> Self {
        Chromosome {
            id: id.to_string(),
            seq: seq.to_ascii_uppercase(),
            rec_rate: None,
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

impl Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rec_rate {
            Some(r) => write!(f, "{} : {} bp : {}", self.id, self.len(), r),
            None => write!(f, "{} : {} bp", self.id, self.len()),
        }
    }
}

/// Replacement choices for IUPAC ambiguity codes.
fn ambiguity_choices(base: u8) -> Option<&'static [u8]> {
    match base {
        b'B' => Some(b"CGT"),
        b'D' => Some(b"AGT"),
        b'H' => Some(b"ACT"),
        b'K' => Some(b"GT"),
        b'M' => Some(b"AC"),
        b'R' => Some(b"AG"),
        b'S' => Some(b"GC"),
        b'U' => Some(b"T"),
        b'V' => Some(b"ACG"),
        b'W' => Some(b"AT"),
        b'Y' => Some(b"CT"),
        _ => None,
    }
}

///
/// In-memory reference genome. Chromosomes are kept sorted by id, which is
/// the order every downstream stage walks them in.
///
#[derive(Debug, Clone, Default)]
pub struct Genome {
    chromosomes: BTreeMap<String, Chromosome>,
}

impl Genome {
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        Genome {
            chromosomes: chromosomes.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    ///
    /// Read a (optionally gzipped) FASTA file. Does not check the alphabet,
    /// see [`Genome::validate`].
    ///
    /// # Arguments
    ///
    /// - path: path to the FASTA file
    /// - selection: keep only these chromosome ids, if given
    ///
    pub fn from_fasta(path: &Path, selection: Option<&[String]>) -> Result<Self> {
        let selection: Option<HashSet<&str>> =
            selection.map(|s| s.iter().map(|id| id.as_str()).collect());
        let keep = |name: &str| selection.as_ref().is_none_or(|s| s.contains(name));

        let reader = get_dynamic_reader(path)?;
        let mut chromosomes = Vec::new();
        let mut name: Option<String> = None;
        let mut seq = String::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed reading line {} of {:?}", i + 1, path))?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('>') {
                if let Some(prev) = name.take() {
                    if keep(&prev) {
                        chromosomes.push(Chromosome::new(&prev, &seq));
                    }
                }
                name = Some(header.split_whitespace().next().unwrap_or("").to_string());
                seq.clear();
            } else if line.starts_with('#') || line.starts_with('.') {
                continue;
            } else {
                if name.is_none() {
                    return Err(GenomeError::MissingHeader(path.display().to_string()).into());
                }
                seq.push_str(line);
            }
        }
        if let Some(prev) = name {
            if keep(&prev) {
                chromosomes.push(Chromosome::new(&prev, &seq));
            }
        }

        if chromosomes.is_empty() {
            return Err(GenomeError::EmptyGenome(path.display().to_string()).into());
        }

        let genome = Genome::new(chromosomes);
        log::info!(
            "Loaded {} chromosomes ({} bp) from {:?}",
            genome.len(),
            genome.total_length(),
            path
        );
        Ok(genome)
    }

    ///
    /// Load a genome and reject any character outside `ACGTN`.
    ///
    pub fn load(path: &Path, selection: Option<&[String]>) -> Result<Self> {
        let genome = Self::from_fasta(path, selection)?;
        genome.validate()?;
        Ok(genome)
    }

    ///
    /// Check that every chromosome only uses `ACGTN`.
    ///
    pub fn validate(&self) -> Result<(), GenomeError> {
        let mut found = BTreeSet::new();
        for chrom in self.chromosomes.values() {
            for b in chrom.seq.bytes() {
                if !ALLOWED_BASES.contains(&b) {
                    found.insert(b as char);
                }
            }
        }
        if found.is_empty() {
            Ok(())
        } else {
            let chars: Vec<String> = found.iter().map(|c| format!("'{}'", c)).collect();
            Err(GenomeError::InvalidCharacters(chars.join(", ")))
        }
    }

    ///
    /// Copy of the genome with ambiguity codes resolved to one of their
    /// bases at random and any other non-`ACGTN` character replaced by `N`.
    ///
    pub fn fix_bases<R: Rng>(&self, rng: &mut R) -> Genome {
        let mut fixed = Vec::with_capacity(self.chromosomes.len());
        let mut n_replaced = 0usize;
        for chrom in self.chromosomes.values() {
            let seq: Vec<u8> = chrom
                .seq
                .bytes()
                .map(|b| {
                    if ALLOWED_BASES.contains(&b) {
                        return b;
                    }
                    n_replaced += 1;
                    ambiguity_choices(b)
                        .and_then(|choices| choices.choose(rng).copied())
                        .unwrap_or(b'N')
                })
                .collect();
            fixed.push(Chromosome {
                id: chrom.id.clone(),
                seq: String::from_utf8_lossy(&seq).into_owned(),
                rec_rate: chrom.rec_rate,
            });
        }
        log::info!("Replaced {} non-canonical bases", n_replaced);
        Genome::new(fixed)
    }

    ///
    /// Write the genome as gzipped FASTA, wrapping sequence lines at `line_width`.
    ///
    pub fn write_fasta(&self, path: &Path, line_width: usize) -> Result<()> {
        let mut writer = create_gz_writer(path)?;
        for chrom in self.chromosomes.values() {
            writeln!(writer, ">{}", chrom.id)?;
            for chunk in chrom.seq.as_bytes().chunks(line_width.max(1)) {
                writer.write_all(chunk)?;
                writer.write_all(b"\n")?;
            }
        }
        finish_gz_writer(writer)
    }

    pub fn get(&self, id: &str) -> Option<&Chromosome> {
        self.chromosomes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Chromosome> {
        self.chromosomes.get_mut(id)
    }

    /// Chromosomes in sorted id order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes.values()
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn total_length(&self) -> usize {
        self.chromosomes.values().map(|c| c.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn fasta_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("genome.fa"),
            ">chr2 second chromosome\nacgt\n\nNNAA\n>chr1\n# comment\nGGGG\n",
        )
        .unwrap();
        fs::write(dir.path().join("bad.fa"), ">chr1\nACGTRYX\n").unwrap();
        dir
    }

    #[rstest]
    fn test_load_genome(fasta_dir: TempDir) {
        let genome = Genome::load(&fasta_dir.path().join("genome.fa"), None).unwrap();
        assert_eq!(genome.len(), 2);
        let ids: Vec<&str> = genome.chromosomes().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["chr1", "chr2"]);
        assert_eq!(genome.get("chr2").unwrap().seq, "ACGTNNAA");
        assert_eq!(genome.get("chr1").unwrap().seq, "GGGG");
        assert_eq!(genome.total_length(), 12);
    }

    #[rstest]
    fn test_load_genome_selection(fasta_dir: TempDir) {
        let selection = vec!["chr2".to_string()];
        let genome = Genome::load(&fasta_dir.path().join("genome.fa"), Some(&selection)).unwrap();
        assert_eq!(genome.len(), 1);
        assert!(genome.get("chr1").is_none());
    }

    #[rstest]
    fn test_invalid_characters_rejected(fasta_dir: TempDir) {
        let err = Genome::load(&fasta_dir.path().join("bad.fa"), None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'R'"));
        assert!(msg.contains("'X'"));
    }

    #[rstest]
    fn test_fix_bases(fasta_dir: TempDir) {
        let genome = Genome::from_fasta(&fasta_dir.path().join("bad.fa"), None).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let fixed = genome.fix_bases(&mut rng);
        assert!(fixed.validate().is_ok());

        let seq = fixed.get("chr1").unwrap().seq.as_bytes().to_vec();
        assert_eq!(&seq[0..4], b"ACGT");
        assert!(seq[4] == b'A' || seq[4] == b'G');
        assert!(seq[5] == b'C' || seq[5] == b'T');
        assert_eq!(seq[6], b'N');
    }

    #[rstest]
    fn test_write_fasta_wraps_lines(fasta_dir: TempDir) {
        let genome = Genome::new(vec![Chromosome::new("c", &"A".repeat(130))]);
        let out = fasta_dir.path().join("out.fa.gz");
        genome.write_fasta(&out, 60).unwrap();

        let lines: Vec<String> = get_dynamic_reader(&out)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[3].len(), 10);

        let reloaded = Genome::load(&out, None).unwrap();
        assert_eq!(reloaded.get("c").unwrap().len(), 130);
    }
}
