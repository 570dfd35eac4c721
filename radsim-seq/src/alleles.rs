use std::io::prelude::*;
use std::path::Path;

use anyhow::{Context, Result};

use radsim_core::consts::ALLELES_SUFFIX;
use radsim_core::utils::get_dynamic_reader;

use crate::errors::SeqError;

///
/// One kept allele of a sample, as written by allele extraction.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleAllele {
    /// `{locus}:{sample}:a{haplotype}`, the prefix of every read name.
    pub name: String,
    pub cigar: String,
    pub seq: Vec<u8>,
}

impl SampleAllele {
    ///
    /// Parse a FASTA header line (without `>`) of the form
    /// `{locus}:{sample}:a{h} cig={cigar}`.
    ///
    pub fn from_header(header: &str, seq: Vec<u8>) -> Result<Self, SeqError> {
        let mut fields = header.split_whitespace();
        let name = fields
            .next()
            .filter(|n| n.split(':').count() == 3)
            .ok_or_else(|| SeqError::MalformedAlleleHeader(header.to_string()))?;
        let cigar = fields
            .find_map(|f| f.strip_prefix("cig="))
            .unwrap_or_default();
        Ok(SampleAllele {
            name: name.to_string(),
            cigar: cigar.to_string(),
            seq,
        })
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Path of a sample's allele file inside `alleles_dir`.
pub fn sample_alleles_path(alleles_dir: &Path, sample: &str) -> std::path::PathBuf {
    alleles_dir.join(format!("{}{}", sample, ALLELES_SUFFIX))
}

///
/// Load the kept alleles of `sample` from `{alleles_dir}/{sample}.alleles.fa.gz`.
///
/// Sequences may span several lines.
///
pub fn load_sample_alleles(alleles_dir: &Path, sample: &str) -> Result<Vec<SampleAllele>> {
    let path = sample_alleles_path(alleles_dir, sample);
    let reader = get_dynamic_reader(&path)?;

    let mut alleles = Vec::new();
    let mut header: Option<String> = None;
    let mut seq: Vec<u8> = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed reading line {} of {:?}", i + 1, path))?;
        let line = line.trim_end();
        if let Some(h) = line.strip_prefix('>') {
            if let Some(prev) = header.replace(h.to_string()) {
                alleles.push(finish_allele(&prev, std::mem::take(&mut seq))?);
            }
        } else if !line.is_empty() {
            seq.extend_from_slice(line.as_bytes());
        }
    }
    if let Some(prev) = header {
        alleles.push(finish_allele(&prev, seq)?);
    }

    log::debug!("Loaded {} alleles for sample {}", alleles.len(), sample);
    Ok(alleles)
}

fn finish_allele(header: &str, seq: Vec<u8>) -> Result<SampleAllele, SeqError> {
    if seq.is_empty() {
        return Err(SeqError::MissingSequence(header.to_string()));
    }
    SampleAllele::from_header(header, seq)
}
