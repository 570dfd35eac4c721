//! Streaming reader for VCF-like variant files.
//!
//! Only the fixed columns and the first two characters of each genotype
//! column (`0|1`, `1/1`, ...) are interpreted; everything else is carried
//! along untouched so records can be written back out.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::utils::get_dynamic_reader;

/// First genotype column in a VCF data line.
pub const FIRST_SAMPLE_COLUMN: usize = 9;

#[derive(Error, Debug)]
pub enum VcfError {
    #[error("Line {0}: expected at least 5 columns")]
    TooFewColumns(usize),

    #[error("Line {0}: invalid POS field '{1}'")]
    InvalidPosition(usize, String),

    #[error("Line {0}: unsupported genotype '{1}', expected two 0/1 alleles")]
    InvalidGenotype(usize, String),
}

///
/// One VCF data line. `pos` is 0-based.
///
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRecord {
    pub line: usize,
    pub chrom: String,
    pub pos: usize,
    pub ref_allele: String,
    pub alt_allele: String,
    pub fields: Vec<String>,
}

fn parse_allele(line: usize, gt: &str, c: Option<u8>) -> Result<u8, VcfError> {
    match c {
        Some(b'1') => Ok(1),
        Some(b'0') | Some(b'.') => Ok(0),
        _ => Err(VcfError::InvalidGenotype(line, gt.to_string())),
    }
}

impl VcfRecord {
    pub fn parse(line_no: usize, line: &str) -> Result<Self, VcfError> {
        let fields: Vec<String> = line.split('\t').map(|f| f.to_string()).collect();
        if fields.len() < 5 {
            return Err(VcfError::TooFewColumns(line_no));
        }
        let pos = fields[1]
            .parse::<usize>()
            .ok()
            .and_then(|p| p.checked_sub(1))
            .ok_or_else(|| VcfError::InvalidPosition(line_no, fields[1].clone()))?;
        Ok(VcfRecord {
            line: line_no,
            chrom: fields[0].clone(),
            pos,
            ref_allele: fields[3].clone(),
            alt_allele: fields[4].clone(),
            fields,
        })
    }

    ///
    /// Haplotype calls flattened as `[s0a0, s0a1, s1a0, s1a1, ...]`, 1 for
    /// the alternative allele.
    ///
    pub fn genotypes(&self) -> Result<Vec<u8>, VcfError> {
        let columns = self.fields.get(FIRST_SAMPLE_COLUMN..).unwrap_or_default();
        let mut calls = Vec::with_capacity(columns.len() * 2);
        for gt in columns {
            let bytes = gt.as_bytes();
            calls.push(parse_allele(self.line, gt, bytes.first().copied())?);
            calls.push(parse_allele(self.line, gt, bytes.get(2).copied())?);
        }
        Ok(calls)
    }

    /// Tab-joined line, without a newline.
    pub fn to_line(&self) -> String {
        self.fields.join("\t")
    }
}

///
/// Line-by-line VCF reader. Header lines are collected on open; records
/// are then pulled lazily through the [`Iterator`] implementation.
///
pub struct VcfReader {
    reader: BufReader<Box<dyn Read>>,
    pub meta: Vec<String>,
    pub columns: Vec<String>,
    pending: Option<String>,
    line_no: usize,
    line_buf: String,
}

impl VcfReader {
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        let mut vcf = VcfReader {
            reader,
            meta: Vec::new(),
            columns: Vec::new(),
            pending: None,
            line_no: 0,
            line_buf: String::new(),
        };
        vcf.read_header()
            .with_context(|| format!("Failed to read VCF header: {:?}", path))?;
        Ok(vcf)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.line_buf.clear();
        if self.reader.read_line(&mut self.line_buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(
            self.line_buf
                .trim_end_matches('\n')
                .trim_end_matches('\r')
                .to_string(),
        ))
    }

    fn read_header(&mut self) -> Result<()> {
        while let Some(line) = self.read_line()? {
            if line.starts_with("#CHROM") {
                self.columns = line.split('\t').map(|c| c.to_string()).collect();
            } else if line.starts_with('#') {
                self.meta.push(line);
            } else if !line.is_empty() {
                self.pending = Some(line);
                break;
            }
        }
        Ok(())
    }

    /// Sample names from the `#CHROM` line.
    pub fn samples(&self) -> &[String] {
        self.columns.get(FIRST_SAMPLE_COLUMN..).unwrap_or_default()
    }

    pub fn next_record(&mut self) -> Result<Option<VcfRecord>> {
        loop {
            let line = match self.pending.take() {
                Some(line) => line,
                None => match self.read_line()? {
                    Some(line) => line,
                    None => return Ok(None),
                },
            };
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Ok(Some(VcfRecord::parse(self.line_no, &line)?));
        }
    }
}

impl Iterator for VcfReader {
    type Item = Result<VcfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const VCF: &str = "##fileformat=VCFv4.2\n\
##contig=<ID=chr1,length=100>\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tmsp_0\tmsp_1\n\
chr1\t5\t.\tA\tT\t.\tPASS\t.\tGT\t0|1\t1|1\n\
chr1\t9\t.\tAC\tA\t.\tPASS\t.\tGT\t0|0\t.|1\n";

    #[test]
    fn test_read_vcf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.vcf");
        fs::write(&path, VCF).unwrap();

        let reader = VcfReader::from_path(&path).unwrap();
        assert_eq!(reader.meta.len(), 2);
        assert_eq!(reader.samples(), &["msp_0".to_string(), "msp_1".to_string()]);

        let records: Vec<VcfRecord> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pos, 4);
        assert_eq!(records[0].genotypes().unwrap(), vec![0, 1, 1, 1]);
        assert_eq!(records[1].ref_allele, "AC");
        assert_eq!(records[1].genotypes().unwrap(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_bad_records() {
        assert!(matches!(
            VcfRecord::parse(3, "chr1\t0\t.\tA\tT"),
            Err(VcfError::InvalidPosition(3, _))
        ));
        assert!(matches!(
            VcfRecord::parse(4, "chr1\t5"),
            Err(VcfError::TooFewColumns(4))
        ));
        let rec = VcfRecord::parse(5, "chr1\t5\t.\tA\tT\t.\t.\t.\tGT\t2|0").unwrap();
        assert!(rec.genotypes().is_err());
    }
}
