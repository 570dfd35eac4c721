use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::consts::GZ_EXT;

/// Gzip writer used for every compressed output file.
pub type GzWriter = GzEncoder<BufWriter<File>>;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new(GZ_EXT));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    // large buffer, genome and VCF files are read line by line
    let reader = BufReader::with_capacity(256 * 1024, file);

    Ok(reader)
}

///
/// Create a gzip writer at `path`, truncating any existing file.
///
pub fn create_gz_writer(path: &Path) -> Result<GzWriter> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    Ok(GzEncoder::new(BufWriter::new(file), Compression::default()))
}

///
/// Write the gzip trailer and flush the underlying file.
///
pub fn finish_gz_writer(writer: GzWriter) -> Result<()> {
    let mut inner = writer.finish().context("Failed to finalize gzip stream")?;
    inner.flush()?;
    Ok(())
}

///
/// Create a plain buffered writer at `path`.
///
pub fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    Ok(BufWriter::new(file))
}

/// Complement of a single base. Anything outside ACGT becomes `N`.
#[inline]
pub fn complement_base(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        _ => b'N',
    }
}

/// Reverse complement of a sequence. Non-ACGT characters map to `N`.
pub fn rev_comp(sequence: &str) -> String {
    sequence
        .bytes()
        .rev()
        .map(|b| complement_base(b) as char)
        .collect()
}

///
/// Start offsets of all non-overlapping forward matches of `pattern`.
///
pub fn find_sites(sequence: &str, pattern: &str) -> Vec<usize> {
    if pattern.is_empty() {
        return Vec::new();
    }
    sequence.match_indices(pattern).map(|(i, _)| i).collect()
}

///
/// Read a list of identifiers, one per line, skipping blank lines.
///
pub fn read_id_list(path: &Path) -> Result<Vec<String>> {
    let reader = get_dynamic_reader(path)?;
    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

///
/// Progress bar for a per-sample loop.
///
pub fn progress_bar(len: usize, message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?,
    );
    pb.set_message(message.to_string());
    Ok(pb)
}

///
/// Random streams of the pipeline. Each stage derives its own base seed
/// with [`SeedStream::seed`] and offsets it per parallel unit, so units of
/// different stages never share a generator.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStream {
    CloneSizes = 1,
    Lineage = 2,
    Sequencing = 3,
}

impl SeedStream {
    pub fn seed(self, base: u64) -> u64 {
        // odd multiplier spreads the stream ids over the whole seed space
        let mixed = base ^ (self as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(mixed).random()
    }

    /// Generator of parallel unit `index` within this stream.
    pub fn rng(self, base: u64, index: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed(base).wrapping_add(index))
    }
}

/// Number of decimal digits needed to print `n`.
pub fn digits(n: usize) -> usize {
    n.to_string().len()
}
