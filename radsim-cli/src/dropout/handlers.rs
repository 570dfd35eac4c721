use std::fs;

use anyhow::{Context, Result};
use clap::ArgMatches;

use radsim_core::popmap::PopMap;
use radsim_seq::{DEFAULT_MIN_COV, write_read_dropout_log};

use crate::common::required_path;

pub fn run_dropout(matches: &ArgMatches) -> Result<()> {
    let popmap = required_path(matches, "popmap")?;
    let reads_dir = required_path(matches, "reads-dir")?;
    let out = required_path(matches, "out")?;
    let min_cov = matches
        .get_one::<usize>("min-cov")
        .copied()
        .unwrap_or(DEFAULT_MIN_COV);
    fs::create_dir_all(out).with_context(|| format!("Failed to create directory: {:?}", out))?;

    let samples = PopMap::from_file(popmap)?.samples();
    let dropout = write_read_dropout_log(&samples, reads_dir, out, min_cov)?;
    println!(
        "{} loci sequenced; {} allele/sample pairs below {} clones",
        dropout.n_loci(),
        dropout.dropped(min_cov),
        min_cov
    );
    Ok(())
}
