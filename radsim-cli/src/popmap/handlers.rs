use std::fs;

use anyhow::{Context, Result};
use clap::ArgMatches;

use radsim_core::consts::POPMAP_FILE;
use radsim_core::popmap::PopMap;

use crate::common::required_path;

pub fn run_popmap(matches: &ArgMatches) -> Result<()> {
    let sizes: Vec<usize> = matches
        .get_many::<usize>("pop-sizes")
        .map(|v| v.copied().collect())
        .unwrap_or_default();
    let out = required_path(matches, "out")?;
    fs::create_dir_all(out).with_context(|| format!("Failed to create directory: {:?}", out))?;

    let popmap = PopMap::from_population_sizes(&sizes);
    let path = out.join(POPMAP_FILE);
    popmap.write(&path)?;
    println!(
        "Wrote {} samples in {} populations to {:?}",
        popmap.len(),
        sizes.len(),
        path
    );
    Ok(())
}
