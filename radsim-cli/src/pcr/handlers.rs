use std::fs;

use anyhow::{Context, Result};
use clap::ArgMatches;

use radsim_pcr::PcrModel;

use crate::common::{init_thread_pool, load_config, required_path, resolve_seed};

pub fn run_pcr(matches: &ArgMatches) -> Result<()> {
    let out = required_path(matches, "out")?;
    // --read-len is picked up with the library overrides
    let config = load_config(matches)?;
    init_thread_pool(config.threads)?;
    fs::create_dir_all(out).with_context(|| format!("Failed to create directory: {:?}", out))?;

    let seed = resolve_seed(config.seed);
    let model = PcrModel::build(&config.pcr, config.library.read_len as usize, seed)?;
    model.write_distribution(out)?;
    println!("{}", model);
    Ok(())
}
