use std::fs;

use anyhow::{Context, Result};
use clap::ArgMatches;
use rand::SeedableRng;
use rand::rngs::StdRng;

use radsim_core::consts::{MASTER_VCF, REF_LOCI_DIR};
use radsim_core::merge::merge_vcfs;
use radsim_core::models::{Genome, MutationModel};

use crate::common::{chromosome_selection, load_config, required_path, resolve_seed};

pub fn run_merge_vcf(matches: &ArgMatches) -> Result<()> {
    let genome_path = required_path(matches, "genome")?;
    let vcf_dir = required_path(matches, "vcf-dir")?;
    let out = required_path(matches, "out")?;

    let config = load_config(matches)?;
    let model = MutationModel::new(&config.mutation)?;
    println!("{}\n", model);

    let selection = chromosome_selection(matches)?;
    let genome = Genome::load(genome_path, selection.as_deref())?;

    let out_dir = out.join(REF_LOCI_DIR);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create directory: {:?}", out_dir))?;

    let mut rng = StdRng::seed_from_u64(resolve_seed(config.seed));
    let summary = merge_vcfs(&genome, vcf_dir, &out_dir.join(MASTER_VCF), &model, &mut rng)?;
    println!("{}", summary);
    Ok(())
}
