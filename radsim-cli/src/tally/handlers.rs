use std::fs;

use anyhow::{Context, Result};
use clap::ArgMatches;

use radsim_core::consts::{REF_LOCI_DIR, REF_LOCI_FASTA, REF_LOCI_STATS};
use radsim_core::models::Genome;
use radsim_loci::LocusDiscovery;

use crate::common::{chromosome_selection, init_thread_pool, load_config, required_path};

pub fn run_tally(matches: &ArgMatches) -> Result<()> {
    let genome_path = required_path(matches, "genome")?;
    let out = required_path(matches, "out")?;

    let config = load_config(matches)?;
    init_thread_pool(config.threads)?;
    let opts = config.library.build()?;
    println!("{}\n", opts);

    let selection = chromosome_selection(matches)?;
    let genome = Genome::load(genome_path, selection.as_deref())?;

    let loci_dir = out.join(REF_LOCI_DIR);
    fs::create_dir_all(&loci_dir)
        .with_context(|| format!("Failed to create directory: {:?}", loci_dir))?;

    let catalog = LocusDiscovery::new(&opts).run(&genome);
    catalog.write_fasta(&loci_dir.join(REF_LOCI_FASTA))?;
    catalog.write_stats(&loci_dir.join(REF_LOCI_STATS))?;

    println!(
        "Extracted {} loci from {} cutsites on {} chromosomes.",
        catalog.len(),
        catalog.records().len(),
        genome.len()
    );
    Ok(())
}
