use std::fs;

use anyhow::{Context, Result};
use clap::ArgMatches;

use radsim_core::consts::{
    RAD_ALLELES_DIR, RAD_READS_DIR, REF_LOCI_DIR, REF_LOCI_FASTA, REF_LOCI_STATS,
};
use radsim_core::models::Genome;
use radsim_core::popmap::PopMap;
use radsim_loci::{LocusDiscovery, VariantProjector, extract_alleles};
use radsim_pcr::PcrModel;
use radsim_seq::SequencingSimulator;

use crate::common::{
    chromosome_selection, init_thread_pool, load_config, required_path, resolve_seed,
};

/// File the resolved configuration is saved to, so a run can be repeated.
pub const RUN_CONFIG_FILE: &str = "radsim_config.yaml";

pub fn run_make_library(matches: &ArgMatches) -> Result<()> {
    let genome_path = required_path(matches, "genome")?;
    let vcf_path = required_path(matches, "vcf")?;
    let popmap_path = required_path(matches, "popmap")?;
    let out = required_path(matches, "out")?;

    let mut config = load_config(matches)?;
    init_thread_pool(config.threads)?;
    let seed = resolve_seed(config.seed);
    config.seed = Some(seed);

    let opts = config.library.build()?;
    config.pcr.validate()?;
    println!("{}\n", opts);

    for dir in [REF_LOCI_DIR, RAD_ALLELES_DIR, RAD_READS_DIR] {
        let dir = out.join(dir);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
    }
    fs::write(out.join(RUN_CONFIG_FILE), config.to_yaml()?)
        .context("Failed to save the run configuration")?;

    let selection = chromosome_selection(matches)?;
    let genome = Genome::load(genome_path, selection.as_deref())?;
    let samples = PopMap::from_file(popmap_path)?.samples();

    log::info!("Extracting RAD loci...");
    let catalog = LocusDiscovery::new(&opts).run(&genome);
    let loci_dir = out.join(REF_LOCI_DIR);
    catalog.write_fasta(&loci_dir.join(REF_LOCI_FASTA))?;
    catalog.write_stats(&loci_dir.join(REF_LOCI_STATS))?;
    println!("Extracted {} loci.", catalog.len());

    log::info!("Filtering RAD variants...");
    let variants = VariantProjector::new(&catalog, &opts).project_vcf(vcf_path)?;
    println!("Kept {} RAD variants.", variants.len());

    log::info!("Extracting RAD alleles...");
    let alleles_dir = out.join(RAD_ALLELES_DIR);
    let summary = extract_alleles(&catalog, &variants, &samples, &alleles_dir, &opts)?;
    println!("{}", summary);

    let pcr = PcrModel::build(&config.pcr, opts.read_len, seed)?;
    pcr.write_distribution(out)?;
    println!("\n{}\n", pcr);

    log::info!("Sequencing library...");
    let summary = SequencingSimulator::new(&opts, &pcr).sequence_library(
        &samples,
        &alleles_dir,
        &out.join(RAD_READS_DIR),
        seed,
    )?;
    println!("{}", summary);
    Ok(())
}
