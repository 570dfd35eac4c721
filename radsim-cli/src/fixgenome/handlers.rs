use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::ArgMatches;
use rand::SeedableRng;
use rand::rngs::StdRng;

use radsim_core::consts::{FASTA_LINE_WIDTH, GZ_EXT};
use radsim_core::models::Genome;

use crate::common::{required_path, resolve_seed};

pub fn run_fix_genome(matches: &ArgMatches) -> Result<()> {
    let genome_path = required_path(matches, "genome")?;
    let mut out = PathBuf::from(required_path(matches, "out")?);
    if out.extension().is_none_or(|e| e != GZ_EXT) {
        out.as_mut_os_string().push(".gz");
    }
    if out.exists() {
        bail!("Output file already exists: {:?}", out);
    }

    let genome = Genome::from_fasta(genome_path, None)?;
    let mut rng = StdRng::seed_from_u64(resolve_seed(matches.get_one::<u64>("seed").copied()));
    let fixed = genome.fix_bases(&mut rng);
    fixed.validate()?;
    fixed.write_fasta(&out, FASTA_LINE_WIDTH)?;
    println!("Wrote {} chromosomes to {:?}", fixed.len(), out);
    Ok(())
}
