use clap::Command;

use crate::common::{chromosome_args, library_args, path_arg, pcr_args, run_args};

pub const LIBRARY_CMD: &str = "make-library";

pub fn create_library_cli() -> Command {
    let cmd = Command::new(LIBRARY_CMD)
        .about("Simulate a RAD library: reference loci, per-sample alleles, PCR and paired-end reads.")
        .arg(path_arg("genome", "Reference genome FASTA, optionally gzipped"))
        .arg(path_arg("vcf", "Genome-wide VCF with phased genotypes"))
        .arg(path_arg("popmap", "Population map, one sample<TAB>population per line"))
        .arg(path_arg("out", "Output directory"));
    pcr_args(library_args(chromosome_args(run_args(cmd))))
}
