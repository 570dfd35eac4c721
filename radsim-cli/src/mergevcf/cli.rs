use clap::{Arg, Command, value_parser};
use std::path::PathBuf;

use crate::common::{chromosome_args, path_arg, run_args};

pub const MERGE_VCF_CMD: &str = "merge-vcf";

pub fn create_merge_vcf_cli() -> Command {
    let cmd = Command::new(MERGE_VCF_CMD)
        .about("Merge per-chromosome genotype VCFs into one VCF with simulated REF/ALT alleles.")
        .arg(path_arg("genome", "Reference genome FASTA, optionally gzipped"))
        .arg(
            Arg::new("vcf-dir")
                .long("vcf-dir")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding one {chrom}.vcf.gz per chromosome"),
        )
        .arg(path_arg("out", "Output directory"));
    chromosome_args(run_args(cmd))
}
