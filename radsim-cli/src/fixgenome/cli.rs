use clap::{Arg, Command, value_parser};

use crate::common::path_arg;

pub const FIX_GENOME_CMD: &str = "fix-genome";

pub fn create_fix_genome_cli() -> Command {
    Command::new(FIX_GENOME_CMD)
        .about("Replace ambiguous and non-canonical bases so the genome only uses ACGTN.")
        .arg(path_arg("genome", "Reference genome FASTA, optionally gzipped"))
        .arg(path_arg("out", "Output FASTA; .gz is appended when missing"))
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Random seed for resolving ambiguity codes"),
        )
}
