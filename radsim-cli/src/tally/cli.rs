use clap::Command;

use crate::common::{chromosome_args, library_args, path_arg, run_args};

pub const TALLY_CMD: &str = "tally";

pub fn create_tally_cli() -> Command {
    let cmd = Command::new(TALLY_CMD)
        .about("Find the RAD loci of a reference genome and write them with a per-cutsite log.")
        .arg(path_arg("genome", "Reference genome FASTA, optionally gzipped"))
        .arg(path_arg("out", "Output directory"));
    library_args(chromosome_args(run_args(cmd)))
}
