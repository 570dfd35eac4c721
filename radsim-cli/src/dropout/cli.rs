use std::path::PathBuf;

use clap::{Arg, Command, value_parser};

use radsim_seq::DEFAULT_MIN_COV;

use crate::common::path_arg;

pub const DROPOUT_CMD: &str = "dropout";

pub fn create_dropout_cli() -> Command {
    Command::new(DROPOUT_CMD)
        .about("Report alleles sequenced from too few independent templates.")
        .arg(path_arg("popmap", "Population map of the simulated samples"))
        .arg(
            Arg::new("reads-dir")
                .long("reads-dir")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory with the {sample}.1.fa.gz read files"),
        )
        .arg(path_arg("out", "Output directory"))
        .arg(
            Arg::new("min-cov")
                .long("min-cov")
                .value_parser(value_parser!(usize))
                .help(format!(
                    "Minimum distinct clones for an allele to count as sequenced [default: {}]",
                    DEFAULT_MIN_COV
                )),
        )
}
