use clap::{Arg, Command, value_parser};

use crate::common::path_arg;

pub const POPMAP_CMD: &str = "popmap";

pub fn create_popmap_cli() -> Command {
    Command::new(POPMAP_CMD)
        .about("Write a population map for simulated samples.")
        .arg(
            Arg::new("pop-sizes")
                .long("pop-sizes")
                .required(true)
                .value_delimiter(',')
                .value_parser(value_parser!(usize))
                .help("Samples per population, comma separated"),
        )
        .arg(path_arg("out", "Output directory"))
}
