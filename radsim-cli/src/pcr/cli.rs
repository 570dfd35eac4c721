use clap::{Arg, Command, value_parser};

use crate::common::{path_arg, pcr_args, run_args};

pub const PCR_CMD: &str = "pcr";

pub fn create_pcr_cli() -> Command {
    let cmd = Command::new(PCR_CMD)
        .about("Compute the sequenced clone size and PCR error distribution alone.")
        .arg(path_arg("out", "Output directory"))
        .arg(
            Arg::new("read-len")
                .long("read-len")
                .value_parser(value_parser!(u32))
                .help("Read length"),
        );
    pcr_args(run_args(cmd))
}
