mod common;

mod dropout {
    pub mod cli;
    pub mod handlers;
}
mod fixgenome {
    pub mod cli;
    pub mod handlers;
}
mod library {
    pub mod cli;
    pub mod handlers;
}
mod mergevcf {
    pub mod cli;
    pub mod handlers;
}
mod pcr {
    pub mod cli;
    pub mod handlers;
}
mod popmap {
    pub mod cli;
    pub mod handlers;
}
mod tally {
    pub mod cli;
    pub mod handlers;
}

use anyhow::Result;
use clap::{Arg, ArgAction, Command};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "radsim";
    pub const BIN_NAME: &str = "radsim";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Simulate RAD-seq library preparation and sequencing from a reference genome and population variants.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug messages"),
        )
        .subcommand(tally::cli::create_tally_cli())
        .subcommand(library::cli::create_library_cli())
        .subcommand(mergevcf::cli::create_merge_vcf_cli())
        .subcommand(popmap::cli::create_popmap_cli())
        .subcommand(fixgenome::cli::create_fix_genome_cli())
        .subcommand(dropout::cli::create_dropout_cli())
        .subcommand(pcr::cli::create_pcr_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match matches.subcommand() {
        //
        // REFERENCE LOCI
        //
        Some((tally::cli::TALLY_CMD, matches)) => {
            tally::handlers::run_tally(matches)?;
        }

        //
        // FULL LIBRARY SIMULATION
        //
        Some((library::cli::LIBRARY_CMD, matches)) => {
            library::handlers::run_make_library(matches)?;
        }

        //
        // POPULATION INPUTS
        //
        Some((mergevcf::cli::MERGE_VCF_CMD, matches)) => {
            mergevcf::handlers::run_merge_vcf(matches)?;
        }
        Some((popmap::cli::POPMAP_CMD, matches)) => {
            popmap::handlers::run_popmap(matches)?;
        }
        Some((fixgenome::cli::FIX_GENOME_CMD, matches)) => {
            fixgenome::handlers::run_fix_genome(matches)?;
        }

        //
        // DIAGNOSTICS
        //
        Some((dropout::cli::DROPOUT_CMD, matches)) => {
            dropout::handlers::run_dropout(matches)?;
        }
        Some((pcr::cli::PCR_CMD, matches)) => {
            pcr::handlers::run_pcr(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
