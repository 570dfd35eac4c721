//! Arguments shared by several subcommands and their resolution into a
//! [`RadsimConfig`]. Flags given on the command line override values from
//! `--config`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgMatches, Command, value_parser};

use radsim_core::config::{LibraryConfig, PcrConfig, ProtocolConfig, RadsimConfig};
use radsim_core::utils::read_id_list;

pub fn required_path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a Path> {
    matches
        .get_one::<PathBuf>(name)
        .map(|p| p.as_path())
        .ok_or_else(|| anyhow!("--{} is required", name))
}

pub fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

pub fn run_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("config")
            .long("config")
            .short('c')
            .value_parser(value_parser!(PathBuf))
            .help("YAML or TOML configuration file"),
    )
    .arg(
        Arg::new("seed")
            .long("seed")
            .value_parser(value_parser!(u64))
            .help("Random seed; drawn at random when absent"),
    )
    .arg(
        Arg::new("threads")
            .long("threads")
            .short('t')
            .value_parser(value_parser!(usize))
            .help("Worker threads (default: all cores)"),
    )
}

pub fn chromosome_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("chromosomes")
            .long("chromosomes")
            .value_parser(value_parser!(PathBuf))
            .help("File with one chromosome id per line to restrict the simulation to"),
    )
}

pub fn library_args(cmd: Command) -> Command {
    let typed = |name: &'static str, help: &'static str| Arg::new(name).long(name).help(help);
    cmd.arg(typed("renz-1", "Main restriction enzyme"))
        .arg(typed("renz-2", "Second restriction enzyme, selects a double digest"))
        .arg(typed("insert-mu", "Mean insert size").value_parser(value_parser!(u32)))
        .arg(typed("insert-sigma", "Insert size standard deviation").value_parser(value_parser!(f64)))
        .arg(typed("insert-min", "Minimum insert size (ddRAD)").value_parser(value_parser!(u32)))
        .arg(typed("insert-max", "Maximum insert size (ddRAD)").value_parser(value_parser!(u32)))
        .arg(typed("coverage", "Sequencing coverage per locus").value_parser(value_parser!(u32)))
        .arg(typed("read-len", "Read length").value_parser(value_parser!(u32)))
        .arg(typed("barcode-len", "Barcode length trimmed from mate 1").value_parser(value_parser!(u32)))
        .arg(typed("barcode2-len", "Barcode length trimmed from mate 2").value_parser(value_parser!(u32)))
        .arg(typed("min-distance", "Minimum distance between cutsites").value_parser(value_parser!(u32)))
        .arg(typed("base-len", "Length of a reference locus").value_parser(value_parser!(u32)))
}

pub fn pcr_args(cmd: Command) -> Command {
    let typed = |name: &'static str, help: &'static str| Arg::new(name).long(name).help(help);
    cmd.arg(typed("pcr-cycles", "PCR cycles, 0 disables duplicates").value_parser(value_parser!(u32)))
        .arg(typed("pcr-mu", "Mean per-cycle duplication probability").value_parser(value_parser!(f64)))
        .arg(typed("pcr-sigma", "Std dev of the duplication probability").value_parser(value_parser!(f64)))
        .arg(typed("templates-to-reads", "Templates per sequenced read").value_parser(value_parser!(f64)))
        .arg(typed("pol-error", "Polymerase error rate per base").value_parser(value_parser!(f64)))
}

fn override_with<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, name: &str, target: &mut T) {
    if let Ok(Some(value)) = matches.try_get_one::<T>(name) {
        *target = value.clone();
    }
}

pub fn apply_library_overrides(matches: &ArgMatches, library: &mut LibraryConfig) {
    override_with(matches, "renz-1", &mut library.renz_1);
    override_with(matches, "insert-mu", &mut library.insert_mu);
    override_with(matches, "insert-sigma", &mut library.insert_sigma);
    override_with(matches, "coverage", &mut library.coverage);
    override_with(matches, "read-len", &mut library.read_len);
    override_with(matches, "barcode-len", &mut library.barcode_len);
    override_with(matches, "barcode2-len", &mut library.barcode2_len);
    override_with(matches, "min-distance", &mut library.min_distance);
    override_with(matches, "base-len", &mut library.base_locus_length);

    if let Ok(Some(renz_2)) = matches.try_get_one::<String>("renz-2") {
        library.protocol = ProtocolConfig::Ddrad {
            renz_2: renz_2.clone(),
            insert_min: None,
            insert_max: None,
        };
    }
    if let ProtocolConfig::Ddrad {
        insert_min,
        insert_max,
        ..
    } = &mut library.protocol
    {
        if let Ok(Some(min)) = matches.try_get_one::<u32>("insert-min") {
            *insert_min = Some(*min);
        }
        if let Ok(Some(max)) = matches.try_get_one::<u32>("insert-max") {
            *insert_max = Some(*max);
        }
    }
}

pub fn apply_pcr_overrides(matches: &ArgMatches, pcr: &mut PcrConfig) {
    override_with(matches, "pcr-cycles", &mut pcr.cycles);
    override_with(matches, "pcr-mu", &mut pcr.mu);
    override_with(matches, "pcr-sigma", &mut pcr.sigma);
    override_with(matches, "templates-to-reads", &mut pcr.templates_to_reads);
    override_with(matches, "pol-error", &mut pcr.pol_error);
}

///
/// Load `--config` (or defaults) and apply every command line override the
/// subcommand defines.
///
pub fn load_config(matches: &ArgMatches) -> Result<RadsimConfig> {
    let mut config = match matches.try_get_one::<PathBuf>("config") {
        Ok(Some(path)) => RadsimConfig::from_file(path)?,
        _ => RadsimConfig::default(),
    };
    apply_library_overrides(matches, &mut config.library);
    apply_pcr_overrides(matches, &mut config.pcr);
    if let Ok(Some(seed)) = matches.try_get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    if let Ok(Some(threads)) = matches.try_get_one::<usize>("threads") {
        config.threads = Some(*threads);
    }
    Ok(config)
}

/// The configured seed, or a random one that is logged for reruns.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        let seed = rand::random::<u64>();
        log::info!("Using random seed {}", seed);
        seed
    })
}

pub fn init_thread_pool(threads: Option<usize>) -> Result<()> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to configure the thread pool")?;
    }
    Ok(())
}

pub fn chromosome_selection(matches: &ArgMatches) -> Result<Option<Vec<String>>> {
    match matches.try_get_one::<PathBuf>("chromosomes") {
        Ok(Some(path)) => Ok(Some(read_id_list(path)?)),
        _ => Ok(None),
    }
}
