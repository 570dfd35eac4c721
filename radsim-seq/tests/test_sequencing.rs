//! End-to-end: reference loci -> alleles -> reads -> dropout

use std::io::BufRead;
use std::path::Path;

use pretty_assertions::assert_eq;
use radsim_core::config::{LibraryConfig, PcrConfig};
use radsim_core::consts::{DROPPED_READS_LOG, READS1_SUFFIX, READS2_SUFFIX};
use radsim_core::models::{Chromosome, Genome, LibraryOptions};
use radsim_core::utils::get_dynamic_reader;
use radsim_loci::{LocusDiscovery, ProjectedVariants, extract_alleles};
use radsim_pcr::PcrModel;
use radsim_seq::{SequencingSimulator, write_read_dropout_log};
use rstest::*;
use tempfile::{TempDir, tempdir};

const CUTS: [usize; 3] = [2500, 5000, 7500];

fn chromosome() -> String {
    let mut seq: Vec<u8> = b"ACGT".iter().copied().cycle().take(10_000).collect();
    for cut in CUTS {
        seq[cut..cut + 6].copy_from_slice(b"CTGCAG");
    }
    String::from_utf8(seq).unwrap()
}

#[fixture]
fn opts() -> LibraryOptions {
    LibraryConfig {
        renz_1: "PstI".to_string(),
        ierr: 0.0,
        ferr: 0.0,
        ..LibraryConfig::default()
    }
    .build()
    .unwrap()
}

fn samples() -> Vec<String> {
    vec!["msp_0".to_string(), "msp_1".to_string()]
}

/// Writes the reference alleles of two samples into a temp dir.
#[fixture]
fn alleles_dir(opts: LibraryOptions) -> TempDir {
    let dir = tempdir().unwrap();
    let genome = Genome::new(vec![Chromosome::new("chr1", &chromosome())]);
    let catalog = LocusDiscovery::new(&opts).run(&genome);
    let variants = ProjectedVariants {
        samples: samples(),
        ..Default::default()
    };
    extract_alleles(&catalog, &variants, &samples(), dir.path(), &opts).unwrap();
    dir
}

fn read_lines(path: &Path) -> Vec<String> {
    get_dynamic_reader(path)
        .unwrap()
        .lines()
        .map(|l| l.unwrap())
        .collect()
}

#[rstest]
fn test_library_without_pcr(opts: LibraryOptions, alleles_dir: TempDir) {
    let reads_dir = alleles_dir.path().join("reads");
    let pcr = PcrModel::without_pcr(opts.read_len).unwrap();
    let summary = SequencingSimulator::new(&opts, &pcr)
        .sequence_library(&samples(), alleles_dir.path(), &reads_dir, 17)
        .unwrap();

    // 12 alleles per sample -> 6 loci x 20X
    assert_eq!(summary.samples.len(), 2);
    for s in &summary.samples {
        assert_eq!(s.alleles, 12);
        assert_eq!(s.read_pairs, 120);
        assert_eq!(s.clones, 120);
    }

    let r1 = read_lines(&reads_dir.join(format!("msp_0{}", READS1_SUFFIX)));
    let r2 = read_lines(&reads_dir.join(format!("msp_0{}", READS2_SUFFIX)));
    assert_eq!(r1.len(), 240);
    assert_eq!(r2.len(), 240);
    for (i, pair) in r1.chunks(2).enumerate() {
        assert!(pair[0].starts_with(">t"));
        assert!(pair[0].ends_with(&format!(":{}/1", i + 1)));
        assert_eq!(pair[1].len(), opts.read_len - opts.barcode_len);
        // error-free reads start at the enzyme remainder
        assert!(pair[1].starts_with("TGCAG"));
    }
    assert!(r2.chunks(2).all(|pair| pair[1].len() == opts.read_len));
}

#[rstest]
fn test_library_with_pcr(opts: LibraryOptions, alleles_dir: TempDir) {
    let config = PcrConfig {
        cycles: 6,
        clone_simulations: 20_000,
        mut_node_iterations: 50,
        ..Default::default()
    };
    let pcr = PcrModel::build(&config, opts.read_len, 3).unwrap();
    let sim = SequencingSimulator::new(&opts, &pcr);

    let run = |name: &str| {
        let out = alleles_dir.path().join(name);
        let summary = sim
            .sequence_library(&samples(), alleles_dir.path(), &out, 99)
            .unwrap();
        (summary, read_lines(&out.join(format!("msp_1{}", READS1_SUFFIX))))
    };
    let (summary, first) = run("reads_a");
    let (_, second) = run("reads_b");

    assert_eq!(first, second);
    for s in &summary.samples {
        assert!(s.read_pairs >= 120);
        assert!(s.clones <= s.read_pairs);
    }
    assert!(summary.read_pairs() > summary.clones());
}

#[rstest]
fn test_read_dropout(opts: LibraryOptions, alleles_dir: TempDir) {
    let reads_dir = alleles_dir.path().join("reads");
    let pcr = PcrModel::without_pcr(opts.read_len).unwrap();
    SequencingSimulator::new(&opts, &pcr)
        .sequence_library(&samples(), alleles_dir.path(), &reads_dir, 5)
        .unwrap();

    let dropout = write_read_dropout_log(&samples(), &reads_dir, alleles_dir.path(), 3).unwrap();
    assert_eq!(dropout.n_loci(), 6);

    let lines = read_lines(&alleles_dir.path().join(DROPPED_READS_LOG));
    assert_eq!(lines[0], "allele_id\tmsp_0\tmsp_1");
    assert_eq!(lines.len(), 1 + 6 * 2);
    assert_eq!(lines[1].split('\t').next(), Some("t0n_a1"));

    // without PCR every read is its own clone
    let total: usize = (0..2)
        .flat_map(|s| {
            let dropout = &dropout;
            ["t0n", "t1p", "t2n", "t3p", "t4n", "t5p"]
                .into_iter()
                .flat_map(move |l| (0..2).map(move |h| dropout.clones(l, h, s).unwrap_or(0)))
        })
        .sum();
    assert_eq!(total, 240);
}
