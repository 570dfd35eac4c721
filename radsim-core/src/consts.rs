// Output directory layout
pub const REF_LOCI_DIR: &str = "ref_loci_vars";
pub const RAD_ALLELES_DIR: &str = "rad_alleles";
pub const RAD_READS_DIR: &str = "rad_reads";

// Output files
pub const REF_LOCI_FASTA: &str = "reference_rad_loci.fa.gz";
pub const REF_LOCI_STATS: &str = "reference_rad_loci.stats.gz";
pub const MASTER_VCF: &str = "ri_master.vcf.gz";
pub const DROPPED_ALLELES_LOG: &str = "dropped_alleles.tsv.gz";
pub const DROPPED_READS_LOG: &str = "dropped_alleles_reads.tsv";
pub const CLONE_DISTRIB_FILE: &str = "sequenced_clone_distrib.tsv";
pub const POPMAP_FILE: &str = "popmap.tsv";

// Per-sample file suffixes
pub const ALLELES_SUFFIX: &str = ".alleles.fa.gz";
pub const READS1_SUFFIX: &str = ".1.fa.gz";
pub const READS2_SUFFIX: &str = ".2.fa.gz";

pub const GZ_EXT: &str = "gz";
pub const FASTA_LINE_WIDTH: usize = 60;
pub const PLOIDY: usize = 2;

/// Bases a genome may contain after loading.
pub const ALLOWED_BASES: &[u8] = b"ACGTN";
