/// Header of the per-candidate discovery log.
pub const STATS_HEADER: &str = "#chrom_id\tcut_pos\ttag_dir\tstatus";

/// Leading columns of the per-allele drop log; sample names follow.
pub const DROPPED_ALLELES_HEADER: &str = "locus\tallele";
