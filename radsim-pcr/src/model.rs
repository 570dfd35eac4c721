use std::fmt::{self, Display};
use std::path::Path;

use anyhow::Result;
use rand::Rng;

use radsim_core::config::PcrConfig;
use radsim_core::consts::CLONE_DISTRIB_FILE;

use crate::amplification::clone_size_distribution;
use crate::binning::LogBins;
use crate::errors::PcrError;
use crate::fusion::sequenced_clone_matrix;
use crate::lineage::adjusted_error_distributions;
use crate::table::CloneErrorTable;

///
/// PCR duplicate and error model. Built once per run; afterwards it only
/// answers "how many reads does this template produce, and how many of
/// them carry a polymerase error".
///
#[derive(Debug, Clone)]
pub struct PcrModel {
    config: PcrConfig,
    read_len: usize,
    table: CloneErrorTable,
}

impl PcrModel {
    ///
    /// Simulate amplification and derive the sequenced clone table.
    ///
    /// # Arguments
    ///
    /// - config: PCR parameters
    /// - read_len: length of one mate, errors are counted over both mates
    /// - seed: base seed for every Monte-Carlo step
    ///
    pub fn build(config: &PcrConfig, read_len: usize, seed: u64) -> Result<Self, PcrError> {
        config.validate()?;

        if config.cycles == 0 {
            return Ok(PcrModel {
                config: config.clone(),
                read_len,
                table: CloneErrorTable::no_pcr()?,
            });
        }

        log::info!(
            "Simulating {} clones over {} PCR cycles",
            config.clone_simulations,
            config.cycles
        );
        let amplified = clone_size_distribution(
            config.mu,
            config.sigma,
            config.cycles,
            config.clone_simulations,
            seed,
        )?;

        let bins = LogBins::new(config.log_base);
        let class_probs = bins.collapse(&amplified);
        log::debug!("{} amplified clone size classes", class_probs.len());

        let errors = adjusted_error_distributions(
            &bins,
            class_probs.len(),
            read_len,
            config.pol_error,
            config.mut_node_iterations,
            seed,
        );

        let matrix = sequenced_clone_matrix(
            &bins,
            &class_probs,
            &errors,
            1.0 / config.templates_to_reads,
            config.max_seq_clone_size,
            config.truncation_epsilon,
        )?;
        let table = CloneErrorTable::from_matrix(&matrix)?;

        if table.truncated_mass() > config.truncation_epsilon {
            log::warn!(
                "Sequenced clone table truncated at size {} with {:.3e} probability mass left out",
                matrix.len() - 1,
                table.truncated_mass()
            );
        } else {
            log::debug!(
                "Sequenced clone table: {} sizes, truncated mass {:.3e}",
                matrix.len(),
                table.truncated_mass()
            );
        }

        Ok(PcrModel {
            config: config.clone(),
            read_len,
            table,
        })
    }

    /// Model with PCR disabled.
    pub fn without_pcr(read_len: usize) -> Result<Self, PcrError> {
        Self::build(&PcrConfig::default(), read_len, 0)
    }

    /// Draw `(clone_size, mutated_reads)` for one template.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        self.table.sample(rng)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.cycles > 0
    }

    pub fn config(&self) -> &PcrConfig {
        &self.config
    }

    pub fn read_len(&self) -> usize {
        self.read_len
    }

    pub fn table(&self) -> &CloneErrorTable {
        &self.table
    }

    pub fn percent_duplicates(&self) -> f64 {
        self.table.percent_duplicates()
    }

    ///
    /// Write the sequenced clone distribution into `dir`.
    ///
    pub fn write_distribution(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CLONE_DISTRIB_FILE);
        self.table.write_tsv(&path)?;
        log::info!("Wrote sequenced clone distribution to {:?}", path);
        Ok(())
    }
}

impl Display for PcrModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.config)?;
        write!(
            f,
            "    PCR duplicates : {:.2}%",
            self.percent_duplicates() * 100.0
        )
    }
}
