use std::fmt::{self, Display};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::models::{LibraryOptions, LibraryProtocol, RestrictionEnzyme};

// ============================================================================
// Library protocol
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum ProtocolConfig {
    Sdrad,
    Ddrad {
        #[serde(default = "default_renz_2")]
        renz_2: String,
        #[serde(default)]
        insert_min: Option<u32>,
        #[serde(default)]
        insert_max: Option<u32>,
    },
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig::Sdrad
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryConfig {
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default = "default_renz_1")]
    pub renz_1: String,
    #[serde(default = "default_insert_mu")]
    pub insert_mu: u32,
    #[serde(default = "default_insert_sigma")]
    pub insert_sigma: f64,
    #[serde(default = "default_coverage")]
    pub coverage: u32,
    #[serde(default = "default_read_len")]
    pub read_len: u32,
    #[serde(default = "default_barcode_len")]
    pub barcode_len: u32,
    #[serde(default)]
    pub barcode2_len: u32,
    #[serde(default = "default_ierr")]
    pub ierr: f64,
    #[serde(default = "default_ferr")]
    pub ferr: f64,
    #[serde(default = "default_min_distance")]
    pub min_distance: u32,
    #[serde(default = "default_base_locus_length")]
    pub base_locus_length: u32,
}

fn default_renz_1() -> String { "SbfI".to_string() }
fn default_renz_2() -> String { "MspI".to_string() }
fn default_insert_mu() -> u32 { 350 }
fn default_insert_sigma() -> f64 { 37.0 }
fn default_coverage() -> u32 { 20 }
fn default_read_len() -> u32 { 150 }
fn default_barcode_len() -> u32 { 6 }
fn default_ierr() -> f64 { 0.001 }
fn default_ferr() -> f64 { 0.01 }
fn default_min_distance() -> u32 { 500 }
fn default_base_locus_length() -> u32 { 1000 }

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            protocol: ProtocolConfig::default(),
            renz_1: default_renz_1(),
            insert_mu: default_insert_mu(),
            insert_sigma: default_insert_sigma(),
            coverage: default_coverage(),
            read_len: default_read_len(),
            barcode_len: default_barcode_len(),
            barcode2_len: 0,
            ierr: default_ierr(),
            ferr: default_ferr(),
            min_distance: default_min_distance(),
            base_locus_length: default_base_locus_length(),
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter(
            name.to_string(),
            format!("{} is not a probability", value),
        ))
    }
}

impl LibraryConfig {
    ///
    /// Validate the configuration and resolve it into [`LibraryOptions`].
    ///
    pub fn build(&self) -> Result<LibraryOptions, ConfigError> {
        let renz_1 = RestrictionEnzyme::from_name(&self.renz_1)?;

        if self.insert_mu >= self.base_locus_length {
            return Err(ConfigError::InsertLargerThanLocus(
                self.insert_mu,
                self.base_locus_length,
            ));
        }
        if self.insert_mu <= self.read_len {
            return Err(ConfigError::InsertSmallerThanRead(self.insert_mu, self.read_len));
        }
        if !(self.insert_sigma >= 0.0 && self.insert_sigma.is_finite()) {
            return Err(ConfigError::InvalidParameter(
                "insert_sigma".to_string(),
                format!("{} must be a finite, non-negative number", self.insert_sigma),
            ));
        }
        if self.barcode_len >= self.read_len || self.barcode2_len >= self.read_len {
            return Err(ConfigError::BarcodeTooLong(
                self.barcode_len.max(self.barcode2_len),
                self.read_len,
            ));
        }
        check_probability("ierr", self.ierr)?;
        check_probability("ferr", self.ferr)?;

        let mu = self.insert_mu as f64;
        let derived_min = (mu - 2.0 * self.insert_sigma).max(0.0).floor() as u32;
        let derived_max = (mu + 2.0 * self.insert_sigma).floor() as u32;

        let (protocol, ins_min, ins_max) = match &self.protocol {
            ProtocolConfig::Sdrad => (
                LibraryProtocol::SingleDigest,
                derived_min,
                derived_max.min(self.base_locus_length),
            ),
            ProtocolConfig::Ddrad {
                renz_2,
                insert_min,
                insert_max,
            } => {
                let renz_2 = RestrictionEnzyme::from_name(renz_2)?;
                if let Some(max) = insert_max {
                    if *max >= self.base_locus_length {
                        return Err(ConfigError::InsertMaxLargerThanLocus(
                            *max,
                            self.base_locus_length,
                        ));
                    }
                }
                let ins_min = insert_min.unwrap_or(derived_min);
                if ins_min <= self.read_len {
                    return Err(ConfigError::InsertMinSmallerThanRead(ins_min, self.read_len));
                }
                let ins_max = insert_max.unwrap_or(derived_max).min(self.base_locus_length);
                if ins_min >= ins_max {
                    return Err(ConfigError::InvertedInsertWindow(ins_min, ins_max));
                }
                (
                    LibraryProtocol::DoubleDigest {
                        renz_2,
                        ins_min: ins_min as usize,
                        ins_max: ins_max as usize,
                    },
                    ins_min,
                    ins_max,
                )
            }
        };

        let read_len = self.read_len as usize;
        Ok(LibraryOptions {
            protocol,
            renz_1,
            insert_mu: mu,
            insert_sigma: self.insert_sigma,
            ins_min: ins_min as usize,
            ins_max: ins_max as usize,
            coverage: self.coverage as usize,
            read_len,
            barcode_len: self.barcode_len as usize,
            barcode2_len: self.barcode2_len as usize,
            min_dist: self.min_distance as usize,
            base_len: self.base_locus_length as usize,
            ierr: self.ierr,
            ferr: self.ferr,
            error_probs: LibraryOptions::error_ramp(self.ierr, self.ferr, read_len),
        })
    }
}

// ============================================================================
// PCR model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PcrConfig {
    /// Number of PCR cycles; 0 disables duplicates and PCR errors.
    #[serde(default)]
    pub cycles: u32,
    /// Mean of the per-cycle duplication probability.
    #[serde(default = "default_pcr_mu")]
    pub mu: f64,
    /// Standard deviation of the per-cycle duplication probability.
    #[serde(default = "default_pcr_sigma")]
    pub sigma: f64,
    #[serde(default = "default_templates_to_reads")]
    pub templates_to_reads: f64,
    /// Base of the logarithmic clone size classes.
    #[serde(default = "default_log_base")]
    pub log_base: f64,
    /// Polymerase error rate per base per duplication.
    #[serde(default = "default_pol_error")]
    pub pol_error: f64,
    /// Monte-Carlo trials for the amplified clone size distribution.
    #[serde(default = "default_clone_simulations")]
    pub clone_simulations: usize,
    /// Monte-Carlo trials per clone class for the mutated node distribution.
    #[serde(default = "default_mut_node_iterations")]
    pub mut_node_iterations: usize,
    #[serde(default = "default_max_seq_clone_size")]
    pub max_seq_clone_size: usize,
    /// Sequenced clone sizes whose total mass falls below this end the table.
    #[serde(default = "default_truncation_epsilon")]
    pub truncation_epsilon: f64,
}

fn default_pcr_mu() -> f64 { 0.45 }
fn default_pcr_sigma() -> f64 { 0.2 }
fn default_templates_to_reads() -> f64 { 4.0 }
fn default_log_base() -> f64 { 2f64.powf(0.1) }
fn default_pol_error() -> f64 { 4.4e-7 }
fn default_clone_simulations() -> usize { 100_000 }
fn default_mut_node_iterations() -> usize { 100 }
fn default_max_seq_clone_size() -> usize { 1000 }
fn default_truncation_epsilon() -> f64 { 1e-6 }

impl Default for PcrConfig {
    fn default() -> Self {
        PcrConfig {
            cycles: 0,
            mu: default_pcr_mu(),
            sigma: default_pcr_sigma(),
            templates_to_reads: default_templates_to_reads(),
            log_base: default_log_base(),
            pol_error: default_pol_error(),
            clone_simulations: default_clone_simulations(),
            mut_node_iterations: default_mut_node_iterations(),
            max_seq_clone_size: default_max_seq_clone_size(),
            truncation_epsilon: default_truncation_epsilon(),
        }
    }
}

impl PcrConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &str, msg: String| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidParameter(name.to_string(), msg))
        };

        if !(self.sigma >= 0.0 && self.sigma.is_finite()) {
            return invalid("sigma", format!("{} must be finite and non-negative", self.sigma));
        }
        if !self.mu.is_finite() {
            return invalid("mu", format!("{} must be finite", self.mu));
        }
        if self.cycles > 0 && self.sigma == 0.0 && !(self.mu > 0.0 && self.mu <= 1.0) {
            return invalid("mu", format!("{} with sigma 0 is not a probability in (0, 1]", self.mu));
        }
        if !(self.templates_to_reads > 0.0) {
            return invalid(
                "templates_to_reads",
                format!("{} must be positive", self.templates_to_reads),
            );
        }
        if !(self.log_base > 1.0) {
            return invalid("log_base", format!("{} must be larger than 1", self.log_base));
        }
        if !(0.0..1.0).contains(&self.pol_error) {
            return invalid("pol_error", format!("{} is not a probability", self.pol_error));
        }
        if self.clone_simulations == 0 {
            return invalid("clone_simulations", "must be positive".to_string());
        }
        if self.mut_node_iterations == 0 {
            return invalid("mut_node_iterations", "must be positive".to_string());
        }
        if self.max_seq_clone_size < 2 {
            return invalid("max_seq_clone_size", "must be at least 2".to_string());
        }
        if !(self.truncation_epsilon > 0.0 && self.truncation_epsilon < 1.0) {
            return invalid(
                "truncation_epsilon",
                format!("{} must be in (0, 1)", self.truncation_epsilon),
            );
        }
        Ok(())
    }
}

impl Display for PcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PCR model options:")?;
        write!(f, "    PCR cycles : {}", self.cycles)?;
        if self.cycles > 0 {
            writeln!(f)?;
            writeln!(f, "    PCR model mu : {}", self.mu)?;
            writeln!(f, "    PCR model sigma : {}", self.sigma)?;
            write!(f, "    Template to reads ratio : {:.3}", self.templates_to_reads)?;
        }
        Ok(())
    }
}

// ============================================================================
// Mutation model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationConfig {
    /// Row = reference base, column = alternative base, both in ACGT order.
    #[serde(default = "default_substitution_matrix")]
    pub substitution_matrix: [[f64; 4]; 4],
    #[serde(default = "default_indel_prob")]
    pub indel_prob: f64,
    #[serde(default = "default_ins_del_ratio")]
    pub ins_del_ratio: f64,
    /// Mean of the Poisson indel size distribution.
    #[serde(default = "default_indel_lambda")]
    pub indel_lambda: f64,
}

fn default_substitution_matrix() -> [[f64; 4]; 4] {
    let t = 1.0 / 3.0;
    [
        [0.0, t, t, t],
        [t, 0.0, t, t],
        [t, t, 0.0, t],
        [t, t, t, 0.0],
    ]
}
fn default_indel_prob() -> f64 { 0.01 }
fn default_ins_del_ratio() -> f64 { 1.0 }
fn default_indel_lambda() -> f64 { 1.0 }

impl Default for MutationConfig {
    fn default() -> Self {
        MutationConfig {
            substitution_matrix: default_substitution_matrix(),
            indel_prob: default_indel_prob(),
            ins_del_ratio: default_ins_del_ratio(),
            indel_lambda: default_indel_lambda(),
        }
    }
}

// ============================================================================
// Unified configuration file
// ============================================================================

///
/// Configuration file for a full simulation run. YAML by default, TOML when
/// the file ends in `.toml`.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RadsimConfig {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub pcr: PcrConfig,
    #[serde(default)]
    pub mutation: MutationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl RadsimConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let is_toml = path.extension().is_some_and(|e| e == "toml");
        let config: Self = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {:?}", path))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {:?}", path))?
        };
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_default_library_options() {
        let opts = LibraryConfig::default().build().unwrap();
        assert_eq!(opts.protocol, LibraryProtocol::SingleDigest);
        assert_eq!(opts.renz_1.name, "SbfI");
        assert_eq!(opts.ins_min, 276);
        assert_eq!(opts.ins_max, 424);
        assert_eq!(opts.error_probs.len(), 150);
        assert!((opts.error_probs[0] - 0.001).abs() < 1e-12);
        assert!((opts.error_probs[149] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_ddrad_library_options() {
        let config = LibraryConfig {
            protocol: ProtocolConfig::Ddrad {
                renz_2: "mspi".to_string(),
                insert_min: Some(200),
                insert_max: None,
            },
            ..LibraryConfig::default()
        };
        let opts = config.build().unwrap();
        match &opts.protocol {
            LibraryProtocol::DoubleDigest {
                renz_2,
                ins_min,
                ins_max,
            } => {
                assert_eq!(renz_2.name, "MspI");
                assert_eq!(*ins_min, 200);
                assert_eq!(*ins_max, 424);
            }
            _ => panic!("expected a double digest"),
        }
        assert_eq!(opts.protocol.chrom_end_margin(opts.base_len), 424);
    }

    #[rstest]
    #[case(LibraryConfig { insert_mu: 1000, ..LibraryConfig::default() })]
    #[case(LibraryConfig { insert_mu: 150, ..LibraryConfig::default() })]
    #[case(LibraryConfig { renz_1: "NotAnEnzyme".to_string(), ..LibraryConfig::default() })]
    #[case(LibraryConfig { barcode_len: 150, ..LibraryConfig::default() })]
    #[case(LibraryConfig { ferr: 1.5, ..LibraryConfig::default() })]
    #[case(LibraryConfig {
        protocol: ProtocolConfig::Ddrad { renz_2: "MspI".to_string(), insert_min: Some(100), insert_max: None },
        ..LibraryConfig::default()
    })]
    #[case(LibraryConfig {
        protocol: ProtocolConfig::Ddrad { renz_2: "MspI".to_string(), insert_min: None, insert_max: Some(1000) },
        ..LibraryConfig::default()
    })]
    #[case(LibraryConfig {
        protocol: ProtocolConfig::Ddrad { renz_2: "MspI".to_string(), insert_min: Some(400), insert_max: Some(300) },
        ..LibraryConfig::default()
    })]
    fn test_invalid_library_config(#[case] config: LibraryConfig) {
        assert!(config.build().is_err());
    }

    #[test]
    fn test_pcr_config_validation() {
        assert!(PcrConfig::default().validate().is_ok());
        let bad = PcrConfig {
            log_base: 1.0,
            ..PcrConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = PcrConfig {
            templates_to_reads: 0.0,
            ..PcrConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
library:
  protocol:
    type: ddrad
    renz_2: MspI
  renz_1: PstI
  coverage: 10
pcr:
  cycles: 9
seed: 42
"#;
        let config: RadsimConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.library.renz_1, "PstI");
        assert_eq!(config.library.coverage, 10);
        assert_eq!(config.library.read_len, 150);
        assert_eq!(
            config.library.protocol,
            ProtocolConfig::Ddrad {
                renz_2: "MspI".to_string(),
                insert_min: None,
                insert_max: None
            }
        );
        assert_eq!(config.pcr.cycles, 9);
        assert_eq!(config.pcr.mu, 0.45);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.threads, None);
    }

    #[test]
    fn test_config_files() {
        let dir = tempfile::tempdir().unwrap();

        let config = RadsimConfig {
            seed: Some(3),
            ..RadsimConfig::default()
        };
        let yaml_path = dir.path().join("config.yaml");
        fs::write(&yaml_path, config.to_yaml().unwrap()).unwrap();
        assert_eq!(RadsimConfig::from_file(&yaml_path).unwrap(), config);

        let toml_path = dir.path().join("config.toml");
        fs::write(&toml_path, "seed = 5\n[library]\nread_len = 100\n").unwrap();
        let parsed = RadsimConfig::from_file(&toml_path).unwrap();
        assert_eq!(parsed.seed, Some(5));
        assert_eq!(parsed.library.read_len, 100);
        assert_eq!(parsed.library.protocol, ProtocolConfig::Sdrad);
    }
}
