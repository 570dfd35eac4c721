use radsim_core::errors::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PcrError {
    #[error("Could not draw a duplication probability in (0, 1] from Normal({0}, {1})")]
    EfficiencyOutOfRange(f64, f64),

    #[error("Invalid distribution parameter: {0}")]
    InvalidDistribution(String),

    #[error("Clone distribution is empty")]
    EmptyDistribution,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
