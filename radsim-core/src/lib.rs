//! # Core models for simulating RAD-seq libraries
//!
//! This crate holds the pieces every other radsim crate builds on:
//!
//! - [`models::Genome`] and [`models::Chromosome`]: the in-memory reference
//! - [`models::RestrictionEnzyme`]: recognition site, cutsite and remainder
//! - [`config::LibraryConfig`] / [`models::LibraryOptions`]: the validated protocol
//! - [`models::MutationModel`]: random substitutions and indels
//! - [`utils`]: gzip-aware readers/writers and reverse complement
//!
//! ## Example
//!
//! ```rust
//! use radsim_core::config::LibraryConfig;
//! use radsim_core::utils::rev_comp;
//!
//! let opts = LibraryConfig::default().build().unwrap();
//! assert_eq!(opts.renz_1.name, "SbfI");
//! assert_eq!(rev_comp("AACG"), "CGTT");
//! ```

pub mod config;
pub mod consts;
pub mod errors;
pub mod merge;
pub mod models;
pub mod popmap;
pub mod utils;
pub mod vcf;

// re-exports
pub use config::{LibraryConfig, MutationConfig, PcrConfig, ProtocolConfig, RadsimConfig};
pub use errors::{ConfigError, EnzymeError, GenomeError};
pub use popmap::PopMap;
pub use models::{
    Chromosome, Genome, LibraryOptions, LibraryProtocol, MutationModel, RestrictionEnzyme,
};
