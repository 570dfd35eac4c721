//! # RAD-seq read simulation
//!
//! Turns each sample's kept alleles into paired-end reads:
//!
//! - [`template::TemplateSampler`] picks a fragment (sheared or digested)
//! - a [`radsim_pcr::PcrModel`] decides how many reads the fragment's clone
//!   yields and how many carry a polymerase error
//! - [`noise`] adds position-dependent sequencing errors
//!
//! [`dropout`] reads the simulated libraries back and reports alleles with
//! too few independent templates.

pub mod alleles;
pub mod dropout;
pub mod errors;
pub mod noise;
pub mod sequencer;
pub mod template;

// re-exports
pub use alleles::{SampleAllele, load_sample_alleles};
pub use dropout::{DEFAULT_MIN_COV, ReadDropout, write_read_dropout_log};
pub use errors::SeqError;
pub use sequencer::{LibrarySummary, ReadPair, SampleSummary, SequencingSimulator, target_reads};
pub use template::{Template, TemplateSampler};
