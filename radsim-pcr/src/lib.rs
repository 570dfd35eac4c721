//! # PCR amplification model
//!
//! Simulates how many sequenced reads each library template produces and
//! how many of those reads carry a polymerase error.
//!
//! Building a [`PcrModel`] runs three Monte-Carlo stages:
//!
//! 1. amplified clone sizes under a per-clone duplication probability
//!    ([`amplification`]), collapsed into logarithmic classes ([`binning`]);
//! 2. error-bearing molecules inside each clone class ([`lineage`]);
//! 3. Poisson sequencing of every clone, fused into one joint table of
//!    `(sequenced clone size, mutated reads)` ([`fusion`], [`table`]).
//!
//! The resulting table is immutable and can be sampled from many threads.

pub mod amplification;
pub mod binning;
pub mod errors;
pub mod fusion;
pub mod lineage;
pub mod model;
pub mod table;

// re-exports
pub use binning::LogBins;
pub use errors::PcrError;
pub use model::PcrModel;
pub use table::CloneErrorTable;
