//! # radsim
//!
//! Simulates RAD-seq libraries: restriction digestion of a reference
//! genome, per-sample alleles from population variants, PCR duplicates and
//! polymerase errors, and paired-end reads with sequencing errors.
//!
//! Each stage lives in its own crate and is re-exported here behind a
//! feature of the same name.

#[cfg(feature = "core")]
#[doc(inline)]
pub use radsim_core as core;

#[cfg(feature = "loci")]
#[doc(inline)]
pub use radsim_loci as loci;

#[cfg(feature = "pcr")]
#[doc(inline)]
pub use radsim_pcr as pcr;

#[cfg(feature = "seq")]
#[doc(inline)]
pub use radsim_seq as seq;
