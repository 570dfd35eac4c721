//! # RAD loci and alleles
//!
//! Digests a reference genome into RAD loci, projects population variants
//! onto them and reconstructs the per-sample alleles that make it into the
//! library.
//!
//! The stages run in order:
//!
//! 1. [`discovery::LocusDiscovery`] scans every chromosome for cut sites and
//!    produces a [`discovery::LocusCatalog`].
//! 2. [`projector::VariantProjector`] streams a VCF and maps each variant to
//!    locus-local columns through a [`index::PositionIndex`].
//! 3. [`alleles::AlleleReconstructor`] applies each haplotype's variants and
//!    drops alleles that lost their cutsite.

pub mod alleles;
pub mod consts;
pub mod discovery;
pub mod index;
pub mod models;
pub mod projector;

// re-exports
pub use alleles::{AlleleOutcome, AlleleReconstructor, AlleleSummary, DropReason, extract_alleles};
pub use discovery::{LocusCatalog, LocusDiscovery};
pub use index::PositionIndex;
pub use models::{Direction, LocusStatus, RadVariant, ReferenceRadLocus, VariantKind};
pub use projector::{ProjectedVariants, VariantProjector};
