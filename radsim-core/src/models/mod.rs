pub mod chromosome;
pub mod enzyme;
pub mod mutation;
pub mod protocol;

pub use self::chromosome::{Chromosome, Genome};
pub use self::enzyme::{KNOWN_ENZYMES, RestrictionEnzyme, known_enzyme_names};
pub use self::mutation::MutationModel;
pub use self::protocol::{LibraryOptions, LibraryProtocol};
