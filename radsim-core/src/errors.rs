use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenomeError {
    #[error("Genome contains non-canonical characters: {0}. Only 'A', 'C', 'G', 'T' and 'N' are allowed")]
    InvalidCharacters(String),

    #[error("No chromosomes found in genome file: {0}")]
    EmptyGenome(String),

    #[error("Sequence found before any FASTA header in: {0}")]
    MissingHeader(String),

    #[error("Chromosome not found in genome: {0}")]
    UnknownChromosome(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum EnzymeError {
    #[error("'{0}' is not an available enzyme. Enzymes include: {1}")]
    UnknownEnzyme(String, String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Insert size mean ({0}) must be smaller than the base locus length ({1})")]
    InsertLargerThanLocus(u32, u32),

    #[error("Insert size mean ({0}) must be larger than the read length ({1})")]
    InsertSmallerThanRead(u32, u32),

    #[error("Insert size max ({0}) must be smaller than the base locus length ({1})")]
    InsertMaxLargerThanLocus(u32, u32),

    #[error("Minimum insert size ({0}) must be larger than the read length ({1})")]
    InsertMinSmallerThanRead(u32, u32),

    #[error("Minimum insert size ({0}) must be smaller than the maximum insert size ({1})")]
    InvertedInsertWindow(u32, u32),

    #[error("Barcode length ({0}) must be smaller than the read length ({1})")]
    BarcodeTooLong(u32, u32),

    #[error("Invalid parameter {0}: {1}")]
    InvalidParameter(String, String),

    #[error(transparent)]
    Enzyme(#[from] EnzymeError),
}
