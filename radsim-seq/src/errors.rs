use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqError {
    #[error("Malformed allele header: {0}")]
    MalformedAlleleHeader(String),

    #[error("Malformed read header: {0}")]
    MalformedReadHeader(String),

    #[error("Allele {0} has no sequence")]
    MissingSequence(String),

    #[error("No allele of sample {0} can produce a sequencing template")]
    NoTemplate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
