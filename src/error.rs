use thiserror::Error;

/// Failure kinds surfaced by the pipeline and the HTTP boundary.
///
/// The variants map onto transport status codes: `MissingImage` and `Image`
/// become 400 responses, `LedgerNotFound` becomes 404, everything else 500.
#[derive(Debug, Error)]
pub enum Error {
    /// No image payload was supplied to the submit endpoint.
    #[error("no image provided")]
    MissingImage,

    /// Ledger download requested before any detection has ever run.
    #[error("ledger not found")]
    LedgerNotFound,

    /// The ledger could not be created, appended to, or read.
    #[error("ledger unavailable: {0}")]
    Ledger(#[from] std::io::Error),

    /// The image payload could not be decoded.
    #[error("invalid image payload: {0}")]
    Image(#[from] image::ImageError),

    /// An external detector or recognizer backend failed.
    #[error("model failure: {0}")]
    Model(anyhow::Error),
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::Ledger(io),
            other => Error::Ledger(std::io::Error::other(format!("csv: {:?}", other))),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
