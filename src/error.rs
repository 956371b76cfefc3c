use thiserror::Error;

/// Crate-wide error type.
///
/// Shape and domain violations are surfaced immediately and never recovered;
/// I/O errors from result persistence carry the underlying cause.
#[derive(Debug, Error)]
pub enum Error {
    /// Inputs with incompatible lengths/shapes.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Operation undefined for the given values (e.g. level-setting a
    /// silent signal).
    #[error("domain error: {0}")]
    Domain(String),

    /// A model prediction did not contain the named output.
    #[error("missing model output `{0}`")]
    MissingOutput(String),

    /// A worker in the distributed pool went away before returning.
    #[error("worker pool failure: {0}")]
    Pool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
