//! Error types for tensor construction.

/// Errors raised while building a `Tensor`.
///
/// Construction is the only fallible phase: lowering an already-built tensor
/// cannot fail.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A builder's callable expects a different number of index variables
    /// than the number of dimensions supplied, or a reduction source has a
    /// rank that does not match the combined output and reduction rank.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
