use thiserror::Error;

/// Errors returned by the matrix types in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid size or parameter passed to a setup call.
    #[error("setup failed for {name}: {message}")]
    Setup {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// The file is not a matrix file this crate can read.
    #[error("bad matrix file format: {0}")]
    Format(String),

    /// Counts declared in a file header disagree with each other or with the file length.
    #[error("size mismatch in {what}: expected {expected}, found {found}")]
    SizeMismatch {
        /// Which quantity disagreed.
        what: &'static str,
        /// Value implied by the rest of the header.
        expected: u64,
        /// Value actually found.
        found: u64,
    },

    /// Degenerate (`i == j`) or out-of-range address.
    #[error("invalid index ({row}, {col}) for size {size}")]
    Index {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Number of addressable points.
        size: usize,
    },

    /// Translation requested for a frame the sieve did not select.
    #[error("frame {frame} was not selected by the sieve (sieve = {sieve})")]
    SieveContract {
        /// Original frame index.
        frame: usize,
        /// Sieve value in effect.
        sieve: usize,
    },

    /// Sequential fill ran past the last stored element.
    #[error("store is full: all {capacity} elements already written")]
    StoreFull {
        /// Number of stored elements.
        capacity: usize,
    },

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn setup(name: &'static str, message: impl Into<String>) -> Self {
        Self::Setup {
            name,
            message: message.into(),
        }
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
