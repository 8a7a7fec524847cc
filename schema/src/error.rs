use thiserror::Error;

/// Failures raised while a record is written to or read from a buffer.
///
/// An encode that fails leaves whatever it already wrote in the caller's
/// buffer; those bytes are not meaningful and must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("buffer too small: {needed} more bytes needed, {available} available")]
    BufferTooSmall {
        needed:    usize,
        available: usize,
    },

    #[error("could not allocate storage for {requested} elements")]
    AllocationFailure {
        requested: usize,
    },

    #[error("length {0} does not fit in a 4-byte prefix")]
    LengthOverflow(usize),

    #[error("text field of {len_with_null} bytes does not end with a NUL terminator")]
    MissingTerminator {
        len_with_null: usize,
    },

    #[error("text field is not valid UTF-8 (first invalid byte at offset {valid_up_to})")]
    InvalidUtf8 {
        valid_up_to: usize,
    },
}
