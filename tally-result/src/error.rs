use std::{fmt, io};
use thiserror::Error;

/// Unified error type for all tally operations.
///
/// None of these errors are recovered from internally. They propagate
/// synchronously to the immediate caller, which decides whether the failing
/// call (or the whole instance, for construction errors) is abandoned.
///
/// `Error` is `Send + Sync`, so it can cross the mutex boundary used by
/// concurrent producers.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error surfaced by an upstream row source.
    ///
    /// tally performs no I/O itself. This variant exists so storage-backed
    /// sources can report failures through the sequence protocol and have
    /// them reach the consumer untouched.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow error while converting between rows and record batches.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Unsupported construction parameters.
    ///
    /// Raised when an aggregate operator is paired with a field kind that
    /// cannot support it (anything other than COUNT over text), or when a
    /// histogram is given empty bounds or zero buckets. The instance is never
    /// created.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A value's type differs from the type the operator was configured with.
    ///
    /// Values are never coerced. The call that produced the mismatch fails and
    /// must not be retried without fixing the input row.
    #[error("type mismatch in {context}: expected {expected}, got {got}")]
    TypeMismatch {
        context: &'static str,
        expected: String,
        got: String,
    },

    /// A histogram observation outside `[min, max]`.
    #[error("value {value} is outside the histogram range [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },

    /// A sequence method was called from a state that does not allow it.
    ///
    /// This is a programmer error, for example calling `next` before `open`.
    #[error("sequence protocol violation: {0}")]
    Protocol(String),

    /// `next` was called after the sequence had produced its last row.
    #[error("result sequence is exhausted")]
    SequenceExhausted,

    /// Malformed input that is not a configuration problem.
    ///
    /// Covers field indices past the end of a row, NULLs in Arrow input and
    /// integer overflow while accumulating.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state, such as a
    /// poisoned lock.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Build an [`Error::Protocol`] from any displayable message.
    #[inline]
    pub fn protocol<M: fmt::Display>(msg: M) -> Self {
        Error::Protocol(msg.to_string())
    }

    /// Build an [`Error::InvalidConfiguration`] from any displayable message.
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_result::Error;
    ///
    /// let err = Error::invalid_configuration("AVG is not supported over text fields");
    /// assert!(matches!(err, Error::InvalidConfiguration(msg) if msg.contains("AVG")));
    /// ```
    #[inline]
    pub fn invalid_configuration<M: fmt::Display>(msg: M) -> Self {
        Error::InvalidConfiguration(msg.to_string())
    }

    /// Build an [`Error::TypeMismatch`] from the expected and observed types.
    #[inline]
    pub fn type_mismatch(
        context: &'static str,
        expected: impl fmt::Display,
        got: impl fmt::Display,
    ) -> Self {
        Error::TypeMismatch {
            context,
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Build the overflow error reported by checked accumulator arithmetic.
    #[inline]
    pub fn overflow(what: &str) -> Self {
        Error::InvalidArgumentError(format!("{what} exceeds i64 range"))
    }
}
