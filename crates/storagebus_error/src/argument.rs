//! Argument validation error types.

/// Kinds of argument errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ArgumentErrorKind {
    /// Malformed input to a constructor or operation
    #[display("Invalid argument: {}", _0)]
    InvalidArgument(String),
    /// Separator rejected by the key sanitizer
    #[display("{} is not a valid separator", _0)]
    InvalidSeparator(String),
}

/// Argument error with location tracking.
///
/// Raised before any I/O takes place, at the call that received the bad input.
///
/// # Examples
///
/// ```
/// use storagebus_error::{ArgumentError, ArgumentErrorKind};
///
/// let err = ArgumentError::new(ArgumentErrorKind::InvalidSeparator("|".to_string()));
/// assert!(format!("{}", err).contains("not a valid separator"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Argument Error: {} at line {} in {}", kind, line, file)]
pub struct ArgumentError {
    /// The kind of error that occurred
    pub kind: ArgumentErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ArgumentError {
    /// Create a new argument error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ArgumentErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for an [`ArgumentErrorKind::InvalidArgument`] error.
    #[track_caller]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ArgumentErrorKind::InvalidArgument(message.into()))
    }
}
