//! Top-level error wrapper types.

use crate::{
    ArgumentError, ArgumentErrorKind, BackendError, ConfigError, StorageError, StorageErrorKind,
};

/// Every error family raised by storagebus crates.
///
/// # Examples
///
/// ```
/// use storagebus_error::{BackendError, StorageBusError};
///
/// let err: StorageBusError = BackendError::new("gcs: 503 Service Unavailable").into();
/// assert!(format!("{}", err).contains("Backend Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StorageBusErrorKind {
    /// Invalid argument or separator
    #[from(ArgumentError)]
    Argument(ArgumentError),
    /// Storage-level failure (not found, cross-device, I/O)
    #[from(StorageError)]
    Storage(StorageError),
    /// Failure reported by a backend client
    #[from(BackendError)]
    Backend(BackendError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// storagebus error with kind discrimination.
///
/// # Examples
///
/// ```
/// use storagebus_error::{ArgumentError, StorageBusResult};
///
/// fn validate(name: &str) -> StorageBusResult<()> {
///     if name.is_empty() {
///         Err(ArgumentError::invalid("name must not be empty"))?
///     }
///     Ok(())
/// }
///
/// assert!(validate("").unwrap_err().is_invalid_argument());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("StorageBus Error: {}", _0)]
pub struct StorageBusError(Box<StorageBusErrorKind>);

impl StorageBusError {
    /// Create a new error from a kind.
    pub fn new(kind: StorageBusErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorageBusErrorKind {
        &self.0
    }

    /// Get the storage error kind, if this is a storage error.
    pub fn storage_kind(&self) -> Option<&StorageErrorKind> {
        match self.kind() {
            StorageBusErrorKind::Storage(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// True when the requested key does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.storage_kind(), Some(StorageErrorKind::NotFound(_)))
    }

    /// True when a rename failed because source and destination live on
    /// different devices or containers.
    pub fn is_cross_device(&self) -> bool {
        matches!(self.storage_kind(), Some(StorageErrorKind::CrossDevice(_)))
    }

    /// True for [`ArgumentErrorKind::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self.kind(),
            StorageBusErrorKind::Argument(ArgumentError {
                kind: ArgumentErrorKind::InvalidArgument(_),
                ..
            })
        )
    }

    /// True for [`ArgumentErrorKind::InvalidSeparator`].
    pub fn is_invalid_separator(&self) -> bool {
        matches!(
            self.kind(),
            StorageBusErrorKind::Argument(ArgumentError {
                kind: ArgumentErrorKind::InvalidSeparator(_),
                ..
            })
        )
    }
}

// Generic From implementation for any type that converts to StorageBusErrorKind
impl<T> From<T> for StorageBusError
where
    T: Into<StorageBusErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for storagebus operations.
pub type StorageBusResult<T> = std::result::Result<T, StorageBusError>;
