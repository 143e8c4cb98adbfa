//! Error types for storagebus.
//!
//! Every crate in the workspace reports failures through the types defined here.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use storagebus_error::{StorageBusResult, StorageError, StorageErrorKind};
//!
//! fn open(key: &str) -> StorageBusResult<Vec<u8>> {
//!     Err(StorageError::new(StorageErrorKind::NotFound(key.to_string())))?
//! }
//!
//! let err = open("avatars/missing.png").unwrap_err();
//! assert!(err.is_not_found());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod argument;
mod backend;
mod config;
mod error;
mod storage;

pub use argument::{ArgumentError, ArgumentErrorKind};
pub use backend::BackendError;
pub use config::ConfigError;
pub use error::{StorageBusError, StorageBusErrorKind, StorageBusResult};
pub use storage::{StorageError, StorageErrorKind};
