//! storagebus - one streaming file storage interface over several backends.
//!
//! Callers hold a [`Storage`] and read or write [`File`]s by key; a
//! [`Driver`] moves the bytes. Four drivers ship with the workspace:
//!
//! - [`MemoryDriver`] - process-local map, for tests and caches
//! - [`LocalDriver`] - files below a root directory
//! - [`ObjectStoreDriver`] - S3-compatible and Google Cloud Storage buckets
//!
//! # Quick Start
//!
//! ```rust
//! use storagebus::{MemoryDriver, Storage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Storage::new(MemoryDriver::new());
//!
//! let key = storage.write("Reports/Q1 Summary.txt", "all good").await?;
//! assert_eq!(key, "Reports/Q1-Summary.txt");
//!
//! let mut file = storage.file(&key).await?;
//! assert_eq!(file.content_type(), "text/plain");
//! assert_eq!(file.text().await?, "all good");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! [`StorageConfig::load`] reads the bundled defaults, then
//! `~/.config/storagebus/storagebus.toml`, then `./storagebus.toml`:
//!
//! ```toml
//! [storage]
//! separator = "_"
//!
//! [storage.driver]
//! kind = "local"
//! root = "/var/lib/storagebus"
//! ```
//!
//! # Architecture
//!
//! - `storagebus_error` - error types
//! - `storagebus_file` - the lazy [`File`] handle
//! - `storagebus_storage` - key sanitizer, [`Driver`] contract, [`Storage`] facade
//! - `storagebus_local` - filesystem driver
//! - `storagebus_cloud` - S3 and GCS drivers
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use config::{DriverConfig, StorageConfig, StorageSettings};

pub use storagebus_cloud::{GcsOptions, MULTIPART_THRESHOLD, ObjectStoreDriver, S3Options};
pub use storagebus_error::*;
pub use storagebus_file::*;
pub use storagebus_local::LocalDriver;
pub use storagebus_storage::{
    DEFAULT_SEPARATOR, Destination, Driver, DriverKind, MemoryDriver, Payload, RawKey,
    SanitizeKey, Storage, StorageOptions, StorageOptionsBuilder, sanitize, validate_separator,
};

/// Build the storage described by the loaded configuration.
///
/// # Errors
///
/// Returns a configuration error if a config file cannot be parsed or
/// describes an unusable backend.
pub fn open() -> StorageBusResult<Storage> {
    StorageConfig::load()?.build()
}
