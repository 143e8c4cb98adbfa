//! Driver contract and storage facade for storagebus.
//!
//! [`Storage`] is the one entry point callers use: it canonicalizes keys,
//! shapes payloads into [`File`]s and delegates byte transfer to a
//! [`Driver`]. Backends implement [`Driver`]; [`MemoryDriver`] ships here,
//! the filesystem and cloud drivers live in their own crates.
//!
//! # Features
//!
//! - `compliance`: the [`compliance`] module, a behavioral suite every
//!   driver crate runs in its tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "compliance")]
pub mod compliance;
mod driver;
mod memory;
mod sanitize;
mod storage;

pub use driver::{Driver, DriverKind};
pub use memory::MemoryDriver;
pub use sanitize::{DEFAULT_SEPARATOR, RawKey, sanitize, validate_separator};
pub use storage::{
    Destination, Payload, SanitizeKey, Storage, StorageOptions, StorageOptionsBuilder,
};

pub use storagebus_error::{StorageBusError, StorageBusResult, StorageError, StorageErrorKind};
pub use storagebus_file::{
    ByteStream, Content, ContentProducer, DEFAULT_CONTENT_TYPE, File, FileMetadata,
    MetadataProvider, MimeLookup,
};
