//! S3-compatible and Google Cloud Storage drivers for storagebus.
//!
//! Both backends go through one [`ObjectStoreDriver`] wrapping an
//! `object_store` client. Small objects are uploaded with a single request,
//! large ones as a multipart upload of the file's stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use storagebus_cloud::{ObjectStoreDriver, S3Options};
//! use storagebus_storage::Storage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = S3Options::new("media")
//!     .with_endpoint("http://localhost:9000")
//!     .with_credentials("minio", "minio123")
//!     .with_allow_http(true);
//! let storage = Storage::new(ObjectStoreDriver::s3(&options)?);
//!
//! storage.write("thumbnails/cat.png", vec![0u8; 64]).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod options;

pub use driver::{MULTIPART_THRESHOLD, ObjectStoreDriver};
pub use options::{GcsOptions, S3Options};
