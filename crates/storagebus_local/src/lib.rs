//! Local filesystem driver for storagebus.
//!
//! Keys map to paths below a root directory; `/` in a key becomes a
//! directory level. Parent directories are created on demand.
//!
//! # Example
//!
//! ```rust
//! use storagebus_local::LocalDriver;
//! use storagebus_storage::Storage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Storage::new(LocalDriver::new("/tmp/storagebus")?);
//! storage.write("invoices/2024/march.pdf", vec![0u8; 16]).await?;
//! assert!(storage.exists("invoices/2024/march.pdf").await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;

pub use driver::LocalDriver;
