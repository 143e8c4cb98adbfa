//! Lazy file handles for storagebus.
//!
//! A [`File`] is a self-describing handle to byte content that is decoupled from
//! wherever the bytes actually live. Content is either resident (a string or a
//! byte buffer) or produced on demand by a [`ContentProducer`], and every call to
//! [`File::stream`] yields a fresh, independently consumable stream.
//!
//! # Example
//!
//! ```rust
//! use storagebus_file::{Content, File};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut file = File::new("notes/hello.txt", Content::from("hello"))?;
//! assert_eq!(file.size(), Some(5));
//! assert_eq!(file.content_type(), "text/plain");
//! assert_eq!(file.text().await?, "hello");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod content;
mod file;
mod metadata;
mod mime;

pub use content::{ByteStream, Content, ContentProducer};
pub use file::{File, FileBuilder};
pub use metadata::{FileMetadata, MetadataProvider};
pub use mime::{DEFAULT_CONTENT_TYPE, MimeLookup};
