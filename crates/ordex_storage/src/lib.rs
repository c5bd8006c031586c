//! # Ordex Storage
//!
//! Byte storage for ordex indexes.
//!
//! This crate provides the lowest-level storage abstraction for ordex.
//! Storage here is **opaque bytes** - nothing in this crate interprets the
//! finite-state encoding it holds.
//!
//! ## Design Principles
//!
//! - Readers see one contiguous, immutable byte region ([`IndexBytes`])
//! - Writers are append-only sinks that are sealed exactly once ([`IndexSink`])
//! - No knowledge of the index format; `ordex_core` owns its interpretation
//!
//! ## Available Sinks
//!
//! - [`MemorySink`] - Encodes into an in-memory buffer
//! - [`FileSink`] - Streams into a temporary file renamed over the target on seal
//!
//! ## Example
//!
//! ```rust
//! use ordex_storage::{IndexBytes, IndexSink, MemorySink};
//! use std::io::Write;
//!
//! let mut sink = MemorySink::new();
//! sink.write_all(b"hello world").unwrap();
//! let bytes = IndexBytes::from_vec(sink.seal().unwrap());
//! assert_eq!(bytes.as_ref(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bytes;
mod error;
mod file;
mod memory;
mod sink;

pub use bytes::{IndexBytes, OpenMode};
pub use error::{StorageError, StorageResult};
pub use file::{FileSink, FileSinkOptions};
pub use memory::MemorySink;
pub use sink::IndexSink;
