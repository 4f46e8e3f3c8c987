//! # LocalDB Storage
//!
//! Filesystem capability trait and implementations for LocalDB.
//!
//! This crate provides the lowest-level abstraction LocalDB is built on.
//! Filesystems here are **plain file stores** - they do not interpret
//! the files they hold.
//!
//! ## Design Principles
//!
//! - A filesystem is injected, never reached through a global
//! - Whole-file reads and writes, plus atomic same-volume rename
//! - No knowledge of instance, meta or link layouts
//! - Must be `Send + Sync` so one context can be shared
//!
//! ## Available Filesystems
//!
//! - [`OsFileSystem`] - The host filesystem through `std::fs`
//! - [`InMemoryFileSystem`] - For testing and snapshot comparison
//! - [`FaultInjectingFileSystem`] - Wrapper that fails chosen mutations
//!
//! ## Example
//!
//! ```rust
//! use localdb_storage::{FileSystem, InMemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = InMemoryFileSystem::new();
//! fs.write(Path::new("/object~new"), b"hello world").unwrap();
//! fs.rename(Path::new("/object~new"), Path::new("/object")).unwrap();
//! assert_eq!(fs.read(Path::new("/object")).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod faulty;
mod file;
mod memory;

pub use backend::{DirEntry, FileSystem, Metadata};
pub use error::{StorageError, StorageResult};
pub use faulty::{FaultInjectingFileSystem, FsOp, RecordedOp};
pub use file::OsFileSystem;
pub use memory::InMemoryFileSystem;
