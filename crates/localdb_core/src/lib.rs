//! # LocalDB Core
//!
//! Transactional object store persisted as plain files.
//!
//! This crate provides:
//! - Groups (directories) and Instances (a payload, a meta file and named blobs)
//! - Reversible actions batched in self-compacting transactions
//! - Best-effort rollback of a failed commit, one rename at a time
//! - One-level group and instance links
//! - Binary/text format detection on read
//!
//! ## Example
//!
//! ```rust
//! use localdb_core::{Database, Guid, Persistent};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Note {
//!     text: String,
//! }
//!
//! impl Persistent for Note {
//!     const TYPE_NAME: &'static str = "demo.Note";
//! }
//!
//! let db = Database::open_in_memory().unwrap();
//! let mut note = db.root_group().create_instance("Hello", Guid::new()).unwrap();
//! note.write_object(&Note { text: "hi".into() }).unwrap();
//! note.commit_transaction().unwrap();
//!
//! let read: Note = note.read_object().unwrap();
//! assert_eq!(read.text, "hi");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
mod config;
mod context;
mod database;
mod error;
mod group;
mod guid;
mod instance;
pub mod layout;
mod link;
mod lock;
mod meta;
mod physical;
mod transaction;

pub use action::{Action, ActionKind};
pub use config::Config;
pub use context::Context;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use group::{Child, Group};
pub use guid::Guid;
pub use instance::Instance;
pub use link::FileLink;
pub use localdb_codec::Format;
#[cfg(feature = "named-lock")]
pub use lock::FileLockFactory;
pub use lock::{LockFactory, LockGuard, NoopLockFactory};
pub use meta::InstanceMeta;
pub use physical::{encode_object, read_object, sniff_format, write_object, Persistent};
pub use transaction::Transaction;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
