//! # LocalDB Testkit
//!
//! Test utilities for LocalDB.
//!
//! This crate provides:
//! - Test stores over memory, a fault-injecting wrapper or a temp directory
//! - Property-based test generators using proptest
//! - A rollback harness that fails every mutation of a commit in turn
//! - Cross-crate integration scenarios
//!
//! ## Usage
//!
//! ```rust,ignore
//! use localdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|store| {
//!         let root = store.root_group();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod rollback;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::rollback::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use rollback::*;
