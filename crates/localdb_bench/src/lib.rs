//! Shared helpers for the LocalDB benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
