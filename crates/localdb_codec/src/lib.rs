//! # LocalDB Codec
//!
//! Object encodings for LocalDB.
//!
//! Every object file is written in one of two formats:
//! - **Binary**: compact CBOR, the default
//! - **Text**: a fixed magic header followed by pretty-printed JSON,
//!   meant for files that humans diff and merge
//!
//! The writer picks the format. The reader never needs to be told: it
//! sniffs the first [`SNIFF_LEN`] bytes and dispatches to the matching
//! decoder.
//!
//! ## Usage
//!
//! ```
//! use localdb_codec::{decode, encode, Format};
//!
//! let bytes = encode(&vec![1u32, 2, 3], Format::Text).unwrap();
//! assert_eq!(Format::sniff(&bytes), Format::Text);
//!
//! let decoded: Vec<u32> = decode(&bytes).unwrap();
//! assert_eq!(decoded, vec![1, 2, 3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod binary;
mod error;
mod format;
mod text;

pub use binary::{from_binary, to_binary};
pub use error::{CodecError, CodecResult};
pub use format::{Format, SNIFF_LEN, TEXT_MAGIC};
pub use text::{from_text, to_text};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value in the given format.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn encode<T: Serialize + ?Sized>(value: &T, format: Format) -> CodecResult<Vec<u8>> {
    match format {
        Format::Binary => to_binary(value),
        Format::Text => to_text(value),
    }
}

/// Decode a value, detecting its format from the header.
///
/// # Errors
///
/// Returns an error if the bytes do not decode as `T` in the sniffed format.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    match Format::sniff(bytes) {
        Format::Binary => from_binary(bytes),
        Format::Text => from_text(bytes),
    }
}
