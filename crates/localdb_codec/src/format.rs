//! Encoding discriminant and header sniffing.

use std::fmt;

/// Magic prefix that marks a file as text-encoded.
///
/// Anything that does not start with these bytes is decoded as binary.
pub const TEXT_MAGIC: &[u8; 15] = b"#!localdb-text\n";

/// Number of leading bytes [`Format::sniff`] needs to decide.
pub const SNIFF_LEN: usize = TEXT_MAGIC.len();

/// The on-disk encoding of an object file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Compact CBOR.
    #[default]
    Binary,
    /// Human-readable JSON behind [`TEXT_MAGIC`].
    Text,
}

impl Format {
    /// Picks the format for a file from its first bytes.
    ///
    /// Only the first [`SNIFF_LEN`] bytes are inspected; passing the
    /// whole file is fine.
    #[must_use]
    pub fn sniff(prefix: &[u8]) -> Self {
        if prefix.starts_with(TEXT_MAGIC) {
            Self::Text
        } else {
            Self::Binary
        }
    }

    /// Returns the format selected by a "prefer binary" flag.
    #[must_use]
    pub const fn preferred(prefer_binary: bool) -> Self {
        if prefer_binary {
            Self::Binary
        } else {
            Self::Text
        }
    }

    /// Short lowercase name of the format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
