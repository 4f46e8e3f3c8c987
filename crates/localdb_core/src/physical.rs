//! Typed read/write of one object to one path.
//!
//! Reading sniffs the first [`SNIFF_LEN`] bytes of the file and picks the
//! decoder; writing uses whatever format the caller chose once through
//! the [`Context`](crate::Context).

use crate::error::{CoreError, CoreResult};
use localdb_codec::{Format, SNIFF_LEN};
use localdb_storage::FileSystem;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// An object type that can be stored as an instance payload.
///
/// `TYPE_NAME` is recorded in the instance meta as its primary type and
/// checked when the payload is read back.
///
/// # Example
///
/// ```rust
/// use localdb_core::Persistent;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Texture {
///     width: u32,
///     height: u32,
/// }
///
/// impl Persistent for Texture {
///     const TYPE_NAME: &'static str = "render.Texture";
/// }
/// ```
pub trait Persistent: Serialize + DeserializeOwned {
    /// Stable name of the type, independent of the Rust path.
    const TYPE_NAME: &'static str;
}

/// Serializes `object` into a memory buffer.
///
/// # Errors
///
/// Returns a codec error if the object cannot be encoded.
pub fn encode_object<T: Serialize + ?Sized>(object: &T, format: Format) -> CoreResult<Vec<u8>> {
    Ok(localdb_codec::encode(object, format)?)
}

/// Detects the format of the file at `path` from its header.
///
/// # Errors
///
/// Returns `NotFound` if the file does not exist.
pub fn sniff_format(fs: &dyn FileSystem, path: &Path) -> CoreResult<Format> {
    let prefix = fs
        .read_prefix(path, SNIFF_LEN)
        .map_err(|e| not_found_or(e, path))?;
    Ok(Format::sniff(&prefix))
}

/// Reads and decodes the object stored at `path`.
///
/// # Errors
///
/// Returns `NotFound` if the file is missing, or a codec error if it does
/// not decode as `T`.
pub fn read_object<T: DeserializeOwned>(fs: &dyn FileSystem, path: &Path) -> CoreResult<T> {
    let bytes = fs.read(path).map_err(|e| not_found_or(e, path))?;
    Ok(localdb_codec::decode(&bytes)?)
}

/// Encodes `object` and overwrites the file at `path`.
///
/// The object is fully encoded before the file is opened, so an encoding
/// failure leaves the file untouched.
///
/// # Errors
///
/// Returns a codec or storage error.
pub fn write_object<T: Serialize + ?Sized>(
    fs: &dyn FileSystem,
    path: &Path,
    object: &T,
    format: Format,
) -> CoreResult<()> {
    let buffer = encode_object(object, format)?;
    fs.write(path, &buffer)?;
    Ok(())
}

fn not_found_or(err: localdb_storage::StorageError, path: &Path) -> CoreError {
    if err.is_not_found() {
        CoreError::not_found("file", path)
    } else {
        CoreError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localdb_storage::InMemoryFileSystem;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        value: i32,
    }

    fn fs() -> InMemoryFileSystem {
        let fs = InMemoryFileSystem::new();
        fs.create_dir(Path::new("/db")).unwrap();
        fs
    }

    #[test]
    fn write_then_read_in_both_formats() {
        let fs = fs();
        for format in [Format::Binary, Format::Text] {
            let path = Path::new("/db/sample");
            write_object(&fs, path, &Sample { value: 7 }, format).unwrap();

            assert_eq!(sniff_format(&fs, path).unwrap(), format);
            let read: Sample = read_object(&fs, path).unwrap();
            assert_eq!(read, Sample { value: 7 });
        }
    }

    #[test]
    fn read_missing_is_not_found() {
        let fs = fs();
        let result: CoreResult<Sample> = read_object(&fs, Path::new("/db/none"));
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn read_garbage_is_codec_error() {
        let fs = fs();
        fs.write(Path::new("/db/bad"), b"#!localdb-text\n{ nope").unwrap();

        let result: CoreResult<Sample> = read_object(&fs, Path::new("/db/bad"));
        assert!(matches!(result, Err(CoreError::Codec(_))));
    }
}
