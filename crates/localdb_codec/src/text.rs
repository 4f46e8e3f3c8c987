//! Text encoding: [`TEXT_MAGIC`] followed by pretty-printed JSON.

use crate::error::{CodecError, CodecResult};
use crate::format::TEXT_MAGIC;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value as text, magic header included.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn to_text<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = TEXT_MAGIC.to_vec();
    serde_json::to_writer_pretty(&mut buffer, value)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Decode a text-encoded value. The magic header must be present.
///
/// # Errors
///
/// Returns `UnexpectedEof` if nothing but whitespace follows the header,
/// and a decoding error if the header is missing or the JSON does not
/// match `T`.
pub fn from_text<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    let body = bytes
        .strip_prefix(TEXT_MAGIC.as_slice())
        .ok_or_else(|| CodecError::decoding_failed("text", "missing text header"))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CodecError::UnexpectedEof);
    }
    serde_json::from_slice(body).map_err(|e| CodecError::decoding_failed("text", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_starts_with_magic() {
        let bytes = to_text(&vec![1, 2, 3]).unwrap();
        assert!(bytes.starts_with(TEXT_MAGIC));
        assert!(bytes.ends_with(b"\n"));
    }

    #[test]
    fn missing_header_fails() {
        let result: CodecResult<Vec<u32>> = from_text(b"[1,2,3]");
        assert!(matches!(result, Err(CodecError::DecodingFailed { format: "text", .. })));
    }

    #[test]
    fn empty_body_is_eof() {
        let mut bytes = TEXT_MAGIC.to_vec();
        let result: CodecResult<u32> = from_text(&bytes);
        assert_eq!(result, Err(CodecError::UnexpectedEof));

        bytes.extend_from_slice(b" \n");
        let result: CodecResult<u32> = from_text(&bytes);
        assert_eq!(result, Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn body_is_readable_json() {
        let bytes = to_text(&("name", 7)).unwrap();
        let body = std::str::from_utf8(&bytes[TEXT_MAGIC.len()..]).unwrap();
        assert!(body.contains("\"name\""));
    }
}
