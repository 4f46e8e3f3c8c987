//! CBOR encoding via `ciborium`.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value to CBOR bytes.
///
/// # Errors
///
/// Returns an error if the value's `Serialize` impl fails.
pub fn to_binary<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(value, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Decode a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are empty, malformed, or do not match `T`.
pub fn from_binary<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    if bytes.is_empty() {
        return Err(CodecError::UnexpectedEof);
    }
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::decoding_failed("binary", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn empty_input_is_eof() {
        let result: CodecResult<u32> = from_binary(&[]);
        assert_eq!(result, Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn map_roundtrip() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1u32);
        map.insert("b".to_string(), 2u32);

        let bytes = to_binary(&map).unwrap();
        let decoded: BTreeMap<String, u32> = from_binary(&bytes).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn type_mismatch_fails() {
        let bytes = to_binary("text").unwrap();
        let result: CodecResult<u64> = from_binary(&bytes);
        assert!(matches!(result, Err(CodecError::DecodingFailed { format: "binary", .. })));
    }
}
