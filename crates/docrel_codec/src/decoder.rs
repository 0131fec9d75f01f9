//! Canonical CBOR decoder for documents.

use crate::encoder::OBJECT_ID_TAG;
use crate::error::{CodecError, CodecResult};
use crate::object_id::ObjectId;
use crate::value::Value;

/// Decode a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid canonical CBOR, contain
/// forbidden constructs (floats, indefinite-length items), or carry a
/// malformed object identifier.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = CanonicalDecoder::new(bytes);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CodecError::invalid_structure(format!(
            "{} trailing bytes after value",
            decoder.remaining().len()
        )));
    }
    Ok(value)
}

/// A canonical CBOR decoder.
///
/// Validates that input follows canonical CBOR rules and rejects
/// forbidden constructs.
pub struct CanonicalDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

/// Maximum element count accepted for arrays and maps.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Maximum byte/text string length accepted.
const MAX_BYTES_LENGTH: u64 = 256 * 1024 * 1024;

impl<'a> CanonicalDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decode the next value.
    #[allow(clippy::cast_possible_wrap)]
    pub fn decode(&mut self) -> CodecResult<Value> {
        let initial_byte = self.read_byte()?;
        let major_type = initial_byte >> 5;
        let additional_info = initial_byte & 0x1f;

        match major_type {
            0 => {
                let n = self.decode_unsigned(additional_info)?;
                i64::try_from(n)
                    .map(Value::Integer)
                    .map_err(|_| CodecError::decoding_failed("unsigned integer exceeds i64"))
            }
            1 => {
                let n = self.decode_unsigned(additional_info)?;
                i64::try_from(n)
                    .map(|n| Value::Integer(-n - 1))
                    .map_err(|_| CodecError::decoding_failed("negative integer exceeds i64"))
            }
            2 => self.decode_bytes(additional_info).map(Value::Bytes),
            3 => self.decode_text(additional_info),
            4 => self.decode_array(additional_info),
            5 => self.decode_map(additional_info),
            6 => self.decode_tagged(additional_info),
            7 => self.decode_simple(additional_info),
            _ => Err(CodecError::invalid_structure("invalid major type")),
        }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        let bytes = self.data.get(self.pos..end).ok_or(CodecError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    fn decode_unsigned(&mut self, additional_info: u8) -> CodecResult<u64> {
        let non_canonical =
            || CodecError::invalid_structure("non-canonical: value could be encoded in fewer bytes");

        match additional_info {
            0..=23 => Ok(u64::from(additional_info)),
            24 => {
                let byte = self.read_byte()?;
                if byte < 24 {
                    return Err(non_canonical());
                }
                Ok(u64::from(byte))
            }
            25 => {
                let bytes = self.read_bytes(2)?;
                let value = u16::from_be_bytes([bytes[0], bytes[1]]);
                if u8::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            26 => {
                let bytes = self.read_bytes(4)?;
                let value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                if u16::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            27 => {
                let bytes = self.read_bytes(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                let value = u64::from_be_bytes(raw);
                if u32::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(value)
            }
            31 => Err(CodecError::IndefiniteLengthForbidden),
            _ => Err(CodecError::invalid_structure("reserved additional info")),
        }
    }

    fn decode_length(&mut self, additional_info: u8, max_allowed: u64) -> CodecResult<usize> {
        let claimed = self.decode_unsigned(additional_info)?;
        if claimed > max_allowed {
            return Err(CodecError::SizeLimitExceeded {
                claimed,
                max_allowed,
            });
        }
        usize::try_from(claimed).map_err(|_| CodecError::SizeLimitExceeded {
            claimed,
            max_allowed,
        })
    }

    fn decode_bytes(&mut self, additional_info: u8) -> CodecResult<Vec<u8>> {
        let len = self.decode_length(additional_info, MAX_BYTES_LENGTH)?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    fn decode_text(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_length(additional_info, MAX_BYTES_LENGTH)?;
        let bytes = self.read_bytes(len)?;
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(Value::Text(text.to_string()))
    }

    fn decode_array(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_length(additional_info, MAX_CONTAINER_ELEMENTS)?;
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_length(additional_info, MAX_CONTAINER_ELEMENTS)?;
        let mut pairs = Vec::with_capacity(len.min(1024));
        let data = self.data;
        let mut prev_key: Option<&'a [u8]> = None;

        for _ in 0..len {
            let key_start = self.pos;
            let key = self.decode()?;
            let key_bytes = &data[key_start..self.pos];

            // Keys must be strictly increasing in canonical order.
            if let Some(prev) = prev_key {
                if compare_cbor_bytes(prev, key_bytes) != std::cmp::Ordering::Less {
                    return Err(CodecError::invalid_structure(
                        "non-canonical: map keys not in sorted order",
                    ));
                }
            }
            prev_key = Some(key_bytes);

            let value = self.decode()?;
            pairs.push((key, value));
        }

        Ok(Value::Map(pairs))
    }

    fn decode_tagged(&mut self, additional_info: u8) -> CodecResult<Value> {
        let tag = self.decode_unsigned(additional_info)?;
        if tag != OBJECT_ID_TAG {
            return Err(CodecError::unsupported_type(format!("tag {tag}")));
        }

        let initial_byte = self.read_byte()?;
        if initial_byte >> 5 != 2 {
            return Err(CodecError::invalid_structure(
                "object id tag must wrap a byte string",
            ));
        }
        let payload = self.decode_bytes(initial_byte & 0x1f)?;
        ObjectId::from_slice(&payload)
            .map(Value::ObjectId)
            .ok_or_else(|| {
                CodecError::invalid_structure(format!(
                    "object id payload must be 12 bytes, got {}",
                    payload.len()
                ))
            })
    }

    fn decode_simple(&mut self, additional_info: u8) -> CodecResult<Value> {
        match additional_info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 | 23 => Ok(Value::Null),
            24 => {
                let simple = self.read_byte()?;
                if simple < 32 {
                    Err(CodecError::invalid_structure(
                        "non-canonical: simple value should use direct encoding",
                    ))
                } else {
                    Err(CodecError::unsupported_type(format!("simple value {simple}")))
                }
            }
            25..=27 => Err(CodecError::FloatForbidden),
            31 => Err(CodecError::invalid_structure("break without indefinite")),
            _ => Err(CodecError::unsupported_type(format!(
                "simple value {additional_info}"
            ))),
        }
    }
}

/// Length-first, then bytewise comparison of encoded keys.
fn compare_cbor_bytes(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Equal => a.cmp(b),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::to_canonical_cbor;

    #[test]
    fn decode_scalars() {
        assert_eq!(from_cbor(&[0xf6]).unwrap(), Value::Null);
        assert_eq!(from_cbor(&[0xf5]).unwrap(), Value::Bool(true));
        assert_eq!(from_cbor(&[0x38, 99]).unwrap(), Value::Integer(-100));
        assert_eq!(
            from_cbor(&[0x61, b'a']).unwrap(),
            Value::Text("a".to_string())
        );
    }

    #[test]
    fn decode_object_id() {
        let mut bytes = vec![0xd8, 39, 0x4c];
        bytes.extend_from_slice(&[9; 12]);
        assert_eq!(
            from_cbor(&bytes).unwrap(),
            Value::ObjectId(ObjectId::from_bytes([9; 12]))
        );
    }

    #[test]
    fn reject_short_object_id_payload() {
        let bytes = vec![0xd8, 39, 0x42, 1, 2];
        assert!(matches!(
            from_cbor(&bytes),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn reject_unknown_tag() {
        // Tag 1 (epoch time) around an integer.
        assert!(matches!(
            from_cbor(&[0xc1, 0x01]),
            Err(CodecError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn document_survives_storage_encoding() {
        let doc = Value::document([
            ("_id", Value::ObjectId(ObjectId::new())),
            ("tags", Value::from(vec!["a", "b"])),
            ("owner", Value::document([("id", Value::ObjectId(ObjectId::new()))])),
            ("deleted", Value::Null),
        ]);
        let bytes = to_canonical_cbor(&doc).unwrap();
        assert_eq!(from_cbor(&bytes).unwrap(), doc);
    }

    #[test]
    fn reject_float() {
        assert!(matches!(
            from_cbor(&[0xfb, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(CodecError::FloatForbidden)
        ));
    }

    #[test]
    fn reject_indefinite_length() {
        assert!(matches!(
            from_cbor(&[0x9f, 0x01, 0xff]),
            Err(CodecError::IndefiniteLengthForbidden)
        ));
    }

    #[test]
    fn reject_non_shortest_encoding() {
        assert!(matches!(
            from_cbor(&[0x18, 23]),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn reject_unsorted_map_keys() {
        assert!(matches!(
            from_cbor(&[0xa2, 0x61, b'b', 0x01, 0x61, b'a', 0x02]),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn reject_trailing_bytes() {
        assert!(matches!(
            from_cbor(&[0x01, 0x02]),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn unexpected_eof() {
        assert!(matches!(from_cbor(&[]), Err(CodecError::UnexpectedEof)));
        assert!(matches!(
            from_cbor(&[0x19, 0x01]),
            Err(CodecError::UnexpectedEof)
        ));
    }
}
