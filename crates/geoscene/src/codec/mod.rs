//! Binary array codec.
//!
//! Arrays are sent as raw little-endian bytes with a dtype tag: `<f4` for
//! float data, `<i4` for int data. Category indices use the index codec,
//! which carries the "no category" sentinel as NaN. Texture images pass
//! through as PNG bytes.

pub mod array;
pub mod index;
pub mod primitives;

pub use array::{ArrayPayload, WireDtype, deserialize, deserialize_ordered, encoded_len, serialize};
pub use index::{deserialize_index, serialize_index};
pub use primitives::{Reader, Writer};

use crate::error::CodecError;
use crate::limits::PNG_SIGNATURE;

/// Wraps PNG bytes in a payload after checking the file signature.
pub fn encode_png(bytes: &[u8]) -> Result<ArrayPayload, CodecError> {
    if !is_png(bytes) {
        return Err(CodecError::InvalidPng);
    }
    Ok(ArrayPayload {
        bytes: bytes.to_vec(),
        dtype: WireDtype::Png,
        shape: Vec::new(),
    })
}

/// Returns true if `bytes` starts with the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}
