//! Numeric array serialization.
//!
//! Float arrays are narrowed to `<f4` and int arrays to `<i4`. The written
//! bytes are read back and compared with the source before the payload is
//! returned, so a payload that leaves this module is known to carry the
//! caller's values.

use std::fmt;

use tracing::trace;

use crate::codec::primitives::{Reader, Writer};
use crate::error::CodecError;
use crate::limits::{FLOAT_ATOL, FLOAT_RTOL, WIRE_ITEM_SIZE};
use crate::model::array::element_count;
use crate::model::{ArrayData, NdArray, Order};

/// Wire type tag of a binary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireDtype {
    /// Little-endian 4-byte float.
    F4,
    /// Little-endian 4-byte signed int.
    I4,
    /// PNG image bytes, passed through unchanged.
    Png,
}

impl WireDtype {
    /// Canonical tag as it appears on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            WireDtype::F4 => "<f4",
            WireDtype::I4 => "<i4",
            WireDtype::Png => "image/png",
        }
    }

    /// Parses a canonical tag.
    pub fn from_tag(tag: &str) -> Result<WireDtype, CodecError> {
        match tag {
            "<f4" => Ok(WireDtype::F4),
            "<i4" => Ok(WireDtype::I4),
            "image/png" => Ok(WireDtype::Png),
            _ => Err(CodecError::UnknownDtype {
                tag: tag.to_string(),
            }),
        }
    }
}

impl fmt::Display for WireDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Encoded form of one binary field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayPayload {
    pub bytes: Vec<u8>,
    pub dtype: WireDtype,
    /// Row-major shape. Empty for image payloads.
    pub shape: Vec<usize>,
}

impl ArrayPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encoded size in bytes of `array`, without encoding it.
pub fn encoded_len(array: &NdArray) -> usize {
    array.numel() * WIRE_ITEM_SIZE
}

/// Serializes an array to little-endian 4-byte elements.
///
/// Fails with [`CodecError::PrecisionLoss`] if any element does not survive
/// the narrowing cast.
pub fn serialize(array: &NdArray) -> Result<ArrayPayload, CodecError> {
    let mut writer = Writer::for_elements(array.numel());
    let dtype = match array.data() {
        ArrayData::Float(values) => {
            for v in values {
                writer.write_f32(*v as f32);
            }
            verify_floats(values, writer.as_bytes())?;
            WireDtype::F4
        }
        ArrayData::Int(values) => {
            for (index, v) in values.iter().enumerate() {
                let narrow = i32::try_from(*v).map_err(|_| CodecError::PrecisionLoss {
                    dtype: WireDtype::I4,
                    index,
                    value: *v as f64,
                })?;
                writer.write_i32(narrow);
            }
            WireDtype::I4
        }
    };
    trace!(dtype = %dtype, shape = ?array.shape(), bytes = writer.len(), "serialized array");
    Ok(ArrayPayload {
        bytes: writer.into_bytes(),
        dtype,
        shape: array.shape().to_vec(),
    })
}

/// Re-widens the encoded floats and compares them with the source.
///
/// Finite values must agree within the closeness tolerances, NaN must stay
/// NaN and infinities must stay the same infinity.
fn verify_floats(values: &[f64], bytes: &[u8]) -> Result<(), CodecError> {
    let mut reader = Reader::new(bytes);
    for (index, &original) in values.iter().enumerate() {
        let widened = f64::from(reader.read_f32("verify")?);
        let ok = if original.is_nan() {
            widened.is_nan()
        } else if original.is_infinite() {
            widened == original
        } else {
            widened.is_finite()
                && (widened - original).abs() <= FLOAT_ATOL + FLOAT_RTOL * original.abs()
        };
        if !ok {
            return Err(CodecError::PrecisionLoss {
                dtype: WireDtype::F4,
                index,
                value: original,
            });
        }
    }
    Ok(())
}

/// Decodes a row-major payload.
pub fn deserialize(bytes: &[u8], shape: &[usize], dtype: WireDtype) -> Result<NdArray, CodecError> {
    let data = decode_flat(bytes, shape, dtype)?;
    NdArray::new(shape.to_vec(), data)
}

/// Decodes a payload stored in the given memory order into row-major storage.
pub fn deserialize_ordered(
    bytes: &[u8],
    shape: &[usize],
    dtype: WireDtype,
    order: Order,
) -> Result<NdArray, CodecError> {
    let data = decode_flat(bytes, shape, dtype)?;
    match order {
        Order::C => NdArray::new(shape.to_vec(), data),
        Order::F => NdArray::from_column_major(shape.to_vec(), data),
    }
}

fn decode_flat(bytes: &[u8], shape: &[usize], dtype: WireDtype) -> Result<ArrayData, CodecError> {
    let sized = element_count(shape)
        .and_then(|count| count.checked_mul(WIRE_ITEM_SIZE).map(|bytes| (count, bytes)));
    let Some((count, expected)) = sized else {
        return Err(CodecError::ShapeMismatch {
            shape: shape.to_vec(),
            len: bytes.len() / WIRE_ITEM_SIZE,
        });
    };
    if bytes.len() != expected {
        return Err(CodecError::LengthMismatch {
            shape: shape.to_vec(),
            expected,
            actual: bytes.len(),
        });
    }

    let mut reader = Reader::new(bytes);
    let data = match dtype {
        WireDtype::F4 => {
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(f64::from(reader.read_f32("f4 element")?));
            }
            ArrayData::Float(out)
        }
        WireDtype::I4 => {
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(i64::from(reader.read_i32("i4 element")?));
            }
            ArrayData::Int(out)
        }
        WireDtype::Png => return Err(CodecError::NotNumeric { dtype }),
    };
    trace!(dtype = %dtype, shape = ?shape, "deserialized array");
    Ok(data)
}
