//! Index array codec.
//!
//! Category indices travel as `<f4` so that "no category" can be carried as
//! NaN. Encoding maps [`NO_CATEGORY`] to NaN; decoding maps NaN back to
//! [`NO_CATEGORY`] and truncates everything else to an integer.

use crate::codec::array::{ArrayPayload, WireDtype, deserialize};
use crate::codec::primitives::Writer;
use crate::error::CodecError;
use crate::limits::NO_CATEGORY;
use crate::model::{ArrayData, NdArray};

/// Serializes an integer index array as `<f4` with the sentinel remapped.
///
/// Float input is accepted as already remapped (NaN for missing).
pub fn serialize_index(array: &NdArray) -> Result<ArrayPayload, CodecError> {
    let mut writer = Writer::for_elements(array.numel());
    match array.data() {
        ArrayData::Int(values) => {
            for (index, &v) in values.iter().enumerate() {
                if v == NO_CATEGORY {
                    writer.write_f32(f32::NAN);
                    continue;
                }
                let narrow = v as f32;
                if narrow as i64 != v {
                    return Err(CodecError::PrecisionLoss {
                        dtype: WireDtype::F4,
                        index,
                        value: v as f64,
                    });
                }
                writer.write_f32(narrow);
            }
        }
        ArrayData::Float(values) => {
            for (index, &v) in values.iter().enumerate() {
                let narrow = v as f32;
                if !v.is_nan() && f64::from(narrow) != v {
                    return Err(CodecError::PrecisionLoss {
                        dtype: WireDtype::F4,
                        index,
                        value: v,
                    });
                }
                writer.write_f32(narrow);
            }
        }
    }
    Ok(ArrayPayload {
        bytes: writer.into_bytes(),
        dtype: WireDtype::F4,
        shape: array.shape().to_vec(),
    })
}

/// Decodes an `<f4` index payload back into an integer array.
pub fn deserialize_index(bytes: &[u8], shape: &[usize]) -> Result<NdArray, CodecError> {
    let floats = deserialize(bytes, shape, WireDtype::F4)?;
    let ints = floats
        .to_f64_vec()
        .into_iter()
        .map(|v| if v.is_nan() { NO_CATEGORY } else { v.trunc() as i64 })
        .collect();
    NdArray::new(shape.to_vec(), ArrayData::Int(ints))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_sentinel_becomes_nan() {
        let a = NdArray::from(vec![0i64, -1, 255]);
        let payload = serialize_index(&a).unwrap();
        assert_eq!(payload.dtype, WireDtype::F4);
        let second = f32::from_le_bytes(payload.bytes[4..8].try_into().unwrap());
        assert!(second.is_nan());
        assert_eq!(deserialize_index(&payload.bytes, &payload.shape).unwrap(), a);
    }

    #[test]
    fn test_decode_truncates() {
        let bytes = [2.7f32.to_le_bytes(), (-0.5f32).to_le_bytes()].concat();
        let a = deserialize_index(&bytes, &[2]).unwrap();
        assert_eq!(a.as_ints().unwrap(), &[2, 0]);
    }

    #[test]
    fn test_unrepresentable_index_rejected() {
        let a = NdArray::from(vec![(1i64 << 24) + 1]);
        assert!(matches!(
            serialize_index(&a),
            Err(CodecError::PrecisionLoss { index: 0, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_sentinel_idempotence(values in prop::collection::vec(-1i64..=255, 0..128)) {
            let a = NdArray::from(values);
            let payload = serialize_index(&a).unwrap();
            let decoded = deserialize_index(&payload.bytes, &payload.shape).unwrap();
            prop_assert_eq!(&decoded, &a);
            prop_assert_eq!(serialize_index(&decoded).unwrap().bytes, payload.bytes);
        }
    }
}
