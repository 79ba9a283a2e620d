//! Field values.
//!
//! [`RawValue`] is what callers hand to [`Scene::set`](crate::Scene::set);
//! field descriptors turn it into a normalized [`Value`], which is what the
//! scene stores.

use serde_json::Value as Json;

use crate::model::{Handle, NdArray, Rgb};

/// A normalized, validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Float(f64),
    Str(String),
    Array(NdArray),
    Color(Rgb),
    /// One or more 3-vectors. Single-vector fields hold exactly one.
    Vectors(Vec<[f64; 3]>),
    Bytes(Vec<u8>),
    StrList(Vec<String>),
    BoolList(Vec<bool>),
    ColorList(Vec<Rgb>),
    Object(Handle),
    Objects(Vec<Handle>),
}

impl Value {
    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Color(_) => "color",
            Value::Vectors(_) => "vectors",
            Value::Bytes(_) => "bytes",
            Value::StrList(_) => "string list",
            Value::BoolList(_) => "bool list",
            Value::ColorList(_) => "color list",
            Value::Object(_) => "object",
            Value::Objects(_) => "object list",
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<Handle> {
        match self {
            Value::Object(h) => Some(*h),
            _ => None,
        }
    }

    /// Handles held by this value: one for `Object`, all for `Objects`.
    pub fn handles(&self) -> &[Handle] {
        match self {
            Value::Object(h) => std::slice::from_ref(h),
            Value::Objects(hs) => hs,
            _ => &[],
        }
    }

    /// Converts back to input form, so a stored value can be re-validated.
    pub fn to_raw(&self) -> RawValue {
        match self {
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Float(f) => RawValue::Float(*f),
            Value::Str(s) => RawValue::Str(s.clone()),
            Value::Array(a) => RawValue::Array(a.clone()),
            Value::Color(c) => RawValue::Color(*c),
            Value::Vectors(vs) => match vs.as_slice() {
                [v] => RawValue::Array(NdArray::from(*v)),
                _ => RawValue::Array(NdArray::from(vs.clone())),
            },
            Value::Bytes(b) => RawValue::Bytes(b.clone()),
            Value::StrList(items) => {
                RawValue::List(items.iter().map(|s| RawValue::Str(s.clone())).collect())
            }
            Value::BoolList(items) => {
                RawValue::List(items.iter().map(|b| RawValue::Bool(*b)).collect())
            }
            Value::ColorList(items) => {
                RawValue::List(items.iter().map(|c| RawValue::Color(*c)).collect())
            }
            Value::Object(h) => RawValue::Object(*h),
            Value::Objects(hs) => RawValue::Objects(hs.clone()),
        }
    }

    /// JSON form of the value. Handles become their arena index.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Bool(b) => Json::Bool(*b),
            Value::Float(f) => Json::from(*f),
            Value::Str(s) => Json::String(s.clone()),
            Value::Array(a) => a.to_json(),
            Value::Color(c) => c.to_json(),
            Value::Vectors(vs) => match vs.as_slice() {
                [v] => vector_json(v),
                _ => Json::Array(vs.iter().map(vector_json).collect()),
            },
            Value::Bytes(b) => Json::from(b.len()),
            Value::StrList(items) => Json::from(items.clone()),
            Value::BoolList(items) => Json::from(items.clone()),
            Value::ColorList(items) => Json::Array(items.iter().map(Rgb::to_json).collect()),
            Value::Object(h) => Json::from(h.index()),
            Value::Objects(hs) => Json::Array(hs.iter().map(|h| Json::from(h.index())).collect()),
        }
    }
}

fn vector_json(v: &[f64; 3]) -> Json {
    Json::from(v.to_vec())
}

/// Unvalidated input for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Clears a nullable field.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(NdArray),
    Color(Rgb),
    Bytes(Vec<u8>),
    List(Vec<RawValue>),
    Object(Handle),
    Objects(Vec<Handle>),
}

impl RawValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) => "int",
            RawValue::Float(_) => "float",
            RawValue::Str(_) => "string",
            RawValue::Array(_) => "array",
            RawValue::Color(_) => "color",
            RawValue::Bytes(_) => "bytes",
            RawValue::List(_) => "list",
            RawValue::Object(_) => "object",
            RawValue::Objects(_) => "object list",
        }
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int(i64::from(v))
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Str(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Str(v)
    }
}

impl From<NdArray> for RawValue {
    fn from(v: NdArray) -> Self {
        RawValue::Array(v)
    }
}

impl From<Vec<f64>> for RawValue {
    fn from(v: Vec<f64>) -> Self {
        RawValue::Array(NdArray::from(v))
    }
}

impl From<Vec<i64>> for RawValue {
    fn from(v: Vec<i64>) -> Self {
        RawValue::Array(NdArray::from(v))
    }
}

impl From<Vec<[f64; 3]>> for RawValue {
    fn from(v: Vec<[f64; 3]>) -> Self {
        RawValue::Array(NdArray::from(v))
    }
}

impl From<Vec<[i64; 3]>> for RawValue {
    fn from(v: Vec<[i64; 3]>) -> Self {
        RawValue::Array(NdArray::from(v))
    }
}

impl From<[f64; 3]> for RawValue {
    fn from(v: [f64; 3]) -> Self {
        RawValue::Array(NdArray::from(v))
    }
}

impl From<[i64; 3]> for RawValue {
    fn from(v: [i64; 3]) -> Self {
        RawValue::Array(NdArray::from(v))
    }
}

impl From<Rgb> for RawValue {
    fn from(v: Rgb) -> Self {
        RawValue::Color(v)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(v: Vec<u8>) -> Self {
        RawValue::Bytes(v)
    }
}

impl From<Vec<bool>> for RawValue {
    fn from(v: Vec<bool>) -> Self {
        RawValue::List(v.into_iter().map(RawValue::Bool).collect())
    }
}

impl From<Vec<&str>> for RawValue {
    fn from(v: Vec<&str>) -> Self {
        RawValue::List(v.into_iter().map(RawValue::from).collect())
    }
}

impl From<Vec<String>> for RawValue {
    fn from(v: Vec<String>) -> Self {
        RawValue::List(v.into_iter().map(RawValue::Str).collect())
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(v: Vec<RawValue>) -> Self {
        RawValue::List(v)
    }
}

impl From<Handle> for RawValue {
    fn from(v: Handle) -> Self {
        RawValue::Object(v)
    }
}

impl From<Vec<Handle>> for RawValue {
    fn from(v: Vec<Handle>) -> Self {
        RawValue::Objects(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_forms() {
        assert_eq!(Value::Vectors(vec![[1.0, 0.0, 0.0]]).to_json(), serde_json::json!([1.0, 0.0, 0.0]));
        assert_eq!(
            Value::Objects(vec![Handle::from_index(3), Handle::from_index(1)]).to_json(),
            serde_json::json!([3, 1])
        );
        assert_eq!(Value::ColorList(vec![Rgb([1, 2, 3])]).to_json(), serde_json::json!([[1, 2, 3]]));
    }

    #[test]
    fn test_raw_conversions() {
        assert_eq!(RawValue::from(None::<f64>), RawValue::Null);
        assert_eq!(RawValue::from(Some(2.5)), RawValue::Float(2.5));
        assert_eq!(
            RawValue::from(vec![true, false]),
            RawValue::List(vec![RawValue::Bool(true), RawValue::Bool(false)])
        );
        let single = Value::Vectors(vec![[0.0, 1.0, 2.0]]).to_raw();
        assert_eq!(single, RawValue::Array(NdArray::from([0.0, 1.0, 2.0])));
    }

    #[test]
    fn test_handles() {
        let h = Handle::from_index(4);
        assert_eq!(Value::Object(h).handles(), &[h]);
        assert!(Value::Bool(true).handles().is_empty());
    }
}
