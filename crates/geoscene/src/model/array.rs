//! N-dimensional numeric arrays.
//!
//! Arrays are stored flat in row-major order with an explicit shape.
//! Elements are either 64-bit floats or 64-bit signed integers; the wire
//! codec narrows them to 4-byte types and verifies that nothing is lost.

use serde_json::Value as Json;

use crate::error::CodecError;

/// Element type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Float,
    Int,
}

/// Memory order of a flat array payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// Row-major (C, numpy default).
    #[default]
    C,
    /// Column-major (Fortran, MATLAB).
    F,
}

impl Order {
    /// Canonical tag (`c` or `f`).
    pub fn tag(self) -> &'static str {
        match self {
            Order::C => "c",
            Order::F => "f",
        }
    }

    /// Parses a canonical tag.
    pub fn from_tag(tag: &str) -> Option<Order> {
        match tag {
            "c" => Some(Order::C),
            "f" => Some(Order::F),
            _ => None,
        }
    }
}

/// Flat element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Float(Vec<f64>),
    Int(Vec<i64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Float(v) => v.len(),
            ArrayData::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ArrayData::Float(_) => ElementKind::Float,
            ArrayData::Int(_) => ElementKind::Int,
        }
    }
}

/// Number of elements a `shape` holds, or `None` if it overflows `usize`.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// A shaped numeric array.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Creates an array from row-major data.
    ///
    /// Fails if the product of `shape` differs from the data length.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self, CodecError> {
        if element_count(&shape) != Some(data.len()) {
            return Err(CodecError::ShapeMismatch {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates an array from column-major data, reordering it to row-major.
    pub fn from_column_major(shape: Vec<usize>, data: ArrayData) -> Result<Self, CodecError> {
        if element_count(&shape) != Some(data.len()) {
            return Err(CodecError::ShapeMismatch {
                shape,
                len: data.len(),
            });
        }
        let data = match data {
            ArrayData::Float(v) => ArrayData::Float(column_to_row_major(&shape, &v)),
            ArrayData::Int(v) => ArrayData::Int(column_to_row_major(&shape, &v)),
        };
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Length of the first dimension (number of rows).
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Returns true if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn element_kind(&self) -> ElementKind {
        self.data.kind()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match &self.data {
            ArrayData::Float(v) => Some(v),
            ArrayData::Int(_) => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match &self.data {
            ArrayData::Int(v) => Some(v),
            ArrayData::Float(_) => None,
        }
    }

    /// Flat data widened to f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match &self.data {
            ArrayData::Float(v) => v.clone(),
            ArrayData::Int(v) => v.iter().map(|x| *x as f64).collect(),
        }
    }

    /// Converts integer storage to float storage.
    pub fn into_float(self) -> NdArray {
        match self.data {
            ArrayData::Float(_) => self,
            ArrayData::Int(v) => NdArray {
                shape: self.shape,
                data: ArrayData::Float(v.into_iter().map(|x| x as f64).collect()),
            },
        }
    }

    /// Sum of all elements as f64.
    pub fn sum(&self) -> f64 {
        match &self.data {
            ArrayData::Float(v) => v.iter().sum(),
            ArrayData::Int(v) => v.iter().map(|x| *x as f64).sum(),
        }
    }

    /// Nested JSON lists following the array shape. Non-finite floats become null.
    pub fn to_json(&self) -> Json {
        let flat: Vec<Json> = match &self.data {
            ArrayData::Float(v) => v.iter().map(|x| Json::from(*x)).collect(),
            ArrayData::Int(v) => v.iter().map(|x| Json::from(*x)).collect(),
        };
        nest_json(&flat, &self.shape)
    }

    /// Exact equality that treats NaN as equal to NaN at the same position.
    pub fn bitwise_eq(&self, other: &NdArray) -> bool {
        if self.shape != other.shape {
            return false;
        }
        match (&self.data, &other.data) {
            (ArrayData::Float(a), ArrayData::Float(b)) => a
                .iter()
                .zip(b)
                .all(|(x, y)| x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())),
            (ArrayData::Int(a), ArrayData::Int(b)) => a == b,
            _ => false,
        }
    }
}

fn nest_json(flat: &[Json], shape: &[usize]) -> Json {
    match shape.len() {
        0 => flat.first().cloned().unwrap_or(Json::Null),
        1 => Json::Array(flat.to_vec()),
        _ => {
            let inner: usize = shape[1..].iter().product();
            if inner == 0 {
                return Json::Array(vec![Json::Array(Vec::new()); shape[0]]);
            }
            Json::Array(
                flat.chunks(inner)
                    .map(|chunk| nest_json(chunk, &shape[1..]))
                    .collect(),
            )
        }
    }
}

fn column_to_row_major<T: Copy>(shape: &[usize], data: &[T]) -> Vec<T> {
    if shape.len() < 2 {
        return data.to_vec();
    }
    let mut f_strides = vec![1usize; shape.len()];
    for axis in 1..shape.len() {
        f_strides[axis] = f_strides[axis - 1] * shape[axis - 1];
    }

    let mut out = Vec::with_capacity(data.len());
    let mut index = vec![0usize; shape.len()];
    for _ in 0..data.len() {
        let offset: usize = index.iter().zip(&f_strides).map(|(i, s)| i * s).sum();
        out.push(data[offset]);
        // Advance the row-major multi-index, last axis fastest.
        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    out
}

impl From<Vec<f64>> for NdArray {
    fn from(v: Vec<f64>) -> Self {
        NdArray {
            shape: vec![v.len()],
            data: ArrayData::Float(v),
        }
    }
}

impl From<Vec<i64>> for NdArray {
    fn from(v: Vec<i64>) -> Self {
        NdArray {
            shape: vec![v.len()],
            data: ArrayData::Int(v),
        }
    }
}

impl From<Vec<i32>> for NdArray {
    fn from(v: Vec<i32>) -> Self {
        NdArray::from(v.into_iter().map(i64::from).collect::<Vec<_>>())
    }
}

impl From<Vec<[f64; 3]>> for NdArray {
    fn from(rows: Vec<[f64; 3]>) -> Self {
        NdArray {
            shape: vec![rows.len(), 3],
            data: ArrayData::Float(rows.into_iter().flatten().collect()),
        }
    }
}

impl From<Vec<[i64; 3]>> for NdArray {
    fn from(rows: Vec<[i64; 3]>) -> Self {
        NdArray {
            shape: vec![rows.len(), 3],
            data: ArrayData::Int(rows.into_iter().flatten().collect()),
        }
    }
}

impl From<[f64; 3]> for NdArray {
    fn from(v: [f64; 3]) -> Self {
        NdArray::from(v.to_vec())
    }
}

impl From<[i64; 3]> for NdArray {
    fn from(v: [i64; 3]) -> Self {
        NdArray::from(v.to_vec())
    }
}
