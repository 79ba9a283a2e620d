//! Error types for field validation, scene consistency and the array codec.

use thiserror::Error;

use crate::codec::WireDtype;
use crate::model::{Handle, Location};

/// Error codes grouping every failure this crate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// C001: A single field's value violates its declared constraint
    Constraint,
    /// C002: A non-nullable field is unset at full validation
    RequiredFieldMissing,
    /// C003: A cross-object rule is violated
    Consistency,
    /// C004: The codec detected a lossy numeric cast
    PrecisionLoss,
    /// C005: Malformed binary payload
    Decode,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "C001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::Constraint => "C001",
            ErrorCode::RequiredFieldMissing => "C002",
            ErrorCode::Consistency => "C003",
            ErrorCode::PrecisionLoss => "C004",
            ErrorCode::Decode => "C005",
        }
    }
}

/// A field value was rejected. The mutation that produced it did not happen.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[C001] {object}.{field}: {reason}")]
pub struct ConstraintError {
    /// Name of the object kind owning the field.
    pub object: &'static str,
    /// Field name as requested by the caller.
    pub field: String,
    /// Human-readable description of the violated constraint.
    pub reason: String,
}

impl ConstraintError {
    pub fn new(object: &'static str, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            object,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Full validation found an unset field that may not be null.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[C002] required field not set: {object}.{field}")]
pub struct RequiredFieldMissing {
    pub object: &'static str,
    pub field: &'static str,
}

/// A rule spanning several fields or objects is violated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("[C003] {resource}.data[{index}] length {actual} does not match {location} length {expected}")]
    BindingLength {
        resource: &'static str,
        index: usize,
        location: Location,
        expected: usize,
        actual: usize,
    },

    #[error("[C003] {resource}.data[{index}] location {location} is not permitted on {mesh} (allowed: {allowed})")]
    LocationNotPermitted {
        resource: &'static str,
        index: usize,
        location: Location,
        mesh: &'static str,
        allowed: String,
    },

    #[error("[C003] triangles may only have non-negative indices, found {value} at position {position}")]
    NegativeTriangleIndex { position: usize, value: i64 },

    #[error("[C003] triangle index {value} at position {position} expects more vertices than provided ({vertices})")]
    TriangleIndexOutOfBounds {
        position: usize,
        value: i64,
        vertices: usize,
    },

    #[error("[C003] {object}.{field} must hold exactly one vector, found {count}")]
    VectorCount {
        object: &'static str,
        field: &'static str,
        count: usize,
    },

    #[error("[C003] length of Z, {actual}, must equal number of nodes, {expected}")]
    ElevationLength { expected: usize, actual: usize },

    #[error("[C003] {field}[{index}] cell width {width} must be finite and non-negative")]
    TensorWidth {
        field: &'static str,
        index: usize,
        width: f64,
    },

    #[error("[C003] category index {max_index} requires more than {max_index} {what}, found {len}")]
    CategoryIndexOutOfRange {
        what: &'static str,
        max_index: i64,
        len: usize,
    },

    #[error("[C003] categories ({categories}) and colormap ({colormap}) must be equal length")]
    CategoryColormapMismatch { categories: usize, colormap: usize },

    #[error("[C003] end_values must be finite, found {value} at index {index}")]
    NonFiniteBinEdge { index: usize, value: f64 },

    #[error("[C003] end_values must be strictly increasing, {value} at index {index} follows {previous}")]
    BinEdgesNotIncreasing {
        index: usize,
        previous: f64,
        value: f64,
    },

    #[error("[C003] {field} length {actual} must be {expected} for {edges} end_values")]
    DiscreteLength {
        field: &'static str,
        expected: usize,
        actual: usize,
        edges: usize,
    },

    #[error("[C003] vectorfield.vectors length {actual} does not match node length {expected}")]
    VectorLength { expected: usize, actual: usize },

    #[error("[C003] project/resource pointers misaligned: {resource} does not point back to project {project}")]
    BackReference { project: Handle, resource: Handle },

    #[error("[C003] total number of resources in project ({count}) exceeds limit: {limit}")]
    ResourceLimit { count: usize, limit: usize },

    #[error("[C003] total project size ({bytes} bytes) exceeds limit: {limit} bytes")]
    ProjectSize { bytes: u64, limit: u64 },
}

/// Error during array encoding or decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("[C004] cannot encode {value} at index {index} as {dtype} without precision loss")]
    PrecisionLoss {
        dtype: WireDtype,
        index: usize,
        value: f64,
    },

    #[error("[C005] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[C005] payload of {actual} bytes does not match shape {shape:?} ({expected} bytes expected)")]
    LengthMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("[C005] array data length {len} does not fit shape {shape:?}")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    #[error("[C005] unknown dtype tag: {tag}")]
    UnknownDtype { tag: String },

    #[error("[C005] {dtype} payloads do not hold numeric arrays")]
    NotNumeric { dtype: WireDtype },

    #[error("[C005] image payload is not a PNG file")]
    InvalidPng,
}

impl CodecError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CodecError::PrecisionLoss { .. } => ErrorCode::PrecisionLoss,
            _ => ErrorCode::Decode,
        }
    }
}

/// Any failure raised by a [`Scene`](crate::Scene) operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    #[error(transparent)]
    RequiredFieldMissing(#[from] RequiredFieldMissing),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("[C001] unknown object handle {0}")]
    UnknownHandle(Handle),
}

impl Error {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Constraint(_) | Error::UnknownHandle(_) => ErrorCode::Constraint,
            Error::RequiredFieldMissing(_) => ErrorCode::RequiredFieldMissing,
            Error::Consistency(_) => ErrorCode::Consistency,
            Error::Codec(e) => e.code(),
        }
    }
}
