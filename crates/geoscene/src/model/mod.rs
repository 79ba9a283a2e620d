//! Core value types for the scene graph.

pub mod array;
pub mod color;
pub mod object;
pub mod value;

pub use array::{ArrayData, ElementKind, NdArray, Order};
pub use color::{COLORS_20, NAMED_COLORS, Palette, Rgb};
pub use object::{Handle, Location, ObjectKind};
pub use value::{RawValue, Value};
