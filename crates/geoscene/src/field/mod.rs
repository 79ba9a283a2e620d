//! Field descriptors.
//!
//! A [`FieldDescriptor`] declares one typed slot of an object kind: its
//! value kind and constraints, default, nullability and how it travels on
//! the wire. [`FieldDescriptor::validate`] turns caller input into the
//! normalized [`Value`] the scene stores, or rejects it with a
//! [`ConstraintError`]. Validation has no side effects besides drawing from
//! the supplied random source for `"random"` colors.

pub mod choices;

pub use choices::{Choices, LOCATION, ORDER};

use rand::RngCore;

use crate::codec;
use crate::error::{ConstraintError, Error};
use crate::model::{ArrayData, ElementKind, Handle, NdArray, ObjectKind, Palette, RawValue, Rgb, Value};
use crate::scene::Scene;

/// Callback run after a value has been stored. An error rolls the field
/// back to its previous value.
pub type ChangeHook = fn(&Scene, Handle, &FieldDescriptor) -> Result<(), Error>;

// =============================================================================
// KINDS
// =============================================================================

/// Size of one array dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Any,
    Fixed(usize),
}

/// Element types an array field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    /// Float elements. Int input is widened to float.
    Float,
    /// Int elements only.
    Int,
    /// Either, stored as given.
    Any,
}

/// Inclusive lower and exclusive upper element bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max_exclusive: Option<f64>,
}

impl Bounds {
    pub const NONE: Bounds = Bounds {
        min: None,
        max_exclusive: None,
    };
}

/// How an array field is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayCodec {
    Plain,
    /// Index codec: the "no category" sentinel travels as NaN.
    Index,
}

/// Shape, dtype and bounds of an array field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArraySpec {
    pub shape: &'static [Dim],
    pub dtype: Dtype,
    pub bounds: Bounds,
    pub codec: ArrayCodec,
}

impl ArraySpec {
    pub const fn new(shape: &'static [Dim], dtype: Dtype) -> Self {
        Self {
            shape,
            dtype,
            bounds: Bounds::NONE,
            codec: ArrayCodec::Plain,
        }
    }

    pub const fn bounded(mut self, min: f64, max_exclusive: f64) -> Self {
        self.bounds = Bounds {
            min: Some(min),
            max_exclusive: Some(max_exclusive),
        };
        self
    }

    pub const fn index_codec(mut self) -> Self {
        self.codec = ArrayCodec::Index;
        self
    }
}

/// Value kind of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Bool,
    Float { min: Option<f64>, max: Option<f64> },
    Str,
    Enum(&'static Choices),
    Array(ArraySpec),
    Color(Palette),
    /// One or more 3-vectors; accepts `X`/`Y`/`Z` axis tokens.
    Vector,
    /// PNG bytes.
    Image,
    StrList,
    BoolList,
    ColorList(Palette),
    /// Owned reference to one object of the listed kinds.
    Object(&'static [ObjectKind]),
    /// Owned ordered references to objects of the listed kinds.
    Objects(&'static [ObjectKind]),
    /// Non-owning references back to containers of the given kind.
    BackRefs(ObjectKind),
}

impl FieldKind {
    /// Returns true for kinds whose values are owned sub-objects.
    pub fn is_owned_ref(&self) -> bool {
        matches!(self, FieldKind::Object(_) | FieldKind::Objects(_))
    }
}

/// Where a field's value goes in the dirty payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    /// JSON metadata.
    Json,
    /// Binary codec output.
    Binary,
    /// Not sent itself; folded into a derived JSON entry.
    Derived,
    /// Never sent.
    Local,
}

/// Value applied when an object is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    None,
    Bool(bool),
    Float(f64),
    Str(&'static str),
    Vector([f64; 3]),
    RandomColor(Palette),
    EmptyList,
    /// A freshly created object of the given kind.
    NewObject(ObjectKind),
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

/// Declaration of one field of an object kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: DefaultValue,
    pub nullable: bool,
    /// Name of the field on the referenced object that mirrors this one.
    pub inverse: Option<&'static str>,
    pub wire: Wire,
    pub help: &'static str,
    pub hook: Option<ChangeHook>,
}

impl FieldDescriptor {
    /// Creates a required field sent as JSON (or binary, for arrays and images).
    pub const fn new(name: &'static str, kind: FieldKind, help: &'static str) -> Self {
        let wire = match kind {
            FieldKind::Array(_) | FieldKind::Image => Wire::Binary,
            FieldKind::BackRefs(_) => Wire::Local,
            _ => Wire::Json,
        };
        Self {
            name,
            kind,
            default: DefaultValue::None,
            nullable: false,
            inverse: None,
            wire,
            help,
            hook: None,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    pub const fn inverse(mut self, field: &'static str) -> Self {
        self.inverse = Some(field);
        self
    }

    pub const fn wire(mut self, wire: Wire) -> Self {
        self.wire = wire;
        self
    }

    pub const fn hook(mut self, hook: ChangeHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Validates and normalizes `raw`.
    ///
    /// Returns `Ok(None)` when a nullable field is cleared.
    pub fn validate(
        &self,
        raw: RawValue,
        ctx: &mut FieldContext<'_>,
    ) -> Result<Option<Value>, ConstraintError> {
        let object = ctx.object;
        let fail = |reason: String| ConstraintError::new(object, self.name, reason);
        if matches!(raw, RawValue::Null) {
            return if self.nullable {
                Ok(None)
            } else {
                Err(fail("may not be null".to_string()))
            };
        }

        let value = match self.kind {
            FieldKind::Bool => match raw {
                RawValue::Bool(b) => Value::Bool(b),
                other => return Err(fail(expected("bool", &other))),
            },
            FieldKind::Float { min, max } => {
                let v = match raw {
                    RawValue::Float(f) => f,
                    RawValue::Int(i) => i as f64,
                    other => return Err(fail(expected("number", &other))),
                };
                if v.is_nan() {
                    return Err(fail("must be a number, found NaN".to_string()));
                }
                if let Some(lo) = min.filter(|lo| v < *lo) {
                    return Err(fail(format!("{} must be >= {}", v, lo)));
                }
                if let Some(hi) = max.filter(|hi| v > *hi) {
                    return Err(fail(format!("{} must be <= {}", v, hi)));
                }
                Value::Float(v)
            }
            FieldKind::Str => match raw {
                RawValue::Str(s) => Value::Str(s),
                other => return Err(fail(expected("string", &other))),
            },
            FieldKind::Enum(choices) => match raw {
                RawValue::Str(s) => match choices.resolve(&s) {
                    Some(key) => Value::Str(key.to_string()),
                    None => {
                        return Err(fail(format!(
                            "`{}` is not one of: {}",
                            s,
                            choices.describe()
                        )));
                    }
                },
                other => return Err(fail(expected("string", &other))),
            },
            FieldKind::Array(spec) => match raw {
                RawValue::Array(a) => Value::Array(validate_array(&spec, a).map_err(fail)?),
                other => return Err(fail(expected("array", &other))),
            },
            FieldKind::Color(palette) => {
                Value::Color(parse_color(raw, palette, ctx.rng).map_err(fail)?)
            }
            FieldKind::Vector => Value::Vectors(parse_vectors(raw).map_err(fail)?),
            FieldKind::Image => match raw {
                RawValue::Bytes(b) if codec::is_png(&b) => Value::Bytes(b),
                RawValue::Bytes(_) => return Err(fail("must be a PNG file".to_string())),
                other => return Err(fail(expected("PNG bytes", &other))),
            },
            FieldKind::StrList => {
                let items = expect_list(raw).map_err(fail)?;
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        RawValue::Str(s) => out.push(s),
                        other => return Err(fail(format!("[{}]: {}", i, expected("string", &other)))),
                    }
                }
                Value::StrList(out)
            }
            FieldKind::BoolList => {
                let items = expect_list(raw).map_err(fail)?;
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        RawValue::Bool(b) => out.push(b),
                        other => return Err(fail(format!("[{}]: {}", i, expected("bool", &other)))),
                    }
                }
                Value::BoolList(out)
            }
            FieldKind::ColorList(palette) => {
                let items = expect_list(raw).map_err(fail)?;
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let color = parse_color(item, palette, ctx.rng)
                        .map_err(|reason| fail(format!("[{}]: {}", i, reason)))?;
                    out.push(color);
                }
                Value::ColorList(out)
            }
            FieldKind::Object(kinds) => match raw {
                RawValue::Object(h) => {
                    check_kind(ctx.resolver, h, kinds).map_err(fail)?;
                    Value::Object(h)
                }
                other => return Err(fail(expected("object", &other))),
            },
            FieldKind::Objects(kinds) => {
                Value::Objects(collect_handles(raw, ctx.resolver, kinds).map_err(fail)?)
            }
            FieldKind::BackRefs(kind) => Value::Objects(
                collect_handles(raw, ctx.resolver, std::slice::from_ref(&kind)).map_err(fail)?,
            ),
        };
        Ok(Some(value))
    }
}

/// Everything a descriptor needs from its surroundings while validating.
pub struct FieldContext<'a> {
    /// Name of the owning object's kind.
    pub object: &'static str,
    pub resolver: &'a dyn HandleResolver,
    pub rng: &'a mut dyn RngCore,
}

/// Resolves handles to object kinds.
pub trait HandleResolver {
    /// Kind of the object behind `handle`, or `None` if it does not exist.
    fn kind_of(&self, handle: Handle) -> Option<ObjectKind>;
}

// =============================================================================
// HELPERS
// =============================================================================

fn expected(what: &str, found: &RawValue) -> String {
    format!("expected {}, found {}", what, found.type_name())
}

fn expect_list(raw: RawValue) -> Result<Vec<RawValue>, String> {
    match raw {
        RawValue::List(items) => Ok(items),
        other => Err(expected("list", &other)),
    }
}

fn validate_array(spec: &ArraySpec, array: NdArray) -> Result<NdArray, String> {
    if array.ndim() != spec.shape.len() {
        return Err(format!(
            "expected {}-D array, found {}-D with shape {:?}",
            spec.shape.len(),
            array.ndim(),
            array.shape()
        ));
    }
    for (axis, (dim, actual)) in spec.shape.iter().zip(array.shape()).enumerate() {
        match dim {
            Dim::Fixed(n) if n != actual => {
                return Err(format!(
                    "dimension {} must have length {}, found shape {:?}",
                    axis,
                    n,
                    array.shape()
                ));
            }
            _ => {}
        }
    }

    let array = match (spec.dtype, array.element_kind()) {
        (Dtype::Int, ElementKind::Float) => {
            return Err("expected int elements, found float".to_string());
        }
        (Dtype::Float, ElementKind::Int) => array.into_float(),
        _ => array,
    };

    if let Some(min) = spec.bounds.min {
        if let Some((i, v)) = first_where(&array, |v| v < min) {
            return Err(format!("value {} at index {} must be >= {}", v, i, min));
        }
    }
    if let Some(max) = spec.bounds.max_exclusive {
        if let Some((i, v)) = first_where(&array, |v| v >= max) {
            return Err(format!("value {} at index {} must be < {}", v, i, max));
        }
    }
    Ok(array)
}

fn first_where(array: &NdArray, pred: impl Fn(f64) -> bool) -> Option<(usize, f64)> {
    match array.data() {
        ArrayData::Float(values) => values.iter().copied().enumerate().find(|(_, v)| pred(*v)),
        ArrayData::Int(values) => values
            .iter()
            .map(|v| *v as f64)
            .enumerate()
            .find(|(_, v)| pred(*v)),
    }
}

fn parse_color(raw: RawValue, palette: Palette, rng: &mut dyn RngCore) -> Result<Rgb, String> {
    match raw {
        RawValue::Color(c) => Ok(c),
        RawValue::Str(s) => Rgb::parse(&s, palette, rng),
        RawValue::Array(a) => match a.as_ints() {
            Some(channels) if a.ndim() == 1 => Rgb::from_channels(channels),
            _ => Err("color array must be 1-D with 3 int channels".to_string()),
        },
        RawValue::List(items) => {
            let mut channels = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    RawValue::Int(c) => channels.push(c),
                    other => return Err(expected("int color channel", &other)),
                }
            }
            Rgb::from_channels(&channels)
        }
        other => Err(expected("color", &other)),
    }
}

fn parse_vectors(raw: RawValue) -> Result<Vec<[f64; 3]>, String> {
    match raw {
        RawValue::Str(s) => match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(vec![[1.0, 0.0, 0.0]]),
            "Y" => Ok(vec![[0.0, 1.0, 0.0]]),
            "Z" => Ok(vec![[0.0, 0.0, 1.0]]),
            _ => Err(format!("`{}` is not a vector; use X, Y or Z", s)),
        },
        RawValue::Array(a) => {
            let v = a.to_f64_vec();
            match a.shape() {
                [3] => Ok(vec![[v[0], v[1], v[2]]]),
                [_, 3] => Ok(v.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()),
                shape => Err(format!("expected shape [3] or [*, 3], found {:?}", shape)),
            }
        }
        other => Err(expected("vector", &other)),
    }
}

fn check_kind(
    resolver: &dyn HandleResolver,
    handle: Handle,
    kinds: &[ObjectKind],
) -> Result<(), String> {
    match resolver.kind_of(handle) {
        None => Err(format!("unknown object handle {}", handle)),
        Some(kind) if kinds.contains(&kind) => Ok(()),
        Some(kind) => Err(format!(
            "expected {}, found {} {}",
            kinds.iter().map(|k| k.name()).collect::<Vec<_>>().join(" or "),
            kind,
            handle
        )),
    }
}

fn collect_handles(
    raw: RawValue,
    resolver: &dyn HandleResolver,
    kinds: &[ObjectKind],
) -> Result<Vec<Handle>, String> {
    let handles = match raw {
        RawValue::Objects(hs) => hs,
        RawValue::List(items) => {
            let mut hs = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    RawValue::Object(h) => hs.push(h),
                    other => return Err(expected("object", &other)),
                }
            }
            hs
        }
        other => return Err(expected("object list", &other)),
    };
    for h in &handles {
        check_kind(resolver, *h, kinds)?;
    }
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    struct Kinds(Vec<ObjectKind>);

    impl HandleResolver for Kinds {
        fn kind_of(&self, handle: Handle) -> Option<ObjectKind> {
            self.0.get(handle.index()).copied()
        }
    }

    fn check(desc: &FieldDescriptor, raw: impl Into<RawValue>) -> Result<Option<Value>, ConstraintError> {
        let resolver = Kinds(vec![ObjectKind::Point, ObjectKind::Mesh0D]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = FieldContext {
            object: "test",
            resolver: &resolver,
            rng: &mut rng,
        };
        desc.validate(raw.into(), &mut ctx)
    }

    const VERTICES: FieldDescriptor = FieldDescriptor::new(
        "vertices",
        FieldKind::Array(ArraySpec::new(&[Dim::Any, Dim::Fixed(3)], Dtype::Float)),
        "",
    );

    const INDICES: FieldDescriptor = FieldDescriptor::new(
        "array",
        FieldKind::Array(ArraySpec::new(&[Dim::Any], Dtype::Int).bounded(-1.0, 256.0)),
        "",
    );

    #[test]
    fn test_array_shape_and_dtype() {
        assert!(check(&VERTICES, vec![[0.0, 1.0, 2.0]]).is_ok());
        let err = check(&VERTICES, vec![1.0, 2.0]).unwrap_err();
        assert!(err.reason.contains("expected 2-D"), "{}", err);
        let bad = NdArray::new(vec![1, 2], ArrayData::Float(vec![0.0, 0.0])).unwrap();
        assert!(check(&VERTICES, bad).unwrap_err().reason.contains("length 3"));
        // Int vertices widen to float.
        let widened = check(&VERTICES, vec![[1i64, 2, 3]]).unwrap().unwrap();
        assert_eq!(widened.as_array().unwrap().element_kind(), ElementKind::Float);
        assert!(check(&INDICES, vec![0.5]).unwrap_err().reason.contains("int"));
    }

    #[test]
    fn test_array_bounds() {
        assert!(check(&INDICES, vec![-1i64, 0, 255]).is_ok());
        let err = check(&INDICES, vec![0i64, 300]).unwrap_err();
        assert!(err.reason.contains("must be < 256"), "{}", err);
        let err = check(&INDICES, vec![-2i64]).unwrap_err();
        assert!(err.reason.contains("must be >= -1"), "{}", err);
        assert_eq!(err.to_string(), "[C001] test.array: value -2 at index 0 must be >= -1");
    }

    #[test]
    fn test_enum_and_null() {
        let order = FieldDescriptor::new("order", FieldKind::Enum(&ORDER), "");
        assert_eq!(check(&order, "Row-Major").unwrap(), Some(Value::Str("c".into())));
        assert!(check(&order, "diagonal").is_err());
        assert!(check(&order, RawValue::Null).unwrap_err().reason.contains("null"));
        assert_eq!(check(&order.nullable(), RawValue::Null).unwrap(), None);
    }

    #[test]
    fn test_colors() {
        let color = FieldDescriptor::new("color", FieldKind::Color(Palette::Twenty), "");
        assert_eq!(check(&color, "#F00").unwrap(), Some(Value::Color(Rgb([255, 0, 0]))));
        assert_eq!(
            check(&color, vec![RawValue::Int(1), RawValue::Int(2), RawValue::Int(3)]).unwrap(),
            Some(Value::Color(Rgb([1, 2, 3])))
        );
        assert!(check(&color, vec![RawValue::Int(1), RawValue::Int(2), RawValue::Int(300)]).is_err());
        assert!(check(&color, "chartreuse-ish").is_err());
        assert!(matches!(check(&color, "random").unwrap(), Some(Value::Color(_))));
    }

    #[test]
    fn test_vectors() {
        let x0 = FieldDescriptor::new("x0", FieldKind::Vector, "");
        assert_eq!(check(&x0, "y").unwrap(), Some(Value::Vectors(vec![[0.0, 1.0, 0.0]])));
        assert_eq!(
            check(&x0, vec![1i64, 2, 3]).unwrap(),
            Some(Value::Vectors(vec![[1.0, 2.0, 3.0]]))
        );
        assert!(check(&x0, vec![1.0, 2.0]).is_err());
        assert!(check(&x0, "W").is_err());
    }

    #[test]
    fn test_object_kinds() {
        let mesh = FieldDescriptor::new("mesh", FieldKind::Object(&[ObjectKind::Mesh0D]), "");
        assert!(check(&mesh, Handle::from_index(1)).is_ok());
        let err = check(&mesh, Handle::from_index(0)).unwrap_err();
        assert!(err.reason.contains("expected mesh0d, found point"), "{}", err);
        assert!(check(&mesh, Handle::from_index(9)).unwrap_err().reason.contains("unknown"));
    }

    #[test]
    fn test_image_signature() {
        let image = FieldDescriptor::new("image", FieldKind::Image, "");
        assert!(check(&image, crate::limits::PNG_SIGNATURE.to_vec()).is_ok());
        assert!(check(&image, vec![0u8, 1, 2]).is_err());
    }
}
