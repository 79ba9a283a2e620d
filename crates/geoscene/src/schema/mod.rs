//! Field declarations for every object kind.
//!
//! Each kind has one static descriptor list. The list order is the order
//! fields are validated, reported dirty and serialized.

use crate::field::{
    ArraySpec, DefaultValue, Dim, Dtype, FieldDescriptor, FieldKind, LOCATION, ORDER, Wire,
};
use crate::limits::MAX_CATEGORY_INDEX;
use crate::model::{ObjectKind, Palette};
use crate::validate::limit_field_bytes;

use ObjectKind as K;

// =============================================================================
// SHARED DECLARATIONS
// =============================================================================

const ROWS3: &[Dim] = &[Dim::Any, Dim::Fixed(3)];
const FLAT: &[Dim] = &[Dim::Any];

const RESOURCE_KINDS: &[ObjectKind] = &[K::Point, K::Surface, K::Volume, K::VectorField];
const DATA_KINDS: &[ObjectKind] = &[K::DataArray, K::DataCategory, K::DataDiscrete];

const TITLE: FieldDescriptor = FieldDescriptor::new("title", FieldKind::Str, "Title").nullable();
const DESCRIPTION: FieldDescriptor =
    FieldDescriptor::new("description", FieldKind::Str, "Description").nullable();

const PROJECTS: FieldDescriptor = FieldDescriptor::new(
    "projects",
    FieldKind::BackRefs(K::Project),
    "Projects containing this resource",
)
.default(DefaultValue::EmptyList)
.inverse("resources");

const BINDINGS: FieldDescriptor =
    FieldDescriptor::new("data", FieldKind::Objects(&[K::Binding]), "Data")
        .default(DefaultValue::EmptyList);

const TEXTURES: FieldDescriptor =
    FieldDescriptor::new("textures", FieldKind::Objects(&[K::Texture2DImage]), "Textures")
        .default(DefaultValue::EmptyList);

const RESOURCE_OPTS: FieldDescriptor = FieldDescriptor::new(
    "opts",
    FieldKind::Object(&[K::ResourceOptions]),
    "Options",
)
.default(DefaultValue::NewObject(K::ResourceOptions));

const MESH_OPTS: FieldDescriptor =
    FieldDescriptor::new("opts", FieldKind::Object(&[K::MeshOptions]), "Mesh options")
        .nullable()
        .default(DefaultValue::NewObject(K::MeshOptions));

const fn float_array(name: &'static str, shape: &'static [Dim], help: &'static str) -> FieldDescriptor {
    FieldDescriptor::new(name, FieldKind::Array(ArraySpec::new(shape, Dtype::Float)), help)
        .hook(limit_field_bytes)
}

const fn cell_widths(name: &'static str, help: &'static str) -> FieldDescriptor {
    float_array(name, FLAT, help).wire(Wire::Derived)
}

const ORIGIN: FieldDescriptor = FieldDescriptor::new("x0", FieldKind::Vector, "Origin vector")
    .default(DefaultValue::Vector([0.0, 0.0, 0.0]))
    .wire(Wire::Derived)
    .hook(limit_field_bytes);

const DATA_ORDER: FieldDescriptor =
    FieldDescriptor::new("order", FieldKind::Enum(&ORDER), "Data array order, for data on grid meshes")
        .default(DefaultValue::Str("c"));

const DATA_COLORMAP: FieldDescriptor =
    FieldDescriptor::new("colormap", FieldKind::ColorList(Palette::Twenty), "Colormap").nullable();

// =============================================================================
// PER-KIND LISTS
// =============================================================================

static PROJECT: [FieldDescriptor; 4] = [
    TITLE,
    DESCRIPTION,
    FieldDescriptor::new("resources", FieldKind::Objects(RESOURCE_KINDS), "Project resources")
        .default(DefaultValue::EmptyList)
        .inverse("projects"),
    FieldDescriptor::new("public", FieldKind::Bool, "Public visibility of project")
        .default(DefaultValue::Bool(false)),
];

static POINT: [FieldDescriptor; 7] = [
    TITLE,
    DESCRIPTION,
    PROJECTS,
    FieldDescriptor::new("mesh", FieldKind::Object(&[K::Mesh0D]), "Mesh"),
    BINDINGS,
    TEXTURES,
    RESOURCE_OPTS,
];

static SURFACE: [FieldDescriptor; 7] = [
    TITLE,
    DESCRIPTION,
    PROJECTS,
    FieldDescriptor::new("mesh", FieldKind::Object(&[K::Mesh2D, K::Mesh2DGrid]), "Mesh"),
    BINDINGS,
    TEXTURES,
    RESOURCE_OPTS,
];

static VOLUME: [FieldDescriptor; 6] = [
    TITLE,
    DESCRIPTION,
    PROJECTS,
    FieldDescriptor::new("mesh", FieldKind::Object(&[K::Mesh3DGrid]), "Mesh"),
    BINDINGS,
    RESOURCE_OPTS,
];

static VECTOR_FIELD: [FieldDescriptor; 7] = [
    TITLE,
    DESCRIPTION,
    PROJECTS,
    FieldDescriptor::new("mesh", FieldKind::Object(&[K::Mesh0D]), "Mesh"),
    float_array("vectors", ROWS3, "Vectors at mesh nodes"),
    BINDINGS,
    RESOURCE_OPTS,
];

static MESH_0D: [FieldDescriptor; 2] = [float_array("vertices", ROWS3, "Point locations"), MESH_OPTS];

static MESH_2D: [FieldDescriptor; 3] = [
    float_array("vertices", ROWS3, "Mesh vertices"),
    FieldDescriptor::new(
        "triangles",
        FieldKind::Array(ArraySpec::new(ROWS3, Dtype::Int)),
        "Mesh triangle vertex indices",
    )
    .hook(limit_field_bytes),
    MESH_OPTS,
];

static MESH_2D_GRID: [FieldDescriptor; 5] = [
    cell_widths("h1", "Grid cell widths, x-direction"),
    cell_widths("h2", "Grid cell widths, y-direction"),
    ORIGIN,
    float_array("Z", FLAT, "Node topography").nullable(),
    MESH_OPTS,
];

static MESH_3D_GRID: [FieldDescriptor; 5] = [
    cell_widths("h1", "Tensor cell widths, x-direction"),
    cell_widths("h2", "Tensor cell widths, y-direction"),
    cell_widths("h3", "Tensor cell widths, z-direction"),
    ORIGIN,
    MESH_OPTS,
];

static BINDING: [FieldDescriptor; 2] = [
    FieldDescriptor::new("location", FieldKind::Enum(&LOCATION), "Location of the data on mesh")
        .default(DefaultValue::Str("N")),
    FieldDescriptor::new("data", FieldKind::Object(DATA_KINDS), "Data"),
];

static DATA_ARRAY: [FieldDescriptor; 4] = [
    TITLE,
    DESCRIPTION,
    FieldDescriptor::new(
        "array",
        FieldKind::Array(ArraySpec::new(FLAT, Dtype::Any)),
        "Data, unique to mesh",
    )
    .hook(limit_field_bytes),
    DATA_ORDER,
];

static DATA_CATEGORY: [FieldDescriptor; 5] = [
    TITLE,
    DESCRIPTION,
    FieldDescriptor::new(
        "array",
        FieldKind::Array(
            ArraySpec::new(FLAT, Dtype::Int)
                .bounded(-1.0, (MAX_CATEGORY_INDEX + 1) as f64)
                .index_codec(),
        ),
        "Category index values at locations on a mesh",
    )
    .hook(limit_field_bytes),
    FieldDescriptor::new("categories", FieldKind::StrList, "Category names").nullable(),
    DATA_COLORMAP,
];

static DATA_DISCRETE: [FieldDescriptor; 8] = [
    TITLE,
    DESCRIPTION,
    FieldDescriptor::new(
        "array",
        FieldKind::Array(ArraySpec::new(FLAT, Dtype::Any)),
        "Data, unique to mesh",
    )
    .hook(limit_field_bytes),
    float_array("end_values", FLAT, "Data values where discrete bins end").wire(Wire::Json),
    FieldDescriptor::new("end_inclusive", FieldKind::BoolList, "Whether each bin end is inclusive")
        .nullable(),
    FieldDescriptor::new("visibility", FieldKind::BoolList, "Visibility of each bin").nullable(),
    DATA_COLORMAP,
    DATA_ORDER,
];

static TEXTURE_2D_IMAGE: [FieldDescriptor; 6] = [
    TITLE,
    DESCRIPTION,
    FieldDescriptor::new("O", FieldKind::Vector, "Origin of the texture"),
    FieldDescriptor::new("U", FieldKind::Vector, "U axis of the texture"),
    FieldDescriptor::new("V", FieldKind::Vector, "V axis of the texture"),
    FieldDescriptor::new("image", FieldKind::Image, "PNG image file").hook(limit_field_bytes),
];

static RESOURCE_OPTIONS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("color", FieldKind::Color(Palette::Twenty), "Solid color")
        .default(DefaultValue::RandomColor(Palette::Twenty)),
    FieldDescriptor::new(
        "opacity",
        FieldKind::Float {
            min: Some(0.0),
            max: Some(1.0),
        },
        "Opacity",
    )
    .default(DefaultValue::Float(1.0)),
];

static MESH_OPTIONS: [FieldDescriptor; 1] = [FieldDescriptor::new(
    "wireframe",
    FieldKind::Bool,
    "Wireframe",
)
.default(DefaultValue::Bool(false))];

// =============================================================================
// LOOKUP
// =============================================================================

/// Declared fields of `kind`, in declaration order.
pub fn schema(kind: ObjectKind) -> &'static [FieldDescriptor] {
    match kind {
        K::Project => &PROJECT,
        K::Point => &POINT,
        K::Surface => &SURFACE,
        K::Volume => &VOLUME,
        K::VectorField => &VECTOR_FIELD,
        K::Mesh0D => &MESH_0D,
        K::Mesh2D => &MESH_2D,
        K::Mesh2DGrid => &MESH_2D_GRID,
        K::Mesh3DGrid => &MESH_3D_GRID,
        K::Binding => &BINDING,
        K::DataArray => &DATA_ARRAY,
        K::DataCategory => &DATA_CATEGORY,
        K::DataDiscrete => &DATA_DISCRETE,
        K::Texture2DImage => &TEXTURE_2D_IMAGE,
        K::ResourceOptions => &RESOURCE_OPTIONS,
        K::MeshOptions => &MESH_OPTIONS,
    }
}

/// Position of field `name` in the schema of `kind`.
pub fn field_index(kind: ObjectKind, name: &str) -> Option<usize> {
    schema(kind).iter().position(|f| f.name == name)
}
