//! Object-level validation rules.
//!
//! Field validation only sees one value at a time. The rules here span
//! several fields or objects: data lengths against the bound mesh, category
//! indices against their names and colors, discrete bin layouts, and the
//! project quotas.

mod mesh;

pub use mesh::{BoundData, MeshTopology, MeshView};

use tracing::{debug, warn};

use crate::error::{ConsistencyError, ConstraintError, Error, RequiredFieldMissing};
use crate::field::FieldDescriptor;
use crate::model::{Handle, Location, ObjectKind, Palette, Rgb, Value};
use crate::schema::{field_index, schema};
use crate::scene::{Scene, value_byte_size};

// =============================================================================
// FIELD HOOKS
// =============================================================================

/// Rejects a stored array, vector or image whose encoded size exceeds the
/// scene's per-field ceiling.
pub fn limit_field_bytes(scene: &Scene, handle: Handle, desc: &FieldDescriptor) -> Result<(), Error> {
    let Some(value) = scene.get(handle, desc.name)? else {
        return Ok(());
    };
    let bytes = value_byte_size(value);
    let limit = scene.config().limits.max_field_bytes;
    if bytes > limit {
        return Err(ConstraintError::new(
            scene.kind(handle)?.name(),
            desc.name,
            format!("file size {} bytes exceeds the {} byte limit", bytes, limit),
        )
        .into());
    }
    Ok(())
}

fn run_hooks(scene: &Scene, handle: Handle, kind: ObjectKind) -> Result<(), Error> {
    for desc in schema(kind) {
        if let Some(hook) = desc.hook {
            if let Err(err) = hook(scene, handle, desc) {
                warn!(handle = %handle, field = desc.name, error = %err, "field check failed");
                return Err(err);
            }
        }
    }
    Ok(())
}

// =============================================================================
// DEFAULTS
// =============================================================================

/// Fills the unset presentation fields of a discrete data object from its
/// bin edges: one color and one visibility flag per bin, and inclusive bin
/// ends. Other kinds are left unchanged.
pub fn fill_defaults(scene: &mut Scene, handle: Handle) -> Result<(), Error> {
    if scene.kind(handle)? != ObjectKind::DataDiscrete {
        return Ok(());
    }
    let edges = match scene.get(handle, "end_values")?.and_then(Value::as_array) {
        Some(array) => array.len(),
        None => return Ok(()),
    };
    if let Some(index) = unset_index(scene, handle, "colormap")? {
        let colors: Vec<Rgb> = (0..=edges)
            .map(|_| Rgb::random(Palette::Twenty, scene.rng()))
            .collect();
        scene.store(handle, index, Value::ColorList(colors));
        debug!(handle = %handle, bins = edges + 1, "generated discrete colormap");
    }
    if let Some(index) = unset_index(scene, handle, "end_inclusive")? {
        scene.store(handle, index, Value::BoolList(vec![true; edges]));
    }
    if let Some(index) = unset_index(scene, handle, "visibility")? {
        scene.store(handle, index, Value::BoolList(vec![true; edges + 1]));
    }
    Ok(())
}

/// Schema position of `name` if the field is unset.
fn unset_index(scene: &Scene, handle: Handle, name: &str) -> Result<Option<usize>, Error> {
    let index = field_index(scene.kind(handle)?, name);
    Ok(match scene.get(handle, name)? {
        None => index,
        Some(_) => None,
    })
}

// =============================================================================
// OBJECT RULES
// =============================================================================

/// Runs the rules of `handle`'s kind, then its field hooks.
pub fn check_object(scene: &Scene, handle: Handle) -> Result<(), Error> {
    let kind = scene.kind(handle)?;
    match kind {
        ObjectKind::Project => check_project(scene, handle)?,
        kind if kind.is_resource() => check_resource(scene, handle, kind)?,
        kind if kind.is_mesh() => MeshView::load(scene, handle)?.check()?,
        ObjectKind::DataCategory => check_category(scene, handle)?,
        ObjectKind::DataDiscrete => check_discrete(scene, handle)?,
        ObjectKind::Texture2DImage => check_texture(scene, handle)?,
        _ => {}
    }
    run_hooks(scene, handle, kind)
}

fn required<'a, T>(
    scene: &'a Scene,
    handle: Handle,
    kind: ObjectKind,
    field: &'static str,
    read: impl FnOnce(&'a Value) -> Option<T>,
) -> Result<T, Error> {
    scene
        .get(handle, field)?
        .and_then(read)
        .ok_or_else(|| RequiredFieldMissing { object: kind.name(), field }.into())
}

fn check_project(scene: &Scene, project: Handle) -> Result<(), Error> {
    let resources = scene
        .get(project, "resources")?
        .map(Value::handles)
        .unwrap_or_default();
    for &resource in resources {
        if !scene.references(resource, "projects", project)? {
            return Err(ConsistencyError::BackReference { project, resource }.into());
        }
    }

    let limits = scene.config().limits;
    if let Some(limit) = limits.max_project_resources {
        if resources.len() > limit {
            return Err(ConsistencyError::ResourceLimit {
                count: resources.len(),
                limit,
            }
            .into());
        }
    }
    if let Some(limit) = limits.max_project_bytes {
        let bytes = scene.total_byte_size(project)?;
        if bytes > limit {
            return Err(ConsistencyError::ProjectSize { bytes, limit }.into());
        }
    }
    Ok(())
}

fn check_resource(scene: &Scene, resource: Handle, kind: ObjectKind) -> Result<(), Error> {
    let mesh_handle = required(scene, resource, kind, "mesh", Value::as_object)?;
    let mesh = MeshView::load(scene, mesh_handle)?;

    let bindings = scene
        .get(resource, "data")?
        .map(Value::handles)
        .unwrap_or_default();
    let mut bound = Vec::with_capacity(bindings.len());
    for &binding in bindings {
        bound.push(bound_data(scene, binding)?);
    }
    mesh.validate_bindings(kind, &bound)?;

    if kind == ObjectKind::VectorField {
        if let Some(vectors) = scene.get(resource, "vectors")?.and_then(Value::as_array) {
            if vectors.len() != mesh.node_count() {
                return Err(ConsistencyError::VectorLength {
                    expected: mesh.node_count(),
                    actual: vectors.len(),
                }
                .into());
            }
        }
    }
    Ok(())
}

fn bound_data(scene: &Scene, binding: Handle) -> Result<BoundData, Error> {
    let kind = ObjectKind::Binding;
    let location = required(scene, binding, kind, "location", |v| match v {
        Value::Str(tag) => Location::from_tag(tag),
        _ => None,
    })?;
    let data = required(scene, binding, kind, "data", Value::as_object)?;
    let data_kind = scene.kind(data)?;
    let array = required(scene, data, data_kind, "array", Value::as_array)?;
    Ok(BoundData {
        location,
        len: array.len(),
    })
}

fn check_category(scene: &Scene, handle: Handle) -> Result<(), Error> {
    let array = required(scene, handle, ObjectKind::DataCategory, "array", Value::as_array)?;
    let max_index = array
        .as_ints()
        .and_then(|ints| ints.iter().copied().max())
        .unwrap_or(-1);

    let categories = match scene.get(handle, "categories")? {
        Some(Value::StrList(names)) => Some(names.len()),
        _ => None,
    };
    let colormap = match scene.get(handle, "colormap")? {
        Some(Value::ColorList(colors)) => Some(colors.len()),
        _ => None,
    };

    for (what, len) in [("categories", categories), ("colors", colormap)] {
        if let Some(len) = len {
            if max_index >= len as i64 {
                return Err(ConsistencyError::CategoryIndexOutOfRange {
                    what,
                    max_index,
                    len,
                }
                .into());
            }
        }
    }
    if let (Some(categories), Some(colormap)) = (categories, colormap) {
        if categories != colormap {
            return Err(ConsistencyError::CategoryColormapMismatch {
                categories,
                colormap,
            }
            .into());
        }
    }
    Ok(())
}

fn check_discrete(scene: &Scene, handle: Handle) -> Result<(), Error> {
    let edges = required(scene, handle, ObjectKind::DataDiscrete, "end_values", Value::as_array)?
        .to_f64_vec();
    for (index, &value) in edges.iter().enumerate() {
        if !value.is_finite() {
            return Err(ConsistencyError::NonFiniteBinEdge { index, value }.into());
        }
    }
    for (index, pair) in edges.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(ConsistencyError::BinEdgesNotIncreasing {
                index: index + 1,
                previous: pair[0],
                value: pair[1],
            }
            .into());
        }
    }

    let n = edges.len();
    let expected = [("end_inclusive", n), ("visibility", n + 1), ("colormap", n + 1)];
    for (field, expected) in expected {
        let actual = match scene.get(handle, field)? {
            Some(Value::BoolList(flags)) => flags.len(),
            Some(Value::ColorList(colors)) => colors.len(),
            _ => continue,
        };
        if actual != expected {
            return Err(ConsistencyError::DiscreteLength {
                field,
                expected,
                actual,
                edges: n,
            }
            .into());
        }
    }
    Ok(())
}

fn check_texture(scene: &Scene, handle: Handle) -> Result<(), Error> {
    let kind = ObjectKind::Texture2DImage;
    for field in ["O", "U", "V"] {
        let count = required(scene, handle, kind, field, |v| match v {
            Value::Vectors(vs) => Some(vs.len()),
            _ => None,
        })?;
        if count != 1 {
            return Err(ConsistencyError::VectorCount {
                object: kind.name(),
                field,
                count,
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::limits::{Limits, PNG_SIGNATURE, SceneConfig};
    use crate::model::COLORS_20;

    fn scene() -> Scene {
        Scene::with_config(SceneConfig::new().with_seed(17))
    }

    fn point_with_data(scene: &mut Scene, vertices: usize, values: usize) -> Handle {
        let mesh = scene.create(ObjectKind::Mesh0D);
        scene.set(mesh, "vertices", vec![[0.0, 0.0, 0.0]; vertices]).unwrap();
        let data = scene.create(ObjectKind::DataArray);
        scene.set(data, "array", vec![1.5; values]).unwrap();
        let binding = scene.create(ObjectKind::Binding);
        scene.set(binding, "data", data).unwrap();
        let point = scene.create(ObjectKind::Point);
        scene.set(point, "mesh", mesh).unwrap();
        scene.set(point, "data", vec![binding]).unwrap();
        point
    }

    #[test]
    fn test_binding_length_mismatch() {
        let mut scene = scene();
        let point = point_with_data(&mut scene, 5, 4);
        let err = scene.validate_all(point).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Consistency);
        assert_eq!(
            err.to_string(),
            "[C003] point.data[0] length 4 does not match node length 5"
        );

        let ok = point_with_data(&mut scene, 5, 5);
        assert_eq!(scene.validate_all(ok), Ok(true));
    }

    #[test]
    fn test_category_index_bounds() {
        let mut scene = scene();
        let data = scene.create(ObjectKind::DataCategory);
        for bad in [vec![0i64, 300], vec![-2, 1]] {
            let err = scene.set(data, "array", bad).unwrap_err();
            assert!(matches!(err, Error::Constraint(_)), "{}", err);
        }
        scene.set(data, "array", vec![0i64, -1, 255]).unwrap();
        assert_eq!(scene.validate_all(data), Ok(true));
    }

    #[test]
    fn test_category_names_and_colors() {
        let mut scene = scene();
        let data = scene.create(ObjectKind::DataCategory);
        scene.set(data, "array", vec![0i64, 2, -1]).unwrap();
        scene.set(data, "categories", vec!["sand", "clay"]).unwrap();
        let err = scene.validate_all(data).unwrap_err();
        assert_eq!(
            err,
            Error::Consistency(ConsistencyError::CategoryIndexOutOfRange {
                what: "categories",
                max_index: 2,
                len: 2,
            })
        );

        scene.set(data, "categories", vec!["sand", "clay", "silt"]).unwrap();
        scene.set(data, "colormap", vec!["red", "blue", "green", "black"]).unwrap();
        let err = scene.validate_all(data).unwrap_err();
        assert!(matches!(
            err,
            Error::Consistency(ConsistencyError::CategoryColormapMismatch { categories: 3, colormap: 4 })
        ));

        scene.set(data, "colormap", vec!["red", "blue", "green"]).unwrap();
        assert_eq!(scene.validate_all(data), Ok(true));
    }

    #[test]
    fn test_discrete_colormap_length() {
        let mut scene = scene();
        let data = scene.create(ObjectKind::DataDiscrete);
        scene.set(data, "array", vec![0.5, 1.5, 2.5]).unwrap();
        scene.set(data, "end_values", vec![1.0, 2.0]).unwrap();
        scene.set(data, "colormap", vec!["red", "blue"]).unwrap();
        let err = scene.validate_all(data).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[C003] colormap length 2 must be 3 for 2 end_values"
        );
    }

    #[test]
    fn test_discrete_bin_edges() {
        let mut scene = scene();
        let data = scene.create(ObjectKind::DataDiscrete);
        scene.set(data, "array", vec![0.5]).unwrap();
        scene.set(data, "end_values", vec![1.0, 1.0]).unwrap();
        let err = scene.validate_all(data).unwrap_err();
        assert!(matches!(
            err,
            Error::Consistency(ConsistencyError::BinEdgesNotIncreasing { index: 1, .. })
        ));

        scene.set(data, "end_values", vec![1.0, f64::NAN]).unwrap();
        let err = scene.validate_all(data).unwrap_err();
        assert!(matches!(
            err,
            Error::Consistency(ConsistencyError::NonFiniteBinEdge { index: 1, .. })
        ));
    }

    #[test]
    fn test_generated_colormap_is_seeded() {
        let build = || {
            let mut scene = scene();
            let data = scene.create(ObjectKind::DataDiscrete);
            scene.set(data, "array", vec![0.5, 3.5]).unwrap();
            scene.set(data, "end_values", vec![1.0, 2.0, 3.0]).unwrap();
            scene.validate_all(data).unwrap();
            (scene, data)
        };
        let (a, data) = build();
        let (b, _) = build();

        let Some(Value::ColorList(colors)) = a.get(data, "colormap").unwrap() else {
            panic!("colormap not generated");
        };
        assert_eq!(colors.len(), 4);
        assert!(colors.iter().all(|c| COLORS_20.iter().any(|hex| Rgb::from_hex(hex) == Some(*c))));
        assert_eq!(a.get(data, "colormap").unwrap(), b.get(data, "colormap").unwrap());
        assert_eq!(
            a.get(data, "visibility").unwrap(),
            Some(&Value::BoolList(vec![true; 4]))
        );
        assert_eq!(
            a.get(data, "end_inclusive").unwrap(),
            Some(&Value::BoolList(vec![true; 3]))
        );
        assert!(a.dirty_fields(data).unwrap().contains(&"colormap"));
    }

    #[test]
    fn test_grid_surface_end_to_end() {
        let mut scene = scene();
        let grid = scene.create(ObjectKind::Mesh2DGrid);
        scene.set(grid, "h1", vec![1.0, 1.0, 1.0]).unwrap();
        scene.set(grid, "h2", vec![1.0, 1.0]).unwrap();
        scene.set(grid, "Z", vec![0.0; 12]).unwrap();
        let data = scene.create(ObjectKind::DataArray);
        scene.set(data, "array", (0..12).map(f64::from).collect::<Vec<_>>()).unwrap();
        let binding = scene.create(ObjectKind::Binding);
        scene.set(binding, "data", data).unwrap();
        let surface = scene.create(ObjectKind::Surface);
        scene.set(surface, "mesh", grid).unwrap();
        scene.set(surface, "data", vec![binding]).unwrap();

        assert_eq!(scene.validate_all(surface), Ok(true));
        assert_eq!(scene.node_count(grid).unwrap(), 12);
        assert_eq!(scene.cell_count(grid).unwrap(), 6);

        let mesh_payload = scene.get_dirty_payload(grid, true).unwrap();
        assert!(mesh_payload.json.contains_key("tensors"));
        assert_eq!(mesh_payload.json["OUV"]["U"], serde_json::json!([3.0, 0.0, 0.0]));
        assert_eq!(mesh_payload.binary["Z"].shape, vec![12]);
        let data_payload = scene.get_dirty_payload(data, true).unwrap();
        assert_eq!(data_payload.binary["array"].len(), 48);
    }

    #[test]
    fn test_cell_center_binding_on_grid() {
        let mut scene = scene();
        let grid = scene.create(ObjectKind::Mesh2DGrid);
        scene.set(grid, "h1", vec![1.0, 1.0]).unwrap();
        scene.set(grid, "h2", vec![1.0]).unwrap();
        let data = scene.create(ObjectKind::DataArray);
        scene.set(data, "array", vec![1i64, 2, 3]).unwrap();
        let binding = scene.create(ObjectKind::Binding);
        scene.set(binding, "location", "face").unwrap();
        scene.set(binding, "data", data).unwrap();
        let surface = scene.create(ObjectKind::Surface);
        scene.set(surface, "mesh", grid).unwrap();
        scene.set(surface, "data", vec![binding]).unwrap();
        let err = scene.validate_all(surface).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[C003] surface.data[0] length 3 does not match cell-center length 2"
        );
    }

    #[test]
    fn test_vector_field_length() {
        let mut scene = scene();
        let mesh = scene.create(ObjectKind::Mesh0D);
        scene.set(mesh, "vertices", vec![[0.0, 0.0, 0.0]; 3]).unwrap();
        let field = scene.create(ObjectKind::VectorField);
        scene.set(field, "mesh", mesh).unwrap();
        scene.set(field, "vectors", vec![[1.0, 0.0, 0.0]; 2]).unwrap();
        let err = scene.validate_all(field).unwrap_err();
        assert_eq!(
            err,
            Error::Consistency(ConsistencyError::VectorLength { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_texture_vectors() {
        let mut scene = scene();
        let texture = scene.create(ObjectKind::Texture2DImage);
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(&[0u8; 8]);
        scene.set(texture, "image", png).unwrap();
        scene.set(texture, "O", [0.0, 0.0, 0.0]).unwrap();
        scene.set(texture, "U", vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]).unwrap();
        scene.set(texture, "V", "y").unwrap();
        let err = scene.validate_all(texture).unwrap_err();
        assert!(matches!(
            err,
            Error::Consistency(ConsistencyError::VectorCount { field: "U", count: 2, .. })
        ));
        scene.set(texture, "U", "x").unwrap();
        assert_eq!(scene.validate_all(texture), Ok(true));
    }

    #[test]
    fn test_project_quotas() {
        let limits = Limits::new().with_max_project_resources(1).with_max_project_bytes(40);
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(3).with_limits(limits));
        let a = point_with_data(&mut scene, 2, 2);
        let b = point_with_data(&mut scene, 2, 2);
        let project = scene.create(ObjectKind::Project);

        scene.set(project, "resources", vec![a, b]).unwrap();
        let err = scene.validate_all(project).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[C003] total number of resources in project (2) exceeds limit: 1"
        );

        // Two vertices (24 bytes) plus two float values (8 bytes) fit.
        scene.set(project, "resources", vec![a]).unwrap();
        assert_eq!(scene.validate_all(project), Ok(true));

        let big = point_with_data(&mut scene, 4, 4);
        scene.set(project, "resources", vec![big]).unwrap();
        let err = scene.validate_all(project).unwrap_err();
        assert_eq!(
            err,
            Error::Consistency(ConsistencyError::ProjectSize { bytes: 64, limit: 40 })
        );
    }
}
