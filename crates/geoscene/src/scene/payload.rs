//! Dirty payload serialization and byte accounting.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde_json::{Map, Value as Json, json};
use tracing::trace;

use crate::codec::{self, ArrayPayload};
use crate::error::{ConstraintError, Error, RequiredFieldMissing};
use crate::field::{ArrayCodec, FieldDescriptor, FieldKind, Wire};
use crate::limits::WIRE_ITEM_SIZE;
use crate::model::{Handle, NdArray, ObjectKind, Value};
use crate::schema::schema;
use crate::scene::Scene;

/// Changed fields of one object, split into JSON metadata and binary files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirtyPayload {
    pub json: Map<String, Json>,
    pub binary: BTreeMap<String, ArrayPayload>,
}

impl DirtyPayload {
    pub fn is_empty(&self) -> bool {
        self.json.is_empty() && self.binary.is_empty()
    }

    /// Total size of the binary files.
    pub fn binary_len(&self) -> usize {
        self.binary.values().map(ArrayPayload::len).sum()
    }
}

impl Scene {
    /// Serializes the dirty fields of `handle`, or every field if `force`.
    ///
    /// Back-references are never included. Nested objects appear as handle
    /// indices; their own fields travel in their own payloads.
    pub fn get_dirty_payload(&self, handle: Handle, force: bool) -> Result<DirtyPayload, Error> {
        let node = self.node(handle)?;
        let fields = schema(node.kind);
        let mut payload = DirtyPayload::default();

        for (i, desc) in fields.iter().enumerate() {
            if !(force || node.dirty[i] != 0) {
                continue;
            }
            let value = node.values[i].as_ref();
            match desc.wire {
                Wire::Local | Wire::Derived => {}
                Wire::Json => {
                    let json = value.map(Value::to_json).unwrap_or(Json::Null);
                    payload.json.insert(desc.name.to_string(), json);
                }
                Wire::Binary => match value {
                    Some(value) => {
                        let file = self.encode_binary(node.kind, desc, value)?;
                        payload.binary.insert(desc.name.to_string(), file);
                    }
                    // A cleared file is announced in the metadata.
                    None => {
                        payload.json.insert(desc.name.to_string(), Json::Null);
                    }
                },
            }
        }

        if matches!(node.kind, ObjectKind::Mesh2DGrid | ObjectKind::Mesh3DGrid) {
            self.grid_entries(handle, force, &mut payload.json)?;
        }
        trace!(
            handle = %handle,
            json = payload.json.len(),
            binary_bytes = payload.binary_len(),
            "built dirty payload"
        );
        Ok(payload)
    }

    fn encode_binary(
        &self,
        kind: ObjectKind,
        desc: &FieldDescriptor,
        value: &Value,
    ) -> Result<ArrayPayload, Error> {
        let file = match (desc.kind, value) {
            (FieldKind::Array(spec), Value::Array(array)) => match spec.codec {
                ArrayCodec::Plain => codec::serialize(array)?,
                ArrayCodec::Index => codec::serialize_index(array)?,
            },
            (FieldKind::Image, Value::Bytes(bytes)) => codec::encode_png(bytes)?,
            _ => {
                return Err(ConstraintError::new(
                    kind.name(),
                    desc.name,
                    format!("{} value cannot be sent as a file", value.type_name()),
                )
                .into());
            }
        };
        let limit = self.config.limits.max_field_bytes;
        if file.len() as u64 > limit {
            return Err(ConstraintError::new(
                kind.name(),
                desc.name,
                format!("file size {} bytes exceeds the {} byte limit", file.len(), limit),
            )
            .into());
        }
        Ok(file)
    }

    /// Derived grid entries: `tensors` when a cell width changed, and the
    /// `OUV` (2-D) or `OUVZ` (3-D) descriptor when a width or the origin
    /// changed.
    fn grid_entries(
        &self,
        handle: Handle,
        force: bool,
        json: &mut Map<String, Json>,
    ) -> Result<(), Error> {
        let node = self.node(handle)?;
        let axes: &[&'static str] = match node.kind {
            ObjectKind::Mesh3DGrid => &["h1", "h2", "h3"],
            _ => &["h1", "h2"],
        };
        let own = self.own_dirty_fields(handle)?;
        let widths_dirty = axes.iter().any(|a| own.contains(a));
        let origin_dirty = own.contains(&"x0");
        if !(force || widths_dirty || origin_dirty) {
            return Ok(());
        }

        let mut widths: Vec<&NdArray> = Vec::with_capacity(axes.len());
        for axis in axes {
            match self.get(handle, axis)?.and_then(Value::as_array) {
                Some(array) => widths.push(array),
                None => {
                    return Err(RequiredFieldMissing {
                        object: node.kind.name(),
                        field: *axis,
                    }
                    .into());
                }
            }
        }

        if force || widths_dirty {
            let tensors: Map<String, Json> = axes
                .iter()
                .zip(&widths)
                .map(|(axis, w)| (axis.to_string(), w.to_json()))
                .collect();
            json.insert("tensors".to_string(), Json::Object(tensors));
        }

        let origin = match self.get(handle, "x0")? {
            Some(Value::Vectors(vs)) if !vs.is_empty() => vs[0],
            _ => {
                return Err(RequiredFieldMissing {
                    object: node.kind.name(),
                    field: "x0",
                }
                .into());
            }
        };
        let extent: Vec<f64> = widths.iter().map(|w| w.sum()).collect();
        if axes.len() == 3 {
            json.insert(
                "OUVZ".to_string(),
                json!({
                    "O": origin,
                    "U": [extent[0], 0.0, 0.0],
                    "V": [0.0, extent[1], 0.0],
                    "Z": [0.0, 0.0, extent[2]],
                }),
            );
        } else {
            json.insert(
                "OUV".to_string(),
                json!({
                    "O": origin,
                    "U": [extent[0], 0.0, 0.0],
                    "V": [0.0, extent[1], 0.0],
                }),
            );
        }
        Ok(())
    }

    /// Encoded size of every array, vector and image owned by `handle`,
    /// counted once per object.
    pub fn total_byte_size(&self, handle: Handle) -> Result<u64, Error> {
        let mut visited = FxHashSet::default();
        self.sum_bytes(handle, &mut visited)
    }

    fn sum_bytes(&self, handle: Handle, visited: &mut FxHashSet<Handle>) -> Result<u64, Error> {
        if !visited.insert(handle) {
            return Ok(0);
        }
        let node = self.node(handle)?;
        let mut total = 0u64;
        for (desc, value) in schema(node.kind).iter().zip(&node.values) {
            let Some(value) = value else { continue };
            if desc.kind.is_owned_ref() {
                for &child in value.handles() {
                    total += self.sum_bytes(child, visited)?;
                }
            } else {
                total += value_byte_size(value);
            }
        }
        Ok(total)
    }
}

/// Encoded size of a single stored value; zero for metadata.
pub(crate) fn value_byte_size(value: &Value) -> u64 {
    match value {
        Value::Array(array) => codec::encoded_len(array) as u64,
        Value::Vectors(vs) => (vs.len() * 3 * WIRE_ITEM_SIZE) as u64,
        Value::Bytes(bytes) => bytes.len() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::codec::WireDtype;
    use crate::limits::{Limits, PNG_SIGNATURE, SceneConfig};
    use crate::model::ObjectKind;
    use crate::scene::Scene;

    #[test]
    fn test_only_dirty_fields_sent() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(2));
        let data = scene.create(ObjectKind::DataArray);
        scene.set(data, "array", vec![1i64, 2, 3]).unwrap();
        scene.set(data, "title", "depth").unwrap();
        scene.mark_clean(data, true).unwrap();
        scene.set(data, "order", "fortran").unwrap();

        let payload = scene.get_dirty_payload(data, false).unwrap();
        assert_eq!(payload.json.get("order"), Some(&json!("f")));
        assert_eq!(payload.json.len(), 1);
        assert!(payload.binary.is_empty());

        let full = scene.get_dirty_payload(data, true).unwrap();
        assert_eq!(full.json.get("title"), Some(&json!("depth")));
        assert_eq!(full.json.get("description"), Some(&json!(null)));
        assert_eq!(full.binary["array"].dtype, WireDtype::I4);
        assert_eq!(full.binary["array"].len(), 12);
    }

    #[test]
    fn test_cleared_file_sent_as_null() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(2));
        let grid = scene.create(ObjectKind::Mesh2DGrid);
        scene.set(grid, "h1", vec![1.0]).unwrap();
        scene.set(grid, "h2", vec![1.0]).unwrap();
        scene.set(grid, "Z", vec![0.0; 4]).unwrap();
        scene.mark_clean(grid, false).unwrap();

        scene.set(grid, "Z", None::<f64>).unwrap();
        let payload = scene.get_dirty_payload(grid, false).unwrap();
        assert_eq!(payload.json.get("Z"), Some(&json!(null)));
        assert!(payload.binary.is_empty());
        assert!(!payload.json.contains_key("tensors"));
    }

    #[test]
    fn test_category_array_uses_index_codec() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(2));
        let data = scene.create(ObjectKind::DataCategory);
        scene.set(data, "array", vec![0i64, -1, 2]).unwrap();
        let payload = scene.get_dirty_payload(data, false).unwrap();
        let file = &payload.binary["array"];
        assert_eq!(file.dtype, WireDtype::F4);
        assert!(f32::from_le_bytes(file.bytes[4..8].try_into().unwrap()).is_nan());
    }

    #[test]
    fn test_back_references_not_sent() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(2));
        let project = scene.create(ObjectKind::Project);
        let point = scene.create(ObjectKind::Point);
        scene.set(project, "resources", vec![point]).unwrap();

        let payload = scene.get_dirty_payload(point, true).unwrap();
        assert!(!payload.json.contains_key("projects"));
        let project_payload = scene.get_dirty_payload(project, false).unwrap();
        assert_eq!(project_payload.json["resources"], json!([point.index()]));
    }

    #[test]
    fn test_field_ceiling_on_serialize() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(2));
        let texture = scene.create(ObjectKind::Texture2DImage);
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(&[0u8; 64]);
        scene.set(texture, "image", png).unwrap();

        let mut small = scene.clone();
        small.config.limits = Limits::new().with_max_field_bytes(16);
        let err = small.get_dirty_payload(texture, false).unwrap_err();
        assert!(err.to_string().contains("exceeds the 16 byte limit"), "{}", err);
        assert_eq!(scene.get_dirty_payload(texture, false).unwrap().binary["image"].dtype, WireDtype::Png);
    }

    #[test]
    fn test_total_byte_size() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(2));
        let grid = scene.create(ObjectKind::Mesh2DGrid);
        scene.set(grid, "h1", vec![1.0; 3]).unwrap();
        scene.set(grid, "h2", vec![1.0; 2]).unwrap();
        let surface = scene.create(ObjectKind::Surface);
        scene.set(surface, "mesh", grid).unwrap();
        // h1 + h2 + one origin vector.
        assert_eq!(scene.total_byte_size(surface).unwrap(), (3 + 2 + 3) * 4);
    }
}
