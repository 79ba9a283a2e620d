//! The object arena.
//!
//! A [`Scene`] owns every object of a scene graph. Objects are addressed by
//! [`Handle`]s and never removed. All field mutation goes through
//! [`Scene::set`], which validates the input, records the field as dirty and
//! keeps inverse reference fields (project <-> resource) in sync.

mod dirty;
mod graph;
mod payload;
mod sync;
mod walk;

pub use payload::DirtyPayload;
pub(crate) use payload::value_byte_size;
pub use sync::{SyncEntry, SyncError, SyncPlan, Uploader};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::{ConstraintError, Error};
use crate::field::{DefaultValue, FieldContext, HandleResolver, Wire};
use crate::limits::SceneConfig;
use crate::model::{Handle, ObjectKind, RawValue, Rgb, Value};
use crate::schema::{field_index, schema};

/// One object in the arena.
#[derive(Debug, Clone)]
struct Node {
    kind: ObjectKind,
    /// Current values, indexed like the kind's schema.
    values: Vec<Option<Value>>,
    /// Revision of the last unsent change per field, indexed like the
    /// kind's schema. Zero means clean.
    dirty: Vec<u64>,
    /// Whether the object has been transmitted at least once.
    synced: bool,
}

/// Arena of validated objects.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    /// Bumped on every change that marks a field dirty.
    revision: u64,
    rng: StdRng,
    config: SceneConfig,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Creates an empty scene.
    pub fn with_config(config: SceneConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            nodes: Vec::new(),
            revision: 0,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Number of objects in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates an object of `kind` with its declared defaults applied.
    ///
    /// Defaults are not dirty. A new object is transmitted in full on its
    /// first sync regardless.
    pub fn create(&mut self, kind: ObjectKind) -> Handle {
        let fields = schema(kind);
        let handle = Handle::from_index(self.nodes.len());
        self.nodes.push(Node {
            kind,
            values: vec![None; fields.len()],
            dirty: vec![0; fields.len()],
            synced: false,
        });
        for (i, desc) in fields.iter().enumerate() {
            let value = self.default_value(desc.default);
            self.nodes[handle.index()].values[i] = value;
        }
        debug!(kind = %kind, handle = %handle, "created object");
        handle
    }

    fn default_value(&mut self, default: DefaultValue) -> Option<Value> {
        match default {
            DefaultValue::None => None,
            DefaultValue::Bool(b) => Some(Value::Bool(b)),
            DefaultValue::Float(f) => Some(Value::Float(f)),
            DefaultValue::Str(s) => Some(Value::Str(s.to_string())),
            DefaultValue::Vector(v) => Some(Value::Vectors(vec![v])),
            DefaultValue::RandomColor(palette) => {
                Some(Value::Color(Rgb::random(palette, &mut self.rng)))
            }
            DefaultValue::EmptyList => Some(Value::Objects(Vec::new())),
            DefaultValue::NewObject(kind) => Some(Value::Object(self.create(kind))),
        }
    }

    /// Kind of the object behind `handle`.
    pub fn kind(&self, handle: Handle) -> Result<ObjectKind, Error> {
        self.node(handle).map(|n| n.kind)
    }

    /// Current value of `field`, or `None` if unset.
    pub fn get(&self, handle: Handle, field: &str) -> Result<Option<&Value>, Error> {
        let node = self.node(handle)?;
        let index = lookup(node.kind, field)?;
        Ok(node.values[index].as_ref())
    }

    /// Assigns `raw` to `field` of `handle`.
    ///
    /// The value is validated first; on failure nothing changes. After the
    /// value is stored the field's change hook runs, and an error from it
    /// restores the previous value. Assigning a field with an inverse
    /// updates the mirrored field on every added or removed target.
    pub fn set(
        &mut self,
        handle: Handle,
        field: &str,
        raw: impl Into<RawValue>,
    ) -> Result<(), Error> {
        let kind = self.kind(handle)?;
        let index = lookup(kind, field)?;
        let desc = &schema(kind)[index];

        let resolver = KindView(&self.nodes);
        let mut ctx = FieldContext {
            object: kind.name(),
            resolver: &resolver,
            rng: &mut self.rng,
        };
        let mut value = desc.validate(raw.into(), &mut ctx)?;
        if desc.inverse.is_some() {
            if let Some(Value::Objects(handles)) = &mut value {
                dedup_handles(handles);
            }
        }

        let previous = std::mem::replace(&mut self.nodes[handle.index()].values[index], value);
        if let Some(hook) = desc.hook {
            if let Err(err) = hook(self, handle, desc) {
                warn!(kind = %kind, handle = %handle, field = desc.name, error = %err, "rolled back assignment");
                self.nodes[handle.index()].values[index] = previous;
                return Err(err);
            }
        }

        let previous_targets = previous.as_ref().map(|v| v.handles().to_vec()).unwrap_or_default();
        self.maintain_inverse(handle, desc, index, &previous_targets)?;
        self.mark_dirty(handle, index);
        debug!(kind = %kind, handle = %handle, field = desc.name, "set field");
        Ok(())
    }

    /// Stores an already validated value and marks it dirty.
    pub(crate) fn store(&mut self, handle: Handle, index: usize, value: Value) {
        self.nodes[handle.index()].values[index] = Some(value);
        self.mark_dirty(handle, index);
    }

    fn mark_dirty(&mut self, handle: Handle, index: usize) {
        let node = &mut self.nodes[handle.index()];
        if schema(node.kind)[index].wire != Wire::Local {
            self.revision += 1;
            node.dirty[index] = self.revision;
        }
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn node(&self, handle: Handle) -> Result<&Node, Error> {
        self.nodes
            .get(handle.index())
            .ok_or(Error::UnknownHandle(handle))
    }

    /// Owned sub-objects of `handle`, in declaration order.
    pub(crate) fn owned_children(&self, handle: Handle) -> Result<Vec<Handle>, Error> {
        let node = self.node(handle)?;
        let mut out = Vec::new();
        for (desc, value) in schema(node.kind).iter().zip(&node.values) {
            if let (true, Some(v)) = (desc.kind.is_owned_ref(), value) {
                out.extend_from_slice(v.handles());
            }
        }
        Ok(out)
    }
}

impl HandleResolver for Scene {
    fn kind_of(&self, handle: Handle) -> Option<ObjectKind> {
        self.nodes.get(handle.index()).map(|n| n.kind)
    }
}

/// Read-only kind lookup over the arena, borrowed apart from the RNG.
struct KindView<'a>(&'a [Node]);

impl HandleResolver for KindView<'_> {
    fn kind_of(&self, handle: Handle) -> Option<ObjectKind> {
        self.0.get(handle.index()).map(|n| n.kind)
    }
}

fn lookup(kind: ObjectKind, field: &str) -> Result<usize, Error> {
    field_index(kind, field)
        .ok_or_else(|| ConstraintError::new(kind.name(), field, "unknown field").into())
}

/// Removes repeated handles, keeping the first occurrence of each.
fn dedup_handles(handles: &mut Vec<Handle>) {
    let mut seen = FxHashSet::default();
    let before = handles.len();
    handles.retain(|h| seen.insert(*h));
    if handles.len() != before {
        debug!(removed = before - handles.len(), "deduplicated object list");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::limits::Limits;
    use crate::model::NdArray;

    fn seeded() -> Scene {
        Scene::with_config(SceneConfig::new().with_seed(11))
    }

    #[test]
    fn test_create_applies_defaults() {
        let mut scene = seeded();
        let point = scene.create(ObjectKind::Point);
        assert_eq!(scene.get(point, "data").unwrap(), Some(&Value::Objects(vec![])));
        assert_eq!(scene.get(point, "mesh").unwrap(), None);

        let opts = scene.get(point, "opts").unwrap().and_then(Value::as_object).unwrap();
        assert_eq!(scene.kind(opts).unwrap(), ObjectKind::ResourceOptions);
        assert_eq!(scene.get(opts, "opacity").unwrap(), Some(&Value::Float(1.0)));
        assert!(matches!(scene.get(opts, "color").unwrap(), Some(Value::Color(_))));
        assert!(!scene.is_dirty(point).unwrap());
    }

    #[test]
    fn test_failed_assignment_keeps_previous() {
        let mut scene = seeded();
        let mesh = scene.create(ObjectKind::Mesh0D);
        scene.set(mesh, "vertices", vec![[0.0, 0.0, 0.0]]).unwrap();
        let err = scene.set(mesh, "vertices", vec![1.0, 2.0]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Constraint);
        assert_eq!(
            scene.get(mesh, "vertices").unwrap(),
            Some(&Value::Array(NdArray::from(vec![[0.0, 0.0, 0.0]])))
        );
    }

    #[test]
    fn test_hook_rolls_back() {
        let limits = Limits::new().with_max_field_bytes(24);
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(1).with_limits(limits));
        let mesh = scene.create(ObjectKind::Mesh0D);
        scene.set(mesh, "vertices", vec![[0.0, 0.0, 0.0]; 2]).unwrap();
        scene.mark_clean(mesh, true).unwrap();

        let err = scene.set(mesh, "vertices", vec![[0.0, 0.0, 0.0]; 3]).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "{}", err);
        let kept = scene.get(mesh, "vertices").unwrap().and_then(Value::as_array).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(scene.dirty_fields(mesh).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_field_and_handle() {
        let mut scene = seeded();
        let data = scene.create(ObjectKind::DataArray);
        let err = scene.set(data, "colour", "red").unwrap_err();
        assert_eq!(err.to_string(), "[C001] dataarray.colour: unknown field");
        assert_eq!(
            scene.set(Handle::from_index(99), "title", "x"),
            Err(Error::UnknownHandle(Handle::from_index(99)))
        );
    }

    #[test]
    fn test_wrong_kind_reference_rejected() {
        let mut scene = seeded();
        let point = scene.create(ObjectKind::Point);
        let grid = scene.create(ObjectKind::Mesh2DGrid);
        let err = scene.set(point, "mesh", grid).unwrap_err();
        assert!(err.to_string().contains("expected mesh0d"), "{}", err);
    }

    #[test]
    fn test_enum_stores_canonical_key() {
        let mut scene = seeded();
        let binding = scene.create(ObjectKind::Binding);
        scene.set(binding, "location", "cell-center").unwrap();
        assert_eq!(scene.get(binding, "location").unwrap(), Some(&Value::Str("CC".into())));
    }

    #[test]
    fn test_seeded_defaults_reproducible() {
        let color = |seed| {
            let mut scene = Scene::with_config(SceneConfig::new().with_seed(seed));
            let opts = scene.create(ObjectKind::ResourceOptions);
            scene.get(opts, "color").unwrap().cloned()
        };
        assert_eq!(color(5), color(5));
    }
}
