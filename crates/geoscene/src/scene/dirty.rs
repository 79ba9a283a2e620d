//! Dirty tracking.
//!
//! Each object records which of its own fields changed since it was last
//! marked clean. Aggregation over owned sub-objects reports the owning
//! field name without inlining the nested set.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::error::Error;
use crate::model::Handle;
use crate::schema::schema;
use crate::scene::Scene;

impl Scene {
    /// Fields of `handle` that changed, plus every owned-reference field
    /// whose sub-tree holds a change. Declaration order.
    pub fn dirty_fields(&self, handle: Handle) -> Result<Vec<&'static str>, Error> {
        let mut path = FxHashSet::default();
        path.insert(handle);
        self.collect_dirty(handle, &mut path)
    }

    /// Returns true if `handle` or anything it owns has changed.
    pub fn is_dirty(&self, handle: Handle) -> Result<bool, Error> {
        Ok(!self.dirty_fields(handle)?.is_empty())
    }

    /// Fields of `handle` itself that changed, ignoring sub-objects.
    pub fn own_dirty_fields(&self, handle: Handle) -> Result<Vec<&'static str>, Error> {
        let node = self.node(handle)?;
        Ok(schema(node.kind)
            .iter()
            .zip(&node.dirty)
            .filter(|(_, revision)| **revision != 0)
            .map(|(desc, _)| desc.name)
            .collect())
    }

    fn collect_dirty(
        &self,
        handle: Handle,
        path: &mut FxHashSet<Handle>,
    ) -> Result<Vec<&'static str>, Error> {
        let node = self.node(handle)?;
        let mut fields = Vec::new();
        for (i, desc) in schema(node.kind).iter().enumerate() {
            if node.dirty[i] != 0 {
                fields.push(desc.name);
                continue;
            }
            if !desc.kind.is_owned_ref() {
                continue;
            }
            let Some(value) = &node.values[i] else { continue };
            for &child in value.handles() {
                // A handle already on the current path is being aggregated
                // further up and contributes nothing here.
                if !path.insert(child) {
                    continue;
                }
                let child_dirty = !self.collect_dirty(child, path)?.is_empty();
                path.remove(&child);
                if child_dirty {
                    fields.push(desc.name);
                    break;
                }
            }
        }
        trace!(handle = %handle, dirty = ?fields, "aggregated dirty fields");
        Ok(fields)
    }

    /// Clears the dirty set of `handle`, and of everything it owns if
    /// `recursive`.
    pub fn mark_clean(&mut self, handle: Handle, recursive: bool) -> Result<(), Error> {
        let mut visited = FxHashSet::default();
        self.clean(handle, recursive, &mut visited)
    }

    fn clean(
        &mut self,
        handle: Handle,
        recursive: bool,
        visited: &mut FxHashSet<Handle>,
    ) -> Result<(), Error> {
        if !visited.insert(handle) {
            return Ok(());
        }
        self.node(handle)?;
        self.nodes[handle.index()].dirty.fill(0);
        if recursive {
            for child in self.owned_children(handle)? {
                self.clean(child, true, visited)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::limits::SceneConfig;
    use crate::model::{Handle, ObjectKind, RawValue, Value};
    use crate::scene::Scene;

    /// A point with a mesh and one bound data array.
    fn point_scene() -> (Scene, Handle, Handle, Handle, Handle) {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(3));
        let mesh = scene.create(ObjectKind::Mesh0D);
        scene.set(mesh, "vertices", vec![[0.0, 0.0, 0.0]; 2]).unwrap();
        let data = scene.create(ObjectKind::DataArray);
        scene.set(data, "array", vec![1.0, 2.0]).unwrap();
        let binding = scene.create(ObjectKind::Binding);
        scene.set(binding, "data", data).unwrap();
        let point = scene.create(ObjectKind::Point);
        scene.set(point, "mesh", mesh).unwrap();
        scene.set(point, "data", vec![binding]).unwrap();
        (scene, point, mesh, binding, data)
    }

    #[test]
    fn test_nested_change_marks_ancestors() {
        let (mut scene, point, mesh, binding, data) = point_scene();
        scene.mark_clean(point, true).unwrap();
        assert!(!scene.is_dirty(point).unwrap());

        scene.set(data, "title", "temperature").unwrap();
        assert_eq!(scene.dirty_fields(data).unwrap(), vec!["title"]);
        assert_eq!(scene.dirty_fields(binding).unwrap(), vec!["data"]);
        assert_eq!(scene.dirty_fields(point).unwrap(), vec!["data"]);
        assert!(scene.dirty_fields(mesh).unwrap().is_empty());
        assert!(scene.own_dirty_fields(point).unwrap().is_empty());
    }

    #[test]
    fn test_non_recursive_clean() {
        let (mut scene, point, mesh, ..) = point_scene();
        scene.mark_clean(point, false).unwrap();
        assert_eq!(scene.dirty_fields(point).unwrap(), vec!["mesh", "data"]);
        assert_eq!(scene.dirty_fields(mesh).unwrap(), vec!["vertices"]);
    }

    #[test]
    fn test_back_references_are_not_aggregated() {
        let (mut scene, point, ..) = point_scene();
        let project = scene.create(ObjectKind::Project);
        scene.set(project, "resources", vec![point]).unwrap();
        scene.mark_clean(project, true).unwrap();

        scene.set(project, "title", "survey").unwrap();
        assert!(!scene.is_dirty(point).unwrap());
        assert_eq!(scene.dirty_fields(project).unwrap(), vec!["title"]);
    }

    fn edit() -> impl Strategy<Value = (usize, RawValue)> {
        prop_oneof![
            Just((0, RawValue::from("renamed"))),
            (0.0f64..1.0).prop_map(|v| (1, RawValue::from(v))),
            Just((2, RawValue::from("col"))),
            (1.0f64..9.0).prop_map(|v| (3, RawValue::from(vec![v, v]))),
        ]
    }

    proptest! {
        #[test]
        fn prop_single_assignment_dirties_only_its_chain(edits in prop::collection::vec(edit(), 1..8)) {
            let (mut scene, point, mesh, binding, data) = point_scene();
            let opts = scene.get(point, "opts").unwrap().and_then(Value::as_object).unwrap();
            for (target, raw) in edits {
                scene.mark_clean(point, true).unwrap();
                prop_assert!(scene.dirty_fields(point).unwrap().is_empty());

                let (handle, field) = match target {
                    0 => (point, "title"),
                    1 => (opts, "opacity"),
                    2 => (data, "order"),
                    _ => (data, "array"),
                };
                scene.set(handle, field, raw).unwrap();

                prop_assert_eq!(scene.dirty_fields(handle).unwrap(), vec![field]);
                prop_assert!(scene.dirty_fields(mesh).unwrap().is_empty());
                let expected_point: Vec<&str> = match target {
                    0 => vec!["title"],
                    1 => vec!["opts"],
                    _ => vec!["data"],
                };
                prop_assert_eq!(scene.dirty_fields(point).unwrap(), expected_point);
                prop_assert_eq!(scene.is_dirty(binding).unwrap(), target >= 2);
            }
        }
    }
}
