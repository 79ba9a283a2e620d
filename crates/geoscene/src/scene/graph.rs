//! Inverse reference maintenance.
//!
//! A field declared with an inverse (project `resources`, resource
//! `projects`) is mirrored on every object it references: after an
//! assignment, each newly referenced target lists the owner in its inverse
//! field and each dropped target no longer does. Mirror writes go straight
//! to storage and never cascade.

use tracing::debug;

use crate::error::{ConstraintError, Error};
use crate::field::FieldDescriptor;
use crate::model::{Handle, Value};
use crate::schema::field_index;
use crate::scene::Scene;

impl Scene {
    pub(super) fn maintain_inverse(
        &mut self,
        owner: Handle,
        desc: &FieldDescriptor,
        index: usize,
        previous: &[Handle],
    ) -> Result<(), Error> {
        let Some(inverse) = desc.inverse else {
            return Ok(());
        };
        let current: Vec<Handle> = self.nodes[owner.index()].values[index]
            .as_ref()
            .map(|v| v.handles().to_vec())
            .unwrap_or_default();

        for target in current.iter().filter(|h| !previous.contains(h)) {
            self.link(*target, inverse, owner)?;
        }
        for target in previous.iter().filter(|h| !current.contains(h)) {
            self.unlink(*target, inverse, owner)?;
        }
        Ok(())
    }

    fn inverse_slot(&self, target: Handle, field: &'static str) -> Result<usize, Error> {
        let kind = self.kind(target)?;
        field_index(kind, field).ok_or_else(|| {
            ConstraintError::new(kind.name(), field, "object has no inverse field").into()
        })
    }

    fn link(&mut self, target: Handle, field: &'static str, owner: Handle) -> Result<(), Error> {
        let index = self.inverse_slot(target, field)?;
        let slot = &mut self.nodes[target.index()].values[index];
        if let Some(Value::Objects(handles)) = slot {
            if handles.contains(&owner) {
                return Ok(());
            }
            handles.push(owner);
        } else {
            *slot = Some(Value::Objects(vec![owner]));
        }
        self.mark_dirty(target, index);
        debug!(target = %target, field, owner = %owner, "linked inverse reference");
        Ok(())
    }

    fn unlink(&mut self, target: Handle, field: &'static str, owner: Handle) -> Result<(), Error> {
        let index = self.inverse_slot(target, field)?;
        if let Some(Value::Objects(handles)) = &mut self.nodes[target.index()].values[index] {
            if !handles.contains(&owner) {
                return Ok(());
            }
            handles.retain(|h| *h != owner);
            self.mark_dirty(target, index);
            debug!(target = %target, field, owner = %owner, "unlinked inverse reference");
        }
        Ok(())
    }

    /// Returns true if `field` of `from` holds `to`.
    pub(crate) fn references(&self, from: Handle, field: &str, to: Handle) -> Result<bool, Error> {
        Ok(self
            .get(from, field)?
            .map(|v| v.handles().contains(&to))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::limits::SceneConfig;
    use crate::model::{Handle, ObjectKind, Value};
    use crate::scene::Scene;

    fn handles(scene: &Scene, h: Handle, field: &str) -> Vec<Handle> {
        scene.get(h, field).unwrap().map(|v| v.handles().to_vec()).unwrap_or_default()
    }

    #[test]
    fn test_project_assignment_sets_back_reference() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(0));
        let project = scene.create(ObjectKind::Project);
        let a = scene.create(ObjectKind::Point);
        let b = scene.create(ObjectKind::Surface);

        scene.set(project, "resources", vec![a, b, a]).unwrap();
        assert_eq!(handles(&scene, project, "resources"), vec![a, b]);
        assert_eq!(handles(&scene, a, "projects"), vec![project]);
        assert_eq!(handles(&scene, b, "projects"), vec![project]);

        scene.set(project, "resources", vec![b]).unwrap();
        assert!(handles(&scene, a, "projects").is_empty());
        assert_eq!(handles(&scene, b, "projects"), vec![project]);
    }

    #[test]
    fn test_resource_assignment_updates_project() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(0));
        let p1 = scene.create(ObjectKind::Project);
        let p2 = scene.create(ObjectKind::Project);
        let vol = scene.create(ObjectKind::Volume);

        scene.set(vol, "projects", vec![p1, p2]).unwrap();
        assert_eq!(handles(&scene, p1, "resources"), vec![vol]);
        assert_eq!(handles(&scene, p2, "resources"), vec![vol]);
        assert_eq!(scene.own_dirty_fields(p1).unwrap(), vec!["resources"]);

        scene.set(vol, "projects", vec![p2]).unwrap();
        assert_eq!(scene.get(p1, "resources").unwrap(), Some(&Value::Objects(vec![])));
    }

    #[test]
    fn test_non_resource_rejected() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(0));
        let project = scene.create(ObjectKind::Project);
        let mesh = scene.create(ObjectKind::Mesh0D);
        assert!(scene.set(project, "resources", vec![mesh]).is_err());
        assert!(handles(&scene, project, "resources").is_empty());
    }

    #[derive(Debug, Clone)]
    enum Edit {
        Resources(usize, Vec<usize>),
        Projects(usize, Vec<usize>),
    }

    fn edit() -> impl Strategy<Value = Edit> {
        let picks = || prop::collection::vec(0usize..3, 0..5);
        prop_oneof![
            (0usize..3, picks()).prop_map(|(p, rs)| Edit::Resources(p, rs)),
            (0usize..3, picks()).prop_map(|(r, ps)| Edit::Projects(r, ps)),
        ]
    }

    proptest! {
        #[test]
        fn prop_back_reference_symmetry(edits in prop::collection::vec(edit(), 1..20)) {
            let mut scene = Scene::with_config(SceneConfig::new().with_seed(0));
            let projects: Vec<Handle> = (0..3).map(|_| scene.create(ObjectKind::Project)).collect();
            let resources: Vec<Handle> = [ObjectKind::Point, ObjectKind::Surface, ObjectKind::VectorField]
                .into_iter()
                .map(|k| scene.create(k))
                .collect();

            for edit in edits {
                match edit {
                    Edit::Resources(p, rs) => {
                        let list: Vec<Handle> = rs.iter().map(|i| resources[*i]).collect();
                        scene.set(projects[p], "resources", list).unwrap();
                    }
                    Edit::Projects(r, ps) => {
                        let list: Vec<Handle> = ps.iter().map(|i| projects[*i]).collect();
                        scene.set(resources[r], "projects", list).unwrap();
                    }
                }
                for &p in &projects {
                    for &r in &resources {
                        prop_assert_eq!(
                            scene.references(p, "resources", r).unwrap(),
                            scene.references(r, "projects", p).unwrap()
                        );
                    }
                    let list = handles(&scene, p, "resources");
                    let mut unique = list.clone();
                    unique.sort();
                    unique.dedup();
                    prop_assert_eq!(unique.len(), list.len());
                }
            }
        }
    }
}
