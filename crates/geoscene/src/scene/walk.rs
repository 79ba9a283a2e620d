//! Full-graph validation.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::{Error, RequiredFieldMissing};
use crate::field::FieldContext;
use crate::model::Handle;
use crate::schema::schema;
use crate::scene::{KindView, Scene};
use crate::validate;

impl Scene {
    /// Validates `root` and every object it owns.
    ///
    /// Per object, fields are checked in declaration order: an unset
    /// non-nullable field fails with [`RequiredFieldMissing`], a set field is
    /// re-validated against its descriptor, and owned sub-objects are
    /// validated before the next field. Object-level rules run last. The
    /// first violation is returned.
    ///
    /// Unset discrete-data presentation fields are filled with their
    /// defaults first, which is the only mutation this performs.
    pub fn validate_all(&mut self, root: Handle) -> Result<bool, Error> {
        debug!(root = %root, "validating scene graph");
        let mut visited = FxHashSet::default();
        self.validate_node(root, &mut visited)?;
        Ok(true)
    }

    fn validate_node(&mut self, handle: Handle, visited: &mut FxHashSet<Handle>) -> Result<(), Error> {
        if !visited.insert(handle) {
            return Ok(());
        }
        let kind = self.kind(handle)?;
        validate::fill_defaults(self, handle)?;

        for (i, desc) in schema(kind).iter().enumerate() {
            let Some(value) = self.nodes[handle.index()].values[i].clone() else {
                if desc.nullable {
                    continue;
                }
                return Err(RequiredFieldMissing {
                    object: kind.name(),
                    field: desc.name,
                }
                .into());
            };

            let resolver = KindView(&self.nodes);
            let mut ctx = FieldContext {
                object: kind.name(),
                resolver: &resolver,
                rng: &mut self.rng,
            };
            desc.validate(value.to_raw(), &mut ctx)?;

            if desc.kind.is_owned_ref() {
                for &child in value.handles() {
                    self.validate_node(child, visited)?;
                }
            }
        }

        validate::check_object(self, handle)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, ErrorCode, RequiredFieldMissing};
    use crate::limits::SceneConfig;
    use crate::model::ObjectKind;
    use crate::scene::Scene;

    #[test]
    fn test_missing_required_field() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(4));
        let point = scene.create(ObjectKind::Point);
        let err = scene.validate_all(point).unwrap_err();
        assert_eq!(
            err,
            Error::RequiredFieldMissing(RequiredFieldMissing { object: "point", field: "mesh" })
        );
        assert_eq!(err.code(), ErrorCode::RequiredFieldMissing);
    }

    #[test]
    fn test_nested_missing_field_reported() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(4));
        let mesh = scene.create(ObjectKind::Mesh0D);
        let point = scene.create(ObjectKind::Point);
        scene.set(point, "mesh", mesh).unwrap();
        let err = scene.validate_all(point).unwrap_err();
        assert_eq!(err.to_string(), "[C002] required field not set: mesh0d.vertices");
    }

    #[test]
    fn test_project_with_shared_resource() {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(4));
        let mesh = scene.create(ObjectKind::Mesh0D);
        scene.set(mesh, "vertices", vec![[0.0, 0.0, 0.0]]).unwrap();
        let point = scene.create(ObjectKind::Point);
        scene.set(point, "mesh", mesh).unwrap();
        let a = scene.create(ObjectKind::Project);
        let b = scene.create(ObjectKind::Project);
        scene.set(a, "resources", vec![point]).unwrap();
        scene.set(b, "resources", vec![point]).unwrap();
        assert_eq!(scene.validate_all(a), Ok(true));
        assert_eq!(scene.validate_all(b), Ok(true));
    }
}
