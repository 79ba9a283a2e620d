//! Builder API for ergonomic scene construction.
//!
//! Provides a fluent interface for creating an object together with its
//! owned sub-objects.
//!
//! # Example
//!
//! ```rust
//! use geoscene::{ObjectKind, Scene, SceneConfig};
//!
//! let mut scene = Scene::with_config(SceneConfig::new().with_seed(7));
//! let point = scene
//!     .build(ObjectKind::Point, |p| p
//!         .title("Wells")
//!         .mesh(ObjectKind::Mesh0D, |m| m
//!             .set("vertices", vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])
//!         )
//!         .data("N", ObjectKind::DataArray, |d| d
//!             .title("Depth")
//!             .set("array", vec![10.0, 12.5])
//!         )
//!         .opts(|o| o.set("opacity", 0.5))
//!     )
//!     .unwrap();
//! assert!(scene.validate_all(point).unwrap());
//! ```

use crate::error::Error;
use crate::model::{Handle, ObjectKind, RawValue, Value};
use crate::scene::Scene;

/// Builder for one object in a [`Scene`].
///
/// Every step is applied immediately. The first failing step is recorded
/// and later steps are skipped; [`Scene::build`] returns that error.
#[derive(Debug)]
pub struct ObjectBuilder<'s> {
    scene: &'s mut Scene,
    handle: Handle,
    error: Option<Error>,
}

impl<'s> ObjectBuilder<'s> {
    /// Creates a new object of `kind` and a builder for it.
    pub fn new(scene: &'s mut Scene, kind: ObjectKind) -> Self {
        let handle = scene.create(kind);
        Self {
            scene,
            handle,
            error: None,
        }
    }

    /// Handle of the object being built.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Assigns a field.
    pub fn set(mut self, field: &str, value: impl Into<RawValue>) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.scene.set(self.handle, field, value) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Sets the title.
    pub fn title(self, title: &str) -> Self {
        self.set("title", title)
    }

    /// Sets the description.
    pub fn description(self, description: &str) -> Self {
        self.set("description", description)
    }

    // =========================================================================
    // Sub-objects
    // =========================================================================

    /// Builds a new object of `kind` and assigns it to the single-reference
    /// field `field`.
    pub fn child<F>(self, field: &str, kind: ObjectKind, f: F) -> Self
    where
        F: for<'b> FnOnce(ObjectBuilder<'b>) -> ObjectBuilder<'b>,
    {
        let (this, child) = self.nested(kind, f);
        match child {
            Some(child) => this.set(field, child),
            None => this,
        }
    }

    /// Builds a new object of `kind` and appends it to the list field
    /// `field`.
    pub fn push<F>(self, field: &str, kind: ObjectKind, f: F) -> Self
    where
        F: for<'b> FnOnce(ObjectBuilder<'b>) -> ObjectBuilder<'b>,
    {
        let (this, child) = self.nested(kind, f);
        let Some(child) = child else {
            return this;
        };
        let mut list = match this.scene.get(this.handle, field) {
            Ok(Some(value)) => value.handles().to_vec(),
            _ => Vec::new(),
        };
        list.push(child);
        this.set(field, list)
    }

    /// Builds the mesh of a resource.
    pub fn mesh<F>(self, kind: ObjectKind, f: F) -> Self
    where
        F: for<'b> FnOnce(ObjectBuilder<'b>) -> ObjectBuilder<'b>,
    {
        self.child("mesh", kind, f)
    }

    /// Builds a data object of `kind` and binds it to the resource at
    /// `location` (`"N"`, `"CC"` or an alias).
    pub fn data<F>(self, location: &str, kind: ObjectKind, f: F) -> Self
    where
        F: for<'b> FnOnce(ObjectBuilder<'b>) -> ObjectBuilder<'b>,
    {
        self.push("data", ObjectKind::Binding, |b| {
            b.set("location", location).child("data", kind, f)
        })
    }

    /// Builds a texture and appends it to the resource.
    pub fn texture<F>(self, f: F) -> Self
    where
        F: for<'b> FnOnce(ObjectBuilder<'b>) -> ObjectBuilder<'b>,
    {
        self.push("textures", ObjectKind::Texture2DImage, f)
    }

    /// Edits the options object, creating it if unset.
    pub fn opts<F>(mut self, f: F) -> Self
    where
        F: for<'b> FnOnce(ObjectBuilder<'b>) -> ObjectBuilder<'b>,
    {
        if self.error.is_some() {
            return self;
        }
        let existing = match self.scene.get(self.handle, "opts") {
            Ok(value) => value.and_then(Value::as_object),
            Err(err) => {
                self.error = Some(err);
                return self;
            }
        };
        let Some(opts) = existing else {
            let kind = match self.scene.kind(self.handle) {
                Ok(kind) if kind.is_mesh() => ObjectKind::MeshOptions,
                _ => ObjectKind::ResourceOptions,
            };
            return self.child("opts", kind, f);
        };
        let edited = f(ObjectBuilder {
            scene: &mut *self.scene,
            handle: opts,
            error: None,
        });
        if let Some(err) = edited.error {
            self.error = Some(err);
        }
        self
    }

    /// Runs `f` on a builder for a new object of `kind`, returning the new
    /// handle unless a step failed.
    fn nested<F>(mut self, kind: ObjectKind, f: F) -> (Self, Option<Handle>)
    where
        F: for<'b> FnOnce(ObjectBuilder<'b>) -> ObjectBuilder<'b>,
    {
        if self.error.is_some() {
            return (self, None);
        }
        let built = f(ObjectBuilder::new(&mut *self.scene, kind));
        let (handle, error) = (built.handle, built.error);
        match error {
            Some(err) => {
                self.error = Some(err);
                (self, None)
            }
            None => (self, Some(handle)),
        }
    }

    /// Returns the built handle, or the first recorded error.
    pub fn finish(self) -> Result<Handle, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.handle),
        }
    }
}

impl Scene {
    /// Creates an object of `kind` and fills it with `f`.
    pub fn build<F>(&mut self, kind: ObjectKind, f: F) -> Result<Handle, Error>
    where
        F: for<'b> FnOnce(ObjectBuilder<'b>) -> ObjectBuilder<'b>,
    {
        f(ObjectBuilder::new(self, kind)).finish()
    }
}
