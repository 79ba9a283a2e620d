//! geoscene: Validated scene graph for 3D geoscience visualization.
//!
//! This crate models the objects of a 3D geoscience scene (projects,
//! point sets, surfaces, volumes, meshes, data arrays and textures), checks
//! every assignment against a declared field schema, tracks which fields
//! changed since the last upload, and encodes numeric arrays into the
//! compact binary files the visualization service stores.
//!
//! # Overview
//!
//! - **Validated fields**: every object kind declares its fields once;
//!   assignments are coerced and checked, and rejected values leave the
//!   object unchanged
//! - **Dirty tracking**: changed fields aggregate up through owned
//!   sub-objects, so only modified data is uploaded again
//! - **Composite graph**: project and resource references are kept
//!   symmetric without cascading
//! - **Compact arrays**: float and integer arrays narrow to 32-bit little
//!   endian files, and narrowing that would lose precision is refused
//!
//! # Quick Start
//!
//! ```rust
//! use geoscene::{ObjectKind, Scene, SceneConfig};
//!
//! let mut scene = Scene::with_config(SceneConfig::new().with_seed(1));
//! let grid = scene.create(ObjectKind::Mesh2DGrid);
//! scene.set(grid, "h1", vec![1.0, 1.0, 1.0]).unwrap();
//! scene.set(grid, "h2", vec![1.0, 1.0]).unwrap();
//!
//! let surface = scene.create(ObjectKind::Surface);
//! scene.set(surface, "mesh", grid).unwrap();
//! assert!(scene.validate_all(surface).unwrap());
//!
//! // Everything is new, so the first sync carries every object.
//! let plan = scene.plan_sync(surface).unwrap();
//! assert_eq!(plan.entries.last().unwrap().handle, surface);
//! scene.complete_sync(&plan).unwrap();
//! assert!(!scene.is_dirty(surface).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`model`]: Value types (arrays, colors, handles, object kinds)
//! - [`field`]: Field descriptors and single-value validation
//! - [`schema`]: Declared fields of every object kind
//! - [`scene`]: The object arena, dirty tracking, graph maintenance and sync
//! - [`validate`]: Mesh topology and cross-object rules
//! - [`codec`]: Binary array encoding and decoding
//! - [`builder`]: Closure builders for nested objects
//! - [`error`]: Error types
//! - [`limits`]: Size limits and scene configuration
//!
//! # Wire Format
//!
//! Arrays are sent as raw little-endian files tagged `<f4` or `<i4` with
//! their row-major shape. Categorical data uses `<f4` with NaN standing for
//! "no category". Textures are PNG files passed through unchanged.

pub mod builder;
pub mod codec;
pub mod error;
pub mod field;
pub mod limits;
pub mod model;
pub mod scene;
pub mod schema;
pub mod validate;

// Re-export commonly used types at crate root
pub use builder::ObjectBuilder;
pub use codec::{ArrayPayload, WireDtype, deserialize, deserialize_index, serialize, serialize_index};
pub use error::{CodecError, ConsistencyError, ConstraintError, Error, ErrorCode, RequiredFieldMissing};
pub use field::{FieldDescriptor, FieldKind};
pub use limits::{Limits, SceneConfig};
pub use model::{Handle, Location, NdArray, ObjectKind, Order, Palette, RawValue, Rgb, Value};
pub use scene::{DirtyPayload, Scene, SyncEntry, SyncError, SyncPlan, Uploader};
pub use validate::{MeshTopology, MeshView};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
