//! Mesh topology: node and cell counts, mesh-internal rules, and binding
//! checks against data locations.

use crate::error::{ConsistencyError, Error, RequiredFieldMissing};
use crate::model::{Handle, Location, NdArray, ObjectKind, Value};
use crate::scene::Scene;

/// A data array bound to a mesh location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundData {
    pub location: Location,
    /// Length of the bound array.
    pub len: usize,
}

/// What every mesh variant provides to the consistency validator.
pub trait MeshTopology {
    fn kind(&self) -> ObjectKind;

    /// Number of nodes (`nN`).
    fn node_count(&self) -> usize;

    /// Number of cells (`nC`).
    fn cell_count(&self) -> usize;

    /// Locations data may be bound to on this mesh.
    fn permitted_locations(&self) -> &'static [Location];

    /// Rules internal to the mesh geometry.
    fn check(&self) -> Result<(), ConsistencyError>;

    fn count_at(&self, location: Location) -> usize {
        match location {
            Location::Node => self.node_count(),
            Location::CellCenter => self.cell_count(),
        }
    }

    /// Checks each binding's location and length against this mesh.
    fn validate_bindings(
        &self,
        resource: ObjectKind,
        bindings: &[BoundData],
    ) -> Result<(), ConsistencyError> {
        let permitted = self.permitted_locations();
        for (index, bound) in bindings.iter().enumerate() {
            if !permitted.contains(&bound.location) {
                return Err(ConsistencyError::LocationNotPermitted {
                    resource: resource.name(),
                    index,
                    location: bound.location,
                    mesh: self.kind().name(),
                    allowed: permitted
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
            let expected = self.count_at(bound.location);
            if bound.len != expected {
                return Err(ConsistencyError::BindingLength {
                    resource: resource.name(),
                    index,
                    location: bound.location,
                    expected,
                    actual: bound.len,
                });
            }
        }
        Ok(())
    }
}

/// Borrowed geometry of one mesh object.
#[derive(Debug, Clone, Copy)]
pub enum MeshView<'a> {
    Points {
        vertices: &'a NdArray,
    },
    Triangles {
        vertices: &'a NdArray,
        triangles: &'a NdArray,
    },
    Grid2 {
        h1: &'a NdArray,
        h2: &'a NdArray,
        x0: &'a [[f64; 3]],
        z: Option<&'a NdArray>,
    },
    Grid3 {
        h1: &'a NdArray,
        h2: &'a NdArray,
        h3: &'a NdArray,
        x0: &'a [[f64; 3]],
    },
}

const NODE_ONLY: &[Location] = &[Location::Node];
const NODE_OR_CELL: &[Location] = &[Location::Node, Location::CellCenter];
const CELL_ONLY: &[Location] = &[Location::CellCenter];

impl<'a> MeshView<'a> {
    /// Reads the geometry of `handle` from the scene.
    pub fn load(scene: &'a Scene, handle: Handle) -> Result<MeshView<'a>, Error> {
        let kind = scene.kind(handle)?;
        let array = |field: &'static str| -> Result<&'a NdArray, Error> {
            scene
                .get(handle, field)?
                .and_then(Value::as_array)
                .ok_or_else(|| missing(kind, field))
        };
        let vectors = |field: &'static str| -> Result<&'a [[f64; 3]], Error> {
            match scene.get(handle, field)? {
                Some(Value::Vectors(vs)) => Ok(vs.as_slice()),
                _ => Err(missing(kind, field)),
            }
        };

        let view = match kind {
            ObjectKind::Mesh0D => MeshView::Points {
                vertices: array("vertices")?,
            },
            ObjectKind::Mesh2D => MeshView::Triangles {
                vertices: array("vertices")?,
                triangles: array("triangles")?,
            },
            ObjectKind::Mesh2DGrid => MeshView::Grid2 {
                h1: array("h1")?,
                h2: array("h2")?,
                x0: vectors("x0")?,
                z: scene.get(handle, "Z")?.and_then(Value::as_array),
            },
            ObjectKind::Mesh3DGrid => MeshView::Grid3 {
                h1: array("h1")?,
                h2: array("h2")?,
                h3: array("h3")?,
                x0: vectors("x0")?,
            },
            other => {
                return Err(crate::error::ConstraintError::new(
                    other.name(),
                    "mesh",
                    "object is not a mesh",
                )
                .into());
            }
        };
        Ok(view)
    }
}

fn missing(kind: ObjectKind, field: &'static str) -> Error {
    RequiredFieldMissing {
        object: kind.name(),
        field,
    }
    .into()
}

impl MeshTopology for MeshView<'_> {
    fn kind(&self) -> ObjectKind {
        match self {
            MeshView::Points { .. } => ObjectKind::Mesh0D,
            MeshView::Triangles { .. } => ObjectKind::Mesh2D,
            MeshView::Grid2 { .. } => ObjectKind::Mesh2DGrid,
            MeshView::Grid3 { .. } => ObjectKind::Mesh3DGrid,
        }
    }

    fn node_count(&self) -> usize {
        match self {
            MeshView::Points { vertices } | MeshView::Triangles { vertices, .. } => vertices.len(),
            MeshView::Grid2 { h1, h2, .. } => (h1.len() + 1) * (h2.len() + 1),
            MeshView::Grid3 { h1, h2, h3, .. } => (h1.len() + 1) * (h2.len() + 1) * (h3.len() + 1),
        }
    }

    fn cell_count(&self) -> usize {
        match self {
            MeshView::Points { .. } => 0,
            MeshView::Triangles { triangles, .. } => triangles.len(),
            MeshView::Grid2 { h1, h2, .. } => h1.len() * h2.len(),
            MeshView::Grid3 { h1, h2, h3, .. } => h1.len() * h2.len() * h3.len(),
        }
    }

    fn permitted_locations(&self) -> &'static [Location] {
        match self {
            MeshView::Points { .. } => NODE_ONLY,
            MeshView::Triangles { .. } | MeshView::Grid2 { .. } => NODE_OR_CELL,
            MeshView::Grid3 { .. } => CELL_ONLY,
        }
    }

    fn check(&self) -> Result<(), ConsistencyError> {
        match *self {
            MeshView::Points { .. } => Ok(()),
            MeshView::Triangles {
                vertices,
                triangles,
            } => check_triangles(triangles, vertices.len()),
            MeshView::Grid2 { h1, h2, x0, z } => {
                check_origin(ObjectKind::Mesh2DGrid, x0)?;
                if let Some(z) = z {
                    if z.len() != self.node_count() {
                        return Err(ConsistencyError::ElevationLength {
                            expected: self.node_count(),
                            actual: z.len(),
                        });
                    }
                }
                check_widths(&[("h1", h1), ("h2", h2)])
            }
            MeshView::Grid3 { h1, h2, h3, x0 } => {
                check_origin(ObjectKind::Mesh3DGrid, x0)?;
                check_widths(&[("h1", h1), ("h2", h2), ("h3", h3)])
            }
        }
    }
}

fn check_triangles(triangles: &NdArray, vertices: usize) -> Result<(), ConsistencyError> {
    let Some(indices) = triangles.as_ints() else {
        return Ok(());
    };
    if let Some((position, &value)) = indices.iter().enumerate().find(|(_, v)| **v < 0) {
        return Err(ConsistencyError::NegativeTriangleIndex { position, value });
    }
    if let Some((position, &value)) = indices
        .iter()
        .enumerate()
        .find(|(_, v)| **v as usize >= vertices)
    {
        return Err(ConsistencyError::TriangleIndexOutOfBounds {
            position,
            value,
            vertices,
        });
    }
    Ok(())
}

fn check_origin(kind: ObjectKind, x0: &[[f64; 3]]) -> Result<(), ConsistencyError> {
    if x0.len() != 1 {
        return Err(ConsistencyError::VectorCount {
            object: kind.name(),
            field: "x0",
            count: x0.len(),
        });
    }
    Ok(())
}

fn check_widths(axes: &[(&'static str, &NdArray)]) -> Result<(), ConsistencyError> {
    for &(field, widths) in axes {
        for (index, width) in widths.to_f64_vec().into_iter().enumerate() {
            if !width.is_finite() || width < 0.0 {
                return Err(ConsistencyError::TensorWidth {
                    field,
                    index,
                    width,
                });
            }
        }
    }
    Ok(())
}

impl Scene {
    /// Node count of the mesh `handle`.
    pub fn node_count(&self, handle: Handle) -> Result<usize, Error> {
        Ok(MeshView::load(self, handle)?.node_count())
    }

    /// Cell count of the mesh `handle`.
    pub fn cell_count(&self, handle: Handle) -> Result<usize, Error> {
        Ok(MeshView::load(self, handle)?.cell_count())
    }
}
