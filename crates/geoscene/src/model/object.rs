//! Object identity: arena handles, object kinds and data locations.

use std::fmt;

/// Stable index of an object inside a [`Scene`](crate::Scene) arena.
///
/// Handles are never reused; objects are never removed from the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    /// Creates a handle from an arena index.
    ///
    /// A handle created this way is checked against the arena whenever
    /// it is assigned to a field.
    pub fn from_index(index: usize) -> Self {
        Handle(index)
    }

    /// Returns the arena index of this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every object type the scene graph knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Project,
    Point,
    Surface,
    Volume,
    VectorField,
    Mesh0D,
    Mesh2D,
    Mesh2DGrid,
    Mesh3DGrid,
    Binding,
    DataArray,
    DataCategory,
    DataDiscrete,
    Texture2DImage,
    ResourceOptions,
    MeshOptions,
}

impl ObjectKind {
    /// All kinds, in declaration order.
    pub const ALL: [ObjectKind; 16] = [
        ObjectKind::Project,
        ObjectKind::Point,
        ObjectKind::Surface,
        ObjectKind::Volume,
        ObjectKind::VectorField,
        ObjectKind::Mesh0D,
        ObjectKind::Mesh2D,
        ObjectKind::Mesh2DGrid,
        ObjectKind::Mesh3DGrid,
        ObjectKind::Binding,
        ObjectKind::DataArray,
        ObjectKind::DataCategory,
        ObjectKind::DataDiscrete,
        ObjectKind::Texture2DImage,
        ObjectKind::ResourceOptions,
        ObjectKind::MeshOptions,
    ];

    /// Lowercase name used in error messages and payloads.
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Project => "project",
            ObjectKind::Point => "point",
            ObjectKind::Surface => "surface",
            ObjectKind::Volume => "volume",
            ObjectKind::VectorField => "vectorfield",
            ObjectKind::Mesh0D => "mesh0d",
            ObjectKind::Mesh2D => "mesh2d",
            ObjectKind::Mesh2DGrid => "mesh2dgrid",
            ObjectKind::Mesh3DGrid => "mesh3dgrid",
            ObjectKind::Binding => "binding",
            ObjectKind::DataArray => "dataarray",
            ObjectKind::DataCategory => "datacategory",
            ObjectKind::DataDiscrete => "datadiscrete",
            ObjectKind::Texture2DImage => "texture2dimage",
            ObjectKind::ResourceOptions => "resourceoptions",
            ObjectKind::MeshOptions => "meshoptions",
        }
    }

    /// Returns true for the composite resources a project can hold.
    pub fn is_resource(self) -> bool {
        matches!(
            self,
            ObjectKind::Point | ObjectKind::Surface | ObjectKind::Volume | ObjectKind::VectorField
        )
    }

    /// Returns true for mesh kinds.
    pub fn is_mesh(self) -> bool {
        matches!(
            self,
            ObjectKind::Mesh0D | ObjectKind::Mesh2D | ObjectKind::Mesh2DGrid | ObjectKind::Mesh3DGrid
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where on a mesh a data array lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// One value per mesh node (vertex).
    Node,
    /// One value per mesh cell.
    CellCenter,
}

impl Location {
    /// Canonical wire tag (`N` or `CC`).
    pub fn tag(self) -> &'static str {
        match self {
            Location::Node => "N",
            Location::CellCenter => "CC",
        }
    }

    /// Parses a canonical wire tag.
    pub fn from_tag(tag: &str) -> Option<Location> {
        match tag {
            "N" => Some(Location::Node),
            "CC" => Some(Location::CellCenter),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Node => f.write_str("node"),
            Location::CellCenter => f.write_str("cell-center"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_tags() {
        for loc in [Location::Node, Location::CellCenter] {
            assert_eq!(Location::from_tag(loc.tag()), Some(loc));
        }
        assert_eq!(Location::from_tag("node"), None);
        assert_eq!(Location::CellCenter.to_string(), "cell-center");
    }

    #[test]
    fn test_kind_groups() {
        let resources = ObjectKind::ALL.iter().filter(|k| k.is_resource()).count();
        let meshes = ObjectKind::ALL.iter().filter(|k| k.is_mesh()).count();
        assert_eq!((resources, meshes), (4, 4));
        assert_eq!(Handle::from_index(12).to_string(), "#12");
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_handle_keeps_large_indices() {
        let index = u32::MAX as usize + 1;
        assert_eq!(Handle::from_index(index).index(), index);
    }
}
