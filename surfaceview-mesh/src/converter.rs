use std::path::Path;

use serde::Serialize;

/// Turns a mesh file into a serializable mesh dictionary.
pub trait MeshDictConverter {
    type MeshDict: Serialize;
    type Error;

    fn vtk_to_mesh_dict(
        &self,
        vtk_path: &Path,
    ) -> Result<Self::MeshDict, <Self as MeshDictConverter>::Error>;
}
