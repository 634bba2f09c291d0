pub mod converter;
pub mod mesh_dict;
pub mod mesh_json;
pub mod vtk;

pub use converter::MeshDictConverter;
pub use mesh_dict::MeshDict;
pub use mesh_json::{vtk_to_mesh_json, write_mesh_json, VtkToMeshJsonError};
pub use vtk::{LegacyVtkConverter, VtkParseError};
