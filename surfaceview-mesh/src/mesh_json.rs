use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::info;
use serde::Serialize;

use crate::converter::MeshDictConverter;

#[derive(Debug)]
pub enum VtkToMeshJsonError<E> {
    Convert(E),
    IO(Box<std::io::Error>),
}

impl<E: std::fmt::Display> std::fmt::Display for VtkToMeshJsonError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VtkToMeshJsonError::Convert(e) => write!(f, "failed to convert mesh: {}", e),
            VtkToMeshJsonError::IO(e) => write!(f, "failed to write mesh json: {}", e),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for VtkToMeshJsonError<E> {}

/// Writes `value` as compact JSON, truncating any existing file.
///
/// The file is written in place; a failure part way through leaves a
/// truncated file behind.
pub fn write_mesh_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    json_path: P,
) -> Result<(), std::io::Error> {
    let file = File::create(json_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn vtk_to_mesh_json<C, P, Q>(
    converter: &C,
    vtk_path: P,
    json_path: Q,
) -> Result<(), VtkToMeshJsonError<C::Error>>
where
    C: MeshDictConverter + ?Sized,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mesh = converter
        .vtk_to_mesh_dict(vtk_path.as_ref())
        .map_err(VtkToMeshJsonError::Convert)?;
    write_mesh_json(&mesh, json_path.as_ref())
        .map_err(|e| VtkToMeshJsonError::IO(Box::new(e)))?;
    info!(
        "wrote {} from {}",
        json_path.as_ref().display(),
        vtk_path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    struct FixedConverter {
        value: serde_json::Value,
    }

    impl MeshDictConverter for FixedConverter {
        type MeshDict = serde_json::Value;
        type Error = String;

        fn vtk_to_mesh_dict(&self, _vtk_path: &Path) -> Result<serde_json::Value, String> {
            Ok(self.value.clone())
        }
    }

    struct FailingConverter;

    impl MeshDictConverter for FailingConverter {
        type MeshDict = serde_json::Value;
        type Error = String;

        fn vtk_to_mesh_dict(&self, vtk_path: &Path) -> Result<serde_json::Value, String> {
            Err(format!("cannot parse {}", vtk_path.display()))
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let json_path = dir.path().join("mesh.json");
        let value = json!({"vertices": [[0, 0, 0]], "faces": [[0]]});
        let converter = FixedConverter {
            value: value.clone(),
        };

        vtk_to_mesh_json(&converter, "in.vtk", &json_path).unwrap();

        let file = File::open(&json_path).unwrap();
        let read_back: serde_json::Value = serde_json::from_reader(file).unwrap();
        assert_eq!(read_back, value);
    }

    #[test]
    fn test_output_is_compact() {
        let dir = tempdir().unwrap();
        let json_path = dir.path().join("mesh.json");
        let converter = FixedConverter {
            value: json!({"faces": [[0]], "vertices": [[0, 0, 0]]}),
        };

        vtk_to_mesh_json(&converter, "in.vtk", &json_path).unwrap();

        let text = std::fs::read_to_string(&json_path).unwrap();
        insta::assert_snapshot!(text, @r###"{"faces":[[0]],"vertices":[[0,0,0]]}"###);
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let json_path = dir.path().join("mesh.json");
        std::fs::write(&json_path, "x".repeat(1000)).unwrap();
        let converter = FixedConverter { value: json!({}) };

        vtk_to_mesh_json(&converter, "in.vtk", &json_path).unwrap();

        assert_eq!(std::fs::read_to_string(&json_path).unwrap(), "{}");
    }

    #[test]
    fn test_convert_error_propagates() {
        let dir = tempdir().unwrap();
        let json_path = dir.path().join("mesh.json");

        let res = vtk_to_mesh_json(&FailingConverter, "broken.vtk", &json_path);

        match res {
            Err(VtkToMeshJsonError::Convert(e)) => assert_eq!(e, "cannot parse broken.vtk"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!json_path.exists());
    }

    #[test]
    fn test_write_error_propagates() {
        let dir = tempdir().unwrap();
        let json_path: PathBuf = dir.path().join("missing-dir").join("mesh.json");
        let converter = FixedConverter { value: json!({}) };

        let res = vtk_to_mesh_json(&converter, "in.vtk", &json_path);

        match res {
            Err(VtkToMeshJsonError::IO(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
