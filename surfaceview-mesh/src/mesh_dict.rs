use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// All values are expected to be finite: serde_json writes NaN and infinities
/// as `null`, which does not read back into a `MeshDict`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDict {
    pub vertices: Vec<[f64; 3]>,
    /// Indices into `vertices`, one list per polygon
    pub faces: Vec<Vec<u32>>,
    /// Point data arrays by name, components flattened per point
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scalars: BTreeMap<String, Vec<f64>>,
}
