//! Lattice file loading and saving.

use std::path::Path;

use crate::error::{LatticeError, LatticeResult};
use crate::schema::LatticeDef;
use crate::segment::Segment;

pub fn load_yaml(path: &Path) -> LatticeResult<Segment> {
    let content = std::fs::read_to_string(path)?;
    let def: LatticeDef = serde_yaml::from_str(&content)?;
    def.to_segment()
}

pub fn load_json(path: &Path) -> LatticeResult<Segment> {
    let content = std::fs::read_to_string(path)?;
    let def: LatticeDef = serde_json::from_str(&content)?;
    def.to_segment()
}

/// Load a lattice, choosing the format from the file extension.
pub fn load_lattice(path: &Path) -> LatticeResult<Segment> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        Some("yaml") | Some("yml") => load_yaml(path),
        other => Err(LatticeError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

pub fn save_json(path: &Path, segment: &Segment) -> LatticeResult<()> {
    let def = LatticeDef::from_segment(segment);
    let content = serde_json::to_string_pretty(&def)?;
    std::fs::write(path, content)?;
    Ok(())
}
