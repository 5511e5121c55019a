use std::{fs, path::Path};

use crate::{CompiledGraph, GraphSpec, GraphSpecError};

/// Load a graph spec from YAML on disk.
pub fn load_yaml(path: impl AsRef<Path>) -> Result<GraphSpec, GraphSpecError> {
    let yaml = fs::read_to_string(path)?;
    let spec: GraphSpec = serde_yaml::from_str(&yaml)?;
    Ok(spec)
}

/// Load, validate, and compile a graph from a YAML file.
pub fn compile_yaml(path: impl AsRef<Path>) -> Result<CompiledGraph, GraphSpecError> {
    load_yaml(path)?.compile()
}

/// Serialize and write a graph spec to YAML.
pub fn save_yaml(path: impl AsRef<Path>, spec: &GraphSpec) -> Result<(), GraphSpecError> {
    let yaml = serde_yaml::to_string(spec)?;
    fs::write(path, yaml)?;
    Ok(())
}
