use crate::inventory::LoadError;
use crate::types::{ScriptPayload, TargetConfig};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Parses a JSON array of targets. Any malformed record rejects the whole list.
pub fn parse_targets<R: Read>(reader: R) -> Result<Vec<TargetConfig>, LoadError> {
    let targets: Vec<TargetConfig> = serde_json::from_reader(reader)?;

    if let Some(index) = targets.iter().position(|t| t.host.trim().is_empty()) {
        return Err(LoadError::EmptyHost { index });
    }

    Ok(targets)
}

pub fn load_targets(path: &Path) -> Result<Vec<TargetConfig>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let targets = parse_targets(std::io::BufReader::new(file))?;
    debug!("Loaded {} targets from {}", targets.len(), path.display());
    Ok(targets)
}

pub fn load_script(path: &Path) -> Result<ScriptPayload, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Loaded {} byte script from {}", bytes.len(), path.display());
    Ok(ScriptPayload::new(bytes))
}
