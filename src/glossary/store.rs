//! JSON persistence for a [`Glossary`].
//!
//! The on-disk shape is `{ id: { term, senses: [{ body, refs }] } }` in
//! document order, pretty-printed so rebuilds diff cleanly.

use super::Glossary;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// The JSON does not have the glossary shape
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct CorruptDataError(#[from] serde_json::Error);

/// Serialize to pretty JSON with a trailing newline
pub fn to_json(glossary: &Glossary) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(glossary)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn from_json(bytes: &[u8]) -> std::result::Result<Glossary, CorruptDataError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write the glossary to `path`, creating parent directories
pub fn save(glossary: &Glossary, path: &Path) -> Result<()> {
    let bytes = to_json(glossary).map_err(|source| Error::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, &bytes).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote glossary");
    Ok(())
}

/// Read a glossary previously written by [`save`]
pub fn load(path: &Path) -> Result<Glossary> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let glossary = from_json(&bytes).map_err(|source| Error::CorruptData {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), entries = glossary.len(), "loaded glossary");
    Ok(glossary)
}
