//! Command pipelines: `build` (XML -> JSON) and lookup (JSON -> entries ->
//! console).

use crate::error::{Error, Result};
use crate::glossary::{self, store, Glossary};
use crate::output;
use crate::query::{self, Selection};
use crate::utils::spinner;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use termcolor::WriteColor;
use tracing::info;

/// Source and destination files for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub xml: PathBuf,
    pub json: PathBuf,
}

/// Parse the XML and write the JSON. Returns the number of entries.
pub fn build(paths: &DataPaths) -> Result<usize> {
    let glossary = parse_file(&paths.xml)?;
    store::save(&glossary, &paths.json)?;
    info!(
        entries = glossary.len(),
        json = %paths.json.display(),
        "glossary built"
    );
    Ok(glossary.len())
}

fn parse_file(path: &Path) -> Result<Glossary> {
    let xml = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let progress = spinner(&format!("Parsing {}", path.display()));
    let parsed = glossary::parse(&xml);
    progress.finish_and_clear();

    parsed.map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Why [`ensure_json`] had to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    Forced,
    Missing,
}

impl RebuildReason {
    pub fn describe(self) -> &'static str {
        match self {
            RebuildReason::Forced => "Rebuilding JSON",
            RebuildReason::Missing => "JSON missing; generating",
        }
    }
}

/// Build the JSON first when it is absent or `force` is set
pub fn ensure_json(paths: &DataPaths, force: bool) -> Result<Option<RebuildReason>> {
    let reason = if force {
        RebuildReason::Forced
    } else if !paths.json.exists() {
        RebuildReason::Missing
    } else {
        return Ok(None);
    };

    eprintln!("{} from {}", reason.describe(), paths.xml.display());
    build(paths)?;
    Ok(Some(reason))
}

/// Load the glossary, resolve the selection and print the result
pub fn lookup<W: WriteColor + ?Sized>(
    paths: &DataPaths,
    selection: &Selection,
    rebuild: bool,
    out: &mut W,
) -> Result<()> {
    ensure_json(paths, rebuild)?;
    let glossary = store::load(&paths.json)?;

    let mut rng = rand::thread_rng();
    let entries = query::select(&glossary, selection, &mut rng)?;

    output::render_all(&entries, &glossary, out).map_err(Error::Output)?;
    out.flush().map_err(Error::Output)
}
