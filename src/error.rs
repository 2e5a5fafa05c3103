//! Crate-level error type.
//!
//! Component errors ([`ParseError`], [`CorruptDataError`], [`LookupError`])
//! are wrapped here together with the file they came from.

use crate::glossary::{CorruptDataError, ParseError};
use crate::query::LookupError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("corrupt glossary data in {} (run with --rebuild to regenerate it)", .path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: CorruptDataError,
    },

    #[error("cannot encode glossary for {}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("cannot write output")]
    Output(#[source] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
