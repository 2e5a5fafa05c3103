//! # jargon - Jargon File lookups from the terminal
//!
//! Converts the DocBook XML edition of the Jargon File into a JSON glossary
//! once, then prints entries by term or at random.
//!
//! ## Architecture
//!
//! - [`glossary`] - Data model, DocBook parser, JSON store, inline markup
//! - [`query`] - Case-insensitive lookup and random selection
//! - [`output`] - Styled console rendering
//! - [`commands`] - `build` and lookup pipelines used by the binary
//! - [`utils`] - Configuration file and progress spinner
//!
//! ## Quick Start
//!
//! ```no_run
//! use jargon::glossary::{parse, to_json};
//! use jargon::query::resolve_by_query;
//!
//! let xml = std::fs::read("data/jargon.xml").unwrap();
//! let glossary = parse(&xml).unwrap();
//! std::fs::write("data/jargon.json", to_json(&glossary).unwrap()).unwrap();
//!
//! for entry in resolve_by_query(&glossary, "endian", false).unwrap() {
//!     println!("{}: {} senses", entry.term, entry.senses.len());
//! }
//! ```

pub mod commands;
pub mod error;
pub mod glossary;
pub mod output;
pub mod query;
pub mod utils;

pub use error::{Error, Result};
pub use glossary::{Entry, Glossary, Sense};
