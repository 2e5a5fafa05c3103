//! Glossary data model.
//!
//! A [`Glossary`] is an insertion-ordered mapping from entry id to [`Entry`].
//! It is built once by the [`parser`], persisted by the [`store`] and is
//! read-only afterwards.
//!
//! ## Modules
//!
//! - [`parser`] - DocBook XML to [`Glossary`]
//! - [`store`] - JSON persistence
//! - [`markup`] - Inline emphasis / cross-reference markup in sense bodies

pub mod markup;
pub mod parser;
pub mod store;

pub use parser::{parse, ParseError};
pub use store::{from_json, to_json, CorruptDataError};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One definition block under a term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    /// Body text with inline markup (see [`markup`])
    pub body: String,
    /// Ids of entries this sense refers to, in first-appearance order
    pub refs: Vec<String>,
}

impl Sense {
    pub fn new(body: impl Into<String>, refs: Vec<String>) -> Self {
        Self {
            body: body.into(),
            refs,
        }
    }
}

/// A glossary headword and its senses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stored as the map key in JSON, filled in on load
    #[serde(skip)]
    pub id: String,
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar: Option<String>,
    pub senses: Vec<Sense>,
}

impl Entry {
    pub fn new(id: impl Into<String>, term: impl Into<String>, senses: Vec<Sense>) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            pronunciation: None,
            grammar: None,
            senses,
        }
    }
}

/// Ordered id -> entry mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    entries: IndexMap<String, Entry>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Entry at a position in document order
    pub fn get_index(&self, index: usize) -> Option<&Entry> {
        self.entries.get_index(index).map(|(_, entry)| entry)
    }

    /// Entries in document order
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Display label for an id, if the id resolves
    pub fn term_for(&self, id: &str) -> Option<&str> {
        self.get(id).map(|entry| entry.term.as_str())
    }

    /// Insert keyed by `entry.id`. A later entry with the same id replaces
    /// the earlier one in place.
    pub(crate) fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.id.clone(), entry);
    }
}

impl FromIterator<Entry> for Glossary {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut glossary = Glossary::new();
        for entry in iter {
            glossary.insert(entry);
        }
        glossary
    }
}

impl Serialize for Glossary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for Glossary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut entries = IndexMap::<String, Entry>::deserialize(deserializer)?;
        for (id, entry) in entries.iter_mut() {
            entry.id = id.clone();
        }
        Ok(Self { entries })
    }
}
