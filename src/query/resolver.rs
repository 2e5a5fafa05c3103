use crate::glossary::{Entry, Glossary};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no entry found for: {0}")]
    NotFound(String),
    #[error("the glossary has no entries")]
    EmptyGlossary,
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Any entry, uniformly
    Random,
    /// Entries matching a term or id
    Query { text: String, match_all: bool },
}

impl Selection {
    /// Blank queries select at random
    pub fn from_terms(terms: &[String], match_all: bool) -> Self {
        let text = terms.join(" ").trim().to_string();
        if text.is_empty() {
            Selection::Random
        } else {
            Selection::Query { text, match_all }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Exact,
    Partial,
}

/// Trim, collapse whitespace and lowercase
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn rank(entry: &Entry, needle: &str) -> Option<Rank> {
    let id = normalize(&entry.id);
    let term = normalize(&entry.term);

    if id == needle || term == needle {
        Some(Rank::Exact)
    } else if id.contains(needle) || term.contains(needle) {
        Some(Rank::Partial)
    } else {
        None
    }
}

/// Case-insensitive substring lookup against ids and terms.
///
/// With `match_all`, every matching entry is returned in document order.
/// Otherwise the first exact match wins, falling back to the first partial
/// match.
pub fn resolve_by_query<'g>(
    glossary: &'g Glossary,
    query: &str,
    match_all: bool,
) -> Result<Vec<&'g Entry>, LookupError> {
    let needle = normalize(query);
    let ranked = glossary
        .iter()
        .filter_map(|entry| rank(entry, &needle).map(|r| (r, entry)));

    let found: Vec<&Entry> = if match_all {
        ranked.map(|(_, entry)| entry).collect()
    } else {
        let mut best: Option<(Rank, &Entry)> = None;
        for (r, entry) in ranked {
            if best.is_none_or(|(current, _)| r < current) {
                best = Some((r, entry));
            }
            if r == Rank::Exact {
                break;
            }
        }
        best.map(|(_, entry)| entry).into_iter().collect()
    };

    if found.is_empty() {
        return Err(LookupError::NotFound(query.trim().to_string()));
    }

    debug!(query = %needle, matches = found.len(), match_all, "resolved query");
    Ok(found)
}

/// Uniformly random entry
pub fn resolve_random<'g, R: Rng + ?Sized>(
    glossary: &'g Glossary,
    rng: &mut R,
) -> Result<&'g Entry, LookupError> {
    if glossary.is_empty() {
        return Err(LookupError::EmptyGlossary);
    }
    let index = rng.gen_range(0..glossary.len());
    debug!(index, total = glossary.len(), "picked random entry");
    glossary.get_index(index).ok_or(LookupError::EmptyGlossary)
}

/// Resolve a [`Selection`] to the entries to show
pub fn select<'g, R: Rng + ?Sized>(
    glossary: &'g Glossary,
    selection: &Selection,
    rng: &mut R,
) -> Result<Vec<&'g Entry>, LookupError> {
    match selection {
        Selection::Random => resolve_random(glossary, rng).map(|entry| vec![entry]),
        Selection::Query { text, match_all } => resolve_by_query(glossary, text, *match_all),
    }
}
