//! Entry lookup: case-insensitive term/id matching and random choice.

pub mod resolver;

pub use resolver::{
    normalize, resolve_by_query, resolve_random, select, LookupError, Selection,
};
