use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Fatal errors raised before any search begins.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Invalid card token {token:?}")]
    InvalidCardFormat { token: String },
    #[error("Invalid initial state: {0}")]
    InvalidInitialState(#[from] InvalidState),
    #[error("Deal has {found} columns, expected at most {}", crate::tableau::NUM_COLS)]
    TooManyColumns { found: usize },
    #[error("Invalid seed {seed:?}: {reason}")]
    InvalidSeed { seed: String, reason: String },
    #[error("Could not read deal file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One of the layout invariants checked at load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Invariant {
    BufferCapacity,
    FlowerPresence,
    ColorGroups,
    ContiguousRanks,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Invariant::BufferCapacity => "buffer within capacity",
            Invariant::FlowerPresence => "flower presence",
            Invariant::ColorGroups => "complete color groups",
            Invariant::ContiguousRanks => "contiguous ranks",
        })
    }
}

/// A layout that violates one of the invariants, with a description of the
/// offending area.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{invariant} violated\n{detail}")]
pub struct InvalidState {
    pub invariant: Invariant,
    pub detail: String,
}
