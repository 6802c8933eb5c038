//! Error taxonomy for the grammar engine and the ranked enumerator.
//!
//! Mirrors the three failure modes the Python original signals through
//! `RetType` (`GRAMMAR_ERROR`, `QUEUE_FULL_ERROR`, `QUEUE_EMPTY`), plus the
//! scorer-only `TableMiss`.

use thiserror::Error;

/// A malformed grammar, detected at use rather than at load time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("grammar has no non-terminal of type START")]
    NoStart,
    #[error("grammar has {0} non-terminals of type START, expected exactly one")]
    AmbiguousStart(usize),
    #[error("non-terminal index {0} is out of range")]
    UnknownNonTerminal(usize),
    #[error("replacement index {replacement} is out of range for non-terminal {non_terminal}")]
    UnknownReplacement { non_terminal: usize, replacement: usize },
    #[error("replacement {non_terminal}/{replacement} is marked is_terminal=false but has an empty pos list")]
    MissingChildren { non_terminal: usize, replacement: usize },
    #[error("pos entry {pos_index} of replacement {non_terminal}/{replacement} points at non-existent non-terminal {target}")]
    DanglingPos { non_terminal: usize, replacement: usize, pos_index: usize, target: usize },
    #[error("replacement {replacement} of non-terminal {non_terminal} has a higher probability than replacement {prev_replacement}, violating the non-increasing-by-index invariant")]
    NonMonotonicProbability { non_terminal: usize, prev_replacement: usize, replacement: usize },
    #[error("derivation node shape does not match its replacement's arity")]
    MalformedDerivation,
}

/// Raised when `RankedQueue::trim` cannot reduce the queue: the retained
/// tie-band equals the entire queue, which indicates a grammar that
/// violates the monotone-probability invariant (§3, invariant 2 of the
/// core specification).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("trim could not reduce the queue: the tie-band at the cut spans the whole queue")]
pub struct QueueFullError;

/// Top-level error returned by the guess pump.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PcfgError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    QueueFull(#[from] QueueFullError),
}

/// Scorer-only: a count-table lookup found no entry for the requested
/// fragment/length. Treated as zero probability by the caller; this type
/// exists so `Scorer::score` can report *which* lookup missed when asked.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no table entry for fragment {fragment:?} (length {length})")]
pub struct TableMiss {
    pub fragment: String,
    pub length: usize,
}
