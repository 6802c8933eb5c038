//! C1: the grammar store.
//!
//! An immutable table of non-terminals and their weighted replacements, as
//! described in §3/§4.1 of the core specification. Built once (by an
//! external trainer, out of scope here) and read-only for the lifetime of
//! the enumeration.

use std::fmt;

use log_domain::LogDomain;
use serde::{Deserialize, Serialize};

use crate::error::GrammarError;

/// One of the four expansion operators a replacement may carry (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    /// Yields `values` directly. Used for pure terminals.
    Copy,
    /// Forwards `values` to its single expansion child, which operates on
    /// those strings instead of its own.
    Shadow,
    /// Receives strings from a `Shadow` parent and a list of `U`/`L` case
    /// masks; emits the cross product of mask × word whose lengths agree.
    Capitalization,
    /// Has no strings of its own; concatenates the sequences produced by
    /// each child, in order (Cartesian concatenation).
    Transparent,
}

/// One production a non-terminal may expand through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    pub is_terminal: bool,
    #[serde(with = "log_prob")]
    pub probability: LogDomain<f64>,
    pub function: Function,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub pos: Vec<usize>,
}

/// A non-terminal: a name, a type tag, and its ordered replacements.
///
/// Replacement probabilities must be non-increasing by index (§3, invariant
/// 2) — this is what makes the deadbeat-dad successor enumeration sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonTerminal {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub replacements: Vec<Replacement>,
}

pub const START_KIND: &str = "START";

/// The immutable grammar table (C1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    non_terminals: Vec<NonTerminal>,
}

impl Grammar {
    /// Builds a grammar from an already-assembled, but not yet validated,
    /// list of non-terminals.
    pub fn new(non_terminals: Vec<NonTerminal>) -> Result<Self, GrammarError> {
        let grammar = Grammar { non_terminals };
        grammar.validate()?;
        Ok(grammar)
    }

    /// Loads and validates a grammar from its serialized (serde) form. The
    /// wire format itself is outside the core's scope (spec.md §6); this is
    /// CLI-boundary glue only.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, Box<dyn std::error::Error>> {
        let non_terminals: Vec<NonTerminal> = serde_json::from_reader(reader)?;
        Ok(Self::new(non_terminals)?)
    }

    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminals
    }

    pub fn len(&self) -> usize {
        self.non_terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.non_terminals.is_empty()
    }

    pub fn non_terminal(&self, index: usize) -> Result<&NonTerminal, GrammarError> {
        self.non_terminals
            .get(index)
            .ok_or(GrammarError::UnknownNonTerminal(index))
    }

    pub fn replacement(&self, g: usize, r: usize) -> Result<&Replacement, GrammarError> {
        let nt = self.non_terminal(g)?;
        nt.replacements
            .get(r)
            .ok_or(GrammarError::UnknownReplacement { non_terminal: g, replacement: r })
    }

    /// Returns the index of the unique `START` non-terminal.
    ///
    /// The Python original's fallback loop compares `self.grammar[-1]`
    /// (always the last element) instead of `self.grammar[index]`, so it
    /// only ever finds a START entry that happens to sit last, or none at
    /// all. This performs the straightforward linear scan the comment above
    /// it claims to do.
    pub fn start_index(&self) -> Result<usize, GrammarError> {
        let mut found = None;
        let mut count = 0usize;
        for (index, nt) in self.non_terminals.iter().enumerate() {
            if nt.kind == START_KIND {
                count += 1;
                if found.is_none() {
                    found = Some(index);
                }
            }
        }
        match count {
            0 => Err(GrammarError::NoStart),
            1 => Ok(found.unwrap()),
            n => Err(GrammarError::AmbiguousStart(n)),
        }
    }

    /// Checks the four grammar invariants from §3.
    fn validate(&self) -> Result<(), GrammarError> {
        self.start_index()?;

        for (g, nt) in self.non_terminals.iter().enumerate() {
            let mut prev_prob: Option<LogDomain<f64>> = None;
            for (r, replacement) in nt.replacements.iter().enumerate() {
                // Invariant 2: non-increasing probability by index.
                if let Some(prev) = prev_prob {
                    if replacement.probability > prev {
                        return Err(GrammarError::NonMonotonicProbability {
                            non_terminal: g,
                            prev_replacement: r - 1,
                            replacement: r,
                        });
                    }
                }
                prev_prob = Some(replacement.probability);

                // Invariant 3: non-terminal replacements need a non-empty pos.
                if !replacement.is_terminal && replacement.pos.is_empty() {
                    return Err(GrammarError::MissingChildren { non_terminal: g, replacement: r });
                }

                // Invariant 4: every pos entry must resolve.
                for (pos_index, &target) in replacement.pos.iter().enumerate() {
                    if target >= self.non_terminals.len() {
                        return Err(GrammarError::DanglingPos {
                            non_terminal: g,
                            replacement: r,
                            pos_index,
                            target,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, nt) in self.non_terminals.iter().enumerate() {
            writeln!(f, "({index})\t{} [{}]", nt.name, nt.kind)?;
            for (r, replacement) in nt.replacements.iter().enumerate() {
                writeln!(
                    f,
                    "\t\t[{r}] {:?} prob={} terminal={} pos={:?}",
                    replacement.function, replacement.probability, replacement.is_terminal, replacement.pos
                )?;
            }
        }
        Ok(())
    }
}

/// `serde(with = "log_prob")`: `LogDomain<f64>` has no `Serialize`/`Deserialize`
/// impl of its own, so replacement probabilities are stored on the wire as a
/// plain `f64` in (0, 1] and converted at the boundary.
mod log_prob {
    use log_domain::LogDomain;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &LogDomain<f64>, s: S) -> Result<S::Ok, S::Error> {
        // `LogDomain` does not expose a direct accessor for the underlying
        // probability; its `Display` impl prints it, so round-trip through
        // that rather than assuming an unstable conversion API.
        let raw: f64 = value.to_string().parse().map_err(serde::ser::Error::custom)?;
        raw.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LogDomain<f64>, D::Error> {
        let raw = f64::deserialize(d)?;
        LogDomain::new(raw).map_err(serde::de::Error::custom)
    }
}
