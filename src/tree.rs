//! C2: parse-tree algebra.
//!
//! Operations on derivation ("parse") trees: probability evaluation,
//! full-expansion check, cheap copy, and the raw child/parent enumeration
//! that underlies (but is not itself) the deadbeat-dad successor relation
//! of C4. §4.2 of the core specification.

use std::cmp::Ordering;

use log_domain::LogDomain;
use num_traits::{One, Zero};

use crate::error::GrammarError;
use crate::grammar::Grammar;

/// A node in a derivation tree: `(g, r, children)` from §3. `g` indexes the
/// grammar, `r` indexes `grammar[g].replacements`, and `children` is empty
/// until the node has been expanded.
///
/// Kept as a plain recursive structure, in the style of the teacher's own
/// `Tree<A>` (`pta/tree.rs`), rather than a shared global arena: each
/// `Derivation` is independently owned the moment it leaves the ranked
/// queue (§5, shared-resource policy), so there is no cross-tree sharing to
/// economize on. `#[derive(Clone)]` here is already a single flat
/// reallocation per tree level rather than the teacher's own
/// `HashSet<Tree<A>>`-memoized general clone, which is the specialization
/// §4.2 asks `copy` to have over a generic structural clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Derivation {
    pub g: usize,
    pub r: usize,
    pub children: Vec<Derivation>,
}

impl Derivation {
    pub fn leaf(g: usize, r: usize) -> Self {
        Derivation { g, r, children: Vec::new() }
    }

    pub fn with_children(g: usize, r: usize, children: Vec<Derivation>) -> Self {
        Derivation { g, r, children }
    }

    /// `copy(n)`: a deep clone with no shared substructure.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// The probability of this node: the product of its own replacement's
    /// probability and the probabilities of each child (§3).
    pub fn probability(&self, grammar: &Grammar) -> Result<LogDomain<f64>, GrammarError> {
        let replacement = grammar.replacement(self.g, self.r)?;
        let mut product = replacement.probability;
        for child in &self.children {
            product = product * child.probability(grammar)?;
        }
        Ok(product)
    }

    /// True iff every reachable node is either a terminal replacement with
    /// no children, or a non-terminal replacement fully expanded.
    pub fn is_fully_expanded(&self, grammar: &Grammar) -> Result<bool, GrammarError> {
        let replacement = grammar.replacement(self.g, self.r)?;
        if !replacement.is_terminal && self.children.is_empty() {
            return Ok(false);
        }
        for child in &self.children {
            if !child.is_fully_expanded(grammar)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The raw successor set (§4.2): increment, expand, and recurse. This is
    /// the many-to-many relation the deadbeat-dad rule (C4) partitions; it
    /// is not used on the hot enumeration path itself (§9, design notes),
    /// only as a building block for parent probes and for queue rebuild.
    pub fn raw_children(&self, grammar: &Grammar) -> Result<Vec<Derivation>, GrammarError> {
        let mut out = Vec::new();
        if self.children.is_empty() {
            let replacements = &grammar.non_terminal(self.g)?.replacements;

            // Increment.
            if self.r + 1 < replacements.len() {
                out.push(Derivation::leaf(self.g, self.r + 1));
            }

            // Expand.
            let current = grammar.replacement(self.g, self.r)?;
            if !replacements[0].is_terminal {
                let children = current.pos.iter().map(|&p| Derivation::leaf(p, 0)).collect();
                out.push(Derivation::with_children(self.g, self.r, children));
            }
        } else {
            // Recurse: for each child position, for each of that child's raw
            // children, splice it back in at the same position.
            for i in 0..self.children.len() {
                for replaced in self.children[i].raw_children(grammar)? {
                    let mut children = self.children.clone();
                    children[i] = replaced;
                    out.push(Derivation::with_children(self.g, self.r, children));
                }
            }
        }
        Ok(out)
    }

    /// The raw parent set (§4.2, "Parent rules"), the inverse of
    /// `raw_children`.
    pub fn raw_parents(&self, grammar: &Grammar) -> Result<Vec<Derivation>, GrammarError> {
        let mut out = Vec::new();
        if self.children.is_empty() {
            if self.r > 0 {
                out.push(Derivation::leaf(self.g, self.r - 1));
            }
        } else {
            for i in 0..self.children.len() {
                for parent in self.children[i].raw_parents(grammar)? {
                    let mut children = self.children.clone();
                    children[i] = parent;
                    out.push(Derivation::with_children(self.g, self.r, children));
                }
            }
            // Canonical "first expansion" collapse: if every child sits at
            // its own replacement index 0 with no further children, this
            // whole expansion may also be undone wholesale.
            if self.children.iter().all(|c| c.r == 0 && c.children.is_empty()) {
                out.push(Derivation::leaf(self.g, self.r));
            }
        }
        Ok(out)
    }

    /// The deterministic tie-break from §4.4/§9: lexicographic comparison of
    /// parent trees, preorder over `(g, r)` pairs with children compared
    /// pairwise (and a shorter child list sorting first, so a leaf never
    /// ties against a strict prefix of an expansion of itself).
    pub fn cmp_structure(&self, other: &Derivation) -> Ordering {
        self.g
            .cmp(&other.g)
            .then_with(|| self.r.cmp(&other.r))
            .then_with(|| self.children.len().cmp(&other.children.len()))
            .then_with(|| {
                for (a, b) in self.children.iter().zip(&other.children) {
                    let ord = a.cmp_structure(b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            })
    }
}

/// Returns the probability (zero on error) — a convenience used by callers
/// that treat an inconsistent grammar reference as "never admit this node"
/// rather than propagating a hard error through a comparator.
pub fn probability_or_zero(node: &Derivation, grammar: &Grammar) -> LogDomain<f64> {
    node.probability(grammar).unwrap_or_else(|_| LogDomain::zero())
}

/// The unit probability, re-exported for callers that need a neutral
/// starting value (e.g. the queue's initial `max_probability`).
pub fn unit_probability() -> LogDomain<f64> {
    LogDomain::one()
}
