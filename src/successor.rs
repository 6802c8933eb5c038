//! C4: the deadbeat-dad successor algorithm.
//!
//! A derivation reachable from START generally has several parents in the
//! raw child/parent DAG of C2. Enumerating successors naively would
//! re-enqueue the same derivation once per parent. The deadbeat-dad rule
//! (§4.4) instead has each derivation enqueued by exactly one parent: the
//! one with the lowest probability among its parents, ties broken by a
//! fixed structural order (§9, "tie-break determinism" — this spec's own
//! addition, since the original leaves it unspecified).

use std::cmp::Ordering;

use log_domain::LogDomain;

use crate::error::GrammarError;
use crate::grammar::Grammar;
use crate::tree::Derivation;

/// Finds the parent of `child` responsible for emitting it: the
/// lowest-probability parent, with ties broken by `Derivation::cmp_structure`
/// (lexicographically smallest wins).
///
/// This is the shared core behind both `successors` (the hot path) and
/// `RankedQueue::rebuild` (§9: "reuse the parent enumerator only during
/// rebuild verification").
fn responsible_parent<'a>(parents: &'a [Derivation], grammar: &Grammar) -> Result<&'a Derivation, GrammarError> {
    debug_assert!(!parents.is_empty(), "a reachable child always has at least one parent");
    let mut best = &parents[0];
    let mut best_prob = best.probability(grammar)?;
    for candidate in &parents[1..] {
        let prob = candidate.probability(grammar)?;
        let replace = match prob.cmp(&best_prob) {
            Ordering::Less => true,
            Ordering::Equal => candidate.cmp_structure(best) == Ordering::Less,
            Ordering::Greater => false,
        };
        if replace {
            best = candidate;
            best_prob = prob;
        }
    }
    Ok(best)
}

/// True iff `parent` is the node that, among all parents of `child`, is
/// responsible for emitting it.
pub fn is_responsible_parent(
    parent: &Derivation,
    child: &Derivation,
    grammar: &Grammar,
) -> Result<bool, GrammarError> {
    let parents = child.raw_parents(grammar)?;
    Ok(responsible_parent(&parents, grammar)? == parent)
}

/// `successors(p)` (§4.4's observable contract): every child of `p` in the
/// raw DAG for which `p` is the responsible parent, each paired with its
/// already-known probability so the caller (C5) need not recompute it.
pub fn successors(
    parent: &Derivation,
    grammar: &Grammar,
) -> Result<Vec<(Derivation, LogDomain<f64>)>, GrammarError> {
    let mut out = Vec::new();
    for child in parent.raw_children(grammar)? {
        let parents = child.raw_parents(grammar)?;
        let winner = responsible_parent(&parents, grammar)?;
        if winner == parent {
            let prob = child.probability(grammar)?;
            out.push((child, prob));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Function, NonTerminal, Replacement, START_KIND};
    use std::collections::HashSet;

    fn p(v: f64) -> LogDomain<f64> {
        LogDomain::new(v).unwrap()
    }

    fn three_digit_grammar() -> Grammar {
        let d1 = NonTerminal {
            name: "D1".into(),
            kind: "D".into(),
            replacements: vec![
                Replacement {
                    is_terminal: true,
                    probability: p(0.5),
                    function: Function::Copy,
                    values: vec!["1".into()],
                    pos: vec![],
                },
                Replacement {
                    is_terminal: true,
                    probability: p(0.3),
                    function: Function::Copy,
                    values: vec!["2".into()],
                    pos: vec![],
                },
                Replacement {
                    is_terminal: true,
                    probability: p(0.2),
                    function: Function::Copy,
                    values: vec!["3".into()],
                    pos: vec![],
                },
            ],
        };
        let d2 = NonTerminal {
            name: "D2".into(),
            kind: "D".into(),
            replacements: vec![
                Replacement {
                    is_terminal: true,
                    probability: p(0.7),
                    function: Function::Copy,
                    values: vec!["a".into()],
                    pos: vec![],
                },
                Replacement {
                    is_terminal: true,
                    probability: p(0.3),
                    function: Function::Copy,
                    values: vec!["b".into()],
                    pos: vec![],
                },
            ],
        };
        let start = NonTerminal {
            name: "START".into(),
            kind: START_KIND.into(),
            replacements: vec![Replacement {
                is_terminal: false,
                probability: p(1.0),
                function: Function::Transparent,
                values: vec![],
                pos: vec![0, 1],
            }],
        };
        Grammar::new(vec![d1, d2, start]).unwrap()
    }

    #[test]
    fn every_successor_has_probability_at_most_parent() {
        let grammar = three_digit_grammar();
        let start = grammar.start_index().unwrap();
        let root = Derivation::leaf(start, 0);
        let root_prob = root.probability(&grammar).unwrap();
        for (child, prob) in successors(&root, &grammar).unwrap() {
            assert!(prob <= root_prob);
            assert_eq!(child.probability(&grammar).unwrap(), prob);
        }
    }

    #[test]
    fn full_walk_visits_every_derivation_exactly_once() {
        let grammar = three_digit_grammar();
        let start = grammar.start_index().unwrap();
        let root = Derivation::leaf(start, 0);

        let mut seen = HashSet::new();
        let mut frontier = vec![root.clone()];
        seen.insert(root);
        while let Some(node) = frontier.pop() {
            for (child, _) in successors(&node, &grammar).unwrap() {
                assert!(seen.insert(child.clone()), "derivation {child:?} reached twice");
                frontier.push(child);
            }
        }

        // Expect: the root, the increment chain on D1 (index 0 is the one
        // unexpanded leaf, already counted as `root`), each of the 3 D1
        // alternatives times 2 D2 alternatives fully expanded, plus every
        // partially-expanded intermediate (one side expanded, the other
        // not). Just assert the fully expanded leaves are all present and
        // unique, which is the property this test exists to check.
        let fully_expanded: Vec<_> = seen
            .iter()
            .filter(|n| n.is_fully_expanded(&grammar).unwrap())
            .collect();
        assert_eq!(fully_expanded.len(), 6);
    }

    #[test]
    fn responsible_parent_is_deterministic_on_ties() {
        // Two replacements tied at the same probability: the tie-break
        // must be stable across repeated calls.
        let nt = NonTerminal {
            name: "T".into(),
            kind: "T".into(),
            replacements: vec![
                Replacement {
                    is_terminal: true,
                    probability: p(0.5),
                    function: Function::Copy,
                    values: vec!["x".into()],
                    pos: vec![],
                },
                Replacement {
                    is_terminal: true,
                    probability: p(0.5),
                    function: Function::Copy,
                    values: vec!["y".into()],
                    pos: vec![],
                },
            ],
        };
        let start = NonTerminal {
            name: "START".into(),
            kind: START_KIND.into(),
            replacements: vec![Replacement {
                is_terminal: false,
                probability: p(1.0),
                function: Function::Transparent,
                values: vec![],
                pos: vec![0],
            }],
        };
        let grammar = Grammar::new(vec![nt, start]).unwrap();
        let child = Derivation::leaf(0, 1);
        let parents = child.raw_parents(&grammar).unwrap();
        let a = responsible_parent(&parents, &grammar).unwrap().clone();
        let b = responsible_parent(&parents, &grammar).unwrap().clone();
        assert_eq!(a, b);
    }
}
