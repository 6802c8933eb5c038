//! C3: terminal expander.
//!
//! Turns a fully-expanded derivation into the set of concrete guess
//! strings it represents (§4.3). Traversal is bottom-up: every node yields
//! a `Vec<String>`, and a node's function decides how its own strings
//! combine with whatever its children yielded.

use crate::error::GrammarError;
use crate::grammar::{Function, Grammar};
use crate::tree::Derivation;

/// Expands a fully-expanded derivation into its guess strings.
///
/// Behavior is undefined (and will likely return nonsense, not panic) if
/// `node` is not actually fully expanded; callers are expected to have
/// checked `Derivation::is_fully_expanded` already, matching the guess
/// pump's own ordering of operations (§4.6, step 5).
pub fn expand(node: &Derivation, grammar: &Grammar) -> Result<Vec<String>, GrammarError> {
    expand_shadowed(node, grammar, None)
}

/// `shadow`: strings forwarded down from a `Shadow` parent, consumed by
/// the next `Capitalization` node encountered. `Shadow` itself has
/// exactly one child (its `pos[0]`), so the forwarded strings never need
/// to survive past that one recursive call.
fn expand_shadowed(
    node: &Derivation,
    grammar: &Grammar,
    shadow: Option<&[String]>,
) -> Result<Vec<String>, GrammarError> {
    let replacement = grammar.replacement(node.g, node.r)?;
    match replacement.function {
        Function::Copy => Ok(replacement.values.clone()),
        Function::Shadow => {
            let child = node
                .children
                .first()
                .ok_or(GrammarError::MalformedDerivation)?;
            expand_shadowed(child, grammar, Some(&replacement.values))
        }
        Function::Capitalization => {
            let words = shadow.ok_or(GrammarError::MalformedDerivation)?;
            let mut out = Vec::new();
            for mask in &replacement.values {
                for word in words {
                    if mask.chars().count() != word.chars().count() {
                        continue;
                    }
                    let cased: String = word
                        .chars()
                        .zip(mask.chars())
                        .map(|(c, m)| if m == 'U' { c.to_ascii_uppercase() } else { c })
                        .collect();
                    out.push(cased);
                }
            }
            Ok(out)
        }
        Function::Transparent => {
            let mut acc = vec![String::new()];
            for child in &node.children {
                let child_strings = expand_shadowed(child, grammar, None)?;
                let mut next = Vec::with_capacity(acc.len() * child_strings.len());
                for prefix in &acc {
                    for s in &child_strings {
                        next.push(format!("{prefix}{s}"));
                    }
                }
                acc = next;
            }
            Ok(acc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{NonTerminal, Replacement, START_KIND};
    use log_domain::LogDomain;

    fn p(v: f64) -> LogDomain<f64> {
        LogDomain::new(v).unwrap()
    }

    fn capitalized_cat_grammar() -> Grammar {
        // L -> Shadow ["cat"] (prob 1.0, pos=[CAP])
        // CAP -> Capitalization ["UL L".chars? use "ULL"] (prob 0.6)
        // START -> Transparent [L] (prob 1.0)
        let cap = NonTerminal {
            name: "CAP".into(),
            kind: "CAP".into(),
            replacements: vec![Replacement {
                is_terminal: true,
                probability: p(0.6),
                function: Function::Capitalization,
                values: vec!["ULL".into()],
                pos: vec![],
            }],
        };
        let shadow = NonTerminal {
            name: "L".into(),
            kind: "L".into(),
            replacements: vec![Replacement {
                is_terminal: false,
                probability: p(1.0),
                function: Function::Shadow,
                values: vec!["cat".into()],
                pos: vec![0],
            }],
        };
        let start = NonTerminal {
            name: "START".into(),
            kind: START_KIND.into(),
            replacements: vec![Replacement {
                is_terminal: false,
                probability: p(1.0),
                function: Function::Transparent,
                values: vec![],
                pos: vec![1],
            }],
        };
        Grammar::new(vec![cap, shadow, start]).unwrap()
    }

    #[test]
    fn shadow_and_capitalization_produce_cat_variant() {
        let grammar = capitalized_cat_grammar();
        let start = grammar.start_index().unwrap();
        let node = Derivation::with_children(
            start,
            0,
            vec![Derivation::with_children(1, 0, vec![Derivation::leaf(0, 0)])],
        );
        let guesses = expand(&node, &grammar).unwrap();
        assert_eq!(guesses, vec!["Cat".to_string()]);
        assert_eq!(node.probability(&grammar).unwrap(), p(1.0) * p(1.0) * p(0.6));
    }

    #[test]
    fn transparent_concatenates_cartesian_product() {
        let digits = NonTerminal {
            name: "D".into(),
            kind: "D".into(),
            replacements: vec![Replacement {
                is_terminal: true,
                probability: p(1.0),
                function: Function::Copy,
                values: vec!["1".into(), "2".into()],
                pos: vec![],
            }],
        };
        let letters = NonTerminal {
            name: "A".into(),
            kind: "A".into(),
            replacements: vec![Replacement {
                is_terminal: true,
                probability: p(1.0),
                function: Function::Copy,
                values: vec!["cat".into(), "dog".into()],
                pos: vec![],
            }],
        };
        let start = NonTerminal {
            name: "START".into(),
            kind: START_KIND.into(),
            replacements: vec![Replacement {
                is_terminal: false,
                probability: p(1.0),
                function: Function::Transparent,
                values: vec![],
                pos: vec![1, 0],
            }],
        };
        let grammar = Grammar::new(vec![digits, letters, start]).unwrap();
        let start_idx = grammar.start_index().unwrap();
        let node = Derivation::with_children(
            start_idx,
            0,
            vec![Derivation::leaf(1, 0), Derivation::leaf(0, 0)],
        );
        let guesses = expand(&node, &grammar).unwrap();
        assert_eq!(
            guesses,
            vec!["cat1", "cat2", "dog1", "dog2"].into_iter().map(String::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn mismatched_mask_length_is_skipped() {
        let cap = NonTerminal {
            name: "CAP".into(),
            kind: "CAP".into(),
            replacements: vec![Replacement {
                is_terminal: true,
                probability: p(1.0),
                function: Function::Capitalization,
                values: vec!["UU".into()],
                pos: vec![],
            }],
        };
        let shadow = NonTerminal {
            name: "L".into(),
            kind: "L".into(),
            replacements: vec![Replacement {
                is_terminal: false,
                probability: p(1.0),
                function: Function::Shadow,
                values: vec!["cat".into(), "at".into()],
                pos: vec![0],
            }],
        };
        let grammar = Grammar::new(vec![
            cap,
            shadow,
            NonTerminal {
                name: "START".into(),
                kind: START_KIND.into(),
                replacements: vec![Replacement {
                    is_terminal: false,
                    probability: p(1.0),
                    function: Function::Transparent,
                    values: vec![],
                    pos: vec![1],
                }],
            },
        ])
        .unwrap();
        let start = grammar.start_index().unwrap();
        let node = Derivation::with_children(
            start,
            0,
            vec![Derivation::with_children(1, 0, vec![Derivation::leaf(0, 0)])],
        );
        let guesses = expand(&node, &grammar).unwrap();
        assert_eq!(guesses, vec!["AT".to_string()]);
    }

    #[test]
    fn multibyte_word_is_matched_against_mask_by_char_count_not_bytes() {
        // "café" is 4 chars but 5 bytes; a 4-char mask must still align
        // with it rather than being treated as a length mismatch.
        let cap = NonTerminal {
            name: "CAP".into(),
            kind: "CAP".into(),
            replacements: vec![Replacement {
                is_terminal: true,
                probability: p(1.0),
                function: Function::Capitalization,
                values: vec!["ULLL".into()],
                pos: vec![],
            }],
        };
        let shadow = NonTerminal {
            name: "L".into(),
            kind: "L".into(),
            replacements: vec![Replacement {
                is_terminal: false,
                probability: p(1.0),
                function: Function::Shadow,
                values: vec!["café".into()],
                pos: vec![0],
            }],
        };
        let grammar = Grammar::new(vec![
            cap,
            shadow,
            NonTerminal {
                name: "START".into(),
                kind: START_KIND.into(),
                replacements: vec![Replacement {
                    is_terminal: false,
                    probability: p(1.0),
                    function: Function::Transparent,
                    values: vec![],
                    pos: vec![1],
                }],
            },
        ])
        .unwrap();
        let start = grammar.start_index().unwrap();
        let node = Derivation::with_children(
            start,
            0,
            vec![Derivation::with_children(1, 0, vec![Derivation::leaf(0, 0)])],
        );
        let guesses = expand(&node, &grammar).unwrap();
        assert_eq!(guesses, vec!["Café".to_string()]);
    }
}
