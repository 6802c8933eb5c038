//! A random test-grammar generator, for exercising the guess pump and
//! queue against larger-than-handwritten grammars (§8, property-based
//! testing). Grounded on the teacher's own `pta/experiments.rs`, which
//! built random weighted automatons from a seeded RNG for the same
//! purpose; this generalizes that idea to random PCFGs instead of random
//! PTAs.

use log_domain::LogDomain;
use num_traits::One;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::grammar::{Function, Grammar, NonTerminal, Replacement, START_KIND};

/// Generates a grammar with `leaves` terminal non-terminals (each with
/// between 1 and `max_replacements` `Copy` replacements over short
/// alphabetic strings) concatenated in sequence by a single `START`
/// non-terminal. Deterministic for a given `seed`.
pub fn generate(leaves: usize, max_replacements: usize, seed: u64) -> Grammar {
    let mut rng: StdRng = SeedableRng::seed_from_u64(seed);
    let mut non_terminals = Vec::with_capacity(leaves + 1);

    for leaf in 0..leaves {
        let count = rng.gen_range(1..=max_replacements.max(1));
        let mut weights: Vec<f64> = (0..count).map(|_| rng.gen::<f64>() + 0.01).collect();
        let total: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= total;
        }
        weights.sort_by(|a, b| b.partial_cmp(a).unwrap());

        let replacements = weights
            .into_iter()
            .enumerate()
            .map(|(i, probability)| Replacement {
                is_terminal: true,
                probability: LogDomain::new(probability).unwrap(),
                function: Function::Copy,
                values: vec![format!("{}{}", (b'a' + leaf as u8) as char, i)],
                pos: vec![],
            })
            .collect();

        non_terminals.push(NonTerminal { name: format!("L{leaf}"), kind: "LEAF".into(), replacements });
    }

    let start = NonTerminal {
        name: "START".into(),
        kind: START_KIND.into(),
        replacements: vec![Replacement {
            is_terminal: false,
            probability: LogDomain::one(),
            function: Function::Transparent,
            values: vec![],
            pos: (0..leaves).collect(),
        }],
    };
    non_terminals.push(start);

    Grammar::new(non_terminals).expect("generated grammar always satisfies the core invariants")
}
