//! C6: the guess pump.
//!
//! Drives the loop from §4.6: pop the highest-probability derivation,
//! push its deadbeat-dad successors, and if the popped derivation is
//! fully expanded, hand it to the terminal expander and emit its guesses.

use log::info;
use log_domain::LogDomain;
use num_traits::Zero;

use crate::error::PcfgError;
use crate::expander;
use crate::grammar::Grammar;
use crate::queue::RankedQueue;
use crate::successor::successors;
use crate::tree::Derivation;

/// Iterates guesses in non-increasing probability order (until the first
/// trim; see §5, "ordering guarantees").
pub struct GuessPump<'g> {
    grammar: &'g Grammar,
    queue: RankedQueue,
    start: Derivation,
    pending: std::vec::IntoIter<String>,
    done: bool,
}

impl<'g> GuessPump<'g> {
    pub fn new(grammar: &'g Grammar, max_size: usize) -> Result<Self, PcfgError> {
        let start_index = grammar.start_index()?;
        let start = Derivation::leaf(start_index, 0);
        let mut queue = RankedQueue::new(max_size);
        let probability = start.probability(grammar)?;
        queue.push(start.clone(), probability)?;
        Ok(GuessPump { grammar, queue, start, pending: Vec::new().into_iter(), done: false })
    }

    /// Advances the pump until it has a guess ready, the stream ends, or
    /// an error occurs. §4.6, steps 1-6.
    fn advance(&mut self) -> Result<Option<String>, PcfgError> {
        loop {
            if let Some(guess) = self.pending.next() {
                return Ok(Some(guess));
            }

            if self.queue.is_empty() {
                if self.queue.min_probability() == LogDomain::zero() {
                    return Ok(None);
                }
                info!("queue exhausted, rebuilding from START");
                self.queue.rebuild(self.grammar, self.start.clone())?;
                if self.queue.is_empty() {
                    return Ok(None);
                }
            }

            let (node, _) = self.queue.pop().expect("checked non-empty above");

            for (child, probability) in successors(&node, self.grammar)? {
                self.queue.push(child, probability)?;
            }

            if node.is_fully_expanded(self.grammar)? {
                let guesses = expander::expand(&node, self.grammar)?;
                self.pending = guesses.into_iter();
            }
        }
    }
}

impl<'g> Iterator for GuessPump<'g> {
    type Item = Result<String, PcfgError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(guess)) => Some(Ok(guess)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
