//! C5: the ranked queue.
//!
//! A bounded max-priority queue of derivations ordered by probability
//! descending (§4.5), wrapping `priority_queue::PriorityQueue` the same
//! way the teacher's own best-first search did (`pta/mod.rs`,
//! `most_probable_tree`), but adding the trim/rebuild discipline the
//! teacher never needed for its small, exhaustively-searched PTAs.

use log::debug;
use log_domain::LogDomain;
use num_traits::{One, Zero};
use priority_queue::PriorityQueue;

use crate::error::QueueFullError;
use crate::grammar::Grammar;
use crate::successor::is_responsible_parent;
use crate::tree::Derivation;

/// Design defaults from §4.5.
pub const DEFAULT_MAX_SIZE: usize = 500_000;

/// The ranked queue.
pub struct RankedQueue {
    items: PriorityQueue<Derivation, LogDomain<f64>>,
    max_size: usize,
    reduction_size: usize,
    max_probability: LogDomain<f64>,
    min_probability: LogDomain<f64>,
}

impl RankedQueue {
    pub fn new(max_size: usize) -> Self {
        RankedQueue {
            items: PriorityQueue::new(),
            max_size,
            reduction_size: (max_size / 4).max(1),
            max_probability: LogDomain::one(),
            min_probability: LogDomain::zero(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_probability(&self) -> LogDomain<f64> {
        self.max_probability
    }

    pub fn min_probability(&self) -> LogDomain<f64> {
        self.min_probability
    }

    /// Admits `node` iff its probability is at least `min_probability`.
    /// Triggers a `trim` if this push grows the queue past `max_size`.
    pub fn push(&mut self, node: Derivation, probability: LogDomain<f64>) -> Result<(), QueueFullError> {
        if probability < self.min_probability {
            return Ok(());
        }
        self.items.push(node, probability);
        if self.items.len() > self.max_size {
            self.trim()?;
        }
        Ok(())
    }

    /// Removes and returns the highest-probability node, updating
    /// `max_probability`.
    pub fn pop(&mut self) -> Option<(Derivation, LogDomain<f64>)> {
        let popped = self.items.pop();
        if let Some((_, probability)) = &popped {
            self.max_probability = *probability;
        }
        popped
    }

    /// Retains the top `max_size - reduction_size` entries, plus every
    /// additional entry tied with the boundary probability (no tie is
    /// split across the cut). Sets `min_probability` to that boundary.
    ///
    /// In-place partition rather than the Python original's
    /// `copy.deepcopy(keep_list)` (§9, open question): entries are popped
    /// off the heap in descending order and pushed straight into a fresh
    /// queue, with no intermediate deep clone of the retained set.
    pub fn trim(&mut self) -> Result<(), QueueFullError> {
        let original_len = self.items.len();
        let keep = original_len.saturating_sub(self.reduction_size).max(1);

        let mut retained = PriorityQueue::new();
        let mut boundary: Option<LogDomain<f64>> = None;
        let mut count = 0usize;

        while let Some((node, probability)) = self.items.pop() {
            if count < keep {
                retained.push(node, probability);
                count += 1;
                boundary = Some(probability);
            } else if Some(probability) == boundary {
                // Tie at the cut: keep it too, the cut never splits ties.
                retained.push(node, probability);
                count += 1;
            } else {
                break;
            }
        }

        // Whatever is left in `self.items` at this point is strictly below
        // the boundary and is discarded by simply not being retained.
        if count == original_len {
            return Err(QueueFullError);
        }

        self.min_probability = boundary.unwrap_or(self.min_probability);
        debug!(
            "trim: {original_len} -> {count} entries, min_probability={}",
            self.min_probability
        );
        self.items = retained;
        Ok(())
    }

    /// Re-walks the derivation DAG from START after the queue has emptied
    /// with `min_probability > 0` (§4.5), admitting only nodes whose
    /// probability lies in `[min_probability, max_probability)` — the band
    /// between the previously emitted region and the newly raised floor.
    ///
    /// Ported from the original's `rebuild_from_max`/`find_my_children`:
    /// walk down from START, and only re-admit a node if the *current*
    /// node is its responsible parent (§4.4) — i.e. some ancestor above it
    /// has already claimed responsibility for re-inserting it, so the walk
    /// never revisits the same derivation twice.
    pub fn rebuild(&mut self, grammar: &Grammar, start_node: Derivation) -> Result<(), QueueFullError> {
        if !self.items.is_empty() {
            return Ok(());
        }
        let old_max = self.max_probability;
        let mut worklist = std::collections::VecDeque::new();
        worklist.push_back(start_node);
        let mut admitted = 0usize;

        while let Some(node) = worklist.pop_front() {
            let probability = match node.probability(grammar) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if probability >= old_max {
                // Already emitted in a previous band; descend further
                // without admitting this node itself.
                for child in node.raw_children(grammar).unwrap_or_default() {
                    if is_responsible_parent(&node, &child, grammar).unwrap_or(false) {
                        worklist.push_back(child);
                    }
                }
                continue;
            }
            if probability < self.min_probability {
                continue;
            }
            self.items.push(node.clone(), probability);
            admitted += 1;
            for child in node.raw_children(grammar).unwrap_or_default() {
                if is_responsible_parent(&node, &child, grammar).unwrap_or(false) {
                    worklist.push_back(child);
                }
            }
        }

        debug!("rebuild: admitted {admitted} entries below {old_max}");

        if self.items.len() > self.max_size {
            self.trim()?;
        }
        Ok(())
    }
}
