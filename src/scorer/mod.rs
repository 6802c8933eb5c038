//! The scorer (spec.md §6): a distinct entry point, reusing the grammar's
//! probability tables but not the enumerator, that assigns a trained
//! probability to one raw password string. Ported from
//! `PcfgGrammar.parse` in `lib_scorer/pcfg_grammar.py`.

pub mod detectors;
pub mod multiword;
pub mod tables;

use serde::{Deserialize, Serialize};

use detectors::Segment;
use multiword::MultiwordDetector;
use tables::{FlatTable, LengthTable};

/// The four categories the scorer assigns, per spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Password,
    Email,
    Website,
    Other,
}

impl Category {
    pub fn as_char(self) -> char {
        match self {
            Category::Password => 'p',
            Category::Email => 'e',
            Category::Website => 'w',
            Category::Other => 'o',
        }
    }
}

/// Holds every count table the scorer consults, plus the multiword
/// detector trained over the alpha table.
///
/// The multiword detector itself is not serialized: it is a derived
/// index over `count_alpha`, rebuilt by `train_multiword_detector` after
/// loading (the same "recompute, don't persist" choice the teacher makes
/// for its own `known_trees` memoization in `most_probable_tree`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scorer {
    pub count_keyboard: LengthTable,
    pub count_years: FlatTable,
    pub count_context_sensitive: FlatTable,
    pub count_alpha: LengthTable,
    pub count_alpha_masks: LengthTable,
    pub count_digits: LengthTable,
    pub count_other: LengthTable,
    pub count_base_structures: FlatTable,
    #[serde(skip)]
    multiword: MultiwordDetector,
}

impl Scorer {
    pub fn new() -> Self {
        Scorer::default()
    }

    /// Rebuilds the multiword detector from the current alpha table.
    /// Must be called after loading/training `count_alpha` and before the
    /// first `score` call (mirrors `create_multiword_detector`, which the
    /// Python caller runs once after training finishes).
    pub fn train_multiword_detector(&mut self) {
        self.multiword = MultiwordDetector::new();
        self.multiword.train_from_alpha_table(&self.count_alpha);
    }

    /// Scores one password, returning its category and probability.
    pub fn score(&self, password: &str) -> (Category, f64) {
        // Keyboard combos can look like many other things, so filter them
        // out before checking for an email/website, matching the fixed
        // pipeline order "keyboard-walk → email → website → …".
        let filtered = detectors::non_walk_text(password);
        if detectors::detect_email(&filtered) {
            return (Category::Email, 0.0);
        }
        if detectors::detect_website(&filtered) {
            return (Category::Website, 0.0);
        }

        let context_sensitive = |s: &str| self.count_context_sensitive.contains(s);
        let segments = detectors::segment(password, &context_sensitive, &self.multiword);

        let base_structure: String = segments.iter().map(detectors::base_tag).collect();

        let mut probability = 1.0f64;
        let mut miss = false;
        for seg in &segments {
            let factor = match seg {
                Segment::Keyboard(s) => self.count_keyboard.lookup(s),
                Segment::Year(s) => self.count_years.lookup(s),
                Segment::ContextSensitive(s) => self.count_context_sensitive.lookup(s),
                Segment::Alpha { words, mask } => {
                    let word_product: Result<f64, _> = words
                        .iter()
                        .try_fold(1.0, |acc, w| self.count_alpha.lookup(w).map(|p| acc * p));
                    match (word_product, self.count_alpha_masks.lookup(mask)) {
                        (Ok(wp), Ok(mp)) => Ok(wp * mp),
                        (Err(e), _) => Err(e),
                        (_, Err(e)) => Err(e),
                    }
                }
                Segment::Digit(s) => self.count_digits.lookup(s),
                Segment::Other(s) => self.count_other.lookup(s),
            };
            match factor {
                Ok(p) => probability *= p,
                Err(_) => {
                    miss = true;
                    break;
                }
            }
        }

        if !miss {
            match self.count_base_structures.lookup(&base_structure) {
                Ok(p) => probability *= p,
                Err(_) => miss = true,
            }
        }

        if miss {
            (Category::Other, 0.0)
        } else {
            (Category::Password, probability)
        }
    }

    /// A minimal single-password trainer: records every fragment this
    /// password segments into at probability 1.0. Exists only to make
    /// the scorer's own round-trip testable (spec.md §8, scenario S6);
    /// the real trainer is out of scope (spec.md §1).
    #[cfg(test)]
    fn observe(&mut self, password: &str) {
        let context_sensitive = |_: &str| false;
        let placeholder = MultiwordDetector::new();
        let segments = detectors::segment(password, &context_sensitive, &placeholder);
        let base_structure: String = segments.iter().map(detectors::base_tag).collect();
        for seg in &segments {
            match seg {
                Segment::Keyboard(s) => self.count_keyboard.set(s.clone(), 1.0),
                Segment::Year(s) => self.count_years.insert(s.clone(), 1.0),
                Segment::ContextSensitive(s) => self.count_context_sensitive.insert(s.clone(), 1.0),
                Segment::Alpha { words, mask } => {
                    for w in words {
                        self.count_alpha.set(w.clone(), 1.0);
                    }
                    self.count_alpha_masks.set(mask.clone(), 1.0);
                }
                Segment::Digit(s) => self.count_digits.set(s.clone(), 1.0),
                Segment::Other(s) => self.count_other.set(s.clone(), 1.0),
            }
        }
        self.count_base_structures.insert(base_structure, 1.0);
        self.train_multiword_detector();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_short_circuits_to_zero_probability() {
        let scorer = Scorer::new();
        let (category, probability) = scorer.score("alice@example.com");
        assert_eq!(category, Category::Email);
        assert_eq!(probability, 0.0);
    }

    #[test]
    fn website_short_circuits_to_zero_probability() {
        let scorer = Scorer::new();
        let (category, probability) = scorer.score("www.example.com");
        assert_eq!(category, Category::Website);
        assert_eq!(probability, 0.0);
    }

    #[test]
    fn trained_password_scores_as_password_with_observed_probability() {
        let mut scorer = Scorer::new();
        scorer.observe("Password123");
        let (category, probability) = scorer.score("Password123");
        assert_eq!(category, Category::Password);
        assert_eq!(probability, 1.0);
    }

    #[test]
    fn unseen_fragment_is_a_table_miss_scored_as_other() {
        let mut scorer = Scorer::new();
        scorer.observe("Password123");
        let (category, probability) = scorer.score("CompletelyDifferent999");
        assert_eq!(category, Category::Other);
        assert_eq!(probability, 0.0);
    }

    #[test]
    fn keyboard_walk_is_stripped_before_email_detection() {
        // "qwerty" is a keyboard walk and is filtered out first, leaving
        // "@example.com" — not a full email match, so this must not
        // short-circuit to Category::Email the way a bare email would.
        let scorer = Scorer::new();
        let (category, _probability) = scorer.score("qwerty@example.com");
        assert_ne!(category, Category::Email);
    }
}
