//! Lexical detectors: the fixed-order segmentation pipeline from spec.md
//! §6 (keyboard-walk → email → website → year → context-sensitive →
//! alpha+mask → digit → other). The trainer's actual detector
//! implementations (`lib_trainer.*`) were not retrieved; these are
//! original, deterministic re-implementations of the same idea, built
//! from regexes and small fixed tables in the style of the rest of the
//! pack (see `DESIGN.md`). Only the fixed pipeline *order* and the
//! multiword training rule (`multiword.rs`) are part of the observable
//! contract this crate must preserve exactly.

use std::sync::OnceLock;

use regex::Regex;

use crate::scorer::multiword::MultiwordDetector;

/// A single classified piece of a password, in left-to-right order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Keyboard(String),
    Year(String),
    ContextSensitive(String),
    /// An alpha run, pre-split by the multiword detector (a single-element
    /// vec if no split was found), plus its case mask.
    Alpha { words: Vec<String>, mask: String },
    Digit(String),
    Other(String),
}

const KEYBOARD_ROWS: &[&str] = &["qwertyuiop", "asdfghjklm", "zxcvbnm", "1234567890"];
const MIN_KEYBOARD_WALK: usize = 4;

fn is_adjacent_on_a_row(a: char, b: char) -> bool {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    KEYBOARD_ROWS.iter().any(|row| {
        let chars: Vec<char> = row.chars().collect();
        chars.windows(2).any(|w| (w[0] == a && w[1] == b) || (w[0] == b && w[1] == a))
    })
}

/// Finds maximal runs of 4+ adjacent-on-keyboard characters. Returns the
/// password split into an alternating sequence of (is_walk, text) pieces.
pub(crate) fn split_keyboard_walks(password: &str) -> Vec<(bool, String)> {
    let chars: Vec<char> = password.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let mut j = i + 1;
        while j < chars.len() && is_adjacent_on_a_row(chars[j - 1], chars[j]) {
            j += 1;
        }
        let run_len = j - i;
        if run_len >= MIN_KEYBOARD_WALK {
            out.push((true, chars[i..j].iter().collect()));
            i = j;
        } else {
            // Not a walk: consume one character as plain text, merging
            // into the previous plain-text piece if there is one.
            let ch = chars[i].to_string();
            match out.last_mut() {
                Some((false, text)) => text.push_str(&ch),
                _ => out.push((false, ch)),
            }
            i += 1;
        }
    }
    out
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap())
}

fn website_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(https?://)?(www\.)?[a-z0-9-]+\.(com|net|org|io|co|gov|edu)(/.*)?$").unwrap())
}

/// The password with every keyboard-walk run stripped out, keyboard and
/// non-keyboard pieces concatenated back together in order. The original
/// `PcfgGrammar.parse` always filters keyboard combos out first
/// (`section_list, found_walks = detect_keyboard_walk(password)`) and runs
/// email/website detection on that filtered section list, never on the raw
/// password — so a string like `"qwerty@example.com"` has `"qwerty"`
/// stripped as a keyboard walk before `"@example.com"` is checked against
/// the email pattern, and does not short-circuit to `Category::Email`.
pub fn non_walk_text(password: &str) -> String {
    split_keyboard_walks(password)
        .into_iter()
        .filter_map(|(is_walk, text)| if is_walk { None } else { Some(text) })
        .collect()
}

/// Short-circuit checks (spec.md §6: "if category is `e` or `w`,
/// probability is 0 and scoring short-circuits"), run against
/// keyboard-walk-filtered text, matching the fixed pipeline order
/// "keyboard-walk → email → website → …".
pub fn detect_email(password: &str) -> bool {
    email_regex().is_match(password)
}

pub fn detect_website(password: &str) -> bool {
    !detect_email(password) && website_regex().is_match(password)
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(19|20)\d{2}$").unwrap())
}

fn case_mask(word: &str) -> String {
    word.chars().map(|c| if c.is_uppercase() { 'U' } else { 'L' }).collect()
}

/// Runs the fixed detector pipeline over a password that is already known
/// not to be an email or a website, producing its ordered segment list.
pub fn segment(password: &str, context_sensitive: &dyn Fn(&str) -> bool, multiword: &MultiwordDetector) -> Vec<Segment> {
    let mut segments = Vec::new();
    for (is_walk, text) in split_keyboard_walks(password) {
        if is_walk {
            segments.push(Segment::Keyboard(text));
            continue;
        }
        for run in split_char_classes(&text) {
            segments.push(classify_run(run, context_sensitive, multiword));
        }
    }
    segments
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Alpha,
    Digit,
    Other,
}

fn classify_char(c: char) -> CharClass {
    if c.is_ascii_alphabetic() {
        CharClass::Alpha
    } else if c.is_ascii_digit() {
        CharClass::Digit
    } else {
        CharClass::Other
    }
}

fn split_char_classes(text: &str) -> Vec<(CharClass, String)> {
    let mut out: Vec<(CharClass, String)> = Vec::new();
    for c in text.chars() {
        let class = classify_char(c);
        match out.last_mut() {
            Some((last_class, run)) if *last_class == class => run.push(c),
            _ => out.push((class, c.to_string())),
        }
    }
    out
}

fn classify_run(run: (CharClass, String), context_sensitive: &dyn Fn(&str) -> bool, multiword: &MultiwordDetector) -> Segment {
    let (class, text) = run;
    match class {
        CharClass::Digit => {
            if year_regex().is_match(&text) {
                Segment::Year(text)
            } else {
                Segment::Digit(text)
            }
        }
        CharClass::Other => Segment::Other(text),
        CharClass::Alpha => {
            if context_sensitive(&text) {
                return Segment::ContextSensitive(text);
            }
            let mask = case_mask(&text);
            let words = multiword.split(&text).unwrap_or_else(|| vec![text.clone()]);
            Segment::Alpha { words, mask }
        }
    }
}

/// The base-structure tag for one segment (e.g. `A5`, `D3`, `S1`, `K4`,
/// `Y4`, `X8`), concatenated across all segments to form the grammar's
/// base structure key.
pub fn base_tag(segment: &Segment) -> String {
    match segment {
        Segment::Keyboard(s) => format!("K{}", s.chars().count()),
        Segment::Year(_) => "Y4".to_string(),
        Segment::ContextSensitive(s) => format!("X{}", s.chars().count()),
        Segment::Alpha { words, .. } => format!("A{}", words.iter().map(|w| w.chars().count()).sum::<usize>()),
        Segment::Digit(s) => format!("D{}", s.chars().count()),
        Segment::Other(s) => format!("S{}", s.chars().count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_detection_matches_whole_address() {
        assert!(detect_email("alice@example.com"));
        assert!(!detect_email("not-an-email"));
    }

    #[test]
    fn website_detection_matches_common_tlds() {
        assert!(detect_website("www.example.com"));
        assert!(detect_website("http://example.org/path"));
        assert!(!detect_website("Password123"));
    }

    #[test]
    fn keyboard_walk_is_detected_and_removed() {
        let pieces = split_keyboard_walks("qwertyXYZ");
        assert_eq!(pieces[0], (true, "qwerty".to_string()));
        assert_eq!(pieces[1], (false, "XYZ".to_string()));
    }

    #[test]
    fn digit_run_matching_year_pattern_is_tagged_as_year() {
        let multiword = MultiwordDetector::new();
        let segments = segment("1999", &|_| false, &multiword);
        assert_eq!(segments, vec![Segment::Year("1999".into())]);
    }

    #[test]
    fn char_classes_split_into_runs() {
        let runs = split_char_classes("abc123!!");
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].0, CharClass::Alpha);
        assert_eq!(runs[1].0, CharClass::Digit);
        assert_eq!(runs[2].0, CharClass::Other);
    }
}
