//! Stop-word language heuristic.
//!
//! Counts whole-word, case-insensitive matches against three fixed stop-word
//! lists and picks the list with the strictly highest count. The result only
//! fills `ContentFeatures::language`.

use crate::types::UNKNOWN;
use once_cell::sync::Lazy;
use regex::Regex;

const ENGLISH: &[&str] = &[
    "the", "and", "is", "are", "was", "were", "of", "to", "in", "that", "it", "with", "for", "this", "have", "be",
    "on", "not", "you", "they",
];

const SPANISH: &[&str] = &[
    "el", "la", "los", "las", "de", "que", "y", "en", "un", "una", "es", "por", "con", "para", "del", "se", "no",
    "su", "al", "lo",
];

const FRENCH: &[&str] = &[
    "le", "la", "les", "de", "des", "et", "est", "un", "une", "du", "que", "en", "pour", "dans", "pas", "qui", "sur",
    "au", "avec", "ce",
];

struct StopWordList {
    code: &'static str,
    pattern: Regex,
}

impl StopWordList {
    fn new(code: &'static str, words: &[&str]) -> Self {
        let alternation = words.join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
            .expect("Stop-word alternation is built from plain words and always compiles");
        Self { code, pattern }
    }
}

static LISTS: Lazy<[StopWordList; 3]> = Lazy::new(|| {
    [
        StopWordList::new("en", ENGLISH),
        StopWordList::new("es", SPANISH),
        StopWordList::new("fr", FRENCH),
    ]
});

/// Guess the language of `text` as `en`, `es`, `fr`, or `unknown`.
///
/// Ties and texts without any stop word yield `unknown`.
///
/// # Example
///
/// ```rust
/// use omnisift::language_detection::detect_language;
///
/// assert_eq!(detect_language("The cat is on the mat and it is happy"), "en");
/// assert_eq!(detect_language("12345"), "unknown");
/// ```
pub fn detect_language(text: &str) -> &'static str {
    let mut best: Option<(&'static str, usize)> = None;
    let mut tied = false;

    for list in LISTS.iter() {
        let count = list.pattern.find_iter(text).count();
        match best {
            Some((_, top)) if count == top => tied = true,
            Some((_, top)) if count < top => {}
            _ => {
                best = Some((list.code, count));
                tied = false;
            }
        }
    }

    match best {
        Some((code, count)) if count > 0 && !tied => code,
        _ => UNKNOWN,
    }
}
