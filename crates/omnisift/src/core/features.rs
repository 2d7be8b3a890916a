//! Content feature analysis.
//!
//! Text, structure, encoding and language sniffing over the leading bytes of a
//! buffer. Used by the detector and exposed for callers that want the
//! features without a full classification.

use crate::language_detection::detect_language;
use crate::types::ContentFeatures;
use once_cell::sync::Lazy;
use regex::Regex;

/// Number of leading bytes inspected by every heuristic.
pub const SAMPLE_SIZE: usize = 1024;

/// A text is printable when strictly more than this share of sampled bytes is.
pub const PRINTABLE_RATIO_THRESHOLD: f64 = 0.7;

/// Number of leading lines compared by the CSV consistency check.
const CSV_SAMPLE_LINES: usize = 5;

static XML_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<\?xml").expect("XML declaration regex pattern is valid and should compile"));
static XML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<[^>]+>").expect("XML tag regex pattern is valid and should compile"));

/// Stateless analyzer for [`ContentFeatures`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFeatureAnalyzer;

impl ContentFeatureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Compute text/structure/encoding/language features for `buffer`.
    ///
    /// Media flags (`has_images`, `has_audio`, `has_video`) are left false;
    /// they depend on the signature scan and are set by the detector.
    pub fn analyze(&self, buffer: &[u8]) -> ContentFeatures {
        let sample = sample(buffer);
        let has_text = is_text(sample);

        if !has_text {
            return ContentFeatures::default();
        }

        let text = String::from_utf8_lossy(sample);
        ContentFeatures {
            has_text,
            is_structured: is_structured(&text),
            encoding: "utf-8".to_string(),
            language: detect_language(&text).to_string(),
            ..ContentFeatures::default()
        }
    }
}

/// The first [`SAMPLE_SIZE`] bytes, or the whole buffer when shorter.
pub fn sample(buffer: &[u8]) -> &[u8] {
    &buffer[..buffer.len().min(SAMPLE_SIZE)]
}

/// Printable-ratio text test over an already-sampled slice.
///
/// Printable bytes are tab, LF, CR and `0x20..=0x7E`. An empty slice is not text.
pub fn is_text(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    let printable = sample
        .iter()
        .filter(|&&b| matches!(b, 9 | 10 | 13 | 32..=126))
        .count();
    (printable as f64 / sample.len() as f64) > PRINTABLE_RATIO_THRESHOLD
}

/// Structure test, checked in order: JSON parse, XML prefix, CSV line shape.
pub fn is_structured(text: &str) -> bool {
    if serde_json::from_str::<serde_json::Value>(text).is_ok() {
        return true;
    }
    if XML_DECLARATION.is_match(text) || XML_TAG.is_match(text) {
        return true;
    }
    looks_like_csv(text)
}

/// Every sampled line has within one comma of the first line's count, and the
/// first line has at least one comma. Blank lines are skipped.
pub(crate) fn looks_like_csv(text: &str) -> bool {
    let counts: Vec<usize> = text
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .take(CSV_SAMPLE_LINES)
        .map(|line| line.matches(',').count())
        .collect();

    let Some(&first) = counts.first() else {
        return false;
    };
    first > 0 && counts.iter().all(|&count| count.abs_diff(first) <= 1)
}
