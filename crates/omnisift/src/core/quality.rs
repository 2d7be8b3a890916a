//! Completeness and quality scoring for assembled metadata.

use crate::types::{
    ContentMetadata, ContentType, ContentTypeResult, IssueSeverity, QualityIssue, QualityMetadata, UNKNOWN,
};

/// Detection confidence below which a low-severity issue is reported.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Points always counted in the denominator: type, language, encoding.
const BASE_POINTS: u32 = 3;

/// How the content metadata was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// The registered processor succeeded.
    Processor,
    /// The processor failed and generic text extraction replaced its output.
    GenericFallback,
    /// The processor failed and its result was kept.
    Failed,
}

/// Share of expected metadata fields that are present, in `[0, 1]`.
///
/// One point for the type (always present), one each for a known language and
/// encoding, plus the fields specific to the content type: word and character
/// counts for text, page count for PDF, dimensions for images, duration for
/// audio and video.
pub fn completeness(content: &ContentMetadata) -> f64 {
    let mut earned = 1;
    let mut max = BASE_POINTS;

    if content.language != UNKNOWN {
        earned += 1;
    }
    if content.encoding != UNKNOWN {
        earned += 1;
    }

    let bonus_fields: Vec<bool> = match content.content_type {
        ct if ct.is_textual() => vec![content.word_count.is_some(), content.character_count.is_some()],
        ContentType::Pdf => vec![content.page_count.is_some()],
        ct if ct.is_image() => vec![content.dimensions.is_some()],
        ct if ct.is_media() => vec![content.duration_seconds.is_some()],
        _ => Vec::new(),
    };
    for present in bonus_fields {
        max += 1;
        if present {
            earned += 1;
        }
    }

    if max == 0 { 0.0 } else { f64::from(earned) / f64::from(max) }
}

/// Build the quality block for a successfully assembled envelope.
///
/// Overall score and accuracy both mirror the detection confidence.
pub fn assess(detection: &ContentTypeResult, content: &ContentMetadata, outcome: ExtractionOutcome) -> QualityMetadata {
    let mut issues = Vec::new();

    match outcome {
        ExtractionOutcome::Processor => {}
        ExtractionOutcome::GenericFallback => issues.push(QualityIssue::new(
            IssueSeverity::Medium,
            "processor_fallback",
            format!(
                "Processor for {} content failed; metadata comes from generic text extraction",
                detection.content_type
            ),
        )),
        ExtractionOutcome::Failed => issues.push(QualityIssue::new(
            IssueSeverity::High,
            "extraction_failed",
            format!("Extraction of {} content failed", detection.content_type),
        )),
    }

    if detection.confidence < LOW_CONFIDENCE_THRESHOLD {
        issues.push(QualityIssue::new(
            IssueSeverity::Low,
            "low_confidence",
            format!("Content type detection confidence is {:.2}", detection.confidence),
        ));
    }

    if content.content_type.is_textual() && content.language == UNKNOWN {
        issues.push(QualityIssue::new(
            IssueSeverity::Low,
            "unknown_language",
            "Language of the text content could not be determined",
        ));
    }

    QualityMetadata {
        overall_score: detection.confidence,
        confidence: detection.confidence,
        completeness: completeness(content),
        accuracy: detection.confidence,
        issues,
    }
}
