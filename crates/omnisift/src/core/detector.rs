//! Content type detection.
//!
//! Combines the signature scan, content features and the extension table into
//! a [`ContentTypeResult`]. Classification walks an ordered chain of
//! classifiers (MIME table, extension, content heuristics); the first one that
//! answers wins.

use crate::core::features::{ContentFeatureAnalyzer, sample};
use crate::core::signatures::{
    OCTET_STREAM_MIME_TYPE, content_type_for_extension, content_type_for_mime, extension_of, match_signature,
};
use crate::types::{ContentFeatures, ContentType, ContentTypeResult};
use std::panic::{AssertUnwindSafe, catch_unwind};

const BASE_CONFIDENCE: f64 = 0.5;
const SIGNATURE_BONUS: f64 = 0.3;
const EXTENSION_MATCH_BONUS: f64 = 0.2;
const TEXT_BONUS: f64 = 0.1;
const STRUCTURE_BONUS: f64 = 0.1;

/// Everything a classifier may look at.
#[derive(Debug)]
pub struct Evidence<'a> {
    pub sample: &'a [u8],
    pub mime_type: &'a str,
    pub extension_type: Option<ContentType>,
    pub features: &'a ContentFeatures,
}

/// One step of the classification chain.
pub type Classifier = fn(&Evidence<'_>) -> Option<ContentType>;

/// Classification precedence: signature MIME, then extension, then heuristics.
pub const CLASSIFIERS: &[Classifier] = &[classify_by_mime, classify_by_extension, classify_by_heuristics];

fn classify_by_mime(evidence: &Evidence<'_>) -> Option<ContentType> {
    content_type_for_mime(evidence.mime_type)
}

fn classify_by_extension(evidence: &Evidence<'_>) -> Option<ContentType> {
    evidence.extension_type
}

fn classify_by_heuristics(evidence: &Evidence<'_>) -> Option<ContentType> {
    let features = evidence.features;
    if features.is_structured {
        let text = String::from_utf8_lossy(evidence.sample);
        let trimmed = text.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            return Some(ContentType::Json);
        }
        if text.contains('<') && text.contains('>') {
            return Some(ContentType::Xml);
        }
        if text.contains(',') {
            return Some(ContentType::Csv);
        }
    }
    if features.has_text {
        Some(ContentType::PlainText)
    } else {
        Some(ContentType::Binary)
    }
}

/// Detects what kind of content a buffer holds.
///
/// Stateless; one instance can be shared across threads.
///
/// # Example
///
/// ```rust
/// use omnisift::{ContentType, ContentTypeDetector};
///
/// let detector = ContentTypeDetector::new();
/// let result = detector.detect(b"%PDF-1.7\n...", "report.pdf");
/// assert_eq!(result.content_type, ContentType::Pdf);
/// assert_eq!(result.mime_type, "application/pdf");
/// assert!(result.confidence >= 0.8);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTypeDetector {
    analyzer: ContentFeatureAnalyzer,
}

impl ContentTypeDetector {
    pub fn new() -> Self {
        Self {
            analyzer: ContentFeatureAnalyzer::new(),
        }
    }

    /// Classify `buffer`, using `file_name` only for its extension.
    ///
    /// Never panics to the caller: an internal failure yields
    /// `ContentType::Unknown` with confidence 0.
    pub fn detect(&self, buffer: &[u8], file_name: &str) -> ContentTypeResult {
        match catch_unwind(AssertUnwindSafe(|| self.detect_inner(buffer, file_name))) {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Content detection panicked for '{}', reporting unknown", file_name);
                ContentTypeResult::unknown()
            }
        }
    }

    /// Feature analysis only, without classification.
    pub fn analyze_features(&self, buffer: &[u8]) -> ContentFeatures {
        self.analyzer.analyze(buffer)
    }

    fn detect_inner(&self, buffer: &[u8], file_name: &str) -> ContentTypeResult {
        let signature = match_signature(buffer);
        let mime_type = signature.map_or(OCTET_STREAM_MIME_TYPE, |sig| sig.mime_type);

        let mut features = self.analyzer.analyze(buffer);
        features.has_images = mime_type.starts_with("image/");
        features.has_audio = mime_type.starts_with("audio/");
        features.has_video = mime_type.starts_with("video/");

        let extension = extension_of(file_name);
        let extension_type = extension.as_deref().and_then(content_type_for_extension);
        let mime_content_type = content_type_for_mime(mime_type);

        let extension_validated = matches!(
            (extension_type, mime_content_type),
            (Some(by_ext), Some(by_mime)) if by_ext == by_mime
        );

        let evidence = Evidence {
            sample: sample(buffer),
            mime_type,
            extension_type,
            features: &features,
        };
        let content_type = CLASSIFIERS
            .iter()
            .find_map(|classify| classify(&evidence))
            .unwrap_or(ContentType::Unknown);

        let signature_resolved = signature.is_some() && mime_content_type.is_some();
        let confidence = score_confidence(signature_resolved, extension_validated, &features);

        tracing::debug!(
            file_name,
            mime_type,
            content_type = %content_type,
            confidence,
            "Detected content type"
        );

        ContentTypeResult {
            mime_type: mime_type.to_string(),
            content_type,
            confidence,
            features,
        }
    }
}

fn score_confidence(signature_resolved: bool, extension_validated: bool, features: &ContentFeatures) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if signature_resolved {
        confidence += SIGNATURE_BONUS;
    }
    if extension_validated {
        confidence += EXTENSION_MATCH_BONUS;
    }
    if features.has_text {
        confidence += TEXT_BONUS;
    }
    if features.is_structured {
        confidence += STRUCTURE_BONUS;
    }
    confidence.clamp(0.0, 1.0)
}

/// Detect with a default detector.
pub fn detect(buffer: &[u8], file_name: &str) -> ContentTypeResult {
    ContentTypeDetector::new().detect(buffer, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_signature_beats_extension() {
        let result = detect(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3", "notes.txt");
        assert_eq!(result.mime_type, "application/pdf");
        assert_eq!(result.content_type, ContentType::Pdf);
    }

    #[test]
    fn test_pdf_happy_path_confidence() {
        let result = detect(&[0x25, 0x50, 0x44, 0x46, 0x2D, 0x31, 0x2E, 0x37], "report.pdf");
        assert_eq!(result.content_type, ContentType::Pdf);
        assert!(result.confidence >= 0.8);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let result = detect(b"{\"a\": [1, 2, 3]}", "data.json");
        assert_eq!(result.content_type, ContentType::Json);
        assert!((result.confidence - 0.7).abs() < 1e-9);

        let score = score_confidence(
            true,
            true,
            &ContentFeatures {
                has_text: true,
                is_structured: true,
                ..ContentFeatures::default()
            },
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_heuristic_chain_without_extension() {
        assert_eq!(detect(b"[1, 2, 3]", "blob").content_type, ContentType::Json);
        assert_eq!(detect(b"<root><a>1</a></root>", "blob").content_type, ContentType::Xml);
        assert_eq!(detect(b"a,b\n1,2\n3,4\n", "blob").content_type, ContentType::Csv);
        assert_eq!(detect(b"just some plain words", "blob").content_type, ContentType::PlainText);
        assert_eq!(detect(&[0u8, 0xFF, 0x10, 0x80], "blob").content_type, ContentType::Binary);
    }

    #[test]
    fn test_empty_buffer() {
        let result = detect(b"", "");
        assert_eq!(result.content_type, ContentType::Binary);
        assert_eq!(result.mime_type, OCTET_STREAM_MIME_TYPE);
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_media_flags_follow_signature_family() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
        let result = detect(&png, "image.png");
        assert!(result.features.has_images);
        assert!(!result.features.has_audio);
        assert_eq!(result.content_type, ContentType::RasterImage);
    }

    #[test]
    fn test_classifier_chain_order() {
        let features = ContentFeatures {
            has_text: true,
            is_structured: true,
            ..ContentFeatures::default()
        };
        let evidence = Evidence {
            sample: b"{}",
            mime_type: "application/pdf",
            extension_type: Some(ContentType::Markdown),
            features: &features,
        };
        let answers: Vec<_> = CLASSIFIERS.iter().map(|c| c(&evidence)).collect();
        assert_eq!(
            answers,
            vec![Some(ContentType::Pdf), Some(ContentType::Markdown), Some(ContentType::Json)]
        );
    }
}
