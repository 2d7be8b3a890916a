use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

// ============================================================================
// Classification
// ============================================================================

/// Closed classification of file kind used throughout the pipeline.
///
/// Every other structure references a content type by value. The serialized
/// form (`snake_case`) is the stable external identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    PlainText,
    Markdown,
    RichText,
    Pdf,
    OfficeDoc,
    OfficeSheet,
    OfficePresentation,
    RasterImage,
    VectorImage,
    Audio,
    Video,
    Json,
    Xml,
    Csv,
    Binary,
    Unknown,
}

impl ContentType {
    /// All content types in declaration order.
    pub const ALL: [ContentType; 16] = [
        ContentType::PlainText,
        ContentType::Markdown,
        ContentType::RichText,
        ContentType::Pdf,
        ContentType::OfficeDoc,
        ContentType::OfficeSheet,
        ContentType::OfficePresentation,
        ContentType::RasterImage,
        ContentType::VectorImage,
        ContentType::Audio,
        ContentType::Video,
        ContentType::Json,
        ContentType::Xml,
        ContentType::Csv,
        ContentType::Binary,
        ContentType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::PlainText => "plain_text",
            ContentType::Markdown => "markdown",
            ContentType::RichText => "rich_text",
            ContentType::Pdf => "pdf",
            ContentType::OfficeDoc => "office_doc",
            ContentType::OfficeSheet => "office_sheet",
            ContentType::OfficePresentation => "office_presentation",
            ContentType::RasterImage => "raster_image",
            ContentType::VectorImage => "vector_image",
            ContentType::Audio => "audio",
            ContentType::Video => "video",
            ContentType::Json => "json",
            ContentType::Xml => "xml",
            ContentType::Csv => "csv",
            ContentType::Binary => "binary",
            ContentType::Unknown => "unknown",
        }
    }

    /// Types whose payload is read as text (word and character counts apply).
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            ContentType::PlainText
                | ContentType::Markdown
                | ContentType::RichText
                | ContentType::Json
                | ContentType::Xml
                | ContentType::Csv
        )
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentType::RasterImage | ContentType::VectorImage)
    }

    pub fn is_media(&self) -> bool {
        matches!(self, ContentType::Audio | ContentType::Video)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic features sniffed from the leading bytes of a buffer.
///
/// Always embedded in a [`ContentTypeResult`]; never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFeatures {
    pub has_text: bool,
    pub has_images: bool,
    pub has_audio: bool,
    pub has_video: bool,
    pub is_structured: bool,
    pub encoding: String,
    pub language: String,
}

impl Default for ContentFeatures {
    fn default() -> Self {
        Self {
            has_text: false,
            has_images: false,
            has_audio: false,
            has_video: false,
            is_structured: false,
            encoding: UNKNOWN.to_string(),
            language: UNKNOWN.to_string(),
        }
    }
}

/// Outcome of a single detection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeResult {
    pub mime_type: String,
    pub content_type: ContentType,
    /// Heuristic certainty in `[0, 1]`. Not a probability.
    pub confidence: f64,
    pub features: ContentFeatures,
}

impl ContentTypeResult {
    /// Result used when detection itself could not run.
    pub fn unknown() -> Self {
        Self {
            mime_type: crate::core::signatures::OCTET_STREAM_MIME_TYPE.to_string(),
            content_type: ContentType::Unknown,
            confidence: 0.0,
            features: ContentFeatures::default(),
        }
    }
}

/// Marker for a language or encoding that could not be determined.
pub const UNKNOWN: &str = "unknown";

// ============================================================================
// Processing
// ============================================================================

/// Options handed to a processor. Each processor reads the subset it understands.
///
/// Unrecognized fields in serialized options are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Minimum engine confidence to accept, when the engine reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_validation: Option<bool>,
}

impl ProcessorOptions {
    pub fn skip_validation(&self) -> bool {
        self.skip_validation.unwrap_or(false)
    }

    pub fn extract_metadata(&self) -> bool {
        self.extract_metadata.unwrap_or(true)
    }
}

/// Pixel dimensions of an image or video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Per-extraction content metadata.
///
/// Shares `content_type`, `language` and `encoding` across all types; the
/// remaining fields are filled only by the processors they apply to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub content_type: ContentType,
    pub language: String,
    pub encoding: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,

    /// Processor-specific fields that have no dedicated slot.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional: HashMap<String, serde_json::Value>,
}

impl ContentMetadata {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            language: UNKNOWN.to_string(),
            encoding: UNKNOWN.to_string(),
            word_count: None,
            character_count: None,
            line_count: None,
            page_count: None,
            dimensions: None,
            duration_seconds: None,
            sheet_count: None,
            slide_count: None,
            headers: None,
            additional: HashMap::new(),
        }
    }
}

/// Result of one processor call.
///
/// `success == false` always comes with a non-empty `errors` list and a
/// human-readable `text`; use [`ProcessorResult::failure`] to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorResult {
    pub text: String,
    pub metadata: ContentMetadata,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    pub processing_time_ms: u64,
}

impl ProcessorResult {
    pub fn success(text: String, metadata: ContentMetadata, started: Instant) -> Self {
        Self {
            text,
            metadata,
            success: true,
            errors: None,
            processing_time_ms: elapsed_ms(started),
        }
    }

    pub fn failure(content_type: ContentType, error: impl fmt::Display, started: Instant) -> Self {
        let mut message = error.to_string();
        if message.trim().is_empty() {
            message = format!("{} extraction failed", content_type);
        }
        Self {
            text: format!("Failed to extract {} content: {}", content_type, message),
            metadata: ContentMetadata::new(content_type),
            success: false,
            errors: Some(vec![message]),
            processing_time_ms: elapsed_ms(started),
        }
    }

    /// Synthetic result for a content type with no registered processor.
    pub fn unsupported(content_type: ContentType) -> Self {
        Self {
            text: format!("No processor is registered for {} content", content_type),
            metadata: ContentMetadata::new(content_type),
            success: false,
            errors: Some(vec![crate::OmnisiftError::UnsupportedContentType(content_type).to_string()]),
            processing_time_ms: 0,
        }
    }

    /// Fold an internal extraction outcome into a result object.
    pub fn from_outcome(
        content_type: ContentType,
        outcome: crate::Result<(String, ContentMetadata)>,
        started: Instant,
    ) -> Self {
        match outcome {
            Ok((text, metadata)) => Self::success(text, metadata, started),
            Err(e) => Self::failure(content_type, e, started),
        }
    }

    pub fn error_messages(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Universal metadata envelope
// ============================================================================

/// Complete metadata produced once per ingested file.
///
/// Never partially filled: when anything fails a complete, explicitly
/// degraded instance is built instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalMetadata {
    pub file: FileMetadata,
    pub content: ContentMetadata,
    pub processing: ProcessingMetadata,
    pub quality: QualityMetadata,
    pub relationships: RelationshipMetadata,
}

impl UniversalMetadata {
    /// Serialize the envelope to its JSON interchange form.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an envelope previously produced by [`UniversalMetadata::to_json`].
    ///
    /// # Errors
    ///
    /// Returns `OmnisiftError::Serialization` if `json` is not a valid envelope.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::OmnisiftError::serialization_with_source("Invalid metadata envelope", e))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Deterministic identifier derived from the absolute path.
    pub id: String,
    pub path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub size: u64,
    pub mime_type: String,
    /// SHA-256 of the raw bytes, hex encoded. Empty for degraded results.
    pub checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub processed_at: DateTime<Utc>,
    pub processor: String,
    pub processor_version: String,
    pub parameters: ProcessorOptions,
    pub processing_time_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetadata {
    pub overall_score: f64,
    pub confidence: f64,
    pub completeness: f64,
    pub accuracy: f64,
    pub issues: Vec<QualityIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: IssueSeverity,
    /// Short machine-readable tag, e.g. `processor_fallback`.
    pub kind: String,
    pub message: String,
}

impl QualityIssue {
    pub fn new(severity: IssueSeverity, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Relationship data filled by downstream indexing layers; always empty here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetadata {
    pub duplicates: Vec<String>,
    pub related_files: Vec<String>,
    pub topics: Vec<String>,
}
