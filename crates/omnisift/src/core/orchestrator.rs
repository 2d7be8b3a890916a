//! Metadata orchestration.
//!
//! The top-level entry point: read a file, detect its content type, dispatch
//! to the registry, hash it, score it and assemble a [`UniversalMetadata`].
//! Every public operation returns a complete envelope; failures produce a
//! degraded envelope instead of an error.

use crate::core::checksum::{absolute_path, content_checksum, file_id};
use crate::core::config::PipelineConfig;
use crate::core::detector::ContentTypeDetector;
use crate::core::io::{self, FileStat};
use crate::core::quality::{self, ExtractionOutcome};
use crate::core::signatures::{OCTET_STREAM_MIME_TYPE, extension_of};
use crate::plugins::ProcessorRegistry;
use crate::types::{
    ContentMetadata, ContentType, ContentTypeResult, FileMetadata, IssueSeverity, ProcessingMetadata,
    ProcessorOptions, QualityIssue, QualityMetadata, RelationshipMetadata, UniversalMetadata, elapsed_ms,
};
use crate::Result;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Processor name recorded when generic text extraction replaced a failed processor.
pub const GENERIC_FALLBACK_PROCESSOR: &str = "generic-text-fallback";

/// Processor name recorded in degraded envelopes and for unbound content types.
pub const NO_PROCESSOR: &str = "none";

/// Pipeline entry point.
///
/// Cheap to clone: the registry and configuration are shared.
///
/// # Example
///
/// ```rust,no_run
/// use omnisift::{MetadataOrchestrator, PipelineConfig, ProcessorRegistry};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = Arc::new(ProcessorRegistry::with_defaults());
/// let orchestrator = MetadataOrchestrator::new(registry, PipelineConfig::default());
///
/// let metadata = orchestrator.extract_metadata("notes.md").await;
/// if metadata.processing.success {
///     println!("{} words", metadata.content.word_count.unwrap_or(0));
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct MetadataOrchestrator {
    registry: Arc<ProcessorRegistry>,
    detector: ContentTypeDetector,
    config: Arc<PipelineConfig>,
}

impl MetadataOrchestrator {
    pub fn new(registry: Arc<ProcessorRegistry>, config: PipelineConfig) -> Self {
        Self {
            registry,
            detector: ContentTypeDetector::new(),
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract metadata for the file at `path`.
    ///
    /// Never fails: I/O errors, processor panics and any other failure yield
    /// [`UniversalMetadata::degraded`].
    pub async fn extract_metadata(&self, path: impl AsRef<Path>) -> UniversalMetadata {
        let path = path.as_ref();
        let outcome = AssertUnwindSafe(async {
            let started = Instant::now();
            let stat = io::stat_file_async(path).await?;
            let bytes = io::read_file_async(path).await?;
            Ok::<_, crate::OmnisiftError>(self.assemble(path, &bytes, Some(stat), started).await)
        })
        .catch_unwind()
        .await;

        settle(path, outcome)
    }

    /// Extract metadata for bytes already in memory.
    ///
    /// `file_name` supplies the extension and the identity; the id is derived
    /// from the name resolved against the current directory. There is no stat
    /// data, so the size is the buffer length and timestamps are absent.
    pub async fn extract_metadata_from_bytes(&self, bytes: &[u8], file_name: &str) -> UniversalMetadata {
        let path = Path::new(file_name);
        let outcome = AssertUnwindSafe(async {
            Ok::<_, crate::OmnisiftError>(self.assemble(path, bytes, None, Instant::now()).await)
        })
        .catch_unwind()
        .await;

        settle(path, outcome)
    }

    /// Extract metadata for many files concurrently.
    ///
    /// Concurrency is bounded by `max_concurrent_extractions`. Results keep
    /// the input order and every path yields an envelope.
    pub async fn extract_metadata_batch(&self, paths: Vec<impl AsRef<Path>>) -> Vec<UniversalMetadata> {
        if paths.is_empty() {
            return Vec::new();
        }

        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_extractions()));
        let mut tasks = JoinSet::new();

        for (index, path) in paths.iter().cloned().enumerate() {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, orchestrator.extract_metadata(&path).await)
            });
        }

        let mut results: Vec<Option<UniversalMetadata>> = vec![None; paths.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, metadata)) => results[index] = Some(metadata),
                Err(e) => tracing::warn!(error = %e, "Batch extraction task failed"),
            }
        }

        results
            .into_iter()
            .zip(&paths)
            .map(|(metadata, path)| {
                metadata.unwrap_or_else(|| UniversalMetadata::degraded(path, "Extraction task did not complete"))
            })
            .collect()
    }

    async fn assemble(&self, path: &Path, bytes: &[u8], stat: Option<FileStat>, started: Instant) -> UniversalMetadata {
        let name = file_name_of(path);
        let detection = self.detector.detect(bytes, &name);
        let options = &self.config.processor_options;

        let result = self
            .registry
            .process_content(bytes, detection.content_type, options)
            .await;

        let (mut processor, mut processor_version) = match self.registry.get(detection.content_type) {
            Some(p) => (p.processor_name().to_string(), p.version()),
            None => (NO_PROCESSOR.to_string(), String::new()),
        };

        let errors = result.errors.clone();
        let (content, success, outcome) = if result.success {
            let mut content = result.metadata;
            content.content_type = detection.content_type;
            (content, true, ExtractionOutcome::Processor)
        } else if self.config.fallback_to_generic {
            tracing::warn!(
                path = %path.display(),
                processor = %processor,
                errors = ?result.errors,
                "Processor failed, falling back to generic text extraction"
            );
            processor = GENERIC_FALLBACK_PROCESSOR.to_string();
            processor_version = env!("CARGO_PKG_VERSION").to_string();
            (generic_metadata(bytes, &detection), true, ExtractionOutcome::GenericFallback)
        } else {
            let mut content = result.metadata;
            content.content_type = detection.content_type;
            (content, false, ExtractionOutcome::Failed)
        };

        let quality = quality::assess(&detection, &content, outcome);

        let file = FileMetadata {
            id: file_id(path),
            path: absolute_path(path).display().to_string(),
            extension: extension_of(&name),
            name,
            size: stat.as_ref().map_or(bytes.len() as u64, |s| s.size),
            mime_type: detection.mime_type.clone(),
            checksum: content_checksum(bytes),
            created_at: stat.as_ref().and_then(|s| s.created_at),
            modified_at: stat.as_ref().and_then(|s| s.modified_at),
        };

        let processing = ProcessingMetadata {
            processed_at: Utc::now(),
            processor,
            processor_version,
            parameters: options.clone(),
            processing_time_ms: elapsed_ms(started),
            success,
            errors,
        };

        tracing::debug!(
            path = %file.path,
            content_type = %content.content_type,
            success,
            completeness = quality.completeness,
            "Assembled metadata"
        );

        UniversalMetadata {
            file,
            content,
            processing,
            quality,
            relationships: RelationshipMetadata::default(),
        }
    }
}

/// Generic extraction: lossy UTF-8 text with whitespace word count and
/// character count, language and encoding taken from detection.
fn generic_metadata(bytes: &[u8], detection: &ContentTypeResult) -> ContentMetadata {
    let text = String::from_utf8_lossy(bytes);
    let mut content = ContentMetadata::new(detection.content_type);
    content.language = detection.features.language.clone();
    content.encoding = detection.features.encoding.clone();
    content.word_count = Some(text.split_whitespace().count());
    content.character_count = Some(text.chars().count());
    content
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn settle(
    path: &Path,
    outcome: std::result::Result<Result<UniversalMetadata>, Box<dyn Any + Send>>,
) -> UniversalMetadata {
    match outcome {
        Ok(Ok(metadata)) => metadata,
        Ok(Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "Metadata extraction failed");
            UniversalMetadata::degraded(path, e)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::warn!(path = %path.display(), panic = %message, "Metadata extraction panicked");
            UniversalMetadata::degraded(path, format!("Extraction panicked: {}", message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl UniversalMetadata {
    /// Complete envelope describing a failed extraction.
    ///
    /// Size zero, empty checksum, `Unknown` content, `success == false`, zero
    /// scores, a single high-severity issue carrying `error`, and empty
    /// relationships.
    pub fn degraded(path: &Path, error: impl fmt::Display) -> Self {
        let message = error.to_string();
        let name = file_name_of(path);

        Self {
            file: FileMetadata {
                id: file_id(path),
                path: absolute_path(path).display().to_string(),
                extension: extension_of(&name),
                name,
                size: 0,
                mime_type: OCTET_STREAM_MIME_TYPE.to_string(),
                checksum: String::new(),
                created_at: None,
                modified_at: None,
            },
            content: ContentMetadata::new(ContentType::Unknown),
            processing: ProcessingMetadata {
                processed_at: Utc::now(),
                processor: NO_PROCESSOR.to_string(),
                processor_version: String::new(),
                parameters: ProcessorOptions::default(),
                processing_time_ms: 0,
                success: false,
                errors: Some(vec![message.clone()]),
            },
            quality: QualityMetadata {
                overall_score: 0.0,
                confidence: 0.0,
                completeness: 0.0,
                accuracy: 0.0,
                issues: vec![QualityIssue::new(IssueSeverity::High, "extraction_error", message)],
            },
            relationships: RelationshipMetadata::default(),
        }
    }

    /// Whether this envelope was produced by [`UniversalMetadata::degraded`].
    pub fn is_degraded(&self) -> bool {
        !self.processing.success && self.file.checksum.is_empty()
    }
}
