//! Engine-backed processors.
//!
//! PDF text extraction, Office parsing, OCR and speech-to-text live in external
//! engines. An engine implements [`ExtractionEngine`]; [`EngineProcessor`]
//! adapts it to the [`ContentProcessor`] contract for one [`EngineKind`].
//!
//! # Concurrency
//!
//! Each processor owns exactly one engine instance, which is not safe for
//! concurrent use. The instance sits behind a FIFO async mutex and every call
//! runs on the blocking pool, so calls on one processor are serialized in
//! arrival order. Register several processors (or pool engines inside one
//! engine implementation) to extract in parallel.

use crate::core::signatures::{SVG_MIME_TYPE, match_signature};
use crate::plugins::{ContentProcessor, Lifecycle, Plugin};
use crate::types::{ContentMetadata, ContentType, Dimensions, ProcessorOptions, ProcessorResult};
use crate::{OmnisiftError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

const PDF_HEADER: &[u8] = b"%PDF";

/// Family of external engine a processor wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Pdf,
    Office,
    Ocr,
    Speech,
}

impl EngineKind {
    pub fn content_types(&self) -> &'static [ContentType] {
        match self {
            EngineKind::Pdf => &[ContentType::Pdf],
            EngineKind::Office => &[
                ContentType::OfficeDoc,
                ContentType::OfficeSheet,
                ContentType::OfficePresentation,
            ],
            EngineKind::Ocr => &[ContentType::RasterImage],
            EngineKind::Speech => &[ContentType::Audio, ContentType::Video],
        }
    }

    /// OCR workers and speech models hold loaded native state and expose
    /// the lifecycle capability.
    pub fn is_stateful(&self) -> bool {
        matches!(self, EngineKind::Ocr | EngineKind::Speech)
    }

    pub fn default_processor_name(&self) -> &'static str {
        match self {
            EngineKind::Pdf => "pdf-processor",
            EngineKind::Office => "office-processor",
            EngineKind::Ocr => "ocr-processor",
            EngineKind::Speech => "speech-processor",
        }
    }
}

/// What an engine returns for one input. Fields an engine cannot fill stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    pub text: String,
    pub language: Option<String>,
    /// Engine-reported certainty in `[0, 1]` (OCR, speech).
    pub confidence: Option<f64>,
    pub page_count: Option<usize>,
    pub sheet_count: Option<usize>,
    pub slide_count: Option<usize>,
    pub dimensions: Option<Dimensions>,
    pub duration_seconds: Option<f64>,
    pub additional: HashMap<String, serde_json::Value>,
}

/// A single-instance, synchronous extraction engine.
///
/// Methods take `&mut self`: the engine is never called concurrently.
pub trait ExtractionEngine: Send + 'static {
    fn version(&self) -> String {
        "unknown".to_string()
    }

    /// Load models or start workers. Called before the first extraction.
    fn load(&mut self) -> Result<()>;

    fn extract(&mut self, content: &[u8], options: &ProcessorOptions) -> Result<EngineOutput>;

    /// Release everything `load` acquired.
    fn unload(&mut self) -> Result<()>;
}

struct EngineSlot<E> {
    engine: E,
    loaded: bool,
}

impl<E: ExtractionEngine> EngineSlot<E> {
    fn ensure_loaded(&mut self) -> Result<()> {
        if !self.loaded {
            self.engine.load()?;
            self.loaded = true;
        }
        Ok(())
    }

    fn unload(&mut self) -> Result<()> {
        if self.loaded {
            self.engine.unload()?;
            self.loaded = false;
        }
        Ok(())
    }
}

/// [`ContentProcessor`] over one [`ExtractionEngine`] instance.
///
/// Stateless kinds (`Pdf`, `Office`) load their engine lazily on first use.
/// Stateful kinds (`Ocr`, `Speech`) additionally expose [`Lifecycle`], so the
/// registry loads them on `initialize` and unloads them on `cleanup`.
///
/// # Example
///
/// ```rust
/// use omnisift::extractors::{EngineKind, EngineOutput, EngineProcessor, ExtractionEngine};
/// use omnisift::plugins::ContentProcessor;
/// use omnisift::{ContentType, ProcessorOptions, Result};
///
/// struct FixedTextEngine;
///
/// impl ExtractionEngine for FixedTextEngine {
///     fn load(&mut self) -> Result<()> { Ok(()) }
///     fn unload(&mut self) -> Result<()> { Ok(()) }
///     fn extract(&mut self, _content: &[u8], _options: &ProcessorOptions) -> Result<EngineOutput> {
///         Ok(EngineOutput { text: "page text".to_string(), page_count: Some(1), ..Default::default() })
///     }
/// }
///
/// let processor = EngineProcessor::new(EngineKind::Pdf, FixedTextEngine);
/// assert!(processor.supports_content_type(ContentType::Pdf));
/// assert!(processor.lifecycle().is_none());
/// ```
pub struct EngineProcessor<E: ExtractionEngine> {
    kind: EngineKind,
    name: String,
    version: String,
    slot: Arc<Mutex<EngineSlot<E>>>,
}

impl<E: ExtractionEngine> EngineProcessor<E> {
    pub fn new(kind: EngineKind, engine: E) -> Self {
        Self {
            kind,
            name: kind.default_processor_name().to_string(),
            version: engine.version(),
            slot: Arc::new(Mutex::new(EngineSlot { engine, loaded: false })),
        }
    }

    /// Override the processor name, e.g. to register two engines of one kind.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub async fn is_loaded(&self) -> bool {
        self.slot.lock().await.loaded
    }

    fn validate_input(&self, content: &[u8]) -> Result<()> {
        if content.is_empty() {
            return Err(OmnisiftError::validation("Input is empty"));
        }
        match self.kind {
            EngineKind::Pdf if !content.starts_with(PDF_HEADER) => {
                Err(OmnisiftError::validation("Input does not start with a PDF header"))
            }
            EngineKind::Ocr => {
                let is_raster = match_signature(content)
                    .is_some_and(|sig| sig.mime_type.starts_with("image/") && sig.mime_type != SVG_MIME_TYPE);
                if is_raster {
                    Ok(())
                } else {
                    Err(OmnisiftError::validation("Input is not a recognized raster image"))
                }
            }
            _ => Ok(()),
        }
    }

    async fn run_engine(&self, content: &[u8], options: &ProcessorOptions) -> Result<(String, ContentMetadata)> {
        if !options.skip_validation() {
            self.validate_input(content)?;
        }

        let slot = Arc::clone(&self.slot).lock_owned().await;
        let content = content.to_vec();
        let engine_options = options.clone();

        let output = tokio::task::spawn_blocking(move || {
            let mut slot = slot;
            slot.ensure_loaded()?;
            slot.engine.extract(&content, &engine_options)
        })
        .await
        .map_err(|e| OmnisiftError::plugin(&self.name, format!("Engine task panicked: {}", e)))?
        .map_err(|e| match e {
            OmnisiftError::Engine { .. } | OmnisiftError::Validation { .. } => e,
            other => OmnisiftError::engine_with_source(format!("{} engine failed", self.name), other),
        })?;

        if let (Some(reported), Some(required)) = (output.confidence, options.confidence)
            && reported < required
        {
            return Err(OmnisiftError::engine(format!(
                "Engine confidence {:.2} is below the required {:.2}",
                reported, required
            )));
        }

        Ok(self.build_result(output, options))
    }

    fn build_result(&self, output: EngineOutput, options: &ProcessorOptions) -> (String, ContentMetadata) {
        let content_type = match self.kind {
            EngineKind::Pdf => ContentType::Pdf,
            EngineKind::Ocr => ContentType::RasterImage,
            EngineKind::Office if output.sheet_count.is_some() => ContentType::OfficeSheet,
            EngineKind::Office if output.slide_count.is_some() => ContentType::OfficePresentation,
            EngineKind::Office => ContentType::OfficeDoc,
            EngineKind::Speech if output.dimensions.is_some() => ContentType::Video,
            EngineKind::Speech => ContentType::Audio,
        };

        let mut metadata = ContentMetadata::new(content_type);
        if let Some(language) = output.language.or_else(|| options.language.clone()) {
            metadata.language = language;
        }
        if !output.text.is_empty() {
            metadata.encoding = "utf-8".to_string();
            metadata.word_count = Some(output.text.split_whitespace().count());
            metadata.character_count = Some(output.text.chars().count());
        }
        if options.extract_metadata() {
            metadata.page_count = output.page_count;
            metadata.sheet_count = output.sheet_count;
            metadata.slide_count = output.slide_count;
            metadata.dimensions = output.dimensions;
            metadata.duration_seconds = output.duration_seconds;
            metadata.additional = output.additional;
            if let Some(confidence) = output.confidence {
                metadata.additional.insert("engine_confidence".to_string(), confidence.into());
            }
        }

        (output.text, metadata)
    }

    fn primary_content_type(&self) -> ContentType {
        self.kind.content_types()[0]
    }
}

impl<E: ExtractionEngine> Plugin for EngineProcessor<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn description(&self) -> &str {
        match self.kind {
            EngineKind::Pdf => "Extracts PDF text through an external engine",
            EngineKind::Office => "Extracts Office documents through an external engine",
            EngineKind::Ocr => "Recognizes text in raster images through an OCR engine",
            EngineKind::Speech => "Transcribes audio and video through a speech engine",
        }
    }
}

#[async_trait]
impl<E: ExtractionEngine> Lifecycle for EngineProcessor<E> {
    async fn initialize(&self) -> Result<()> {
        let slot = Arc::clone(&self.slot).lock_owned().await;
        tokio::task::spawn_blocking(move || {
            let mut slot = slot;
            slot.ensure_loaded()
        })
        .await??;
        tracing::debug!(processor = %self.name, "Engine loaded");
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        let slot = Arc::clone(&self.slot).lock_owned().await;
        tokio::task::spawn_blocking(move || {
            let mut slot = slot;
            slot.unload()
        })
        .await??;
        tracing::debug!(processor = %self.name, "Engine unloaded");
        Ok(())
    }
}

#[async_trait]
impl<E: ExtractionEngine> ContentProcessor for EngineProcessor<E> {
    async fn extract_from_buffer(&self, content: &[u8], options: &ProcessorOptions) -> ProcessorResult {
        let started = Instant::now();
        let outcome = self.run_engine(content, options).await;
        if let Err(e) = &outcome {
            tracing::debug!(processor = %self.name, error = %e, "Engine extraction failed");
        }
        ProcessorResult::from_outcome(self.primary_content_type(), outcome, started)
    }

    fn supported_content_types(&self) -> &[ContentType] {
        self.kind.content_types()
    }

    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        if self.kind.is_stateful() { Some(self) } else { None }
    }
}
