//! Omnisift - Multi-Modal Content Classification and Processing Dispatch
//!
//! Omnisift decides what kind of content a file holds (signature sniffing,
//! extension mapping, content heuristics, confidence scoring), routes it to a
//! pluggable processor under a uniform contract, and assembles a complete
//! metadata envelope for downstream indexing.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use omnisift::{MetadataOrchestrator, PipelineConfig, ProcessorRegistry};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> omnisift::Result<()> {
//! let registry = Arc::new(ProcessorRegistry::with_defaults());
//! registry.initialize().await?;
//!
//! let orchestrator = MetadataOrchestrator::new(registry.clone(), PipelineConfig::default());
//! let metadata = orchestrator.extract_metadata("document.md").await;
//! println!("{}: {}", metadata.file.name, metadata.content.content_type);
//!
//! registry.cleanup().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): detection, orchestration, quality scoring, configuration
//! - **Plugin System** (`plugins`): processor contract, lifecycle capability, registry
//! - **Extractors** (`extractors`): generic text processor and engine adapters
//!
//! # Error Handling
//!
//! Detection, dispatch and orchestration never return errors: they return
//! result objects carrying `success` flags. Only wiring-time operations
//! (registration, lifecycle, configuration loading) return [`Result`].

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extractors;
pub mod language_detection;
pub mod plugins;
pub mod types;

pub use error::{OmnisiftError, Result};
pub use types::*;

pub use core::checksum::{content_checksum, file_id};
pub use core::config::PipelineConfig;
pub use core::detector::{ContentTypeDetector, detect};
pub use core::features::ContentFeatureAnalyzer;
pub use core::orchestrator::MetadataOrchestrator;
pub use core::signatures::{
    CSV_MIME_TYPE, JSON_MIME_TYPE, MARKDOWN_MIME_TYPE, OCTET_STREAM_MIME_TYPE, PDF_MIME_TYPE, PLAIN_TEXT_MIME_TYPE,
    XML_MIME_TYPE,
};

pub use extractors::{EngineKind, EngineOutput, EngineProcessor, ExtractionEngine, TextProcessor};
pub use plugins::{CleanupReport, ContentProcessor, Lifecycle, Plugin, ProcessorInfo, ProcessorOverride, ProcessorRegistry};
