//! Plugin system.
//!
//! Extraction is pluggable: any type implementing [`ContentProcessor`] can be
//! registered in a [`ProcessorRegistry`] for the content types it supports.
//!
//! # Plugin Types
//!
//! - [`Plugin`] - identity shared by all plugins
//! - [`ContentProcessor`] - type-specific extraction
//! - [`Lifecycle`] - optional capability for processors holding native resources
//!
//! # Example
//!
//! ```rust
//! use omnisift::plugins::{ContentProcessor, Plugin, ProcessorRegistry};
//! use omnisift::{ContentMetadata, ContentType, ProcessorOptions, ProcessorResult};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! struct SvgProcessor;
//!
//! impl Plugin for SvgProcessor {
//!     fn name(&self) -> &str { "svg-processor" }
//!     fn version(&self) -> String { "1.0.0".to_string() }
//! }
//!
//! #[async_trait]
//! impl ContentProcessor for SvgProcessor {
//!     async fn extract_from_buffer(&self, content: &[u8], _options: &ProcessorOptions) -> ProcessorResult {
//!         let started = Instant::now();
//!         let text = String::from_utf8_lossy(content).into_owned();
//!         ProcessorResult::success(text, ContentMetadata::new(ContentType::VectorImage), started)
//!     }
//!
//!     fn supported_content_types(&self) -> &[ContentType] {
//!         &[ContentType::VectorImage]
//!     }
//! }
//!
//! let mut registry = ProcessorRegistry::with_defaults();
//! let overrides = registry.register_processor(Arc::new(SvgProcessor))?;
//! assert!(overrides.is_empty());
//! assert!(registry.is_content_type_supported(ContentType::VectorImage));
//! # Ok::<(), omnisift::OmnisiftError>(())
//! ```

pub mod processor;
pub mod registry;
pub mod traits;

pub use processor::ContentProcessor;
pub use registry::{CleanupReport, ProcessorInfo, ProcessorOverride, ProcessorRegistry};
pub use traits::{Lifecycle, Plugin};
