//! Core classification and orchestration.
//!
//! # Architecture
//!
//! - **Signatures**: magic-number table plus MIME and extension lookups
//! - **Features**: text, structure, encoding and language sniffing
//! - **Detector**: ordered classifier chain and confidence scoring
//! - **Orchestrator**: read, detect, dispatch, hash, score, assemble
//! - **Configuration**: pipeline settings loaded from TOML or JSON
//!
//! # Example
//!
//! ```rust
//! use omnisift::core::detector::detect;
//! use omnisift::ContentType;
//!
//! let result = detect(b"%PDF-1.7\n...", "report.pdf");
//! assert_eq!(result.content_type, ContentType::Pdf);
//! assert!(result.confidence >= 0.8);
//! ```

pub mod checksum;
pub mod config;
pub mod detector;
pub mod features;
pub mod io;
pub mod orchestrator;
pub mod quality;
pub mod signatures;

pub use config::PipelineConfig;
pub use detector::{ContentTypeDetector, detect};
pub use features::ContentFeatureAnalyzer;
pub use orchestrator::MetadataOrchestrator;
