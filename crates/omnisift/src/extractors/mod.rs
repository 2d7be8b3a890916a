//! Built-in content processors.
//!
//! [`TextProcessor`] handles every textual type natively. PDF, Office, OCR and
//! speech extraction run in external engines adapted by [`EngineProcessor`].

pub mod engine;
pub mod text;

pub use engine::{EngineKind, EngineOutput, EngineProcessor, ExtractionEngine};
pub use text::TextProcessor;
