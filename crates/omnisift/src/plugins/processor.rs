//! Content processor trait.
//!
//! A processor extracts text and metadata for one or more content types. The
//! contract is infallible at the boundary: implementations catch their own
//! errors and report them inside the returned [`ProcessorResult`].

use crate::core::io;
use crate::plugins::{Lifecycle, Plugin};
use crate::types::{ContentType, ProcessorOptions, ProcessorResult};
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;

/// Trait for type-specific extractors.
///
/// # Thread Safety
///
/// Processors are shared as `Arc<dyn ContentProcessor>`. Stateless processors
/// may serve concurrent calls freely. A processor wrapping a single-instance
/// native engine must serialize calls to that engine itself (or pool engines);
/// see [`EngineProcessor`](crate::extractors::EngineProcessor).
///
/// # Example
///
/// ```rust
/// use omnisift::plugins::{ContentProcessor, Plugin};
/// use omnisift::{ContentMetadata, ContentType, ProcessorOptions, ProcessorResult};
/// use async_trait::async_trait;
/// use std::time::Instant;
///
/// struct ByteCounter;
///
/// impl Plugin for ByteCounter {
///     fn name(&self) -> &str { "byte-counter" }
///     fn version(&self) -> String { "1.0.0".to_string() }
/// }
///
/// #[async_trait]
/// impl ContentProcessor for ByteCounter {
///     async fn extract_from_buffer(&self, content: &[u8], _options: &ProcessorOptions) -> ProcessorResult {
///         let started = Instant::now();
///         let mut metadata = ContentMetadata::new(ContentType::Binary);
///         metadata.additional.insert("bytes".to_string(), content.len().into());
///         ProcessorResult::success(String::new(), metadata, started)
///     }
///
///     fn supported_content_types(&self) -> &[ContentType] {
///         &[ContentType::Binary]
///     }
/// }
/// ```
#[async_trait]
pub trait ContentProcessor: Plugin {
    /// Extract text and metadata from an in-memory buffer.
    ///
    /// Must not panic or propagate errors: failures come back as
    /// `success == false` with a descriptive `errors` entry.
    async fn extract_from_buffer(&self, content: &[u8], options: &ProcessorOptions) -> ProcessorResult;

    /// Extract from a buffer the registry has already classified.
    ///
    /// Processors serving several content types can trust `content_type`
    /// instead of inspecting the bytes again. Delegates to
    /// `extract_from_buffer` by default.
    async fn extract_from_buffer_as(
        &self,
        content: &[u8],
        _content_type: ContentType,
        options: &ProcessorOptions,
    ) -> ProcessorResult {
        self.extract_from_buffer(content, options).await
    }

    /// Extract from a file.
    ///
    /// Default implementation reads the file and calls `extract_from_buffer`.
    /// A missing or unreadable file is reported as a failed result.
    async fn extract_from_file(&self, path: &Path, options: &ProcessorOptions) -> ProcessorResult {
        let started = Instant::now();
        match io::read_file_async(path).await {
            Ok(bytes) => self.extract_from_buffer(&bytes, options).await,
            Err(e) => {
                let content_type = self
                    .supported_content_types()
                    .first()
                    .copied()
                    .unwrap_or(ContentType::Unknown);
                ProcessorResult::failure(
                    content_type,
                    format!("Failed to read {}: {}", path.display(), e),
                    started,
                )
            }
        }
    }

    /// Content types this processor handles.
    fn supported_content_types(&self) -> &[ContentType];

    fn supports_content_type(&self, content_type: ContentType) -> bool {
        self.supported_content_types().contains(&content_type)
    }

    /// Name used in processing metadata; the plugin name by default.
    fn processor_name(&self) -> &str {
        self.name()
    }

    /// Lifecycle capability, for processors that hold native resources.
    ///
    /// Stateful processors return `Some(self)`; the registry calls
    /// `initialize` / `cleanup` only on processors that do.
    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentMetadata;

    struct EchoProcessor;

    impl Plugin for EchoProcessor {
        fn name(&self) -> &str {
            "echo-processor"
        }

        fn version(&self) -> String {
            "0.1.0".to_string()
        }
    }

    #[async_trait]
    impl ContentProcessor for EchoProcessor {
        async fn extract_from_buffer(&self, content: &[u8], _options: &ProcessorOptions) -> ProcessorResult {
            let started = Instant::now();
            let text = String::from_utf8_lossy(content).into_owned();
            ProcessorResult::success(text, ContentMetadata::new(ContentType::PlainText), started)
        }

        fn supported_content_types(&self) -> &[ContentType] {
            &[ContentType::PlainText, ContentType::Markdown]
        }
    }

    #[test]
    fn test_metadata_queries() {
        let processor = EchoProcessor;
        assert!(processor.supports_content_type(ContentType::Markdown));
        assert!(!processor.supports_content_type(ContentType::Pdf));
        assert_eq!(processor.processor_name(), "echo-processor");
        assert!(processor.lifecycle().is_none());
    }

    #[tokio::test]
    async fn test_extract_from_file_reads_and_delegates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.txt");
        std::fs::write(&path, "hello file").unwrap();

        let result = EchoProcessor
            .extract_from_file(&path, &ProcessorOptions::default())
            .await;
        assert!(result.success);
        assert_eq!(result.text, "hello file");
    }

    #[tokio::test]
    async fn test_extract_as_delegates_by_default() {
        let result = EchoProcessor
            .extract_from_buffer_as(b"# title", ContentType::Markdown, &ProcessorOptions::default())
            .await;
        assert!(result.success);
        assert_eq!(result.text, "# title");
    }

    #[tokio::test]
    async fn test_extract_from_missing_file_is_failed_result() {
        let result = EchoProcessor
            .extract_from_file(Path::new("/nonexistent/echo.txt"), &ProcessorOptions::default())
            .await;
        assert!(!result.success);
        assert!(!result.text.is_empty());
        assert!(result.error_messages()[0].contains("Failed to read"));
        assert_eq!(result.metadata.content_type, ContentType::PlainText);
    }
}
