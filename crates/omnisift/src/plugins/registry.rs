//! Processor registration and dispatch.
//!
//! The registry maps each [`ContentType`] to a single [`ContentProcessor`].
//! Registries are plain values owned by whoever wires the pipeline together;
//! there is no process-wide instance.

use crate::extractors::TextProcessor;
use crate::plugins::ContentProcessor;
use crate::types::{ContentType, ProcessorOptions, ProcessorResult};
use crate::{OmnisiftError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{Id, JoinSet};

const DEFAULT_LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Validate a processor name before registration.
///
/// # Rules
///
/// - Name cannot be empty
/// - Name cannot contain whitespace
///
/// # Errors
///
/// Returns `Validation` if the name is invalid.
fn validate_plugin_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(OmnisiftError::validation("Plugin name cannot be empty"));
    }

    if name.contains(char::is_whitespace) {
        return Err(OmnisiftError::validation(format!(
            "Plugin name '{}' cannot contain whitespace",
            name
        )));
    }

    Ok(())
}

/// A binding replaced by [`ProcessorRegistry::register_processor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorOverride {
    pub content_type: ContentType,
    pub previous: String,
    pub replacement: String,
}

/// Read-only description of a registered processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorInfo {
    pub name: String,
    pub version: String,
    /// Content types currently bound to this processor, sorted.
    pub content_types: Vec<ContentType>,
    /// Whether the processor exposes the lifecycle capability.
    pub stateful: bool,
}

/// Outcome of [`ProcessorRegistry::cleanup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub cleaned: Vec<String>,
    /// `(processor name, error message)` for every cleanup that failed or timed out.
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registry dispatching extraction calls by content type.
///
/// # Thread Safety
///
/// Registration takes `&mut self` and happens while wiring; afterwards the
/// registry is shared (usually behind an `Arc`) and every query and dispatch
/// takes `&self`.
///
/// # Example
///
/// ```rust
/// use omnisift::plugins::ProcessorRegistry;
/// use omnisift::{ContentType, ProcessorOptions};
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = ProcessorRegistry::with_defaults();
/// let result = registry
///     .process_content(b"hello world", ContentType::PlainText, &ProcessorOptions::default())
///     .await;
/// assert!(result.success);
/// # }
/// ```
pub struct ProcessorRegistry {
    processors: HashMap<ContentType, Arc<dyn ContentProcessor>>,
    lifecycle_timeout: Duration,
    initialized: Mutex<bool>,
}

impl ProcessorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
            lifecycle_timeout: DEFAULT_LIFECYCLE_TIMEOUT,
            initialized: Mutex::new(false),
        }
    }

    /// Create a registry with the built-in [`TextProcessor`] registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        // The built-in name is valid, so registration cannot fail.
        let _ = registry.register_processor(Arc::new(TextProcessor::new()));
        registry
    }

    /// Bound applied to each processor's `initialize` and `cleanup`.
    pub fn with_lifecycle_timeout(mut self, timeout: Duration) -> Self {
        self.lifecycle_timeout = timeout;
        self
    }

    /// Register a processor for every content type it supports.
    ///
    /// The last registration for a content type wins. Every binding that was
    /// replaced is logged and returned, so callers can treat overrides as
    /// errors if they want to.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the processor name is empty or contains whitespace.
    pub fn register_processor(&mut self, processor: Arc<dyn ContentProcessor>) -> Result<Vec<ProcessorOverride>> {
        validate_plugin_name(processor.name())?;

        let mut overrides = Vec::new();
        for &content_type in processor.supported_content_types() {
            if let Some(previous) = self.processors.insert(content_type, Arc::clone(&processor)) {
                tracing::warn!(
                    content_type = %content_type,
                    previous = previous.name(),
                    replacement = processor.name(),
                    "Processor binding overridden"
                );
                overrides.push(ProcessorOverride {
                    content_type,
                    previous: previous.name().to_string(),
                    replacement: processor.name().to_string(),
                });
            }
        }

        tracing::debug!(processor = processor.name(), "Registered processor");
        Ok(overrides)
    }

    /// Remove every binding held by the processor named `name`.
    ///
    /// Returns the content types that were unbound. Lifecycle methods are not
    /// called; run [`cleanup`](Self::cleanup) first if the processor holds
    /// resources.
    pub fn unregister_processor(&mut self, name: &str) -> Vec<ContentType> {
        let mut removed: Vec<ContentType> = self
            .processors
            .iter()
            .filter(|(_, processor)| processor.name() == name)
            .map(|(content_type, _)| *content_type)
            .collect();
        removed.sort();

        for content_type in &removed {
            self.processors.remove(content_type);
        }
        removed
    }

    /// Processor bound to `content_type`, if any.
    pub fn get(&self, content_type: ContentType) -> Option<Arc<dyn ContentProcessor>> {
        self.processors.get(&content_type).cloned()
    }

    /// Dispatch an in-memory buffer to the processor for `content_type`.
    ///
    /// Never fails: an unbound type yields [`ProcessorResult::unsupported`].
    pub async fn process_content(
        &self,
        content: &[u8],
        content_type: ContentType,
        options: &ProcessorOptions,
    ) -> ProcessorResult {
        match self.processors.get(&content_type) {
            Some(processor) => {
                tracing::debug!(content_type = %content_type, processor = processor.name(), "Dispatching buffer");
                processor.extract_from_buffer_as(content, content_type, options).await
            }
            None => ProcessorResult::unsupported(content_type),
        }
    }

    /// Dispatch a file to the processor for `content_type`.
    pub async fn process_file(
        &self,
        path: &Path,
        content_type: ContentType,
        options: &ProcessorOptions,
    ) -> ProcessorResult {
        match self.processors.get(&content_type) {
            Some(processor) => {
                tracing::debug!(content_type = %content_type, processor = processor.name(), path = %path.display(), "Dispatching file");
                processor.extract_from_file(path, options).await
            }
            None => ProcessorResult::unsupported(content_type),
        }
    }

    /// Content types with a bound processor, sorted.
    pub fn supported_content_types(&self) -> Vec<ContentType> {
        let mut types: Vec<ContentType> = self.processors.keys().copied().collect();
        types.sort();
        types
    }

    pub fn is_content_type_supported(&self, content_type: ContentType) -> bool {
        self.processors.contains_key(&content_type)
    }

    /// One entry per distinct processor, sorted by name.
    pub fn processor_info(&self) -> Vec<ProcessorInfo> {
        let mut by_name: BTreeMap<&str, ProcessorInfo> = BTreeMap::new();
        for (content_type, processor) in &self.processors {
            by_name
                .entry(processor.name())
                .or_insert_with(|| ProcessorInfo {
                    name: processor.name().to_string(),
                    version: processor.version(),
                    content_types: Vec::new(),
                    stateful: processor.lifecycle().is_some(),
                })
                .content_types
                .push(*content_type);
        }

        by_name
            .into_values()
            .map(|mut info| {
                info.content_types.sort();
                info
            })
            .collect()
    }

    pub async fn is_initialized(&self) -> bool {
        *self.initialized.lock().await
    }

    /// Initialize every stateful processor concurrently.
    ///
    /// Idempotent: once it has succeeded, later calls return immediately. Each
    /// processor gets the configured timeout. The first failure cancels the
    /// remaining initializations and is returned; the registry then stays
    /// uninitialized so the call can be retried.
    ///
    /// # Errors
    ///
    /// - `Timeout` if a processor does not finish in time
    /// - `Plugin` if a processor's `initialize` fails
    pub async fn initialize(&self) -> Result<()> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }

        let mut tasks = JoinSet::new();
        let mut names: HashMap<Id, String> = HashMap::new();
        for processor in self.stateful_processors() {
            let timeout = self.lifecycle_timeout;
            let name = processor.name().to_string();
            let task_name = name.clone();
            let handle = tasks.spawn(async move {
                let Some(lifecycle) = processor.lifecycle() else {
                    return Ok(());
                };
                match tokio::time::timeout(timeout, lifecycle.initialize()).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(OmnisiftError::plugin(task_name, format!("Initialization failed: {}", e))),
                    Err(_) => Err(OmnisiftError::Timeout {
                        operation: "initialize".to_string(),
                        plugin_name: task_name,
                    }),
                }
            });
            names.insert(handle.id(), name);
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| {
                    let name = names.get(&e.id()).cloned().unwrap_or_default();
                    OmnisiftError::plugin(name, format!("Initialization task failed: {}", e))
                })
                .and_then(|result| result);
            if let Err(e) = outcome {
                tasks.abort_all();
                tracing::warn!(error = %e, "Processor registry initialization failed");
                return Err(e);
            }
        }

        *initialized = true;
        tracing::info!("Processor registry initialized");
        Ok(())
    }

    /// Clean up every stateful processor concurrently.
    ///
    /// Runs to completion regardless of individual failures and reports which
    /// processors failed. The registry is marked uninitialized afterwards.
    pub async fn cleanup(&self) -> CleanupReport {
        let mut initialized = self.initialized.lock().await;

        let mut tasks = JoinSet::new();
        let mut names: HashMap<Id, String> = HashMap::new();
        for processor in self.stateful_processors() {
            let timeout = self.lifecycle_timeout;
            let name = processor.name().to_string();
            let handle = tasks.spawn(async move {
                match processor.lifecycle() {
                    Some(lifecycle) => match tokio::time::timeout(timeout, lifecycle.cleanup()).await {
                        Ok(result) => result,
                        Err(_) => Err(OmnisiftError::Timeout {
                            operation: "cleanup".to_string(),
                            plugin_name: processor.name().to_string(),
                        }),
                    },
                    None => Ok(()),
                }
            });
            names.insert(handle.id(), name);
        }

        let mut report = CleanupReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, Ok(()))) => report.cleaned.push(names.remove(&id).unwrap_or_default()),
                Ok((id, Err(e))) => {
                    let name = names.remove(&id).unwrap_or_default();
                    tracing::warn!(processor = %name, error = %e, "Processor cleanup failed");
                    report.failed.push((name, e.to_string()));
                }
                Err(e) => {
                    let name = names.remove(&e.id()).unwrap_or_default();
                    tracing::warn!(processor = %name, error = %e, "Processor cleanup task failed");
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        report.cleaned.sort();
        report.failed.sort();

        *initialized = false;
        tracing::info!(
            cleaned = report.cleaned.len(),
            failed = report.failed.len(),
            "Processor registry cleaned up"
        );
        report
    }

    /// Distinct processor instances exposing the lifecycle capability.
    ///
    /// An instance bound to several content types appears once; distinct
    /// instances sharing a name each appear.
    fn stateful_processors(&self) -> Vec<Arc<dyn ContentProcessor>> {
        let mut seen: HashSet<*const ()> = HashSet::new();
        let mut stateful = Vec::new();
        for processor in self.processors.values() {
            if processor.lifecycle().is_some() && seen.insert(Arc::as_ptr(processor).cast::<()>()) {
                stateful.push(Arc::clone(processor));
            }
        }
        stateful
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{Lifecycle, Plugin};
    use crate::types::ContentMetadata;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct StaticProcessor {
        name: &'static str,
        types: &'static [ContentType],
    }

    impl Plugin for StaticProcessor {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> String {
            "1.0.0".to_string()
        }
    }

    #[async_trait]
    impl ContentProcessor for StaticProcessor {
        async fn extract_from_buffer(&self, _content: &[u8], _options: &ProcessorOptions) -> ProcessorResult {
            let started = Instant::now();
            ProcessorResult::success(self.name.to_string(), ContentMetadata::new(self.types[0]), started)
        }

        fn supported_content_types(&self) -> &[ContentType] {
            self.types
        }
    }

    struct CountingEngine {
        inits: AtomicUsize,
        fail_cleanup: bool,
    }

    impl Plugin for CountingEngine {
        fn name(&self) -> &str {
            "counting-engine"
        }

        fn version(&self) -> String {
            "0.2.0".to_string()
        }
    }

    #[async_trait]
    impl Lifecycle for CountingEngine {
        async fn initialize(&self) -> Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn cleanup(&self) -> Result<()> {
            if self.fail_cleanup {
                Err(OmnisiftError::engine("engine still busy"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ContentProcessor for CountingEngine {
        async fn extract_from_buffer(&self, _content: &[u8], _options: &ProcessorOptions) -> ProcessorResult {
            ProcessorResult::success(String::new(), ContentMetadata::new(ContentType::Audio), Instant::now())
        }

        fn supported_content_types(&self) -> &[ContentType] {
            &[ContentType::Audio, ContentType::Video]
        }

        fn lifecycle(&self) -> Option<&dyn Lifecycle> {
            Some(self)
        }
    }

    #[test]
    fn test_validate_plugin_name() {
        assert!(validate_plugin_name("text-processor").is_ok());
        assert!(validate_plugin_name("").is_err());
        assert!(validate_plugin_name("text processor").is_err());
    }

    #[test]
    fn test_register_reports_overrides() {
        let mut registry = ProcessorRegistry::new();
        let first = registry
            .register_processor(Arc::new(StaticProcessor {
                name: "first",
                types: &[ContentType::Pdf, ContentType::OfficeDoc],
            }))
            .unwrap();
        assert!(first.is_empty());

        let second = registry
            .register_processor(Arc::new(StaticProcessor {
                name: "second",
                types: &[ContentType::Pdf],
            }))
            .unwrap();
        assert_eq!(
            second,
            vec![ProcessorOverride {
                content_type: ContentType::Pdf,
                previous: "first".to_string(),
                replacement: "second".to_string(),
            }]
        );
        assert_eq!(registry.get(ContentType::Pdf).unwrap().name(), "second");
        assert_eq!(registry.get(ContentType::OfficeDoc).unwrap().name(), "first");
    }

    #[test]
    fn test_register_rejects_invalid_name() {
        let mut registry = ProcessorRegistry::new();
        let result = registry.register_processor(Arc::new(StaticProcessor {
            name: "bad name",
            types: &[ContentType::Pdf],
        }));
        assert!(matches!(result, Err(OmnisiftError::Validation { .. })));
        assert!(registry.supported_content_types().is_empty());
    }

    #[test]
    fn test_unregister_processor() {
        let mut registry = ProcessorRegistry::new();
        registry
            .register_processor(Arc::new(StaticProcessor {
                name: "office",
                types: &[ContentType::OfficeSheet, ContentType::OfficeDoc],
            }))
            .unwrap();

        let removed = registry.unregister_processor("office");
        assert_eq!(removed, vec![ContentType::OfficeDoc, ContentType::OfficeSheet]);
        assert!(!registry.is_content_type_supported(ContentType::OfficeDoc));
        assert!(registry.unregister_processor("office").is_empty());
    }

    #[test]
    fn test_processor_info_groups_by_processor() {
        let mut registry = ProcessorRegistry::with_defaults();
        registry
            .register_processor(Arc::new(CountingEngine {
                inits: AtomicUsize::new(0),
                fail_cleanup: false,
            }))
            .unwrap();

        let info = registry.processor_info();
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].name, "counting-engine");
        assert!(info[0].stateful);
        assert_eq!(info[0].content_types, vec![ContentType::Audio, ContentType::Video]);
        assert_eq!(info[1].name, "text-processor");
        assert!(!info[1].stateful);
        assert!(info[1].content_types.contains(&ContentType::Markdown));
    }

    #[tokio::test]
    async fn test_process_content_unsupported() {
        let registry = ProcessorRegistry::new();
        let result = registry
            .process_content(b"frames", ContentType::Video, &ProcessorOptions::default())
            .await;
        assert!(!result.success);
        assert_eq!(result.processing_time_ms, 0);
        assert!(result.error_messages()[0].contains("not supported"));
    }

    #[tokio::test]
    async fn test_process_file_dispatches_by_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "one two three").unwrap();

        let registry = ProcessorRegistry::with_defaults();
        let result = registry
            .process_file(&path, ContentType::PlainText, &ProcessorOptions::default())
            .await;
        assert!(result.success);
        assert_eq!(result.metadata.word_count, Some(3));
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent_and_deduplicates() {
        let engine = Arc::new(CountingEngine {
            inits: AtomicUsize::new(0),
            fail_cleanup: false,
        });
        let mut registry = ProcessorRegistry::new();
        registry.register_processor(engine.clone()).unwrap();

        registry.initialize().await.unwrap();
        registry.initialize().await.unwrap();
        assert!(registry.is_initialized().await);
        assert_eq!(engine.inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cleanup_reports_failures() {
        let mut registry = ProcessorRegistry::with_defaults();
        registry
            .register_processor(Arc::new(CountingEngine {
                inits: AtomicUsize::new(0),
                fail_cleanup: true,
            }))
            .unwrap();
        registry.initialize().await.unwrap();

        let report = registry.cleanup().await;
        assert!(!report.is_clean());
        assert!(report.cleaned.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "counting-engine");
        assert!(report.failed[0].1.contains("engine still busy"));
        assert!(!registry.is_initialized().await);
    }
}
