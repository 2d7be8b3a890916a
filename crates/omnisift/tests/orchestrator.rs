//! Metadata orchestration integration tests.
//!
//! End-to-end envelopes for real files on disk, degraded results, batch
//! ordering, and the serialized interchange shape.

use omnisift::{
    ContentType, EngineKind, EngineOutput, EngineProcessor, ExtractionEngine, IssueSeverity, MetadataOrchestrator,
    PipelineConfig, ProcessorOptions, ProcessorRegistry, Result, UniversalMetadata, content_checksum, file_id,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

struct FakePdfEngine;

impl ExtractionEngine for FakePdfEngine {
    fn version(&self) -> String {
        "fake-pdf 2.1".to_string()
    }

    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    fn extract(&mut self, _content: &[u8], _options: &ProcessorOptions) -> Result<EngineOutput> {
        Ok(EngineOutput {
            text: "The annual report is ready for the board".to_string(),
            language: Some("en".to_string()),
            page_count: Some(12),
            ..Default::default()
        })
    }

    fn unload(&mut self) -> Result<()> {
        Ok(())
    }
}

fn pipeline(config: PipelineConfig) -> MetadataOrchestrator {
    let mut registry = ProcessorRegistry::with_defaults();
    registry
        .register_processor(Arc::new(EngineProcessor::new(EngineKind::Pdf, FakePdfEngine)))
        .expect("valid processor name");
    MetadataOrchestrator::new(Arc::new(registry), config)
}

fn write(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

#[tokio::test]
async fn test_pdf_envelope() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let dir = tempfile::tempdir()?;
    let bytes = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj";
    let path = write(&dir, "report.pdf", bytes);

    let metadata = pipeline(PipelineConfig::default()).extract_metadata(&path).await;

    assert!(metadata.processing.success);
    assert_eq!(metadata.processing.processor, "pdf-processor");
    assert_eq!(metadata.processing.processor_version, "fake-pdf 2.1");
    assert_eq!(metadata.file.mime_type, "application/pdf");
    assert_eq!(metadata.file.size, bytes.len() as u64);
    assert_eq!(metadata.file.checksum, content_checksum(bytes));
    assert_eq!(metadata.file.id, file_id(&path));
    assert_eq!(metadata.content.content_type, ContentType::Pdf);
    assert_eq!(metadata.content.page_count, Some(12));
    assert_eq!(metadata.content.language, "en");
    assert!(metadata.quality.confidence >= 0.8);
    assert_eq!(metadata.quality.overall_score, metadata.quality.confidence);
    assert_eq!(metadata.quality.accuracy, metadata.quality.confidence);
    // type + language + encoding + page count
    assert_eq!(metadata.quality.completeness, 1.0);
    assert!(metadata.quality.issues.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_read_failure_yields_degraded_envelope() {
    let metadata = pipeline(PipelineConfig::default())
        .extract_metadata(Path::new("/definitely/not/here/scan.png"))
        .await;

    assert!(metadata.is_degraded());
    assert!(!metadata.processing.success);
    assert_eq!(metadata.quality.overall_score, 0.0);
    assert!(!metadata.quality.issues.is_empty());
    assert_eq!(metadata.quality.issues[0].severity, IssueSeverity::High);
    assert_eq!(metadata.content.content_type, ContentType::Unknown);
    assert_eq!(metadata.file.name, "scan.png");
    assert!(metadata.relationships.duplicates.is_empty());
    assert!(metadata.relationships.related_files.is_empty());
}

#[tokio::test]
async fn test_directory_yields_degraded_envelope() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let metadata = pipeline(PipelineConfig::default()).extract_metadata(dir.path()).await;
    assert!(metadata.is_degraded());
    assert!(metadata.processing.errors.unwrap()[0].contains("not a regular file"));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_pdf_falls_back_to_generic_text() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    // Named .pdf but without the header: classified by extension, rejected by the engine processor.
    let path = write(&dir, "broken.pdf", b"this is not really a pdf");

    let metadata = pipeline(PipelineConfig::default()).extract_metadata(&path).await;
    assert_eq!(metadata.content.content_type, ContentType::Pdf);
    assert!(metadata.processing.success);
    assert_eq!(metadata.processing.processor, "generic-text-fallback");
    assert_eq!(metadata.content.word_count, Some(6));
    assert!(metadata.processing.errors.as_ref().unwrap()[0].contains("PDF header"));

    let fallback = metadata
        .quality
        .issues
        .iter()
        .find(|issue| issue.kind == "processor_fallback")
        .expect("fallback issue");
    assert_eq!(fallback.severity, IssueSeverity::Medium);
    Ok(())
}

#[tokio::test]
async fn test_fallback_disabled_keeps_failure() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write(&dir, "broken.pdf", b"this is not really a pdf");
    let config = PipelineConfig {
        fallback_to_generic: false,
        ..Default::default()
    };

    let metadata = pipeline(config).extract_metadata(&path).await;
    assert!(!metadata.processing.success);
    assert!(!metadata.is_degraded());
    assert_eq!(metadata.processing.processor, "pdf-processor");
    assert_eq!(metadata.file.checksum, content_checksum(b"this is not really a pdf"));
    Ok(())
}

#[tokio::test]
async fn test_processor_options_are_recorded() {
    let config = PipelineConfig {
        processor_options: ProcessorOptions {
            language: Some("fr".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let metadata = pipeline(config)
        .extract_metadata_from_bytes(b"Le chat est sur la table", "note.txt")
        .await;

    assert_eq!(metadata.processing.parameters.language.as_deref(), Some("fr"));
    assert_eq!(metadata.content.language, "fr");
    assert!(metadata.file.created_at.is_none());
    assert_eq!(metadata.file.size, 24);
}

#[tokio::test]
async fn test_batch_keeps_input_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut paths = Vec::new();
    for i in 0..12 {
        let name = if i % 3 == 0 { format!("doc{i}.md") } else { format!("doc{i}.txt") };
        paths.push(write(&dir, &name, format!("# Document {i}\n\nThe body of the file").as_bytes()));
    }
    paths.insert(5, dir.path().join("missing.txt"));

    let config = PipelineConfig {
        max_concurrent_extractions: Some(3),
        ..Default::default()
    };
    let results = pipeline(config).extract_metadata_batch(paths.clone()).await;

    assert_eq!(results.len(), paths.len());
    for (result, path) in results.iter().zip(&paths) {
        assert_eq!(result.file.name, path.file_name().unwrap().to_string_lossy());
    }
    assert!(results[5].is_degraded());
    assert_eq!(results.iter().filter(|m| m.is_degraded()).count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_envelope_serialization_shape() -> anyhow::Result<()> {
    let metadata = pipeline(PipelineConfig::default())
        .extract_metadata_from_bytes(b"{\"title\": \"draft\"}", "draft.json")
        .await;

    let value = serde_json::to_value(&metadata)?;
    assert_eq!(value["content"]["content_type"], "json");
    assert_eq!(value["processing"]["success"], true);
    assert!(value["relationships"]["topics"].as_array().unwrap().is_empty());

    let degraded = serde_json::to_value(UniversalMetadata::degraded(Path::new("x.bin"), "boom"))?;
    assert_eq!(degraded["quality"]["issues"][0]["severity"], "high");
    assert_eq!(degraded["content"]["content_type"], "unknown");

    let back = UniversalMetadata::from_json(&metadata.to_json()?)?;
    assert_eq!(back.content.content_type, ContentType::Json);
    assert_eq!(back.file.checksum, metadata.file.checksum);
    Ok(())
}

#[tokio::test]
async fn test_readme_with_badge_keeps_markdown_metadata() {
    let readme = b"[![build](https://ci.example/badge.svg)](https://ci.example)\n\n# Project\n\nThe tool is fast and it is small.\n\n## Install\n";
    let metadata = pipeline(PipelineConfig::default())
        .extract_metadata_from_bytes(readme, "README.md")
        .await;

    assert!(metadata.processing.success);
    assert_eq!(metadata.processing.processor, "text-processor");
    assert!(metadata.processing.errors.is_none());
    assert_eq!(metadata.content.content_type, ContentType::Markdown);
    assert_eq!(
        metadata.content.headers,
        Some(vec!["Project".to_string(), "Install".to_string()])
    );
    assert!(!metadata.quality.issues.iter().any(|i| i.kind == "processor_fallback"));
}

#[tokio::test]
async fn test_invalid_json_file_falls_back() {
    let metadata = pipeline(PipelineConfig::default())
        .extract_metadata_from_bytes(b"{\"name\": ", "broken.json")
        .await;

    assert_eq!(metadata.content.content_type, ContentType::Json);
    assert_eq!(metadata.processing.processor, "generic-text-fallback");
    assert!(metadata.processing.errors.as_ref().is_some_and(|e| e[0].contains("Invalid JSON")));
}
