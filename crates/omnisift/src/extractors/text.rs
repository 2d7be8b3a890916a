//! Generic text processor.
//!
//! Handles every textual content type: plain text, Markdown, RTF, JSON, XML
//! and CSV. When the registry dispatches with a classification, that type is
//! used as-is. A bare `extract_from_buffer` call sniffs the format from the
//! bytes (RTF header, parseable JSON, Markdown markup, XML lead character, CSV
//! line shape) and reports it in `metadata.content_type`.

use crate::core::features::looks_like_csv;
use crate::language_detection::detect_language;
use crate::plugins::{ContentProcessor, Plugin};
use crate::types::{ContentMetadata, ContentType, ProcessorOptions, ProcessorResult, UNKNOWN};
use crate::{OmnisiftError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;

static MARKDOWN_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+(.+?)\s*#*$").expect("Markdown header regex pattern is valid and should compile"));
static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("Markdown link regex pattern is valid and should compile")
});
static XML_ROOT_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z_][\w:.-]*)").expect("XML root element regex pattern is valid and should compile")
});

const SUPPORTED_TYPES: &[ContentType] = &[
    ContentType::PlainText,
    ContentType::Markdown,
    ContentType::RichText,
    ContentType::Json,
    ContentType::Xml,
    ContentType::Csv,
];

/// RTF destinations whose content is not document text.
const RTF_IGNORED_DESTINATIONS: &[&str] = &["fonttbl", "colortbl", "stylesheet", "info", "pict", "header", "footer"];

/// Stateless processor for textual content.
pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for TextProcessor {
    fn name(&self) -> &str {
        "text-processor"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn description(&self) -> &str {
        "Extracts text and statistics from plain text, Markdown, RTF, JSON, XML and CSV"
    }
}

#[async_trait]
impl ContentProcessor for TextProcessor {
    async fn extract_from_buffer(&self, content: &[u8], options: &ProcessorOptions) -> ProcessorResult {
        let started = Instant::now();
        let format = sniff_format(content);
        ProcessorResult::from_outcome(format, extract_text(content, format, options), started)
    }

    async fn extract_from_buffer_as(
        &self,
        content: &[u8],
        content_type: ContentType,
        options: &ProcessorOptions,
    ) -> ProcessorResult {
        let started = Instant::now();
        let format = if SUPPORTED_TYPES.contains(&content_type) {
            content_type
        } else {
            sniff_format(content)
        };
        ProcessorResult::from_outcome(format, extract_text(content, format, options), started)
    }

    fn supported_content_types(&self) -> &[ContentType] {
        SUPPORTED_TYPES
    }
}

/// Pick the textual format of `content`.
fn sniff_format(content: &[u8]) -> ContentType {
    let text = String::from_utf8_lossy(content);
    let trimmed = text.trim_start();

    if trimmed.starts_with("{\\rtf") {
        return ContentType::RichText;
    }
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return ContentType::Json;
    }
    if trimmed.starts_with("<?xml") {
        return ContentType::Xml;
    }
    if text
        .lines()
        .any(|line| MARKDOWN_HEADER.is_match(line) || MARKDOWN_LINK.is_match(line))
    {
        return ContentType::Markdown;
    }
    if trimmed.starts_with('<') {
        return ContentType::Xml;
    }
    if text.lines().filter(|line| !line.trim().is_empty()).count() > 1 && looks_like_csv(&text) {
        return ContentType::Csv;
    }
    ContentType::PlainText
}

fn extract_text(content: &[u8], format: ContentType, options: &ProcessorOptions) -> Result<(String, ContentMetadata)> {
    let encoding = if std::str::from_utf8(content).is_ok() { "utf-8" } else { UNKNOWN };
    let raw = String::from_utf8_lossy(content).into_owned();

    let mut metadata = ContentMetadata::new(format);
    metadata.encoding = encoding.to_string();

    let text = match format {
        ContentType::RichText => strip_rtf(&raw),
        ContentType::Json => {
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => {
                    metadata.additional.insert("json_valid".to_string(), true.into());
                    let top_level = if value.is_array() { "array" } else { "object" };
                    metadata.additional.insert("top_level".to_string(), top_level.into());
                }
                Err(e) if options.skip_validation() => {
                    metadata.additional.insert("json_valid".to_string(), false.into());
                    tracing::debug!(error = %e, "Accepting invalid JSON with validation skipped");
                }
                Err(e) => return Err(OmnisiftError::parsing_with_source("Invalid JSON content", e)),
            }
            raw
        }
        _ => raw,
    };

    metadata.word_count = Some(text.split_whitespace().count());
    metadata.character_count = Some(text.chars().count());
    metadata.line_count = Some(text.lines().count());
    metadata.language = match &options.language {
        Some(language) => language.clone(),
        None => detect_language(&text).to_string(),
    };

    if options.extract_metadata() {
        match format {
            ContentType::Markdown => add_markdown_metadata(&text, &mut metadata),
            ContentType::Csv => add_csv_metadata(&text, &mut metadata),
            ContentType::Xml => {
                if let Some(root) = xml_root_element(&text) {
                    metadata.additional.insert("root_element".to_string(), root.into());
                }
            }
            _ => {}
        }
    }

    Ok((text, metadata))
}

fn add_markdown_metadata(text: &str, metadata: &mut ContentMetadata) {
    let mut headers = Vec::new();
    let mut links = 0usize;
    let mut in_code_block = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            continue;
        }
        if let Some(caps) = MARKDOWN_HEADER.captures(line)
            && let Some(header) = caps.get(1)
        {
            headers.push(header.as_str().to_string());
        }
        links += MARKDOWN_LINK.find_iter(line).count();
    }

    if !headers.is_empty() {
        metadata.headers = Some(headers);
    }
    if links > 0 {
        metadata.additional.insert("link_count".to_string(), links.into());
    }
}

fn add_csv_metadata(text: &str, metadata: &mut ContentMetadata) {
    let mut rows = text.lines().filter(|line| !line.trim().is_empty());
    let columns = rows.next().map(|header| header.matches(',').count() + 1).unwrap_or(0);
    let row_count = rows.count() + usize::from(columns > 0);

    metadata.additional.insert("row_count".to_string(), row_count.into());
    metadata.additional.insert("column_count".to_string(), columns.into());
}

fn xml_root_element(text: &str) -> Option<String> {
    XML_ROOT_ELEMENT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .next()
}

/// Reduce RTF markup to plain text.
///
/// Paragraph and line controls become newlines, `\tab` a tab, `\'hh` escapes
/// a Latin-1 character. Ignorable destinations (`{\*...}`) and the font,
/// color, style and info tables are dropped.
fn strip_rtf(rtf: &str) -> String {
    let mut out = String::with_capacity(rtf.len() / 2);
    let mut chars = rtf.chars().peekable();
    let mut depth = 0usize;
    let mut skip_from: Option<usize> = None;

    while let Some(c) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' => {
                if skip_from == Some(depth) {
                    skip_from = None;
                }
                depth = depth.saturating_sub(1);
            }
            '\\' => match chars.peek().copied() {
                Some(escaped @ ('\\' | '{' | '}')) => {
                    chars.next();
                    if skip_from.is_none() {
                        out.push(escaped);
                    }
                }
                Some('\'') => {
                    chars.next();
                    let hex: String = chars.by_ref().take(2).collect();
                    if skip_from.is_none()
                        && let Ok(byte) = u8::from_str_radix(&hex, 16)
                    {
                        out.push(char::from(byte));
                    }
                }
                Some('*') => {
                    chars.next();
                    skip_from.get_or_insert(depth);
                }
                Some(letter) if letter.is_ascii_alphabetic() => {
                    let mut word = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphabetic() {
                            word.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if chars.peek() == Some(&'-') {
                        chars.next();
                    }
                    while chars.peek().is_some_and(|next| next.is_ascii_digit()) {
                        chars.next();
                    }
                    if chars.peek() == Some(&' ') {
                        chars.next();
                    }

                    if skip_from.is_some() {
                        continue;
                    }
                    match word.as_str() {
                        "par" | "line" => out.push('\n'),
                        "tab" => out.push('\t'),
                        w if RTF_IGNORED_DESTINATIONS.contains(&w) => skip_from = Some(depth),
                        _ => {}
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            '\r' | '\n' => {}
            _ => {
                if skip_from.is_none() {
                    out.push(c);
                }
            }
        }
    }

    out.lines().map(str::trim_end).collect::<Vec<_>>().join("\n").trim().to_string()
}
