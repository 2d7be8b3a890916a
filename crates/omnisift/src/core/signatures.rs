//! Byte signatures and MIME/extension lookup tables.
//!
//! Pure data plus lookups. The signature list is scanned in declaration order
//! and the first match wins, so format-specific entries (including the
//! offset-8 RIFF sub-formats) are listed before the generic container entries.

use crate::types::ContentType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";
pub const RTF_MIME_TYPE: &str = "application/rtf";
pub const JSON_MIME_TYPE: &str = "application/json";
pub const XML_MIME_TYPE: &str = "application/xml";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const SVG_MIME_TYPE: &str = "image/svg+xml";

pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const EXCEL_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const POWER_POINT_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Container MIME types. They appear in the signature list but not in the
/// MIME table, so classification of these containers falls through to the
/// file extension.
pub const ZIP_MIME_TYPE: &str = "application/zip";
pub const OLE_MIME_TYPE: &str = "application/x-ole-storage";
pub const RIFF_MIME_TYPE: &str = "application/x-riff";

/// A leading or offset byte pattern identifying a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub pattern: &'static [u8],
    pub offset: usize,
    pub mime_type: &'static str,
    /// Secondary check: one of these patterns must also sit at this offset.
    pub also: Option<(usize, &'static [&'static [u8]])>,
}

/// BITMAPINFOHEADER sizes (core, v1, v2, OS/2 v2, v4, v5), little-endian u32.
const BMP_DIB_HEADER_SIZES: &[&[u8]] = &[
    &[12, 0, 0, 0],
    &[40, 0, 0, 0],
    &[52, 0, 0, 0],
    &[56, 0, 0, 0],
    &[64, 0, 0, 0],
    &[108, 0, 0, 0],
    &[124, 0, 0, 0],
];

impl Signature {
    const fn at(pattern: &'static [u8], offset: usize, mime_type: &'static str) -> Self {
        Self {
            pattern,
            offset,
            mime_type,
            also: None,
        }
    }

    const fn also_at(mut self, offset: usize, patterns: &'static [&'static [u8]]) -> Self {
        self.also = Some((offset, patterns));
        self
    }

    /// Whether `buffer[offset..offset + len(pattern)]` equals the pattern and
    /// the secondary check, if any, holds.
    ///
    /// Buffers too short to hold a pattern at its offset never match.
    pub fn matches(&self, buffer: &[u8]) -> bool {
        if !bytes_at(buffer, self.offset, self.pattern) {
            return false;
        }
        match self.also {
            Some((offset, patterns)) => patterns.iter().any(|pattern| bytes_at(buffer, offset, pattern)),
            None => true,
        }
    }
}

fn bytes_at(buffer: &[u8], offset: usize, pattern: &[u8]) -> bool {
    let Some(end) = offset.checked_add(pattern.len()) else {
        return false;
    };
    buffer.get(offset..end) == Some(pattern)
}

/// Signature table in priority order.
pub static SIGNATURES: &[Signature] = &[
    Signature::at(b"%PDF", 0, PDF_MIME_TYPE),
    Signature::at(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], 0, "image/png"),
    Signature::at(&[0xFF, 0xD8, 0xFF], 0, "image/jpeg"),
    Signature::at(b"GIF87a", 0, "image/gif"),
    Signature::at(b"GIF89a", 0, "image/gif"),
    Signature::at(&[0x49, 0x49, 0x2A, 0x00], 0, "image/tiff"),
    Signature::at(&[0x4D, 0x4D, 0x00, 0x2A], 0, "image/tiff"),
    Signature::at(b"WEBP", 8, "image/webp"),
    Signature::at(b"WAVE", 8, "audio/wav"),
    Signature::at(b"AVI ", 8, "video/x-msvideo"),
    Signature::at(b"ftyp", 4, "video/mp4"),
    Signature::at(b"OggS", 0, "audio/ogg"),
    Signature::at(b"fLaC", 0, "audio/flac"),
    Signature::at(&[0x1A, 0x45, 0xDF, 0xA3], 0, "video/webm"),
    Signature::at(b"{\\rtf", 0, RTF_MIME_TYPE),
    Signature::at(&[0x50, 0x4B, 0x03, 0x04], 0, ZIP_MIME_TYPE),
    Signature::at(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1], 0, OLE_MIME_TYPE),
    Signature::at(b"BM", 0, "image/bmp").also_at(14, BMP_DIB_HEADER_SIZES),
    // Shared by WAV, AVI and WEBP; only reached when the sub-format at offset 8
    // is missing, and deliberately unresolvable so the extension decides.
    Signature::at(b"RIFF", 0, RIFF_MIME_TYPE),
];

/// MIME type to content type mapping.
static MIME_TO_CONTENT_TYPE: Lazy<HashMap<&'static str, ContentType>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert(PLAIN_TEXT_MIME_TYPE, ContentType::PlainText);
    m.insert(MARKDOWN_MIME_TYPE, ContentType::Markdown);
    m.insert("text/x-markdown", ContentType::Markdown);
    m.insert(RTF_MIME_TYPE, ContentType::RichText);
    m.insert("text/rtf", ContentType::RichText);

    m.insert(PDF_MIME_TYPE, ContentType::Pdf);

    m.insert(DOCX_MIME_TYPE, ContentType::OfficeDoc);
    m.insert("application/msword", ContentType::OfficeDoc);
    m.insert("application/vnd.oasis.opendocument.text", ContentType::OfficeDoc);
    m.insert(EXCEL_MIME_TYPE, ContentType::OfficeSheet);
    m.insert("application/vnd.ms-excel", ContentType::OfficeSheet);
    m.insert("application/vnd.oasis.opendocument.spreadsheet", ContentType::OfficeSheet);
    m.insert(POWER_POINT_MIME_TYPE, ContentType::OfficePresentation);
    m.insert("application/vnd.ms-powerpoint", ContentType::OfficePresentation);
    m.insert("application/vnd.oasis.opendocument.presentation", ContentType::OfficePresentation);

    m.insert("image/png", ContentType::RasterImage);
    m.insert("image/jpeg", ContentType::RasterImage);
    m.insert("image/gif", ContentType::RasterImage);
    m.insert("image/tiff", ContentType::RasterImage);
    m.insert("image/webp", ContentType::RasterImage);
    m.insert("image/bmp", ContentType::RasterImage);
    m.insert(SVG_MIME_TYPE, ContentType::VectorImage);

    m.insert("audio/wav", ContentType::Audio);
    m.insert("audio/x-wav", ContentType::Audio);
    m.insert("audio/mpeg", ContentType::Audio);
    m.insert("audio/ogg", ContentType::Audio);
    m.insert("audio/flac", ContentType::Audio);
    m.insert("audio/mp4", ContentType::Audio);

    m.insert("video/mp4", ContentType::Video);
    m.insert("video/x-msvideo", ContentType::Video);
    m.insert("video/webm", ContentType::Video);
    m.insert("video/quicktime", ContentType::Video);
    m.insert("video/x-matroska", ContentType::Video);

    m.insert(JSON_MIME_TYPE, ContentType::Json);
    m.insert(XML_MIME_TYPE, ContentType::Xml);
    m.insert("text/xml", ContentType::Xml);
    m.insert(CSV_MIME_TYPE, ContentType::Csv);

    m
});

/// File extension (lowercase, no dot) to content type mapping.
static EXT_TO_CONTENT_TYPE: Lazy<HashMap<&'static str, ContentType>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("txt", ContentType::PlainText);
    m.insert("text", ContentType::PlainText);
    m.insert("log", ContentType::PlainText);
    m.insert("md", ContentType::Markdown);
    m.insert("markdown", ContentType::Markdown);
    m.insert("rtf", ContentType::RichText);

    m.insert("pdf", ContentType::Pdf);

    m.insert("doc", ContentType::OfficeDoc);
    m.insert("docx", ContentType::OfficeDoc);
    m.insert("odt", ContentType::OfficeDoc);
    m.insert("xls", ContentType::OfficeSheet);
    m.insert("xlsx", ContentType::OfficeSheet);
    m.insert("ods", ContentType::OfficeSheet);
    m.insert("ppt", ContentType::OfficePresentation);
    m.insert("pptx", ContentType::OfficePresentation);
    m.insert("odp", ContentType::OfficePresentation);

    m.insert("png", ContentType::RasterImage);
    m.insert("jpg", ContentType::RasterImage);
    m.insert("jpeg", ContentType::RasterImage);
    m.insert("gif", ContentType::RasterImage);
    m.insert("bmp", ContentType::RasterImage);
    m.insert("tif", ContentType::RasterImage);
    m.insert("tiff", ContentType::RasterImage);
    m.insert("webp", ContentType::RasterImage);
    m.insert("svg", ContentType::VectorImage);

    m.insert("mp3", ContentType::Audio);
    m.insert("wav", ContentType::Audio);
    m.insert("ogg", ContentType::Audio);
    m.insert("flac", ContentType::Audio);
    m.insert("m4a", ContentType::Audio);
    m.insert("aac", ContentType::Audio);

    m.insert("mp4", ContentType::Video);
    m.insert("avi", ContentType::Video);
    m.insert("mov", ContentType::Video);
    m.insert("mkv", ContentType::Video);
    m.insert("webm", ContentType::Video);

    m.insert("json", ContentType::Json);
    m.insert("xml", ContentType::Xml);
    m.insert("csv", ContentType::Csv);

    m.insert("bin", ContentType::Binary);
    m.insert("exe", ContentType::Binary);
    m.insert("dll", ContentType::Binary);
    m.insert("so", ContentType::Binary);

    m
});

/// First signature matching `buffer`, in table order.
pub fn match_signature(buffer: &[u8]) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|sig| sig.matches(buffer))
}

/// Content type for a MIME type, if the MIME table knows it.
pub fn content_type_for_mime(mime_type: &str) -> Option<ContentType> {
    MIME_TO_CONTENT_TYPE.get(mime_type).copied()
}

/// Content type for a file extension. Case-insensitive; a leading dot is ignored.
pub fn content_type_for_extension(extension: &str) -> Option<ContentType> {
    let ext = extension.trim_start_matches('.').to_lowercase();
    EXT_TO_CONTENT_TYPE.get(ext.as_str()).copied()
}

/// Extension of a file name, lowercased, without the dot.
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn extension_of(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_requires_full_pattern() {
        let sig = Signature::at(b"%PDF", 0, PDF_MIME_TYPE);
        assert!(sig.matches(b"%PDF-1.7"));
        assert!(!sig.matches(b"%PD"));
        assert!(!sig.matches(b""));
    }

    #[test]
    fn test_offset_signature_on_short_buffer() {
        let sig = Signature::at(b"ftyp", 4, "video/mp4");
        assert!(sig.matches(b"\0\0\0\x18ftypisom"));
        assert!(!sig.matches(b"\0\0\0\x18fty"));
        assert!(!sig.matches(b"ftyp"));
    }

    #[test]
    fn test_bmp_requires_dib_header() {
        let mut bmp = b"BM\x46\0\0\0\0\0\0\0\x36\0\0\0".to_vec();
        bmp.extend_from_slice(&[40, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(match_signature(&bmp).unwrap().mime_type, "image/bmp");

        assert!(match_signature(b"BMW,2024,sales\nAudi,2023,sales\n").is_none());
        assert!(match_signature(b"BMX tricks\n\n# Guide\n").is_none());
        assert!(match_signature(b"BM\0\0").is_none());
    }

    #[test]
    fn test_riff_subformats_win_over_generic_riff() {
        assert_eq!(match_signature(b"RIFF\x24\0\0\0WAVEfmt ").unwrap().mime_type, "audio/wav");
        assert_eq!(match_signature(b"RIFF\x24\0\0\0AVI LIST").unwrap().mime_type, "video/x-msvideo");
        assert_eq!(match_signature(b"RIFF\x24\0\0\0WEBPVP8 ").unwrap().mime_type, "image/webp");
        assert_eq!(match_signature(b"RIFF").unwrap().mime_type, RIFF_MIME_TYPE);
    }

    #[test]
    fn test_containers_do_not_resolve() {
        for mime in [ZIP_MIME_TYPE, OLE_MIME_TYPE, RIFF_MIME_TYPE, OCTET_STREAM_MIME_TYPE] {
            assert_eq!(content_type_for_mime(mime), None, "{} should not resolve", mime);
        }
    }

    #[test]
    fn test_every_signature_mime_is_known_or_container() {
        for sig in SIGNATURES {
            let container = [ZIP_MIME_TYPE, OLE_MIME_TYPE, RIFF_MIME_TYPE].contains(&sig.mime_type);
            assert!(
                container || content_type_for_mime(sig.mime_type).is_some(),
                "{} has no content type",
                sig.mime_type
            );
        }
    }

    #[test]
    fn test_extension_lookup_case_insensitive() {
        assert_eq!(content_type_for_extension("PDF"), Some(ContentType::Pdf));
        assert_eq!(content_type_for_extension(".Md"), Some(ContentType::Markdown));
        assert_eq!(content_type_for_extension("xyz"), None);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("dir.v2/archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".bashrc"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}
