//! Built-in format handlers.
//!
//! Four parsers cover the common request types out of the box: plain text
//! (`String`), JSON documents (`serde_json::Value`), raw bytes (`Vec<u8>`)
//! and decoded images (`image::DynamicImage`). Games register their own
//! parsers alongside these for proprietary formats.

use std::any::{Any, TypeId};
use std::path::Path;
use std::sync::Arc;

use crate::parser::registry::{InputMode, ParserInput, ResourceParser};

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Produces `String` from UTF-8 text.
///
/// Scores high on known text extensions and keeps a small fallback score
/// elsewhere, so a text request can still be served from an unconventional
/// extension when nothing better applies.
pub struct TextParser;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "log", "ini", "cfg", "xml", "json", "yaml", "yml", "toml", "lua",
];

impl ResourceParser for TextParser {
    fn name(&self) -> &'static str {
        "text"
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Text
    }

    fn confidence(&self, requested: TypeId, concrete: &Path) -> f32 {
        if requested != TypeId::of::<String>() {
            return 0.0;
        }
        match extension(concrete) {
            Some(ext) if TEXT_EXTENSIONS.contains(&ext.as_str()) => 1.0,
            _ => 0.1,
        }
    }

    fn parse(&self, input: ParserInput<'_>) -> Option<Arc<dyn Any + Send + Sync>> {
        let text = input.as_text()?;
        Some(Arc::new(text.to_string()))
    }
}

/// Produces `serde_json::Value` from `.json` entries.
pub struct JsonParser;

impl ResourceParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Text
    }

    fn confidence(&self, requested: TypeId, concrete: &Path) -> f32 {
        if requested != TypeId::of::<serde_json::Value>() {
            return 0.0;
        }
        match extension(concrete).as_deref() {
            Some("json") => 1.0,
            _ => 0.0,
        }
    }

    fn parse(&self, input: ParserInput<'_>) -> Option<Arc<dyn Any + Send + Sync>> {
        let text = input.as_text()?;
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        Some(Arc::new(value))
    }
}

/// Produces `Vec<u8>`, the identity parser. Applies to any entry.
pub struct BytesParser;

impl ResourceParser for BytesParser {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Bytes
    }

    fn confidence(&self, requested: TypeId, _concrete: &Path) -> f32 {
        if requested == TypeId::of::<Vec<u8>>() {
            1.0
        } else {
            0.0
        }
    }

    fn parse(&self, input: ParserInput<'_>) -> Option<Arc<dyn Any + Send + Sync>> {
        let bytes = input.as_bytes()?;
        Some(Arc::new(bytes.to_vec()))
    }
}

/// Produces `image::DynamicImage` from common raster formats.
pub struct ImageParser;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

impl ResourceParser for ImageParser {
    fn name(&self) -> &'static str {
        "image"
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Bytes
    }

    fn confidence(&self, requested: TypeId, concrete: &Path) -> f32 {
        if requested != TypeId::of::<image::DynamicImage>() {
            return 0.0;
        }
        match extension(concrete) {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => 1.0,
            _ => 0.0,
        }
    }

    fn parse(&self, input: ParserInput<'_>) -> Option<Arc<dyn Any + Send + Sync>> {
        let bytes = input.as_bytes()?;
        let img = image::load_from_memory(bytes).ok()?;
        Some(Arc::new(img))
    }
}
