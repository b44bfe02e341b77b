//! The per-package resolution loop.
//!
//! Given one package, a requested semantic type and a logical path, try every
//! matching entry against the ranked parsers until one produces a value.
//! Candidates are visited in the package's enumeration order; for each
//! candidate the registry ranks parsers by confidence and they are tried
//! best first. Content is read at most once per input mode per candidate,
//! however many parsers inspect it.

use std::any::{Any, TypeId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::package::{FoundFile, Package};
use crate::parser::registry::{InputMode, ParserInput, ParserRegistry};

/// Outcome of a successful resolution inside one package.
pub struct Resolution {
    /// The decoded semantic value.
    pub value: Arc<dyn Any + Send + Sync>,
    /// Concrete entry the value was decoded from.
    pub concrete: PathBuf,
    /// Name of the parser that produced the value.
    pub parser: &'static str,
}

/// Lazy per-candidate content, read once per input mode.
struct CandidateContent<'a> {
    package: &'a dyn Package,
    entry: &'a FoundFile,
    text: Option<Option<String>>,
    bytes: Option<Option<Vec<u8>>>,
}

impl<'a> CandidateContent<'a> {
    fn new(package: &'a dyn Package, entry: &'a FoundFile) -> Self {
        Self {
            package,
            entry,
            text: None,
            bytes: None,
        }
    }

    fn text(&mut self) -> Option<&str> {
        if self.text.is_none() {
            self.text = Some(self.package.read_text(self.entry));
        }
        self.text.as_ref().and_then(|t| t.as_deref())
    }

    fn bytes(&mut self) -> Option<&[u8]> {
        if self.bytes.is_none() {
            self.bytes = Some(self.package.read_bytes(self.entry));
        }
        self.bytes.as_ref().and_then(|b| b.as_deref())
    }

    async fn text_async(&mut self) -> Option<&str> {
        if self.text.is_none() {
            self.text = Some(self.package.read_text_async(self.entry).await);
        }
        self.text.as_ref().and_then(|t| t.as_deref())
    }

    async fn bytes_async(&mut self) -> Option<&[u8]> {
        if self.bytes.is_none() {
            self.bytes = Some(self.package.read_bytes_async(self.entry).await);
        }
        self.bytes.as_ref().and_then(|b| b.as_deref())
    }
}

/// Resolve a logical path to a semantic value within one package.
///
/// Returns `None` when no candidate entry can be decoded to the requested
/// type. Falling through parsers and candidates is the normal miss path, not
/// an error.
pub fn resolve_with_parsers(
    package: &dyn Package,
    registry: &ParserRegistry,
    requested: TypeId,
    logical: &Path,
) -> Option<Resolution> {
    for entry in package.find_files(logical) {
        let mut content = CandidateContent::new(package, &entry);
        for (parser, score) in registry.rank(requested, &entry.path) {
            let value = match parser.input_mode() {
                InputMode::Text => content
                    .text()
                    .and_then(|t| parser.parse(ParserInput::Text(t))),
                InputMode::Bytes => content
                    .bytes()
                    .and_then(|b| parser.parse(ParserInput::Bytes(b))),
            };
            match value {
                Some(value) => {
                    return Some(Resolution {
                        value,
                        concrete: entry.path.clone(),
                        parser: parser.name(),
                    });
                }
                None => {
                    debug!(
                        parser = parser.name(),
                        score,
                        entry = %entry.path.display(),
                        "parser declined candidate"
                    );
                }
            }
        }
    }
    None
}

/// Async twin of [`resolve_with_parsers`], reading through the package's
/// async methods.
pub async fn resolve_with_parsers_async(
    package: &dyn Package,
    registry: &ParserRegistry,
    requested: TypeId,
    logical: &Path,
) -> Option<Resolution> {
    for entry in package.find_files(logical) {
        let mut content = CandidateContent::new(package, &entry);
        for (parser, score) in registry.rank(requested, &entry.path) {
            let value = match parser.input_mode() {
                InputMode::Text => match content.text_async().await {
                    Some(t) => parser.parse(ParserInput::Text(t)),
                    None => None,
                },
                InputMode::Bytes => match content.bytes_async().await {
                    Some(b) => parser.parse(ParserInput::Bytes(b)),
                    None => None,
                },
            };
            match value {
                Some(value) => {
                    return Some(Resolution {
                        value,
                        concrete: entry.path.clone(),
                        parser: parser.name(),
                    });
                }
                None => {
                    debug!(
                        parser = parser.name(),
                        score,
                        entry = %entry.path.display(),
                        "parser declined candidate"
                    );
                }
            }
        }
    }
    None
}
