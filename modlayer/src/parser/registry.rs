//! The parser trait and the ordered registry of implementations.

use std::any::{Any, TypeId};
use std::path::Path;
use std::sync::Arc;

/// How a parser wants its input delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
}

/// Input handed to [`ResourceParser::parse`], matching its declared mode.
#[derive(Debug, Clone, Copy)]
pub enum ParserInput<'a> {
    /// UTF-8 text content.
    Text(&'a str),
    /// Raw byte content.
    Bytes(&'a [u8]),
}

impl<'a> ParserInput<'a> {
    /// The text content, if this input is text.
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            ParserInput::Text(s) => Some(s),
            ParserInput::Bytes(_) => None,
        }
    }

    /// The byte content, if this input is bytes.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self {
            ParserInput::Bytes(b) => Some(b),
            ParserInput::Text(_) => None,
        }
    }
}

/// A format handler mapping raw content to one semantic type.
///
/// Parsers self-score per request: [`confidence`](Self::confidence) receives
/// the requested semantic type and the concrete entry path and answers how
/// well this parser fits, `0.0` meaning not at all. Scores only order
/// parsers relative to each other for one candidate; they carry no absolute
/// meaning.
///
/// Implementations must be cheap to score. All expensive work belongs in
/// [`parse`](Self::parse), which is only invoked on ranked candidates.
pub trait ResourceParser: Send + Sync {
    /// Short stable name, used in logs and events.
    fn name(&self) -> &'static str;

    /// Whether this parser consumes text or bytes.
    fn input_mode(&self) -> InputMode;

    /// Applicability score in `[0.0, 1.0]` for producing `requested` from the
    /// entry at `concrete`. `0.0` removes this parser from consideration.
    fn confidence(&self, requested: TypeId, concrete: &Path) -> f32;

    /// Decode the input into the semantic value. `None` on any failure; the
    /// resolution loop then falls through to the next ranked parser.
    fn parse(&self, input: ParserInput<'_>) -> Option<Arc<dyn Any + Send + Sync>>;
}

/// Ordered collection of parsers.
///
/// Registration order is the tie-break: when two parsers score equally for a
/// candidate, the one registered first is tried first.
#[derive(Default, Clone)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn ResourceParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parser. Later registrations rank after earlier ones on ties.
    pub fn register(&mut self, parser: Arc<dyn ResourceParser>) {
        self.parsers.push(parser);
    }

    /// Number of registered parsers.
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Rank parsers for one candidate entry.
    ///
    /// Zero-confidence parsers are dropped; the rest are sorted by descending
    /// score with a stable sort, preserving registration order on ties.
    pub fn rank(
        &self,
        requested: TypeId,
        concrete: &Path,
    ) -> Vec<(Arc<dyn ResourceParser>, f32)> {
        let mut ranked: Vec<(Arc<dyn ResourceParser>, f32)> = self
            .parsers
            .iter()
            .map(|p| (Arc::clone(p), p.confidence(requested, concrete)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}
