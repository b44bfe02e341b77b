//! Format handlers and the typed resolution loop.
//!
//! A [`ResourceParser`] turns raw text or bytes into one semantic type and
//! scores its own applicability for each concrete entry. The
//! [`ParserRegistry`] keeps parsers in registration order and ranks them per
//! candidate; [`resolve_with_parsers`] walks candidates and ranked parsers
//! until one produces a value.
//!
//! Built-in parsers cover text, JSON, raw bytes and images; games register
//! their own for proprietary formats.

pub mod builtin;
mod registry;
mod resolve;

pub use builtin::{BytesParser, ImageParser, JsonParser, TextParser};
pub use registry::{InputMode, ParserInput, ParserRegistry, ResourceParser};
pub use resolve::{resolve_with_parsers, resolve_with_parsers_async, Resolution};

/// Registry preloaded with the built-in parsers.
///
/// Registration order is text, JSON, bytes, image; game parsers registered
/// afterwards rank behind these on equal confidence.
pub fn builtin_registry() -> ParserRegistry {
    use std::sync::Arc;

    let mut registry = ParserRegistry::new();
    registry.register(Arc::new(TextParser));
    registry.register(Arc::new(JsonParser));
    registry.register(Arc::new(BytesParser));
    registry.register(Arc::new(ImageParser));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_four_parsers() {
        assert_eq!(builtin_registry().len(), 4);
    }
}
