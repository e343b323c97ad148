//! # Static Metadata Source
//!
//! Fallback URIs held in memory.

use crate::ports::outbound::MetadataSource;
use keep_types::TokenId;
use std::collections::HashMap;

/// Fallback metadata from a fixed map, with an optional catch-all base.
#[derive(Clone, Debug, Default)]
pub struct StaticMetadata {
    uris: HashMap<TokenId, String>,
    base: Option<String>,
}

impl StaticMetadata {
    /// Empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that answers `{base}{id}` for every id without an explicit entry.
    #[must_use]
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            uris: HashMap::new(),
            base: Some(base.into()),
        }
    }

    /// Adds an explicit entry.
    #[must_use]
    pub fn with_uri(mut self, id: TokenId, uri: impl Into<String>) -> Self {
        self.uris.insert(id, uri.into());
        self
    }
}

impl MetadataSource for StaticMetadata {
    fn uri(&self, id: TokenId) -> Option<String> {
        self.uris
            .get(&id)
            .cloned()
            .or_else(|| self.base.as_ref().map(|base| format!("{base}{id}")))
    }
}
