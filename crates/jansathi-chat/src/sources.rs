//! Citation filtering and collection.
//!
//! `SourceFilter` is policy, not validation: citations whose host is not
//! under an allow-listed official domain suffix are dropped silently.
//! `SourceCollector` keeps the turn's accepted citations unique by URI in
//! first-seen order.

use std::collections::HashSet;

use jansathi_core::Source;
use url::Url;

/// Allow-list filter over citation URIs.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    /// Domain suffixes with leading dots stripped, lowercased.
    allowed_suffixes: Vec<String>,
}

impl SourceFilter {
    /// Build a filter from domain suffixes (e.g. `".gov.in"`).
    pub fn new<S: AsRef<str>>(suffixes: &[S]) -> Self {
        let allowed_suffixes = suffixes
            .iter()
            .map(|s| s.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { allowed_suffixes }
    }

    /// The default official-domain allow-list.
    pub fn official() -> Self {
        Self::new(&[".gov.in", ".nic.in"])
    }

    /// Whether a citation URI should be kept.
    ///
    /// The URI must parse and its host must equal an allowed suffix or end
    /// with `.{suffix}`; a substring check would admit
    /// `gov.in.attacker.example`.
    pub fn accepts(&self, uri: &str) -> bool {
        let Ok(url) = Url::parse(uri) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        self.allowed_suffixes
            .iter()
            .any(|suffix| host == *suffix || host.ends_with(&format!(".{}", suffix)))
    }
}

/// Grow-only citation collection, unique by URI.
#[derive(Debug, Default)]
pub struct SourceCollector {
    sources: Vec<Source>,
    seen_uris: HashSet<String>,
}

impl SourceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a source unless its URI was already collected.
    ///
    /// Returns `true` when the collection changed.
    pub fn insert(&mut self, source: Source) -> bool {
        if self.seen_uris.contains(&source.uri) {
            return false;
        }
        self.seen_uris.insert(source.uri.clone());
        self.sources.push(source);
        true
    }

    /// Collected sources in first-seen order.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
