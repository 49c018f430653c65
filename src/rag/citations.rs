//! Mapping provider-claimed sources back onto the retrieval set

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::models::Citation;
use crate::models::DocumentRef;
use crate::models::SearchResult;

/// Maximum excerpt length in characters, before the ellipsis
pub const EXCERPT_MAX_CHARS: usize = 200;

/// Number of top results cited when the provider cites nothing usable
pub const FALLBACK_CITATIONS: usize = 5;

/// Resolves the user-facing URL of a source document
pub trait SourceUrlResolver: Send + Sync {
    fn resolve(&self, document: &DocumentRef) -> Option<String>;
}

/// Links Drive-backed files to their viewer page, otherwise uses the
/// document's own source URL.
#[derive(Debug, Clone, Default)]
pub struct DriveUrlResolver;

impl SourceUrlResolver for DriveUrlResolver {
    fn resolve(&self, document: &DocumentRef) -> Option<String> {
        document
            .drive_file_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| format!("https://drive.google.com/file/d/{id}/view"))
            .or_else(|| document.source_url.clone())
    }
}

/// Safely truncate a string at character boundary (not byte boundary)
///
/// Returns the string with a "..." suffix if it was truncated.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Builds caller-facing citations
#[derive(Clone)]
pub struct CitationResolver {
    url_resolver: Arc<dyn SourceUrlResolver>,
}

impl Default for CitationResolver {
    fn default() -> Self {
        Self::new(Arc::new(DriveUrlResolver))
    }
}

impl CitationResolver {
    pub fn new(url_resolver: Arc<dyn SourceUrlResolver>) -> Self {
        Self { url_resolver }
    }

    /// Citations for the indices the provider claims it used.
    ///
    /// Out-of-range and repeated indices are dropped; order follows
    /// `sources_used`. If nothing valid remains and `results` is non-empty,
    /// the top results by similarity are cited instead.
    #[must_use]
    pub fn resolve(&self, results: &[SearchResult], sources_used: &[usize]) -> Vec<Citation> {
        let mut seen = HashSet::new();
        let valid: Vec<usize> = sources_used
            .iter()
            .copied()
            .filter(|&idx| idx < results.len() && seen.insert(idx))
            .collect();

        if valid.len() < sources_used.len() {
            debug!(
                "Dropped {} invalid or repeated source indices",
                sources_used.len() - valid.len()
            );
        }

        let indices = if valid.is_empty() {
            fallback_indices(results)
        } else {
            valid
        };

        indices
            .into_iter()
            .map(|idx| self.cite(idx, &results[idx]))
            .collect()
    }

    /// User-facing link for a retrieved document
    #[must_use]
    pub fn source_url(&self, document: &DocumentRef) -> Option<String> {
        self.url_resolver.resolve(document)
    }

    /// Build the citation for one retrieved chunk
    #[must_use]
    pub fn cite(&self, source_index: usize, result: &SearchResult) -> Citation {
        Citation {
            source_index,
            file_name: result.document.file_name.clone(),
            section_title: result.chunk.section_title.clone(),
            source_url: self.source_url(&result.document),
            excerpt: truncate_str(result.chunk.content.trim(), EXCERPT_MAX_CHARS),
            similarity: result.similarity,
            truth_priority: result.chunk.truth_priority,
        }
    }
}

fn fallback_indices(results: &[SearchResult]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..results.len()).collect();
    indices.sort_by(|&a, &b| results[b].similarity.total_cmp(&results[a].similarity));
    indices.truncate(FALLBACK_CITATIONS);
    indices
}
