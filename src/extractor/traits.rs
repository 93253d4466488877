use async_trait::async_trait;
use regex::Regex;

use crate::config::Config;
use crate::db::Platform;
use crate::error::ExtractError;

/// Normalized engagement metrics for a clip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipMetrics {
    pub views: i64,
    pub likes: i64,
    pub author_id: Option<String>,
    pub author_handle: Option<String>,
    pub audio_track_id: Option<String>,
}

/// Trait for platform-specific metric extractors.
///
/// Selection is purely a function of the canonical URL's host and path; no
/// two extractors interact.
#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    /// The platform this extractor serves.
    fn platform(&self) -> Platform;

    /// URL patterns this extractor matches.
    fn url_patterns(&self) -> &[Regex];

    /// Check if this extractor can handle the given URL.
    fn can_handle(&self, url: &str) -> bool {
        self.url_patterns().iter().any(|p| p.is_match(url))
    }

    /// Fetch current engagement metrics for the URL.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Validation`] when the URL does not match any
    /// recognized pattern for this platform, and [`ExtractError::Upstream`]
    /// on network failures or unexpected provider responses.
    async fn extract(
        &self,
        url: &str,
        http: &reqwest::Client,
        config: &Config,
    ) -> Result<ClipMetrics, ExtractError>;
}
