use async_trait::async_trait;
use regex::Regex;

use super::traits::{ClipMetrics, PlatformExtractor};
use crate::config::Config;
use crate::db::Platform;
use crate::error::ExtractError;

static STATUS_PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?(?:x\.com|twitter\.com)/([A-Za-z0-9_]+)/status/\d+").unwrap()
});

static PATTERNS: std::sync::LazyLock<Vec<Regex>> =
    std::sync::LazyLock::new(|| vec![STATUS_PATTERN.clone()]);

/// X has no live provider integration; recognized status URLs yield a
/// deterministic zero-valued record carrying the handle from the URL.
pub struct XExtractor;

impl XExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for XExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformExtractor for XExtractor {
    fn platform(&self) -> Platform {
        Platform::X
    }

    fn url_patterns(&self) -> &[Regex] {
        &PATTERNS
    }

    async fn extract(
        &self,
        url: &str,
        _http: &reqwest::Client,
        _config: &Config,
    ) -> Result<ClipMetrics, ExtractError> {
        let handle = STATUS_PATTERN
            .captures(url)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| {
                ExtractError::Validation(format!("URL must be an X status: {url}"))
            })?;

        Ok(ClipMetrics {
            author_handle: Some(handle),
            ..ClipMetrics::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_handle() {
        let extractor = XExtractor::new();

        assert!(extractor.can_handle("https://x.com/someone/status/1720000000000000000"));
        assert!(extractor.can_handle("https://twitter.com/someone/status/172"));

        assert!(!extractor.can_handle("https://x.com/someone"));
        assert!(!extractor.can_handle("https://example.com/a/status/1"));
    }

    #[tokio::test]
    async fn test_stub_carries_url_handle() {
        let extractor = XExtractor::new();
        let http = reqwest::Client::new();
        let config = Config::for_testing();

        let metrics = extractor
            .extract("https://x.com/someone/status/1720000000000000000", &http, &config)
            .await
            .unwrap();
        assert_eq!(metrics.views, 0);
        assert_eq!(metrics.author_handle.as_deref(), Some("someone"));
    }
}
