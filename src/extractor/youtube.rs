use async_trait::async_trait;
use regex::Regex;

use super::traits::{ClipMetrics, PlatformExtractor};
use crate::config::Config;
use crate::db::Platform;
use crate::error::ExtractError;

static PATTERNS: std::sync::LazyLock<Vec<Regex>> = std::sync::LazyLock::new(|| {
    vec![
        Regex::new(r"^https?://(www\.)?youtube\.com/shorts/[A-Za-z0-9_-]+").unwrap(),
        Regex::new(r"^https?://(www\.)?youtube\.com/watch\?v=[A-Za-z0-9_-]+").unwrap(),
    ]
});

/// YouTube has no live provider integration; recognized URLs yield a
/// deterministic zero-valued record without any network call.
pub struct YouTubeExtractor;

impl YouTubeExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for YouTubeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformExtractor for YouTubeExtractor {
    fn platform(&self) -> Platform {
        Platform::YouTube
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
        if !self.can_handle(url) {
            return Err(ExtractError::Validation(format!(
                "URL must be a YouTube video or short: {url}"
            )));
        }

        Ok(ClipMetrics::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_handle() {
        let extractor = YouTubeExtractor::new();

        assert!(extractor.can_handle("https://www.youtube.com/shorts/dQw4w9WgXcQ"));
        assert!(extractor.can_handle("https://youtube.com/watch?v=dQw4w9WgXcQ"));

        assert!(!extractor.can_handle("https://youtube.com/@channel"));
        // youtu.be links arrive already rewritten by normalize_url.
        assert!(!extractor.can_handle("https://youtu.be/dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_stub_returns_zeroes() {
        let extractor = YouTubeExtractor::new();
        let http = reqwest::Client::new();
        let config = Config::for_testing();

        let metrics = extractor
            .extract("https://www.youtube.com/shorts/dQw4w9WgXcQ", &http, &config)
            .await
            .unwrap();
        assert_eq!(metrics, ClipMetrics::default());
    }

    #[tokio::test]
    async fn test_unrecognized_url_is_validation_error() {
        let extractor = YouTubeExtractor::new();
        let http = reqwest::Client::new();
        let config = Config::for_testing();

        let err = extractor
            .extract("https://youtube.com/@channel", &http, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Validation(_)));
    }
}
