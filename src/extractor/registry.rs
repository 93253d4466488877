use super::traits::PlatformExtractor;
use super::{instagram, tiktok, x, youtube};

/// Registry of platform extractors, dispatching by URL pattern.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn PlatformExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// The registry covering every supported platform.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(instagram::InstagramExtractor::new()));
        registry.register(Box::new(tiktok::TikTokExtractor::new()));
        registry.register(Box::new(youtube::YouTubeExtractor::new()));
        registry.register(Box::new(x::XExtractor::new()));
        registry
    }

    /// Register an extractor.
    pub fn register(&mut self, extractor: Box<dyn PlatformExtractor>) {
        self.extractors.push(extractor);
    }

    /// Find the extractor for a URL.
    #[must_use]
    pub fn find(&self, url: &str) -> Option<&dyn PlatformExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_handle(url))
            .map(AsRef::as_ref)
    }

    /// Get all registered extractors.
    #[must_use]
    pub fn extractors(&self) -> &[Box<dyn PlatformExtractor>] {
        &self.extractors
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Platform;

    #[test]
    fn test_builtin_dispatch() {
        let registry = ExtractorRegistry::builtin();

        let cases = [
            ("https://www.instagram.com/reel/Cxyz123", Platform::Instagram),
            ("https://instagram.com/p/Babc_-9", Platform::Instagram),
            (
                "https://www.tiktok.com/@maker/video/7301234567890123456",
                Platform::TikTok,
            ),
            ("https://www.youtube.com/shorts/dQw4w9WgXcQ", Platform::YouTube),
            ("https://x.com/someone/status/1720000000000000000", Platform::X),
            (
                "https://twitter.com/someone/status/1720000000000000000",
                Platform::X,
            ),
        ];

        for (url, expected) in cases {
            let extractor = registry.find(url).unwrap_or_else(|| panic!("no match for {url}"));
            assert_eq!(extractor.platform(), expected, "wrong platform for {url}");
        }
    }

    #[test]
    fn test_youtu_be_dispatches_after_normalization() {
        let registry = ExtractorRegistry::builtin();
        let canonical = crate::extractor::normalize_url("https://youtu.be/dQw4w9WgXcQ");
        let extractor = registry
            .find(&canonical)
            .expect("normalized youtu.be URL should dispatch");
        assert_eq!(extractor.platform(), Platform::YouTube);
    }

    #[test]
    fn test_unknown_url_has_no_extractor() {
        let registry = ExtractorRegistry::builtin();
        assert!(registry.find("https://example.com/watch?v=abc").is_none());
        assert!(registry.find("not a url").is_none());
    }
}
