use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::traits::{ClipMetrics, PlatformExtractor};
use crate::config::Config;
use crate::db::Platform;
use crate::error::ExtractError;

static VIDEO_PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?tiktok\.com/@([A-Za-z0-9._]+)/video/(\d+)").unwrap()
});

static PHOTO_PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?tiktok\.com/@([A-Za-z0-9._]+)/photo/(\d+)").unwrap()
});

static PATTERNS: std::sync::LazyLock<Vec<Regex>> =
    std::sync::LazyLock::new(|| vec![VIDEO_PATTERN.clone(), PHOTO_PATTERN.clone()]);

pub struct TikTokExtractor;

impl TikTokExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for TikTokExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformExtractor for TikTokExtractor {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn url_patterns(&self) -> &[Regex] {
        &PATTERNS
    }

    async fn extract(
        &self,
        url: &str,
        http: &reqwest::Client,
        config: &Config,
    ) -> Result<ClipMetrics, ExtractError> {
        let (handle, content_id) = parse_content_url(url).ok_or_else(|| {
            ExtractError::Validation(format!("URL must be a TikTok video or photo: {url}"))
        })?;

        let endpoint = format!(
            "{}/api/post/detail?videoId={content_id}",
            config.tiktok_api_base.trim_end_matches('/')
        );

        let response = http
            .get(&endpoint)
            .header("x-rapidapi-key", &config.metrics_api_key)
            .header("x-rapidapi-host", api_host(&config.tiktok_api_base))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Upstream(format!(
                "TikTok provider returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExtractError::Upstream(format!("invalid TikTok response: {e}")))?;

        parse_post_detail(&body, &handle)
    }
}

/// Extract the author handle and content id from a TikTok video/photo URL.
fn parse_content_url(url: &str) -> Option<(String, String)> {
    VIDEO_PATTERN
        .captures(url)
        .or_else(|| PHOTO_PATTERN.captures(url))
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// Parse the provider's post-detail response into normalized metrics.
///
/// A response without `itemInfo.itemStruct` is malformed, not a zero-view
/// clip. The author handle comes from the URL; photo posts carry no play
/// count of their own.
fn parse_post_detail(body: &Value, url_handle: &str) -> Result<ClipMetrics, ExtractError> {
    let item = body.pointer("/itemInfo/itemStruct").ok_or_else(|| {
        ExtractError::Upstream("TikTok response is missing itemInfo.itemStruct".to_string())
    })?;

    let metrics = ClipMetrics {
        views: stat_count(item.pointer("/stats/playCount")),
        likes: stat_count(item.pointer("/stats/diggCount")),
        author_id: item
            .pointer("/author/id")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        author_handle: Some(url_handle.to_string()),
        audio_track_id: item
            .pointer("/music/id")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    };

    debug!(views = metrics.views, likes = metrics.likes, "Parsed TikTok metrics");
    Ok(metrics)
}

/// TikTok stat counters arrive as numbers or decimal strings.
fn stat_count(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn api_host(base: &str) -> String {
    url::Url::parse(base)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_url() {
        assert_eq!(
            parse_content_url("https://www.tiktok.com/@maker.one/video/7301234567890123456"),
            Some(("maker.one".to_string(), "7301234567890123456".to_string()))
        );
        assert_eq!(
            parse_content_url("https://tiktok.com/@maker/photo/7300000000000000001"),
            Some(("maker".to_string(), "7300000000000000001".to_string()))
        );
        assert_eq!(parse_content_url("https://vm.tiktok.com/ZMabc"), None);
        assert_eq!(parse_content_url("https://tiktok.com/@maker"), None);
    }

    #[test]
    fn test_parse_post_detail() {
        let body = serde_json::json!({
            "itemInfo": { "itemStruct": {
                "stats": { "playCount": 40000, "diggCount": "1200" },
                "author": { "id": "6789", "nickname": "Maker" },
                "music": { "id": "music-1" }
            }}
        });

        let metrics = parse_post_detail(&body, "maker").unwrap();
        assert_eq!(metrics.views, 40000);
        assert_eq!(metrics.likes, 1200);
        assert_eq!(metrics.author_id.as_deref(), Some("6789"));
        assert_eq!(metrics.author_handle.as_deref(), Some("maker"));
        assert_eq!(metrics.audio_track_id.as_deref(), Some("music-1"));
    }

    #[test]
    fn test_missing_item_struct_is_upstream_error() {
        let body = serde_json::json!({ "itemInfo": {} });
        assert!(matches!(
            parse_post_detail(&body, "maker"),
            Err(ExtractError::Upstream(_))
        ));
    }
}
