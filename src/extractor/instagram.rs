use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::traits::{ClipMetrics, PlatformExtractor};
use crate::config::Config;
use crate::db::Platform;
use crate::error::ExtractError;

static PATTERNS: std::sync::LazyLock<Vec<Regex>> = std::sync::LazyLock::new(|| {
    vec![
        Regex::new(r"^https?://(www\.)?instagram\.com/reels?/[A-Za-z0-9_-]+").unwrap(),
        Regex::new(r"^https?://(www\.)?instagram\.com/p/[A-Za-z0-9_-]+").unwrap(),
    ]
});

pub struct InstagramExtractor;

impl InstagramExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for InstagramExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformExtractor for InstagramExtractor {
    fn platform(&self) -> Platform {
        Platform::Instagram
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
        if !self.can_handle(url) {
            return Err(ExtractError::Validation(format!(
                "URL must be an Instagram reel or post: {url}"
            )));
        }

        let endpoint = format!(
            "{}/v1/media_info?code_or_id_or_url={}",
            config.instagram_api_base.trim_end_matches('/'),
            urlencoding::encode(url)
        );

        let response = http
            .get(&endpoint)
            .header("x-rapidapi-key", &config.metrics_api_key)
            .header("x-rapidapi-host", api_host(&config.instagram_api_base))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Upstream(format!(
                "Instagram provider returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExtractError::Upstream(format!("invalid Instagram response: {e}")))?;

        parse_media_info(&body)
    }
}

/// Parse the provider's media-info response into normalized metrics.
///
/// A response without `data.items[0]` is malformed, not a zero-view clip.
fn parse_media_info(body: &Value) -> Result<ClipMetrics, ExtractError> {
    let item = body
        .pointer("/data/items/0")
        .ok_or_else(|| {
            ExtractError::Upstream("Instagram response is missing data.items[0]".to_string())
        })?;

    let views = item
        .get("play_count")
        .and_then(Value::as_i64)
        .or_else(|| item.get("video_view_count").and_then(Value::as_i64))
        .unwrap_or(0);
    let likes = item.get("like_count").and_then(Value::as_i64).unwrap_or(0);

    let audio_track_id = item
        .pointer("/clips_metadata/music_info/music_asset_info/audio_cluster_id")
        .and_then(json_id);

    let metrics = ClipMetrics {
        views,
        likes,
        author_id: item.pointer("/owner/id").and_then(json_id),
        author_handle: item
            .pointer("/owner/username")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        audio_track_id,
    };

    debug!(views = metrics.views, likes = metrics.likes, "Parsed Instagram metrics");
    Ok(metrics)
}

/// Provider identifiers arrive as either JSON strings or numbers.
fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn api_host(base: &str) -> String {
    url::Url::parse(base)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_default()
}
