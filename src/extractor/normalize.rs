use async_trait::async_trait;
use url::Url;

use crate::constants::{REDIRECT_LIMIT, SHORT_URL_ATTEMPTS, USER_AGENT};
use crate::error::ExtractError;

/// Tracking parameters to strip from clip URLs.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "igshid",
    "igsh",
    "is_from_webapp",
    "is_copy_url",
    "sender_device",
    "share",
    "s",
    "si",
    "t",
    "feature",
];

/// Hosts that are redirect shorteners and need network expansion.
const SHORTENER_HOSTS: &[&str] = &["vm.tiktok.com", "vt.tiktok.com"];

/// Normalize a URL by applying common transformations.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return url.to_string(),
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return url.to_string();
    }

    let mut normalized = parsed.clone();

    // Force HTTPS
    if normalized.scheme() == "http" {
        let _ = normalized.set_scheme("https");
    }

    // Lowercase the host
    if let Some(host) = normalized.host_str() {
        let lower_host = host.to_lowercase();
        if host != lower_host {
            let _ = normalized.set_host(Some(&lower_host));
        }
    }

    // youtu.be/<id> is shorthand for youtube.com/watch?v=<id>; unlike the
    // TikTok shorteners it needs no redirect round trip.
    if normalized.host_str() == Some("youtu.be") {
        let id = normalized.path().trim_matches('/').to_string();
        if !id.is_empty() && !id.contains('/') {
            let _ = normalized.set_host(Some("www.youtube.com"));
            normalized.set_path("/watch");
            normalized.set_query(Some(&format!("v={id}")));
        }
    }

    // Remove tracking parameters
    let filtered_params: Vec<(String, String)> = normalized
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if filtered_params.is_empty() {
        normalized.set_query(None);
    } else {
        let new_query: String = filtered_params
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        normalized.set_query(Some(&new_query));
    }

    // Remove fragment
    normalized.set_fragment(None);

    // Normalize trailing slash for paths
    let path = normalized.path().to_string();
    if path.ends_with('/') && path.len() > 1 {
        normalized.set_path(path.trim_end_matches('/'));
    }

    normalized.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    let lower = key.to_lowercase();
    TRACKING_PARAMS.contains(&lower.as_str()) || lower.starts_with("utm_")
}

/// Check whether a URL points at a known redirect shortener.
#[must_use]
pub fn is_shortened(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| SHORTENER_HOSTS.contains(&h)))
        .unwrap_or(false)
}

/// Expands shortened clip URLs to their canonical form.
///
/// Injected into the reconciler so tests can run the full loop without
/// real network latency.
#[async_trait]
pub trait UrlResolver: Send + Sync {
    /// Resolve a raw clip URL to its canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Upstream`] if redirect resolution fails; the
    /// caller treats this as an extraction failure for the clip.
    async fn resolve(&self, url: &str) -> Result<String, ExtractError>;
}

/// Resolver that performs a single HTTP redirect resolution for shortener
/// hosts and passes all other URLs through unchanged.
pub struct HttpUrlResolver {
    client: reqwest::Client,
}

impl HttpUrlResolver {
    /// Build a resolver with a bounded-redirect HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: std::time::Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(REDIRECT_LIMIT))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlResolver for HttpUrlResolver {
    async fn resolve(&self, url: &str) -> Result<String, ExtractError> {
        if !is_shortened(url) {
            return Ok(url.to_string());
        }

        let mut last_err = None;
        for _ in 0..SHORT_URL_ATTEMPTS {
            match self.client.get(url).send().await {
                Ok(response) => return Ok(response.url().to_string()),
                Err(e) => last_err = Some(e),
            }
        }

        Err(ExtractError::Upstream(format!(
            "failed to expand shortened URL {url}: {}",
            last_err.map_or_else(|| "unknown error".to_string(), |e| e.to_string())
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_https() {
        assert_eq!(
            normalize_url("http://instagram.com/reel/abc"),
            "https://instagram.com/reel/abc"
        );
    }

    #[test]
    fn test_lowercase_host() {
        assert_eq!(
            normalize_url("https://WWW.TikTok.com/@user/video/123"),
            "https://www.tiktok.com/@user/video/123"
        );
    }

    #[test]
    fn test_remove_tracking_params() {
        assert_eq!(
            normalize_url("https://www.tiktok.com/@user/video/123?is_copy_url=1&lang=en"),
            "https://www.tiktok.com/@user/video/123?lang=en"
        );
    }

    #[test]
    fn test_remove_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://instagram.com/p/abc/#comments"),
            "https://instagram.com/p/abc"
        );
    }

    #[test]
    fn test_youtu_be_rewritten_to_watch_url() {
        assert_eq!(
            normalize_url("https://youtu.be/dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        // Share-link tracking params are discarded along the way.
        assert_eq!(
            normalize_url("http://youtu.be/dQw4w9WgXcQ?si=AbC123"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        // No video id; nothing to rewrite.
        assert_eq!(normalize_url("https://youtu.be/"), "https://youtu.be/");
    }

    #[test]
    fn test_preserve_watch_param() {
        assert_eq!(
            normalize_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_invalid_url_passthrough() {
        assert_eq!(normalize_url("not a url"), "not a url");
    }

    #[test]
    fn test_is_shortened() {
        assert!(is_shortened("https://vm.tiktok.com/ZMabc123/"));
        assert!(is_shortened("https://vt.tiktok.com/ZSxyz/"));
        assert!(!is_shortened("https://www.tiktok.com/@user/video/123"));
        assert!(!is_shortened("not a url"));
    }
}
