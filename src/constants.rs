//! Shared constants.

/// User agent for outbound metric and redirect requests.
pub const USER_AGENT: &str = "clipledger/0.1";

/// Consecutive extraction failures after which a clip is evicted.
pub const EVICTION_THRESHOLD: i64 = 3;

/// Default spacing between outbound extraction calls, in milliseconds.
pub const DEFAULT_CLIP_DELAY_MS: u64 = 1000;

/// Attempts allowed when expanding a shortened URL.
pub const SHORT_URL_ATTEMPTS: u32 = 2;

/// Maximum redirects followed during short-URL expansion.
pub const REDIRECT_LIMIT: usize = 5;
