mod normalize;
mod registry;
mod traits;

// Platform extractors
mod instagram;
mod tiktok;
mod x;
mod youtube;

pub use normalize::{is_shortened, normalize_url, HttpUrlResolver, UrlResolver};
pub use registry::ExtractorRegistry;
pub use traits::{ClipMetrics, PlatformExtractor};
