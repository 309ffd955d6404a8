pub mod client;
pub mod error;
pub mod handle;
pub mod image;
pub mod inflight;
pub mod normalize;
pub mod scrape;
pub mod types;

pub use client::ApifyClient;
pub use error::{ImageProxyError, ScrapeError};
pub use handle::{extract_handle, normalize_post_url};
pub use image::{ImageProxy, ProxiedImage};
pub use normalize::{normalize_post, normalize_profile, CountSource};
pub use scrape::{FailureKind, InstagramScraper, ScrapeFailure, ScrapeOutcome, ScrapedRecord};
pub use types::ResultsType;
