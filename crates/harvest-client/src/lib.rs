pub mod config;
pub mod extractor;
pub mod github;
pub mod http;
pub mod local;
pub mod snapshot;

#[cfg(feature = "browser")]
pub mod browser;

pub use config::GitHubConfig;
pub use extractor::{ExtractorSelectors, ShredditExtractor};
pub use github::GitHubUploader;
pub use http::HttpFeed;
pub use local::LocalUploader;
pub use snapshot::SnapshotFeed;

#[cfg(feature = "browser")]
pub use browser::BrowserFeed;
