pub mod collector;
pub mod encode;
pub mod error;
pub mod models;
pub mod params;
pub mod retry;
pub mod store;
pub mod traits;
pub mod util;

#[cfg(test)]
pub(crate) mod testutil;

pub use collector::{Collector, Phase, RunSummary, StopReason};
pub use error::AppError;
pub use models::{NO_FLAIR, NOT_FOUND, PostRecord, UploadReceipt};
pub use params::{CollectionParams, ParamsSource, RawParams};
pub use store::PostStore;
pub use traits::{FeedSource, PageExtractor, Uploader};
