use std::future::Future;

use crate::error::AppError;
use crate::models::{PostRecord, UploadReceipt};
use crate::store::PostStore;

/// A scrollable feed whose rendered state can be captured as HTML.
pub trait FeedSource: Send {
    /// Advance the feed by `pixels`. Sources without a viewport may ignore it.
    fn scroll_by(&mut self, pixels: u32) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Capture the currently rendered page.
    fn snapshot(&mut self) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Turns a page snapshot into post records.
pub trait PageExtractor: Send + Sync {
    /// Harvest every post rendered in `page` whose id is not yet in `store`.
    ///
    /// Each returned record has already been registered in `store`; the
    /// returned order is the page's render order.
    fn harvest(&self, page: &str, store: &mut PostStore) -> Result<Vec<PostRecord>, AppError>;
}

/// Persists a file to a path-addressed content store, creating or
/// overwriting it.
pub trait Uploader: Send + Sync {
    fn upload(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> impl Future<Output = Result<UploadReceipt, AppError>> + Send;
}

/// An Uploader that accepts everything and writes nothing.
#[derive(Debug, Clone)]
pub struct NullUploader;

impl Uploader for NullUploader {
    async fn upload(
        &self,
        path: &str,
        _content: &str,
        _message: &str,
    ) -> Result<UploadReceipt, AppError> {
        Ok(UploadReceipt {
            path: path.to_string(),
            sha: None,
            location: None,
        })
    }
}
