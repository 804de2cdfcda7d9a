//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, so a clone kept
//! by the test can assert on what the collector did with the original.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{PostRecord, UploadReceipt};
use crate::store::PostStore;
use crate::traits::{FeedSource, PageExtractor, Uploader};

// ---------------------------------------------------------------------------
// MockFeed
// ---------------------------------------------------------------------------

/// Feed that replays a fixed list of pages.
///
/// Each scroll moves to the next page; once the list is exhausted the last
/// page keeps being returned. A snapshot before any scroll returns the
/// first page.
#[derive(Clone)]
pub struct MockFeed {
    pages: Arc<Mutex<Vec<Result<String, AppError>>>>,
    position: Arc<Mutex<usize>>,
    pub scrolls: Arc<Mutex<Vec<u32>>>,
}

impl MockFeed {
    /// Build from page texts. See [`MockExtractor`] for the line format.
    pub fn new(pages: &[&str]) -> Self {
        Self::with_pages(pages.iter().map(|p| Ok(p.to_string())).collect())
    }

    pub fn with_pages(pages: Vec<Result<String, AppError>>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages)),
            position: Arc::new(Mutex::new(0)),
            scrolls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls.lock().unwrap().len()
    }
}

impl FeedSource for MockFeed {
    async fn scroll_by(&mut self, pixels: u32) -> Result<(), AppError> {
        self.scrolls.lock().unwrap().push(pixels);
        *self.position.lock().unwrap() += 1;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String, AppError> {
        let mut pages = self.pages.lock().unwrap();
        if pages.is_empty() {
            return Ok(String::new());
        }
        let scrolled = *self.position.lock().unwrap();
        let idx = scrolled.saturating_sub(1).min(pages.len() - 1);
        match &pages[idx] {
            Ok(page) => Ok(page.clone()),
            // Errors are one-shot: replace with an empty page after firing.
            Err(_) => std::mem::replace(&mut pages[idx], Ok(String::new())),
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Extractor over a line-based page format.
///
/// Each non-empty line is one post: `id` or `id|title`. A line reading
/// `!fail` makes the whole harvest fail.
#[derive(Clone, Default)]
pub struct MockExtractor;

impl PageExtractor for MockExtractor {
    fn harvest(&self, page: &str, store: &mut PostStore) -> Result<Vec<PostRecord>, AppError> {
        let mut fresh = Vec::new();
        for line in page.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line == "!fail" {
                return Err(AppError::ExtractionError("mock extraction failure".into()));
            }
            let (id, title) = line.split_once('|').unwrap_or((line, ""));
            if store.contains(id) {
                continue;
            }
            let mut record = PostRecord::bare(id);
            if !title.is_empty() {
                record.title = title.to_string();
            }
            store.register(record.clone());
            fresh.push(record);
        }
        Ok(fresh)
    }
}

// ---------------------------------------------------------------------------
// MockUploader
// ---------------------------------------------------------------------------

/// One recorded upload: (path, content, message).
pub type UploadCall = (String, String, String);

/// Uploader that records every call and pops scripted results.
///
/// When the script is empty, uploads succeed.
#[derive(Clone, Default)]
pub struct MockUploader {
    results: Arc<Mutex<Vec<Result<(), AppError>>>>,
    pub uploads: Arc<Mutex<Vec<UploadCall>>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<Result<(), AppError>>) -> Self {
        Self {
            results: Arc::new(Mutex::new(results)),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of upload attempts, failed ones included.
    pub fn calls(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _, _)| p.clone())
            .collect()
    }
}

impl Uploader for MockUploader {
    async fn upload(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<UploadReceipt, AppError> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), content.to_string(), message.to_string()));

        let next = {
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Ok(())
            } else {
                results.remove(0)
            }
        };

        next.map(|()| UploadReceipt {
            path: path.to_string(),
            sha: Some(format!("sha-{}", self.calls())),
            location: None,
        })
    }
}
