use std::collections::HashSet;

use crate::models::PostRecord;

/// Deduplication store for one collection run.
///
/// Keyed by `post_id`; keeps records in the order they were first seen.
/// Only ever grows. A later sighting of a known id is dropped, never merged.
#[derive(Debug, Default)]
pub struct PostStore {
    seen: HashSet<String>,
    records: Vec<PostRecord>,
}

impl PostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.seen.contains(post_id)
    }

    /// Admit a record. Returns `false` (and drops the record) if its id is
    /// already known.
    pub fn register(&mut self, record: PostRecord) -> bool {
        if !self.seen.insert(record.post_id.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in first-seen order.
    pub fn records(&self) -> &[PostRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PostRecord> {
        self.records
    }
}

/// Merge several record sequences with first-seen dedup by `post_id`.
pub fn merge_records<I>(batches: I) -> Vec<PostRecord>
where
    I: IntoIterator<Item = Vec<PostRecord>>,
{
    let mut store = PostStore::new();
    for record in batches.into_iter().flatten() {
        store.register(record);
    }
    store.into_records()
}
