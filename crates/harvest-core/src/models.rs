use serde::{Deserialize, Serialize};

/// Placeholder for any field whose markup was absent from the post element.
pub const NOT_FOUND: &str = "Not found";

/// Placeholder for a post that supports flair but has none set.
///
/// Distinct from [`NOT_FOUND`]: the flair component exists, it is just empty.
pub const NO_FLAIR: &str = "No flair";

/// One harvested post.
///
/// Fields are kept as text because the feed may render non-numeric
/// placeholders (e.g. "Vote") in place of counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Identifier assigned by the source feed (e.g. `t3_1abcde`).
    #[serde(rename = "postId")]
    pub post_id: String,
    pub title: String,
    pub content: String,
    pub score: String,
    #[serde(rename = "comments")]
    pub comment_count: String,
    /// `None` when the extractor does not look for flair at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flair: Option<String>,
}

impl PostRecord {
    /// A record with every field set to its sentinel.
    pub fn bare(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            title: NOT_FOUND.to_string(),
            content: NOT_FOUND.to_string(),
            score: NOT_FOUND.to_string(),
            comment_count: NOT_FOUND.to_string(),
            flair: None,
        }
    }
}

/// Confirmation returned by an [`Uploader`](crate::traits::Uploader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    /// Destination path inside the store.
    pub path: String,
    /// Content sha reported by the store, if it has one.
    pub sha: Option<String>,
    /// Browsable location of the written file, if the store exposes one.
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_record_uses_not_found_everywhere() {
        let r = PostRecord::bare("t3_abc");
        assert_eq!(r.post_id, "t3_abc");
        assert_eq!(r.title, NOT_FOUND);
        assert_eq!(r.content, NOT_FOUND);
        assert_eq!(r.score, NOT_FOUND);
        assert_eq!(r.comment_count, NOT_FOUND);
        assert!(r.flair.is_none());
    }

    #[test]
    fn json_keys_match_export_format() {
        let mut r = PostRecord::bare("t3_abc");
        r.score = "12".into();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["postId"], "t3_abc");
        assert_eq!(v["score"], "12");
        assert_eq!(v["comments"], NOT_FOUND);
        assert!(v.get("flair").is_none());

        r.flair = Some(NO_FLAIR.into());
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["flair"], NO_FLAIR);
    }
}
