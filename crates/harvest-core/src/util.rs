use chrono::NaiveDateTime;
use url::Url;

/// Context used when a feed URL yields no usable path segment.
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Derive the source context (e.g. the subreddit) from a feed URL.
///
/// `https://www.reddit.com/r/mentalhealth/new/` → `"mentalhealth"`.
/// Other URLs use their first path segment. Characters outside
/// `[A-Za-z0-9_-]` are dropped so the result is safe in file paths.
pub fn source_context(feed_url: &str) -> String {
    let Ok(url) = Url::parse(feed_url) else {
        return UNKNOWN_CONTEXT.to_string();
    };
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let raw = match segments.as_slice() {
        ["r", name, ..] => *name,
        [first, ..] => *first,
        [] => "",
    };

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        UNKNOWN_CONTEXT.to_string()
    } else {
        cleaned
    }
}

/// `{context}_{YYYY-MM-DD_HH-mm-ss}_{count}`, without extension.
pub fn batch_file_stem(context: &str, timestamp: NaiveDateTime, count: usize) -> String {
    format!(
        "{}_{}_{}",
        context,
        timestamp.format("%Y-%m-%d_%H-%M-%S"),
        count
    )
}

/// Destination of a batch file inside the remote store.
pub fn destination_path(context: &str, filename: &str) -> String {
    format!("data/raw/{context}-posts/{filename}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_source_context_from_subreddit() {
        assert_eq!(
            source_context("https://www.reddit.com/r/mentalhealth/"),
            "mentalhealth"
        );
        assert_eq!(
            source_context("https://www.reddit.com/r/depression/new/?sort=new"),
            "depression"
        );
    }

    #[test]
    fn test_source_context_fallbacks() {
        assert_eq!(source_context("https://example.com/feed/top"), "feed");
        assert_eq!(source_context("https://www.reddit.com/"), UNKNOWN_CONTEXT);
        assert_eq!(source_context("not a url"), UNKNOWN_CONTEXT);
        assert_eq!(source_context("https://example.com/~~~/"), UNKNOWN_CONTEXT);
    }

    #[test]
    fn test_filenames_are_deterministic() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 20)
            .unwrap()
            .and_hms_opt(3, 15, 0)
            .unwrap();
        let stem = batch_file_stem("mentalhealth", ts, 42);
        assert_eq!(format!("{stem}.csv"), "mentalhealth_2024-01-20_03-15-00_42.csv");
        assert_eq!(format!("{stem}.json"), "mentalhealth_2024-01-20_03-15-00_42.json");
    }

    #[test]
    fn test_destination_path() {
        assert_eq!(
            destination_path("mentalhealth", "a.csv"),
            "data/raw/mentalhealth-posts/a.csv"
        );
    }
}
