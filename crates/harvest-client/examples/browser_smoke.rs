/// Smoke-test for `BrowserFeed`.
///
/// Launches a headless Chromium, opens a subreddit feed, scrolls twice and
/// prints how many posts the extractor picked up.
///
/// Run with:
///   cargo run --example browser_smoke --features browser -- https://www.reddit.com/r/mentalhealth/
use harvest_client::{BrowserFeed, ShredditExtractor};
use harvest_core::PostStore;
use harvest_core::traits::{FeedSource, PageExtractor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://www.reddit.com/r/mentalhealth/".to_string());

    println!("Opening {url} …");
    let mut feed = BrowserFeed::open(&url).await?;
    let extractor = ShredditExtractor::new().with_flair(true);
    let mut store = PostStore::new();

    for pass in 1..=3 {
        if pass > 1 {
            feed.scroll_by(2000).await?;
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        }
        let html = feed.snapshot().await?;
        let fresh = extractor.harvest(&html, &mut store)?;
        println!("pass {pass}: {} bytes, {} new posts", html.len(), fresh.len());
    }

    assert!(!store.is_empty(), "No posts extracted from {url}");
    for record in store.records().iter().take(5) {
        println!("  {} | {} | votes {}", record.post_id, record.title, record.score);
    }
    Ok(())
}
