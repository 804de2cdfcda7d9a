use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use harvest_core::error::AppError;
use harvest_core::traits::FeedSource;

/// Serializes the page with every post's shadow root inlined as a
/// declarative `<template shadowrootmode>` child.
const SNAPSHOT_SCRIPT: &str = r#"(() => {
  const roots = Array.from(document.querySelectorAll('shreddit-post'))
    .map((post) => post.shadowRoot)
    .filter(Boolean);
  return document.documentElement.getHTML({ serializableShadowRoots: true, shadowRoots: roots });
})()"#;

/// Live feed driven through a headless Chromium tab (Chrome DevTools Protocol).
///
/// Unlike [`super::HttpFeed`], this executes the feed's JavaScript, so
/// scrolling loads more posts and shadow-DOM content is rendered before
/// each snapshot.
///
/// # Example
///
/// ```rust,no_run
/// use harvest_client::BrowserFeed;
/// use harvest_core::traits::FeedSource;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut feed = BrowserFeed::open("https://www.reddit.com/r/mentalhealth/").await?;
/// feed.scroll_by(2000).await?;
/// let html = feed.snapshot().await?;
/// println!("{}", html.chars().take(200).collect::<String>());
/// # Ok(())
/// # }
/// ```
pub struct BrowserFeed {
    // Keeps the Chromium process alive for as long as the tab is in use.
    _browser: Arc<Browser>,
    page: Page,
    timeout: Duration,
}

impl BrowserFeed {
    /// Launches headless Chromium and opens `url` with a **30 s** timeout.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$PATH` (or the
    /// default locations checked by `chromiumoxide`).
    pub async fn open(url: &str) -> Result<Self, AppError> {
        Self::open_with_timeout(url, Duration::from_secs(30)).await
    }

    pub async fn open_with_timeout(url: &str, timeout: Duration) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder();
        builder = builder.no_sandbox().disable_default_args();

        // Snap-packaged Chromium wraps the real binary and drops unknown
        // flags such as --headless, so look for the real one first.
        if let Some(bin) = Self::find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .window_size(1280, 2000)
            .build()
            .map_err(|e| AppError::Generic(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::Generic(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        let page = tokio::time::timeout(timeout, async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| AppError::HttpError(format!("Failed to navigate to {url}: {e}")))?;
            page.find_element("body")
                .await
                .map_err(|e| AppError::HttpError(format!("Page did not render body: {e}")))?;
            Ok::<Page, AppError>(page)
        })
        .await
        .map_err(|_| AppError::Timeout(timeout.as_secs()))??;

        tracing::info!(%url, "Feed opened in headless browser");
        Ok(Self {
            _browser: Arc::new(browser),
            page,
            timeout,
        })
    }

    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// `CHROME_BIN` wins if it points at an existing file; then the snap's
    /// inner binary and well-known system paths. `None` lets `chromiumoxide`
    /// do its own lookup.
    fn find_chrome_binary() -> Option<PathBuf> {
        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(&p);
            if path.exists() {
                return Some(path);
            }
        }

        [
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, AppError> {
        let result = tokio::time::timeout(self.timeout, self.page.evaluate(script))
            .await
            .map_err(|_| AppError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| AppError::HttpError(format!("Script evaluation failed: {e}")))?;
        Ok(result.into_value::<T>()?)
    }
}

impl FeedSource for BrowserFeed {
    async fn scroll_by(&mut self, pixels: u32) -> Result<(), AppError> {
        let script = format!("(() => {{ window.scrollBy(0, {pixels}); return window.scrollY; }})()");
        let y: f64 = self.evaluate(&script).await?;
        tracing::trace!(scroll_y = y, "Scrolled feed");
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String, AppError> {
        self.evaluate(SNAPSHOT_SCRIPT).await
    }
}
