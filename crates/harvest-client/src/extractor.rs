use harvest_core::error::AppError;
use harvest_core::models::{NO_FLAIR, NOT_FOUND, PostRecord};
use harvest_core::store::PostStore;
use harvest_core::traits::PageExtractor;
use scraper::{ElementRef, Html, Selector};

/// CSS selectors describing where each field lives inside a post element.
///
/// Defaults follow the shreddit markup, where vote and comment counters
/// sit in the post's shadow root and the title/body are slotted light-DOM
/// children.
#[derive(Debug, Clone)]
pub struct ExtractorSelectors {
    pub post: String,
    pub id_attr: String,
    pub title: String,
    pub body: String,
    pub paragraph: String,
    pub score: String,
    pub comments: String,
    /// Attribute on the score/comment indicators holding the raw number.
    pub numeric_attr: String,
    pub flair: String,
}

impl Default for ExtractorSelectors {
    fn default() -> Self {
        Self {
            post: "shreddit-post".into(),
            id_attr: "id".into(),
            title: r#"a[slot="title"]"#.into(),
            body: r#"div[slot="text-body"]"#.into(),
            paragraph: "p".into(),
            score: r#"[data-indicator="score"]"#.into(),
            comments: r#"[data-indicator="comments"]"#.into(),
            numeric_attr: "number".into(),
            flair: "shreddit-post-flair".into(),
        }
    }
}

struct Compiled {
    post: Selector,
    title: Selector,
    body: Selector,
    paragraph: Selector,
    score: Selector,
    comments: Selector,
    flair: Selector,
}

/// HTML post extractor for shreddit-style feeds.
///
/// Works on page snapshots in which each post's shadow root has been
/// serialized as a declarative `<template shadowrootmode>` child. A post
/// whose shadow root is missing has not finished rendering and is skipped
/// so that a later pass can pick it up.
pub struct ShredditExtractor {
    selectors: Compiled,
    id_attr: String,
    numeric_attr: String,
    flair: bool,
    require_shadow_root: bool,
}

impl ShredditExtractor {
    pub fn new() -> Self {
        Self::with_selectors(ExtractorSelectors::default())
            .expect("built-in selectors are valid CSS")
    }

    pub fn with_selectors(selectors: ExtractorSelectors) -> Result<Self, AppError> {
        let compiled = Compiled {
            post: parse(&selectors.post)?,
            title: parse(&selectors.title)?,
            body: parse(&selectors.body)?,
            paragraph: parse(&selectors.paragraph)?,
            score: parse(&selectors.score)?,
            comments: parse(&selectors.comments)?,
            flair: parse(&selectors.flair)?,
        };
        Ok(Self {
            selectors: compiled,
            id_attr: selectors.id_attr,
            numeric_attr: selectors.numeric_attr,
            flair: false,
            require_shadow_root: true,
        })
    }

    /// Also extract post flair (`"No flair"` when the post has none).
    pub fn with_flair(mut self, enabled: bool) -> Self {
        self.flair = enabled;
        self
    }

    /// Accept posts without a serialized shadow root, e.g. plain server
    /// renders that inline their counters.
    pub fn allow_light_dom(mut self) -> Self {
        self.require_shadow_root = false;
        self
    }

    /// Extract one post element and register it in `store`.
    ///
    /// Returns `None` when the element has no id, its id is already known,
    /// or its shadow content is not attached yet. Missing fields become
    /// sentinels; nothing is retried.
    pub fn extract(&self, element: ElementRef<'_>, store: &mut PostStore) -> Option<PostRecord> {
        let id = element.value().attr(&self.id_attr)?.trim();
        if id.is_empty() || store.contains(id) {
            return None;
        }
        if self.require_shadow_root && !has_shadow_root(element) {
            return None;
        }

        let s = &self.selectors;
        let record = PostRecord {
            post_id: id.to_string(),
            title: element
                .select(&s.title)
                .next()
                .map(text_of)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            content: self.content(element),
            score: self.counter(element, &s.score),
            comment_count: self.counter(element, &s.comments),
            flair: self.flair.then(|| {
                element
                    .select(&s.flair)
                    .next()
                    .map(text_of)
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| NO_FLAIR.to_string())
            }),
        };

        store.register(record.clone());
        Some(record)
    }

    fn content(&self, element: ElementRef<'_>) -> String {
        let Some(body) = element.select(&self.selectors.body).next() else {
            return NOT_FOUND.to_string();
        };

        let paragraphs: Vec<String> = body
            .select(&self.selectors.paragraph)
            .map(text_of)
            .collect();

        let joined = if paragraphs.is_empty() {
            text_of(body)
        } else {
            paragraphs.join("\n\n")
        };

        if joined.trim().is_empty() {
            NOT_FOUND.to_string()
        } else {
            joined
        }
    }

    /// Numeric attribute first, displayed text second, sentinel last.
    fn counter(&self, element: ElementRef<'_>, selector: &Selector) -> String {
        let Some(indicator) = element.select(selector).next() else {
            return NOT_FOUND.to_string();
        };

        if let Some(n) = indicator
            .value()
            .attr(&self.numeric_attr)
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            return n.to_string();
        }

        let shown = text_of(indicator);
        if shown.is_empty() {
            NOT_FOUND.to_string()
        } else {
            shown
        }
    }
}

impl Default for ShredditExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageExtractor for ShredditExtractor {
    fn harvest(&self, page: &str, store: &mut PostStore) -> Result<Vec<PostRecord>, AppError> {
        let document = Html::parse_document(page);
        let mut seen = 0usize;
        let mut fresh = Vec::new();

        for element in document.select(&self.selectors.post) {
            seen += 1;
            if let Some(record) = self.extract(element, store) {
                fresh.push(record);
            }
        }

        tracing::debug!(
            rendered = seen,
            fresh = fresh.len(),
            skipped = seen - fresh.len(),
            "Harvested page"
        );
        Ok(fresh)
    }
}

fn parse(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css)
        .map_err(|e| AppError::ConfigError(format!("Invalid selector '{css}': {e}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn has_shadow_root(element: ElementRef<'_>) -> bool {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .any(|child| {
            child.value().name() == "template" && child.value().attr("shadowrootmode").is_some()
        })
}
