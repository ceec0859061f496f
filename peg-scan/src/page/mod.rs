//! Holdings page fetching.
//!
//! Defines the `PageFetcher` trait and the markup → `RawPage` flattening that
//! the holdings segmenter relies on.

mod http;

pub use http::HttpPageFetcher;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;

/// Subtrees whose text is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// Title and flattened visible text of one fund page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    pub title: String,
    pub body: String,
}

impl RawPage {
    /// Build a page from markup.
    ///
    /// Text nodes are concatenated in document order without any separator,
    /// which is what glues the holdings header into one token.
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);

        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let mut body = String::with_capacity(html.len() / 2);
        collect_visible_text(document.root_element(), &mut body);

        Self { title, body }
    }
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !HIDDEN_ELEMENTS.contains(&child_element.value().name()) {
                collect_visible_text(child_element, out);
            }
        }
    }
}

/// Errors from fetching a fund page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or transport failure
    #[error("network error fetching {address}: {message}")]
    Network { address: String, message: String },

    /// The request did not finish within the configured timeout
    #[error("timed out fetching {address}")]
    Timeout { address: String },

    /// Non-2xx response
    #[error("HTTP {status} fetching {address}")]
    Status { address: String, status: u16 },

    /// Response body could not be read
    #[error("failed to read body of {address}: {message}")]
    Body { address: String, message: String },
}

/// Source of fund pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page and flatten it.
    async fn fetch(&self, address: &str) -> Result<RawPage, FetchError>;
}
