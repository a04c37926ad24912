pub mod image;
pub mod label;
pub mod price;
pub mod structured;
pub mod text;
pub mod urls;

pub use image::*;
pub use label::*;
pub use price::*;
pub use structured::*;
pub use text::*;
pub use urls::*;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Invalid title selector"));
static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta").expect("Invalid meta selector"));

/// Collapse whitespace runs to single spaces and trim. No entity or quote
/// rewriting; that happens once, on output.
pub fn clean_text(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// A fetched product page: source URL, raw markup and the parsed tree.
pub struct Page {
    url: String,
    raw: String,
    document: Html,
    text: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let raw = html.into();
        let document = Html::parse_document(&raw);
        let text = document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            url: url.into(),
            raw,
            document,
            text,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The markup exactly as fetched.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Every text node of the page, trimmed and space-joined.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `<title>` text, else the `og:title` meta content. Every title reader
    /// gets the fallback, including the Mini-Circuits `| MODEL` suffix.
    pub fn title(&self) -> Option<String> {
        self.document
            .select(&TITLE_SELECTOR)
            .next()
            .and_then(|title| clean_text(&title.text().collect::<String>()))
            .or_else(|| {
                self.meta_content("property", "og:title")
                    .and_then(clean_text)
            })
    }

    /// Content of the first `<meta {attr}="{key}">` that carries any.
    pub fn meta_content(&self, attr: &str, key: &str) -> Option<&str> {
        self.document
            .select(&META_SELECTOR)
            .filter(|meta| meta.value().attr(attr) == Some(key))
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_and_trims() {
        assert_eq!(
            clean_text("  Thorlabs \n\t - AC127  ").as_deref(),
            Some("Thorlabs - AC127")
        );
        assert_eq!(clean_text(" \n "), None);
    }

    #[test]
    fn page_text_skips_blank_nodes() {
        let page = Page::new(
            "https://example.com/",
            "<html><body><p> Price </p>\n<span>$12</span></body></html>",
        );
        assert_eq!(page.text(), "Price $12");
    }

    #[test]
    fn title_falls_back_to_og_title() {
        let page = Page::new(
            "https://example.com/",
            r#"<html><head><meta property="og:title" content=" Widget  Pro "></head></html>"#,
        );
        assert_eq!(page.title().as_deref(), Some("Widget Pro"));
    }

    #[test]
    fn meta_content_requires_exact_attribute() {
        let page = Page::new(
            "https://example.com/",
            r#"<html><head>
                <meta name="og:image" content="/a.jpg">
                <meta property="og:image" content="">
                <meta property="og:image" content="/b.jpg">
            </head></html>"#,
        );
        assert_eq!(page.meta_content("property", "og:image"), Some("/b.jpg"));
        assert_eq!(page.meta_content("name", "og:image"), Some("/a.jpg"));
        assert_eq!(page.meta_content("name", "twitter:image"), None);
    }
}
