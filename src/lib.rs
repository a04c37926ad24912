//! Product record extraction from vendor product pages.
//!
//! A fetched page goes through [`scrapers::extract`], which picks the first
//! vendor parser whose URL predicate matches and otherwise falls back to a
//! generic image lookup. Every extractor is a pure function of the page.

pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod scrapers;
pub mod utils;

use tracing::info;

use crate::error::AnalyzeError;
use crate::models::{ErrorPayload, ProductRecord};
use crate::parsers::Page;
use crate::utils::http::PageFetcher;

/// Fetch `url` and extract its product record.
pub async fn analyze<F>(fetcher: &F, url: &str) -> Result<ProductRecord, AnalyzeError>
where
    F: PageFetcher + ?Sized,
{
    let html = fetcher.fetch(url).await?;
    info!("Fetched {} bytes from {}", html.len(), url);
    extract_from_html(url, html)
}

/// Run the extraction engine over already-fetched markup.
pub fn extract_from_html(url: &str, html: String) -> Result<ProductRecord, AnalyzeError> {
    let page = Page::new(url, html);
    scrapers::extract(&page).map(scrapers::Extraction::into_record)
}

/// The single JSON line printed for an outcome.
pub fn render_json(outcome: &Result<ProductRecord, AnalyzeError>) -> String {
    let rendered = match outcome {
        Ok(record) => serde_json::to_string(record),
        Err(e) => serde_json::to_string(&ErrorPayload::new(e.to_string())),
    };
    rendered.unwrap_or_else(|e| format!(r#"{{"error": "could not encode result: {}"}}"#, e))
}
