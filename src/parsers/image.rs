use once_cell::sync::Lazy;
use scraper::Selector;
use serde_json::Value;
use tracing::debug;

use super::{is_product, looks_like_logo, resolve_url, structured_objects, Page};

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("Invalid img selector"));

/// Social meta keys in lookup order.
pub const SOCIAL_IMAGE_KEYS: &[(&str, &str)] = &[
    ("property", "og:image"),
    ("name", "og:image"),
    ("property", "twitter:image"),
    ("name", "twitter:image"),
];

/// Class/id fragments that mark a product image.
const PRODUCT_IMAGE_HINTS: &[&str] = &["product", "main", "detail", "primary", "gallery"];

const IMAGE_SOURCE_ATTRS: &[&str] = &["src", "data-src", "data-original"];

/// Vendor-agnostic product image: social meta tags, then structured data,
/// then product-looking `<img>` elements. Logos are skipped throughout.
pub fn extract_image(page: &Page, base_url: &str) -> Option<String> {
    let strategies: [(&str, fn(&Page, &str) -> Option<String>); 3] = [
        ("social meta", |page, base| {
            social_meta_image(page, base, |url| !looks_like_logo(url))
        }),
        ("structured data", structured_data_image),
        ("image heuristic", heuristic_image),
    ];

    for (label, strategy) in strategies {
        if let Some(url) = strategy(page, base_url) {
            debug!("Generic image found via {}: {}", label, url);
            return Some(url);
        }
    }
    None
}

/// First social meta image, resolved against `base_url`, that `accept` allows.
pub fn social_meta_image(
    page: &Page,
    base_url: &str,
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    SOCIAL_IMAGE_KEYS.iter().find_map(|(attr, key)| {
        page.meta_content(attr, key)
            .and_then(|content| resolve_url(Some(content), base_url))
            .filter(|url| accept(url))
    })
}

fn structured_data_image(page: &Page, base_url: &str) -> Option<String> {
    structured_objects(page)
        .iter()
        .filter(|obj| is_product(obj))
        .flat_map(|obj| image_values(obj.get("image")))
        .filter_map(|candidate| resolve_url(Some(candidate.as_str()), base_url))
        .find(|url| !looks_like_logo(url))
}

/// `image` may be a string, a list of strings, or an object with `url`/`@id`.
fn image_values(image: Option<&Value>) -> Vec<String> {
    match image {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::Object(obj)) => obj
            .get("url")
            .or_else(|| obj.get("@id"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// `<img>` whose class or id hints at a product shot.
pub fn heuristic_image(page: &Page, base_url: &str) -> Option<String> {
    for img in page.document().select(&IMG_SELECTOR) {
        let element = img.value();
        let Some(src) = IMAGE_SOURCE_ATTRS
            .iter()
            .filter_map(|attr| element.attr(attr))
            .map(str::trim)
            .find(|src| !src.is_empty())
        else {
            continue;
        };
        if src.starts_with("data:") {
            continue;
        }

        let class = element.classes().collect::<Vec<_>>().join(" ");
        let hints = format!("{} {}", class, element.id().unwrap_or("")).to_lowercase();
        if !PRODUCT_IMAGE_HINTS.iter().any(|hint| hints.contains(hint)) {
            continue;
        }

        if let Some(url) = resolve_url(Some(src), base_url) {
            if !looks_like_logo(&url) {
                return Some(url);
            }
        }
    }
    None
}
