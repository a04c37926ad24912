use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::{structured_objects, value_as_text, Page};

/// Free-text price patterns, tried in order. Each captures the amount.
static TEXT_PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bUSD\s*\$?\s*([\d,]+(?:\.\d{1,2})?)",
        r"\$\s*([\d,]+(?:\.\d{1,2})?)",
        r"(?i)\bNT\$?\s*([\d,]+(?:\.\d{1,2})?)",
        r"(?i)\bTWD\s*([\d,]+(?:\.\d{1,2})?)",
        r"(?i)\bEUR\s*€?\s*([\d,]+(?:\.\d{1,2})?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid price regex"))
    .collect()
});

static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d.]").expect("Invalid non-numeric regex"));

/// Parse a raw price value. Falls back to keeping only digits and dots when
/// the value is decorated (`"$1,234.56"`). Negative, infinite and NaN results
/// are rejected.
pub fn parse_price(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let value = raw
        .parse::<f64>()
        .ok()
        .or_else(|| NON_NUMERIC.replace_all(raw, "").parse::<f64>().ok())?;

    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Price in page order: structured offers, price meta tags, visible text.
pub fn extract_price(page: &Page) -> Option<f64> {
    let strategies: [(&str, fn(&Page) -> Option<f64>); 3] = [
        ("structured offer", price_from_structured_data),
        ("meta tag", price_from_meta),
        ("page text", |page| find_price_in_text(page.text())),
    ];

    for (label, strategy) in strategies {
        if let Some(price) = strategy(page) {
            debug!("Price {} found via {}", price, label);
            return Some(price);
        }
    }

    debug!("No price found on {}", page.url());
    None
}

fn price_from_structured_data(page: &Page) -> Option<f64> {
    structured_objects(page).iter().find_map(|obj| match obj.get("offers") {
        Some(Value::Object(offer)) => offer_price(offer),
        Some(Value::Array(offers)) => offers
            .iter()
            .filter_map(Value::as_object)
            .find_map(offer_price),
        _ => None,
    })
}

fn offer_price(offer: &Map<String, Value>) -> Option<f64> {
    let direct = offer.get("price").and_then(value_as_text).filter(|p| !p.is_empty());
    let raw = direct.or_else(|| {
        offer
            .get("priceSpecification")
            .and_then(|spec| spec.get("price"))
            .and_then(value_as_text)
    })?;
    parse_price(&raw)
}

fn price_from_meta(page: &Page) -> Option<f64> {
    page.meta_content("property", "product:price:amount")
        .or_else(|| page.meta_content("name", "price"))
        .and_then(parse_price)
}

/// First currency-tagged amount in `text`, thousands separators stripped.
pub fn find_price_in_text(text: &str) -> Option<f64> {
    TEXT_PRICE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|amount| parse_price(&amount.as_str().replace(',', "")))
    })
}
