use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::Selector;
use tracing::{debug, info};

use crate::models::{ProductRecord, Vendor};
use crate::parsers::{
    extract_image, extract_price, find_value_by_label, heuristic_image, normalize_for_output,
    parse_price, resolve_url, social_meta_image, Page,
};
use crate::scrapers::{host_is, url_host, VendorParser};

const CASE_STYLE_PATH: &str = "/images/case_style/";
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp"];
const IMAGE_ATTRS: &[&str] = &["src", "data-src", "href", "data-original", "content"];
const TITLE_SEGMENT_TRIM: &[char] = &[' ', '-', '–', '—', ',', ':'];

static SITE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\|\s*Mini[-\s]?Circuits\s*$").expect("Invalid site suffix regex")
});
static MODEL_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\|\s*([A-Z0-9][A-Z0-9+\-]+)\s*$").expect("Invalid model suffix regex")
});
static FREQUENCY_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Frequency\s*Range|Frequency\s*Band)\b").expect("Invalid frequency label regex")
});
static DC_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDC\s*-\s*[\d,]+(?:\.\d+)?\s*MHz\b").expect("Invalid DC range regex")
});
static SPEC_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:DC|[\d.]+)\s*-\s*[\d,]+(?:\.\d+)?\s*MHz\b").expect("Invalid range regex")
});
static IMPEDANCE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bImpedance\b").expect("Invalid impedance label regex"));
static IMPEDANCE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:ohms?|\x{03A9}|\x{2126})\b").expect("Invalid impedance regex")
});
static FIFTY_OHM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b50\s*(?:ohms?|\x{03A9}|\x{2126})\b").expect("Invalid 50 ohm regex")
});
static LABELLED_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bPrice\b[^$]*\$\s*([\d,]+(?:\.\d{1,2})?)").expect("Invalid labelled price regex")
});

static IMAGE_HOLDERS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img, source, a, link, meta").expect("Invalid image holder selector")
});

pub struct MiniCircuitsParser;

impl VendorParser for MiniCircuitsParser {
    fn vendor(&self) -> Vendor {
        Vendor::MiniCircuits
    }

    fn applies_to(&self, url: &str) -> bool {
        url_host(url).map_or(false, |host| host_is(&host, "minicircuits"))
    }

    fn parse(&self, page: &Page) -> ProductRecord {
        let title = page.title().unwrap_or_default();
        let title = SITE_SUFFIX.replace(&title, "").to_string();

        let model = pick_model(model_from_query(page.url()), model_from_title(&title));

        // "15 dB Fixed Attenuator, DC - 12000 MHz, 50Ω | FW-15A+"
        let title = MODEL_SUFFIX.replace(&title, "").to_string();
        let mut parts = title
            .split(',')
            .map(|p| p.trim_matches(TITLE_SEGMENT_TRIM).to_string())
            .filter(|p| !p.is_empty());
        let name = parts.next();
        let spec_guess = {
            let rest: Vec<String> = parts.collect();
            if rest.is_empty() {
                None
            } else {
                Some(rest.join(", "))
            }
        };

        let frequency = frequency_range(page, spec_guess.as_deref());
        let impedance = impedance(page, spec_guess.as_deref(), frequency.as_deref());

        // Only the recognised figures survive; table noise such as VSWR does not
        let spec = [frequency, impedance]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        let spec = if spec.is_empty() {
            None
        } else {
            Some(spec.join(", "))
        };

        let price = extract_price(page).or_else(|| labelled_price(page.text()));

        let imagelink = find_image(page, page.url()).or_else(|| extract_image(page, page.url()));

        info!(
            "Mini-Circuits page parsed: model={:?}, price={:?}, image={}",
            model,
            price,
            imagelink.is_some()
        );

        ProductRecord {
            name: normalize_for_output(name.as_deref()),
            brand: normalize_for_output(Some(Vendor::MiniCircuits.display_name())),
            model: normalize_for_output(model.as_deref()),
            price,
            spec: normalize_for_output(spec.as_deref()),
            imagelink: resolve_url(imagelink.as_deref(), page.url()),
        }
    }
}

/// Percent-decoded `model=` value. A literal `+` stays a `+`; it is part of
/// the part number, not an encoded space.
fn model_from_query(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let query = parsed.query()?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == "model")
        .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().trim().to_string())
        .find(|model| !model.is_empty())
}

/// Trailing `| MODEL` segment of a title whose site suffix is already gone.
fn model_from_title(title: &str) -> Option<String> {
    MODEL_SUFFIX
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// The query value is authoritative unless the title spells the same part
/// with a `+` the query lost.
fn pick_model(from_query: Option<String>, from_title: Option<String>) -> Option<String> {
    match (from_query, from_title) {
        (None, title) => title,
        (Some(query), Some(title))
            if title.len() >= query.len() && title.contains('+') && !query.contains('+') =>
        {
            debug!("Model {} corrected from title to {}", query, title);
            Some(title)
        }
        (query, _) => query,
    }
}

fn frequency_range(page: &Page, spec_guess: Option<&str>) -> Option<String> {
    match spec_guess {
        Some(spec) if spec.contains("MHz") => SPEC_RANGE
            .find(spec)
            .map(|m| m.as_str().replace(',', "")),
        _ => find_value_by_label(page, &FREQUENCY_LABEL).or_else(|| {
            DC_RANGE
                .find(page.text())
                .map(|m| m.as_str().replace(',', ""))
        }),
    }
}

/// `"{n}Ω"` from the impedance row, the title spec, or the page text.
fn impedance(page: &Page, spec_guess: Option<&str>, frequency: Option<&str>) -> Option<String> {
    let from_table = find_value_by_label(page, &IMPEDANCE_LABEL);
    let spec_text = [spec_guess, frequency]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");
    let pool = [from_table.as_deref().unwrap_or(""), spec_text.as_str(), page.text()];

    pool.iter()
        .find_map(|blob| IMPEDANCE_VALUE.captures(blob))
        .and_then(|caps| caps.get(1))
        .map(|n| format!("{}\u{03A9}", n.as_str()))
        .or_else(|| FIFTY_OHM.is_match(page.text()).then(|| "50\u{03A9}".to_string()))
}

/// `Price ... $N` anywhere in the text.
fn labelled_price(text: &str) -> Option<f64> {
    LABELLED_PRICE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_price(&m.as_str().replace(',', "")))
}

/// Case-style drawing, then social meta, then a product-looking `<img>`.
pub(crate) fn find_image(page: &Page, base_url: &str) -> Option<String> {
    for element in page.document().select(&IMAGE_HOLDERS) {
        for attr in IMAGE_ATTRS {
            let Some(value) = element.value().attr(attr).map(str::trim) else {
                continue;
            };
            let lower = value.to_lowercase();
            if value.contains(CASE_STYLE_PATH) && IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
                debug!("Mini-Circuits case style image: {}", value);
                return resolve_url(Some(value), base_url);
            }
        }
    }

    social_meta_image(page, base_url, |_| true).or_else(|| heuristic_image(page, base_url))
}
