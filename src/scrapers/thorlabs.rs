use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::{ProductRecord, Vendor};
use crate::parsers::{
    clean_text, contains_any, extract_image, extract_price, normalize_for_output, resolve_url,
    social_meta_image, Page,
};
use crate::scrapers::{host_is, split_name_spec, VendorParser};

/// Path fragments of product and product-group pages.
const PRODUCT_PAGE_MARKERS: &[&str] = &["thorproduct.cfm", "newgrouppage"];

const LOGO_BLOCKLIST: &[&str] = &["https://www.thorlabs.com/images/thorlabs-logo.png"];
const BAD_IMAGE_MARKERS: &[&str] = &["logo", "sprite", "icon", "banner", "social", "favicon"];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Attributes that may carry an image location, in scan order.
const IMAGE_ATTRS: &[&str] = &[
    "href",
    "src",
    "data-src",
    "data-original",
    "data-large",
    "data-zoom-image",
    "data-image",
    "data-full",
];

static TITLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*Thorlabs\s*-\s*").expect("Invalid title prefix regex"));
static LEADING_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s\-–—:,]+").expect("Invalid separator regex"));
static MODEL_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z0-9]{1,10}(?:-[A-Z0-9]+)*)\b").expect("Invalid model token regex")
});

/// Large-image URLs in raw markup: `-lrg` ones first (absolute, then
/// root-relative), then any large/highres image.
static LRG_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r#"(?i)https?://[^"'\s>]+/images/(?:large|highres)/[^"'\s>]*?[-_]lrg\.(?:jpe?g|png|webp)"#)
            .expect("Invalid absolute lrg regex"),
        Regex::new(r#"(?i)/images/(?:large|highres)/[^"'\s>]*?[-_]lrg\.(?:jpe?g|png|webp)"#)
            .expect("Invalid relative lrg regex"),
    ]
});
static LARGE_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r#"(?i)https?://[^"'\s>]+/images/(?:large|highres)/[^"'\s>]+\.(?:jpe?g|png|webp)"#)
            .expect("Invalid absolute large regex"),
        Regex::new(r#"(?i)/images/(?:large|highres)/[^"'\s>]+\.(?:jpe?g|png|webp)"#)
            .expect("Invalid relative large regex"),
    ]
});

/// Small/tab image locations rewritten to their large counterparts.
static SMALL_TO_LARGE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)/images/small/").expect("Invalid small regex"), "/images/large/"),
        (Regex::new(r"(?i)/images/tabimages/").expect("Invalid tabimages regex"), "/images/large/"),
        (
            Regex::new(r"(?i)[-_](?:sml|small)(\.(?:jpe?g|png|webp))$").expect("Invalid suffix regex"),
            "-lrg${1}",
        ),
    ]
});

static LRG_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[-_]lrg\.(?:jpe?g|png|webp)$").expect("Invalid lrg suffix regex"));
static ZOOM_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(zoom|click to enlarge)\b").expect("Invalid zoom regex"));

static IMAGE_HOLDERS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a, img, source, link").expect("Invalid image holder selector"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("Invalid anchor selector"));

#[derive(Debug, Default, Deserialize)]
struct PartNumberQuery {
    partnumber: Option<String>,
    pn: Option<String>,
}

pub struct ThorlabsParser;

impl VendorParser for ThorlabsParser {
    fn vendor(&self) -> Vendor {
        Vendor::Thorlabs
    }

    fn applies_to(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let on_thorlabs = parsed.host_str().map_or(false, |host| host_is(host, "thorlabs"));
        on_thorlabs && contains_any(parsed.path(), PRODUCT_PAGE_MARKERS)
    }

    fn parse(&self, page: &Page) -> ProductRecord {
        let query_model = part_number_from_query(page.url());
        let title = page.title();
        let (model, name, spec) = match title.as_deref() {
            Some(title) => split_title(title, query_model),
            None => (query_model, None, None),
        };

        let price = extract_price(page);

        // Vendor image locations first, then the generic strategies
        let imagelink = find_image(page, page.url(), model.as_deref())
            .or_else(|| extract_image(page, page.url()));

        info!(
            "Thorlabs page parsed: model={:?}, price={:?}, image={}",
            model,
            price,
            imagelink.is_some()
        );

        ProductRecord {
            name: normalize_for_output(name.as_deref()),
            brand: normalize_for_output(Some(Vendor::Thorlabs.display_name())),
            model: normalize_for_output(model.as_deref()),
            price,
            spec: normalize_for_output(spec.as_deref()),
            imagelink: resolve_url(imagelink.as_deref(), page.url()),
        }
    }
}

/// `partnumber=` or `pn=` from the page URL.
fn part_number_from_query(url: &str) -> Option<String> {
    let query = url::Url::parse(url).ok()?.query()?.to_string();
    let parsed: PartNumberQuery = serde_urlencoded::from_str(&query).unwrap_or_else(|e| {
        debug!("Unreadable Thorlabs query {:?}: {}", query, e);
        PartNumberQuery::default()
    });

    [parsed.partnumber, parsed.pn]
        .into_iter()
        .flatten()
        .map(|pn| pn.trim().to_string())
        .find(|pn| !pn.is_empty())
}

/// Split a page title into (model, name, spec).
///
/// `"Thorlabs - AC127-019-A - f=19.0 mm, NA=0.47"` with a known model gives
/// name `f=19.0 mm` and spec `NA=0.47`. Without a known model the first
/// part-number-looking token of the title is taken as the model.
fn split_title(
    title: &str,
    model: Option<String>,
) -> (Option<String>, Option<String>, Option<String>) {
    let title = TITLE_PREFIX.replace(title, "").trim().to_string();

    let (model, tail) = match model {
        Some(model) => {
            let tail = match title.get(..model.len()) {
                Some(head) if head.eq_ignore_ascii_case(&model) => {
                    strip_separators(&title[model.len()..])
                }
                _ => title.clone(),
            };
            (Some(model), tail)
        }
        None => match MODEL_TOKEN.captures(&title).and_then(|caps| caps.get(1)) {
            Some(token) => {
                let model = token.as_str().to_string();
                let token_re = Regex::new(&format!(r"\b{}\b", regex::escape(&model)));
                let tail = match token_re {
                    Ok(re) => re.replace_all(&title, "").to_string(),
                    Err(_) => title.replacen(&model, "", 1),
                };
                (Some(model), strip_separators(&tail))
            }
            None => (None, title.clone()),
        },
    };

    let parts: Vec<String> = tail.split(',').map(|p| p.trim().to_string()).collect();
    let (name, spec) = split_name_spec(parts);
    (model, name, spec)
}

fn strip_separators(text: &str) -> String {
    LEADING_SEPARATORS.replace(text.trim(), "").to_string()
}

/// Quality gate for Thorlabs image candidates.
fn is_good_image_url(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    if lower.is_empty() || LOGO_BLOCKLIST.iter().any(|b| b.to_lowercase() == lower) {
        return false;
    }
    !contains_any(&lower, BAD_IMAGE_MARKERS) && IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn to_large_from_small(url: &str) -> String {
    SMALL_TO_LARGE
        .iter()
        .fold(url.to_string(), |acc, (pattern, replacement)| {
            pattern.replace(&acc, *replacement).into_owned()
        })
}

/// Sort key; lower is better. `-lrg` files, then `/images/large/` over
/// `/images/highres/`, then filenames naming the model, then shorter URLs.
fn rank(url: &str, model: Option<&str>) -> (u8, u8, i8, usize) {
    let lower = url.to_lowercase();
    let not_lrg = if LRG_SUFFIX.is_match(&lower) { 0 } else { 1 };
    let location = if lower.contains("/images/large/") {
        0
    } else if lower.contains("/images/highres/") {
        1
    } else {
        2
    };
    let filename = lower.rsplit('/').next().unwrap_or(&lower);
    let names_model = match model {
        Some(model) if filename.contains(&model.to_lowercase()) => -1,
        _ => 0,
    };
    (not_lrg, location, names_model, lower.len())
}

/// Deduplicate in first-seen order and return the best-ranked candidate.
fn pick_best(candidates: Vec<String>, model: Option<&str>) -> Option<String> {
    let mut unique: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique.sort_by_key(|url| rank(url, model));
    unique.into_iter().next()
}

/// Thorlabs product image, most specific source first.
pub(crate) fn find_image(page: &Page, base_url: &str, model: Option<&str>) -> Option<String> {
    let raw = page.raw();

    // `-lrg` images named directly in the markup win outright
    for (i, pattern) in LRG_PATTERNS.iter().enumerate() {
        let found = pattern
            .find_iter(raw)
            .map(|m| m.as_str())
            .find(|url| is_good_image_url(url));
        if let Some(url) = found {
            debug!("Thorlabs -lrg image found in markup: {}", url);
            return if i == 0 {
                Some(url.to_string())
            } else {
                resolve_url(Some(url), base_url)
            };
        }
    }

    let mut candidates = Vec::new();
    let mut push = |url: Option<String>| {
        if let Some(url) = url.filter(|u| is_good_image_url(u)) {
            candidates.push(url);
        }
    };

    for pattern in LARGE_PATTERNS.iter() {
        for m in pattern.find_iter(raw) {
            push(resolve_url(Some(m.as_str()), base_url));
        }
    }

    for element in page.document().select(&IMAGE_HOLDERS) {
        for attr in IMAGE_ATTRS {
            let Some(value) = element.value().attr(attr).map(str::trim) else {
                continue;
            };
            if value.is_empty() || value.starts_with("data:") {
                continue;
            }
            let lower = value.to_lowercase();
            if lower.contains("/images/large/") || lower.contains("/images/highres/") {
                push(resolve_url(Some(value), base_url));
            }
            if lower.contains("/images/small/") || lower.contains("/images/tabimages/") {
                push(resolve_url(Some(&to_large_from_small(value)), base_url));
            }
        }
    }

    let zoom_link = page.document().select(&ANCHORS).find(|a| {
        clean_text(&a.text().collect::<Vec<_>>().join(" "))
            .map_or(false, |text| ZOOM_TEXT.is_match(&text))
    });
    if let Some(href) = zoom_link.and_then(|a| a.value().attr("href")) {
        push(resolve_url(Some(href), base_url));
    }

    if let Some(best) = pick_best(candidates, model) {
        debug!("Thorlabs image chosen by rank: {}", best);
        return Some(best);
    }

    social_meta_image(page, base_url, is_good_image_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PRODUCT_URL: &str = "https://www.thorlabs.com/thorproduct.cfm?partnumber=AC127-019-A";

    fn page(url: &str, body: &str) -> Page {
        Page::new(url, format!("<html>{body}</html>"))
    }

    #[test]
    fn applies_only_to_product_pages_on_thorlabs_hosts() {
        let parser = ThorlabsParser;
        assert!(parser.applies_to(PRODUCT_URL));
        assert!(parser.applies_to("https://www.thorlabs.de/newgrouppage9.cfm?objectgroup_id=120"));
        assert!(!parser.applies_to("https://www.thorlabs.com/navigation.cfm"));
        assert!(!parser.applies_to("https://www.minicircuits.com/thorproduct.cfm"));
        assert!(!parser.applies_to("not a url"));
    }

    #[test]
    fn reads_part_number_or_pn() {
        assert_eq!(part_number_from_query(PRODUCT_URL).as_deref(), Some("AC127-019-A"));
        assert_eq!(
            part_number_from_query("https://www.thorlabs.com/thorproduct.cfm?pn=LA1131&x=1").as_deref(),
            Some("LA1131")
        );
        assert_eq!(
            part_number_from_query("https://www.thorlabs.com/thorproduct.cfm?partnumber=&pn=PM100D")
                .as_deref(),
            Some("PM100D")
        );
        assert_eq!(part_number_from_query("https://www.thorlabs.com/thorproduct.cfm"), None);
    }

    #[test]
    fn title_with_known_model() {
        let (model, name, spec) = split_title(
            "Thorlabs - AC127-019-A - f=19.0 mm, NA=0.47, Visible, Mounted Achromatic Doublet",
            Some("AC127-019-A".to_string()),
        );
        assert_eq!(model.as_deref(), Some("AC127-019-A"));
        assert_eq!(name.as_deref(), Some("f=19.0 mm"));
        assert_eq!(
            spec.as_deref(),
            Some("NA=0.47, Visible, Mounted Achromatic Doublet")
        );
    }

    #[test]
    fn title_derives_model_when_unknown() {
        let (model, name, spec) =
            split_title("Thorlabs - PM100D Compact Power and Energy Meter Console, Digital 4\" LCD", None);
        assert_eq!(model.as_deref(), Some("PM100D"));
        assert_eq!(name.as_deref(), Some("Compact Power and Energy Meter Console"));
        assert_eq!(spec.as_deref(), Some("Digital 4\" LCD"));
    }

    #[test]
    fn title_without_model_token_is_all_name() {
        let (model, name, spec) = split_title("Thorlabs - Optical Tables", None);
        assert_eq!(model, None);
        assert_eq!(name.as_deref(), Some("Optical Tables"));
        assert_eq!(spec, None);
    }

    #[test]
    fn small_images_map_to_large() {
        assert_eq!(
            to_large_from_small("/images/small/foo-sml.jpg"),
            "/images/large/foo-lrg.jpg"
        );
        assert_eq!(
            to_large_from_small("/images/TabImages/bar_small.PNG"),
            "/images/large/bar-lrg.PNG"
        );
    }

    #[test]
    fn quality_filter_rejects_logos_and_non_images() {
        assert!(is_good_image_url("https://www.thorlabs.com/images/large/x-lrg.jpg"));
        assert!(!is_good_image_url("https://www.thorlabs.com/images/thorlabs-logo.png"));
        assert!(!is_good_image_url("https://www.thorlabs.com/images/large/banner.jpg"));
        assert!(!is_good_image_url("https://www.thorlabs.com/images/large/x.gif"));
    }

    #[test]
    fn ranking_prefers_lrg_then_location_then_model_then_length() {
        let candidates = vec![
            "https://www.thorlabs.com/images/large/bar.png".to_string(),
            "https://www.thorlabs.com/images/highres/baz-lrg.webp".to_string(),
            "https://www.thorlabs.com/images/large/foo-lrg.jpg".to_string(),
            "https://www.thorlabs.com/images/large/bar.png".to_string(),
        ];
        assert_eq!(
            pick_best(candidates, None).as_deref(),
            Some("https://www.thorlabs.com/images/large/foo-lrg.jpg")
        );

        let tied = vec![
            "https://www.thorlabs.com/images/large/a-lrg.jpg".to_string(),
            "https://www.thorlabs.com/images/large/LA1131-lrg.jpg".to_string(),
        ];
        assert_eq!(
            pick_best(tied.clone(), Some("LA1131")).as_deref(),
            Some("https://www.thorlabs.com/images/large/LA1131-lrg.jpg")
        );
        assert_eq!(
            pick_best(tied, None).as_deref(),
            Some("https://www.thorlabs.com/images/large/a-lrg.jpg")
        );
    }

    #[test]
    fn direct_lrg_markup_wins() {
        let page = page(
            PRODUCT_URL,
            r#"<body><img src="/images/large/AC127-019-A-lrg.jpg">
               <img src="/images/large/other.jpg"></body>"#,
        );
        assert_eq!(
            find_image(&page, PRODUCT_URL, Some("AC127-019-A")).as_deref(),
            Some("https://www.thorlabs.com/images/large/AC127-019-A-lrg.jpg")
        );
    }

    #[test]
    fn lrg_scan_skips_logo_matches() {
        let page = page(
            PRODUCT_URL,
            r#"<body><img src="/images/large/thorlabs-logo-lrg.png">
               <img src="/images/large/AC127-019-A-lrg.jpg"></body>"#,
        );
        assert_eq!(
            find_image(&page, PRODUCT_URL, Some("AC127-019-A")).as_deref(),
            Some("https://www.thorlabs.com/images/large/AC127-019-A-lrg.jpg")
        );
    }

    #[test]
    fn rewritten_small_image_outranks_plain_large_and_highres() {
        let page = page(
            PRODUCT_URL,
            r#"<body>
                <img src="/images/small/foo-sml.jpg">
                <a href="/images/large/bar.png">bar</a>
                <img data-zoom-image="/images/highres/baz.webp">
            </body>"#,
        );
        assert_eq!(
            find_image(&page, PRODUCT_URL, None).as_deref(),
            Some("https://www.thorlabs.com/images/large/foo-lrg.jpg")
        );
    }

    #[test]
    fn zoom_link_and_meta_fallbacks() {
        let zoom = page(
            PRODUCT_URL,
            r#"<body><a href="/images/popup/AC127.jpg"> Click to Enlarge </a></body>"#,
        );
        assert_eq!(
            find_image(&zoom, PRODUCT_URL, None).as_deref(),
            Some("https://www.thorlabs.com/images/popup/AC127.jpg")
        );

        let meta = page(
            PRODUCT_URL,
            r#"<head><meta property="og:image" content="/images/thorlabs-logo.png">
               <meta name="twitter:image" content="/images/products/ac127.png"></head>"#,
        );
        assert_eq!(
            find_image(&meta, PRODUCT_URL, None).as_deref(),
            Some("https://www.thorlabs.com/images/products/ac127.png")
        );
    }
}
