use tracing::{debug, info};

use crate::error::AnalyzeError;
use crate::models::{ProductRecord, Vendor};
use crate::parsers::{extract_image, Page};

mod minicircuits;
mod thorlabs;

pub use minicircuits::MiniCircuitsParser;
pub use thorlabs::ThorlabsParser;

/// A field-extraction ruleset for one vendor's product pages.
pub trait VendorParser {
    fn vendor(&self) -> Vendor;

    /// Whether this parser claims the page. Decided from the URL alone.
    fn applies_to(&self, url: &str) -> bool;

    /// Build the record. Only called after `applies_to` said yes; fields
    /// that cannot be found are left `None`.
    fn parse(&self, page: &Page) -> ProductRecord;
}

/// What the dispatcher produced for a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Vendor {
        vendor: Vendor,
        record: ProductRecord,
    },
    /// No vendor parser applied; only a generic image was found.
    ImageOnly(ProductRecord),
}

impl Extraction {
    pub fn into_record(self) -> ProductRecord {
        match self {
            Extraction::Vendor { record, .. } | Extraction::ImageOnly(record) => record,
        }
    }
}

/// Vendor parsers in probing order.
pub fn vendor_parsers() -> Vec<Box<dyn VendorParser>> {
    vec![Box::new(MiniCircuitsParser), Box::new(ThorlabsParser)]
}

/// Run the first applicable vendor parser, else fall back to a record that
/// carries only a generic image.
pub fn extract(page: &Page) -> Result<Extraction, AnalyzeError> {
    for parser in vendor_parsers() {
        if !parser.applies_to(page.url()) {
            debug!("{} parser does not apply to {}", parser.vendor(), page.url());
            continue;
        }

        info!("Parsing {} with the {} parser", page.url(), parser.vendor());
        return Ok(Extraction::Vendor {
            vendor: parser.vendor(),
            record: parser.parse(page),
        });
    }

    match extract_image(page, page.url()) {
        Some(imagelink) => {
            info!("No vendor parser for {}, returning generic image only", page.url());
            Ok(Extraction::ImageOnly(ProductRecord::image_only(imagelink)))
        }
        None => {
            info!("No parser matched {}", page.url());
            Err(AnalyzeError::NoParserMatch)
        }
    }
}

/// True when the host's registrable label is `label`: the second-to-last
/// label, or the one before a `co.jp`-style country suffix.
pub(crate) fn host_is(host: &str, label: &str) -> bool {
    const SECOND_LEVEL: &[&str] = &["co", "com", "net", "org", "ac"];

    let host = host.trim_end_matches('.').to_lowercase();
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return false;
    }

    let n = parts.len();
    if parts[n - 2] == label {
        return true;
    }

    n >= 3
        && parts[n - 1].len() == 2
        && SECOND_LEVEL.contains(&parts[n - 2])
        && parts[n - 3] == label
}

pub(crate) fn url_host(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Split on commas into a leading name and the rest rejoined as a spec.
pub(crate) fn split_name_spec(parts: Vec<String>) -> (Option<String>, Option<String>) {
    let mut parts = parts.into_iter();
    let name = parts.next().filter(|s| !s.is_empty());
    let rest: Vec<String> = parts.collect();
    let spec = if rest.is_empty() {
        None
    } else {
        Some(rest.join(", "))
    };
    (name, spec)
}
