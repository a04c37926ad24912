//! Label/value lookup for spec tables.
//!
//! Vendor pages mix `<th>Label</th><td>Value</td>` rows with div-based
//! label/value pairs. The value is looked for in the label's own row first,
//! then in its next sibling, and only then in the next cell further down the
//! page, so neighbouring figures (VSWR next to impedance, say) are not
//! picked up by accident.

use regex::Regex;
use scraper::ElementRef;
use tracing::debug;

use super::{clean_text, Page};

/// Elements whose text never counts as a label.
const NON_CONTENT: &[&str] = &["script", "style", "title", "head", "noscript"];

/// Value paired with the first element whose own text matches `label`.
pub fn find_value_by_label(page: &Page, label: &Regex) -> Option<String> {
    let root = page.document().root_element();
    let label_el = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| !NON_CONTENT.contains(&el.value().name()))
        .find(|el| own_text(el).map_or(false, |text| label.is_match(&text)))?;

    if let Some(value) = value_in_same_row(label_el) {
        debug!("Label {} resolved from its table row", label.as_str());
        return Some(value);
    }

    if let Some(sibling) = label_el.next_siblings().find_map(ElementRef::wrap) {
        if let Some(value) = element_text(sibling) {
            debug!("Label {} resolved from its sibling", label.as_str());
            return Some(value);
        }
    }

    let next_cell = root
        .descendants()
        .skip_while(|node| node.id() != label_el.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")?;
    element_text(next_cell)
}

fn value_in_same_row(label_el: ElementRef<'_>) -> Option<String> {
    let cell = std::iter::once(label_el)
        .chain(label_el.ancestors().filter_map(ElementRef::wrap))
        .find(is_cell)?;
    let row = cell
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")?;

    row.children()
        .filter_map(ElementRef::wrap)
        .filter(is_cell)
        .skip_while(|c| c.id() != cell.id())
        .skip(1)
        .find_map(element_text)
}

fn is_cell(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "td" | "th")
}

/// Text nodes directly under `el`, whitespace-collapsed.
fn own_text(el: &ElementRef<'_>) -> Option<String> {
    let text = el
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&text)
}

fn element_text(el: ElementRef<'_>) -> Option<String> {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}
