//! Embedded structured data (`application/ld+json`) blocks.
//!
//! Each payload is either a single object or a list of objects. Both shapes
//! are flattened once into a plain sequence of JSON objects; `@graph`
//! members are lifted alongside their container.

use once_cell::sync::Lazy;
use scraper::Selector;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::Page;

static JSONLD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("Invalid JSON-LD selector")
});

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LdPayload {
    Many(Vec<Value>),
    One(Value),
}

impl LdPayload {
    fn into_objects(self) -> Vec<Map<String, Value>> {
        let values = match self {
            LdPayload::Many(values) => values,
            LdPayload::One(value) => vec![value],
        };

        let mut objects = Vec::new();
        for value in values {
            if let Value::Object(obj) = value {
                if let Some(Value::Array(graph)) = obj.get("@graph") {
                    objects.extend(graph.iter().filter_map(|v| v.as_object().cloned()));
                }
                objects.push(obj);
            }
        }
        objects
    }
}

/// All structured-data objects on the page, in document order.
/// Blocks that are not valid JSON are skipped.
pub fn structured_objects(page: &Page) -> Vec<Map<String, Value>> {
    let mut objects = Vec::new();

    for script in page.document().select(&JSONLD_SELECTOR) {
        let body = script.text().collect::<String>();
        let body = body.trim();
        if body.is_empty() {
            continue;
        }

        match serde_json::from_str::<LdPayload>(body) {
            Ok(payload) => objects.extend(payload.into_objects()),
            Err(e) => debug!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    objects
}

/// True when `@type` (or `type`) names a product, as a string or in a list.
pub fn is_product(obj: &Map<String, Value>) -> bool {
    let type_value = obj.get("@type").or_else(|| obj.get("type"));
    match type_value {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("product"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("product")),
        _ => false,
    }
}

/// String form of a scalar JSON value; `null`, objects and lists yield `None`.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
