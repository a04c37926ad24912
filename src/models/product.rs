use serde::{Deserialize, Serialize};

/// The canonical record pulled out of one product page.
///
/// Every field is independently optional; `None` means the field was not
/// found and serializes as JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub price: Option<f64>,
    pub spec: Option<String>,
    pub imagelink: Option<String>,
}

impl ProductRecord {
    /// A record that only knows where the product image lives.
    pub fn image_only(imagelink: String) -> Self {
        Self {
            imagelink: Some(imagelink),
            ..Default::default()
        }
    }
}

/// Single-line error payload printed in place of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_fields_in_fixed_order_with_nulls() {
        let record = ProductRecord {
            brand: Some("Thorlabs".to_string()),
            price: Some(89.5),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"name":null,"brand":"Thorlabs","model":null,"price":89.5,"spec":null,"imagelink":null}"#
        );
    }

    #[test]
    fn keeps_non_latin_characters_unescaped() {
        let record = ProductRecord {
            spec: Some("DC - 12000 MHz, 50Ω".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("50Ω"));
    }

    #[test]
    fn image_only_record_has_nothing_else() {
        let record = ProductRecord::image_only("https://example.com/a.jpg".to_string());
        assert_eq!(record.imagelink.as_deref(), Some("https://example.com/a.jpg"));
        assert!(record.name.is_none() && record.brand.is_none() && record.model.is_none());
        assert!(record.price.is_none() && record.spec.is_none());
    }
}
