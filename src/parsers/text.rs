use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Inch and foot marks after digits, plus escaped quotes left over from
/// embedded JSON. Applied in order.
static DIMENSION_MARKS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r#"(\d)\s*""#).expect("Invalid inch regex"), "${1}\u{2033}"),
        (Regex::new(r"(\d)\s*'").expect("Invalid foot regex"), "${1}\u{2032}"),
        (Regex::new(r#"\\""#).expect("Invalid escaped quote regex"), "\u{2033}"),
    ]
});

const RIGHT_DOUBLE_QUOTE: &str = "\u{201D}";

/// Final cleanup for every string written into a record.
///
/// Decodes entities, composes to NFC, rewrites dimension marks, removes
/// backslashes, swaps straight double quotes for typographic ones and
/// collapses whitespace. The pass is repeated until nothing changes so that
/// doubly-escaped input settles; the result is always a fixed point.
pub fn normalize_for_output(text: Option<&str>) -> Option<String> {
    let mut current = text?.to_string();
    if current.trim().is_empty() {
        return None;
    }

    // Terminates: a changing pass shortens the text or removes a straight quote
    loop {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    if current.is_empty() {
        None
    } else {
        Some(current)
    }
}

fn normalize_pass(text: &str) -> String {
    let decoded = decode_html_entities(text);
    let mut t: String = decoded.nfc().collect();

    for (pattern, replacement) in DIMENSION_MARKS.iter() {
        t = pattern.replace_all(&t, *replacement).into_owned();
    }

    let t = t.replace('\\', "").replace('"', RIGHT_DOUBLE_QUOTE);
    t.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> Option<String> {
        normalize_for_output(Some(s))
    }

    #[test]
    fn null_and_blank_inputs_stay_null() {
        assert_eq!(normalize_for_output(None), None);
        assert_eq!(norm(""), None);
        assert_eq!(norm("  \n "), None);
    }

    #[test]
    fn decodes_entities_and_collapses_space() {
        assert_eq!(
            norm("  Mounted&nbsp;Achromatic \n Doublet &amp; Lens ").as_deref(),
            Some("Mounted Achromatic Doublet & Lens")
        );
    }

    #[test]
    fn rewrites_inch_and_foot_marks() {
        assert_eq!(norm(r#"Ø1" Mirror"#).as_deref(), Some("Ø1″ Mirror"));
        assert_eq!(norm("6' Cable").as_deref(), Some("6′ Cable"));
    }

    #[test]
    fn strips_backslashes_and_straight_quotes() {
        let out = norm(r#"The \"Best\" \path "quoted""#).unwrap();
        assert!(!out.contains('\\'));
        assert!(!out.contains('"'));
        assert_eq!(out, "The ″Best″ path ”quoted”");
    }

    #[test]
    fn composes_to_nfc() {
        let decomposed = "Cafe\u{301}";
        assert_eq!(norm(decomposed).as_deref(), Some("Caf\u{e9}"));
    }

    #[test]
    fn deeply_escaped_entities_fully_decode() {
        assert_eq!(norm("&amp;amp;amp;amp;amp;lt;x").as_deref(), Some("<x"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "Thorlabs - AC127-019-A - f=19.0 mm",
            "&amp;lt;tag&amp;gt; 1\" optic",
            "&#92;&#34;quoted&#34;",
            "&\\amp; and \\\\ more",
            "  50&#8486;  impedance ",
            "2' x 3\" panel",
            "&amp;amp;amp;amp;amp;lt;x",
            "&amp;amp;amp;amp;amp;amp;amp;#92;&amp;amp;amp;amp;amp;amp;#34;deep",
        ];
        for sample in samples {
            let once = norm(sample);
            let twice = normalize_for_output(once.as_deref());
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }
}
