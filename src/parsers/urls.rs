use url::Url;

/// Resolve `candidate` against `base` and force an absolute https form.
///
/// Relative paths, protocol-relative `//host/...` and absolute URLs are all
/// accepted. Anything that cannot be resolved is passed through as-is
/// (after the scheme rewrite); reachability is not checked.
pub fn resolve_url(candidate: Option<&str>, base: &str) -> Option<String> {
    let candidate = candidate?.trim();
    if candidate.is_empty() {
        return None;
    }

    let resolved = match Url::parse(base).and_then(|base| base.join(candidate)) {
        Ok(url) => url.to_string(),
        Err(_) => candidate.to_string(),
    };

    Some(force_https(&resolved))
}

/// `http://` and protocol-relative URLs become `https://`.
pub fn force_https(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else if url
        .get(..7)
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case("http://"))
    {
        format!("https://{}", &url[7..])
    } else {
        url.to_string()
    }
}

/// Case-insensitive substring test used to weed out logos and chrome.
pub fn contains_any(url: &str, needles: &[&str]) -> bool {
    let lower = url.to_lowercase();
    needles.iter().any(|needle| lower.contains(needle))
}

const LOGO_MARKERS: &[&str] = &["logo", "sprite", "favicon", "icon", "social"];

pub fn looks_like_logo(url: &str) -> bool {
    contains_any(url, LOGO_MARKERS)
}
