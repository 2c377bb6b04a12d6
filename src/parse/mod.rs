//! Pattern matchers over raw CLI output.
//!
//! Shelling out to third-party CLIs leaves free-form text as the only
//! integration contract. Each matcher is total: absence of a pattern
//! returns `None`, and callers treat a missing identifier as "proceed
//! without it", not as a failure.

use std::sync::LazyLock;

use regex::Regex;

const UUID_PATTERN: &str =
    r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b{}\b", UUID_PATTERN)).expect("uuid pattern")
});

static SERVICE_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"/service/({})", UUID_PATTERN)).expect("service fragment pattern")
});

static HTTPS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://[^\s]+").expect("url pattern"));

static NETLIFY_APP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://[^\s]*\.netlify\.app[^\s]*").expect("netlify url pattern")
});

/// First UUID-shaped identifier anywhere in the text
pub fn extract_uuid(text: &str) -> Option<String> {
    UUID.find(text).map(|m| m.as_str().to_lowercase())
}

/// Service id embedded in a `/service/<uuid>` URL fragment
pub fn extract_service_id(text: &str) -> Option<String> {
    SERVICE_FRAGMENT
        .captures(text)
        .map(|caps| caps[1].to_lowercase())
}

/// Token following a literal label such as `Site ID:`
pub fn extract_labeled(text: &str, label: &str) -> Option<String> {
    let pattern = format!(r"{}\s*(\S+)", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .map(|caps| caps[1].trim_end_matches([',', '.']).to_string())
        .filter(|token| !token.is_empty())
}

/// First https URL in the text, trimmed of trailing punctuation
pub fn extract_url(text: &str) -> Option<String> {
    HTTPS_URL.find(text).and_then(|m| clean_url(m.as_str()))
}

/// URL on the same line as a literal label
pub fn extract_labeled_url(text: &str, label: &str) -> Option<String> {
    text.lines()
        .find(|line| line.contains(label))
        .and_then(extract_url)
}

/// Deploy URL with Netlify's label preference, falling back to the
/// default `*.netlify.app` subdomain shape.
pub fn extract_netlify_url(text: &str) -> Option<String> {
    extract_labeled_url(text, "Website URL:")
        .or_else(|| extract_labeled_url(text, "Live URL:"))
        .or_else(|| NETLIFY_APP_URL.find(text).and_then(|m| clean_url(m.as_str())))
}

fn clean_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim_end_matches(['.', ',', ')', '"', '\'']);
    url::Url::parse(trimmed).ok().map(|_| trimmed.to_string())
}
