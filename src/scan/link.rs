//! Decides whether a decoded payload is a followable link.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Deep-link prefix accepted alongside web URLs (passkey hand-off codes).
pub const FIDO_PREFIX: &str = "FIDO:/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    Web,
    DeepLink,
}

// http(s) URL with a non-empty host. Slashes after the scheme are optional
// and spaces are allowed past the host, as browsers' URL parsing accepts.
static WEB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?:/*[^\s/?#@]+(?:@[^\s/?#@]+)?(?:[/?#].*)?$").unwrap()
});

pub fn classify_link(text: &str) -> Option<LinkKind> {
    let text = text.trim();
    // Browsers drop embedded tabs and newlines before parsing.
    let web: String = text.chars().filter(|c| !matches!(c, '\t' | '\n' | '\r')).collect();
    if WEB_URL.is_match(&web) {
        return Some(LinkKind::Web);
    }
    if text.starts_with(FIDO_PREFIX) {
        return Some(LinkKind::DeepLink);
    }
    None
}

pub fn is_valid_url(text: &str) -> bool {
    classify_link(text).is_some()
}
