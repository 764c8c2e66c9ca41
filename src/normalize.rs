//! Deciding whether input looks like a link, and canonicalizing it.

use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());
static WWW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^www\.").unwrap());
static BARE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9-]+\.[a-z]{2,}(/|$)").unwrap());

/// Returns true when `s` (after trimming) reads like a web address.
///
/// Accepts an explicit `http://`/`https://` scheme, a leading `www.`, or a bare
/// `label.tld` optionally followed by a path. Matching is case-insensitive.
///
/// ```
/// use zzqr::normalize::looks_like_url;
///
/// assert!(looks_like_url("example.com/docs"));
/// assert!(!looks_like_url("hello world"));
/// ```
pub fn looks_like_url(s: &str) -> bool {
    let t = s.trim();
    if t.is_empty() {
        return false;
    }
    SCHEME.is_match(t) || WWW.is_match(t) || BARE_DOMAIN.is_match(t)
}

/// Trims `raw` and, when it looks like a link without a scheme, prefixes `https://`.
///
/// Text that is not a link is returned trimmed but otherwise untouched.
///
/// ```
/// use zzqr::normalize::normalize_value;
///
/// assert_eq!(normalize_value("  WWW.Example.com "), "https://www.Example.com");
/// assert_eq!(normalize_value("http://a.io"), "http://a.io");
/// assert_eq!(normalize_value("just text"), "just text");
/// ```
pub fn normalize_value(raw: &str) -> String {
    let t = raw.trim();
    if t.is_empty() {
        return String::new();
    }
    if looks_like_url(t) && !SCHEME.is_match(t) {
        return format!("https://{}", WWW.replace(t, "www."));
    }
    t.to_string()
}
