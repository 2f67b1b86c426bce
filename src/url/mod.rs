//! URL handling module for Blocked-Domains
//!
//! This module composes listing page URLs and provides the label helpers used
//! when comparing domains.

mod domain;

pub use domain::{is_covered_by, reversed_labels};

use url::Url;

/// Composes a listing URL from its configured pieces
///
/// The listing site addresses pages by plain concatenation
/// (`base + path + suffix`), so no path joining rules are applied. The result is
/// parsed to make sure it is a valid absolute URL.
///
/// # Examples
///
/// ```
/// use blocked_domains::url::compose_url;
///
/// let url = compose_url("https://example.com/search/", "blocked", "?page=3").unwrap();
/// assert_eq!(url, "https://example.com/search/blocked?page=3");
/// ```
pub fn compose_url(base: &str, path: &str, suffix: &str) -> Result<String, ::url::ParseError> {
    let joined = format!("{}{}{}", base, path, suffix);
    Url::parse(&joined)?;
    Ok(joined)
}

/// Composes the URL of one page of a listing
pub fn page_url(
    base: &str,
    path: &str,
    page_suffix: &str,
    page: u32,
) -> Result<String, ::url::ParseError> {
    compose_url(base, path, &format!("{}{}", page_suffix, page))
}
