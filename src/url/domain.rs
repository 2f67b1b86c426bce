/// Splits a domain into its labels, TLD first
///
/// Returns `None` for an empty domain or one containing an empty label
/// (leading, trailing or doubled dots).
///
/// # Examples
///
/// ```
/// use blocked_domains::url::reversed_labels;
///
/// assert_eq!(reversed_labels("a.b.com"), Some(vec!["com", "b", "a"]));
/// assert_eq!(reversed_labels("a..com"), None);
/// assert_eq!(reversed_labels(""), None);
/// ```
pub fn reversed_labels(domain: &str) -> Option<Vec<&str>> {
    if domain.is_empty() {
        return None;
    }

    let labels: Vec<&str> = domain.rsplit('.').collect();
    if labels.iter().any(|label| label.is_empty()) {
        return None;
    }

    Some(labels)
}

/// Checks whether `candidate` is `parent` itself or one of its subdomains
///
/// The match is label-aligned: `ba.com` is not covered by `a.com`.
///
/// # Examples
///
/// ```
/// use blocked_domains::url::is_covered_by;
///
/// assert!(is_covered_by("example.com", "example.com"));
/// assert!(is_covered_by("example.com", "api.v2.example.com"));
/// assert!(!is_covered_by("example.com", "myexample.com"));
/// assert!(!is_covered_by("api.example.com", "example.com"));
/// ```
pub fn is_covered_by(parent: &str, candidate: &str) -> bool {
    candidate == parent
        || candidate
            .strip_suffix(parent)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_labels_single() {
        assert_eq!(reversed_labels("localhost"), Some(vec!["localhost"]));
    }

    #[test]
    fn test_reversed_labels_nested() {
        assert_eq!(
            reversed_labels("api.v2.example.com"),
            Some(vec!["com", "example", "v2", "api"])
        );
    }

    #[test]
    fn test_reversed_labels_rejects_empty_labels() {
        assert_eq!(reversed_labels(".example.com"), None);
        assert_eq!(reversed_labels("example.com."), None);
        assert_eq!(reversed_labels("example..com"), None);
        assert_eq!(reversed_labels("."), None);
    }

    #[test]
    fn test_covered_exact() {
        assert!(is_covered_by("example.com", "example.com"));
        assert!(!is_covered_by("example.com", "example.org"));
    }

    #[test]
    fn test_covered_subdomain() {
        assert!(is_covered_by("example.com", "blog.example.com"));
        assert!(is_covered_by("com", "example.com"));
    }

    #[test]
    fn test_not_covered_on_partial_label() {
        assert!(!is_covered_by("example.com", "badexample.com"));
        assert!(!is_covered_by("a.com", "ba.com"));
    }

    #[test]
    fn test_parent_is_not_covered_by_child() {
        assert!(!is_covered_by("blog.example.com", "example.com"));
    }
}
