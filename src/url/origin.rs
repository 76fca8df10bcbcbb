use url::Url;

/// Checks whether two URLs share an origin (scheme, host and port)
///
/// Default ports are normalized, so `https://example.com` and
/// `https://example.com:443` are the same origin. URLs with opaque origins
/// (`mailto:`, `data:`, ...) never match anything.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use llmstxt::url::same_origin;
///
/// let seed = Url::parse("https://example.com/docs/").unwrap();
/// assert!(same_origin(&seed, &Url::parse("https://example.com/blog").unwrap()));
/// assert!(!same_origin(&seed, &Url::parse("http://example.com/blog").unwrap()));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    let origin = a.origin();
    origin.is_tuple() && origin == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_host_different_path() {
        assert!(same_origin(
            &url("https://example.com/"),
            &url("https://example.com/a/b?c=d")
        ));
    }

    #[test]
    fn test_default_port_is_normalized() {
        assert!(same_origin(
            &url("https://example.com/"),
            &url("https://example.com:443/page")
        ));
    }

    #[test]
    fn test_different_port() {
        assert!(!same_origin(
            &url("https://example.com/"),
            &url("https://example.com:8443/")
        ));
    }

    #[test]
    fn test_different_scheme() {
        assert!(!same_origin(
            &url("https://example.com/"),
            &url("http://example.com/")
        ));
    }

    #[test]
    fn test_subdomain_is_different_origin() {
        assert!(!same_origin(
            &url("https://example.com/"),
            &url("https://blog.example.com/")
        ));
    }

    #[test]
    fn test_case_insensitive_host() {
        assert!(same_origin(
            &url("https://EXAMPLE.com/"),
            &url("https://example.COM/x")
        ));
    }

    #[test]
    fn test_opaque_origin_never_matches() {
        assert!(!same_origin(
            &url("mailto:a@example.com"),
            &url("mailto:a@example.com")
        ));
    }
}
