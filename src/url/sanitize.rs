use crate::UrlError;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Query parameters that carry credentials and are stripped before fetching
const SENSITIVE_PARAMS: &[&str] = &[
    "api_key",
    "token",
    "key",
    "password",
    "secret",
    "auth",
    "jwt",
    "access_token",
    "refresh_token",
    "client_secret",
];

/// Knobs for [`sanitize_url_with`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizeOptions {
    /// Skip the private/loopback host guard. Only meant for local test servers.
    pub allow_private_hosts: bool,
}

/// A URL that passed sanitization
///
/// Invariants: scheme is `http` or `https`, the host is not loopback, private
/// or link-local, there is no fragment, and no sensitive query parameter is
/// present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedUrl(Url);

impl SanitizedUrl {
    /// The canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for SanitizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for SanitizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validates and canonicalizes a user-supplied URL
///
/// # Validation Steps (first failure wins)
///
/// 1. Parse as an absolute URL
/// 2. Scheme must be `http` or `https`
/// 3. Host must not be `localhost`, a loopback/private/link-local IPv4
///    address, or a loopback/unique-local/link-local IPv6 address
/// 4. Drop the fragment and every sensitive query parameter
///
/// This guard must run before any fetch issued from user input.
///
/// # Examples
///
/// ```
/// use llmstxt::url::sanitize_url;
///
/// let url = sanitize_url("https://example.com/path?api_key=secret#frag").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/path");
///
/// assert!(sanitize_url("http://localhost/").is_err());
/// ```
pub fn sanitize_url(raw: &str) -> Result<SanitizedUrl, UrlError> {
    sanitize_url_with(raw, &SanitizeOptions::default())
}

/// [`sanitize_url`] with explicit options
pub fn sanitize_url_with(raw: &str, options: &SanitizeOptions) -> Result<SanitizedUrl, UrlError> {
    // Step 1: Parse
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    // Step 2: Scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    // Step 3: Host guard
    let host = url.host().ok_or(UrlError::MissingHost)?;
    if !options.allow_private_hosts && is_blocked_host(&host) {
        return Err(UrlError::BlockedHost(host.to_string()));
    }

    // Step 4: Fragment and sensitive parameters
    url.set_fragment(None);
    strip_sensitive_params(&mut url);

    Ok(SanitizedUrl(url))
}

/// Returns true when the host points at the local machine or a private network
fn is_blocked_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_lowercase();
            domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.starts_with("127.")
                || domain.starts_with("192.168.")
                || domain.starts_with("10.")
        }
        Host::Ipv4(addr) => is_blocked_ipv4(addr),
        Host::Ipv6(addr) => is_blocked_ipv6(addr),
    }
}

fn is_blocked_ipv4(addr: &Ipv4Addr) -> bool {
    addr.is_loopback() || addr.is_private() || addr.is_link_local() || addr.is_unspecified()
}

fn is_blocked_ipv6(addr: &Ipv6Addr) -> bool {
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return is_blocked_ipv4(&mapped);
    }

    let first = addr.segments()[0];
    addr.is_loopback()
        || addr.is_unspecified()
        // fc00::/7 unique-local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link-local
        || (first & 0xffc0) == 0xfe80
}

/// Removes sensitive query parameters, keeping the order of the rest
fn strip_sensitive_params(url: &mut Url) {
    if url.query().is_none() {
        return;
    }

    let has_sensitive = url
        .query_pairs()
        .any(|(key, _)| SENSITIVE_PARAMS.contains(&key.as_ref()));
    if !has_sensitive {
        return;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !SENSITIVE_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(raw: &str) -> Option<UrlError> {
        sanitize_url(raw).err()
    }

    #[test]
    fn test_strips_fragment_and_api_key() {
        let result = sanitize_url("https://example.com/path?api_key=secret#frag").unwrap();
        assert_eq!(result.as_str(), "https://example.com/path");
    }

    #[test]
    fn test_keeps_other_params_in_order() {
        let result =
            sanitize_url("https://example.com/search?q=rust&token=abc&page=2").unwrap();
        assert_eq!(result.as_str(), "https://example.com/search?q=rust&page=2");
    }

    #[test]
    fn test_untouched_query_is_not_reencoded() {
        let result = sanitize_url("https://example.com/a?b=1&a=2").unwrap();
        assert_eq!(result.as_str(), "https://example.com/a?b=1&a=2");
    }

    #[test]
    fn test_sensitive_keys_are_case_sensitive() {
        let result = sanitize_url("https://example.com/?API_KEY=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/?API_KEY=1");
    }

    #[test]
    fn test_all_sensitive_params_removed() {
        for param in SENSITIVE_PARAMS {
            let raw = format!("https://example.com/page?{}=value", param);
            let result = sanitize_url(&raw).unwrap();
            assert_eq!(
                result.as_str(),
                "https://example.com/page",
                "Failed to remove {}",
                param
            );
        }
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(code_of(""), Some(UrlError::Parse(_))));
        assert!(matches!(code_of("not a url"), Some(UrlError::Parse(_))));
        assert!(matches!(code_of("/relative/path"), Some(UrlError::Parse(_))));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(matches!(
            code_of("ftp://example.com/file"),
            Some(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            code_of("javascript:alert(1)"),
            Some(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            code_of("file:///etc/passwd"),
            Some(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_rejects_local_and_private_hosts() {
        for raw in [
            "http://localhost/",
            "http://LOCALHOST:8080/admin",
            "http://127.0.0.1/",
            "http://127.1.2.3/",
            "http://192.168.1.1/",
            "http://10.0.0.5/",
            "http://172.16.0.1/",
            "http://169.254.169.254/latest/meta-data",
            "http://0.0.0.0/",
            "http://[::1]/",
            "http://[fc00::1]/",
            "http://[fd12:3456::1]/",
            "http://[fe80::1]/",
            "http://[::ffff:127.0.0.1]/",
        ] {
            assert!(
                matches!(code_of(raw), Some(UrlError::BlockedHost(_))),
                "expected {} to be blocked",
                raw
            );
        }
    }

    #[test]
    fn test_allows_public_hosts() {
        assert!(sanitize_url("http://example.com/").is_ok());
        assert!(sanitize_url("https://93.184.216.34/").is_ok());
        assert!(sanitize_url("https://[2606:2800:220:1::]/").is_ok());
        assert!(sanitize_url("https://10th-street.example.org/").is_ok());
    }

    #[test]
    fn test_allow_private_hosts_option() {
        let options = SanitizeOptions {
            allow_private_hosts: true,
        };
        let result = sanitize_url_with("http://127.0.0.1:8080/page#top", &options).unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:8080/page");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let result = sanitize_url("  https://example.com/docs  ").unwrap();
        assert_eq!(result.as_str(), "https://example.com/docs");
    }
}
