use reqwest::header::HeaderMap;

/// Identifier used when no proxy header names the caller
pub const FALLBACK_IDENTIFIER: &str = "127.0.0.1";

/// Resolves the caller identifier from trusted proxy headers
///
/// # Precedence
///
/// 1. `cf-connecting-ip`
/// 2. `x-real-ip`
/// 3. First entry of `x-forwarded-for`
/// 4. `127.0.0.1`
///
/// Empty or non-UTF-8 header values are skipped.
pub fn resolve_identifier(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    header("cf-connecting-ip")
        .or_else(|| header("x-real-ip"))
        .or_else(|| {
            header("x-forwarded-for").and_then(|list| {
                list.split(',')
                    .next()
                    .map(str::trim)
                    .filter(|first| !first.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| FALLBACK_IDENTIFIER.to_string())
}
