//! Conditional GET support.
//!
//! Protocol responses depend only on the request URI and the deployed code,
//! so the tag is a hash of the canonical URI and the build revision. Access
//! keys (`key=` parameters) are not part of the canonical URI.

use axum::http::{header, HeaderMap, Uri};
use sha2::{Digest, Sha256};

/// Request URI without `key=` query parameters.
pub fn canonical_uri(uri: &Uri) -> String {
    let path = uri.path();
    let query: Vec<&str> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|p| !p.is_empty() && !p.starts_with("key="))
        .collect();

    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query.join("&"))
    }
}

/// Quoted entity tag for `uri` under `build_revision`.
pub fn compute_etag(uri: &Uri, build_revision: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_uri(uri).as_bytes());
    hasher.update(b"!");
    hasher.update(build_revision.as_bytes());
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// True when `If-None-Match` names `etag` (weak tags compare equal) or `*`.
pub fn matches_if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    value.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/") == etag
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_key_parameters_dropped() {
        assert_eq!(
            canonical_uri(&uri("/dap/a.zarr.dods?temp[0:1]&key=secret")),
            "/dap/a.zarr.dods?temp[0:1]"
        );
        assert_eq!(canonical_uri(&uri("/dap/a.zarr.das?key=secret")), "/dap/a.zarr.das");
        assert_eq!(canonical_uri(&uri("/dap/a.zarr.das")), "/dap/a.zarr.das");
    }

    #[test]
    fn test_etag_ignores_key() {
        let a = compute_etag(&uri("/dap/a.dds?t&key=1"), "rev");
        let b = compute_etag(&uri("/dap/a.dds?t&key=2"), "rev");
        assert_eq!(a, b);
        assert_ne!(a, compute_etag(&uri("/dap/a.dds?t"), "rev2"));
        assert_eq!(a.len(), 66);
    }

    #[test]
    fn test_etag_is_sha256_of_uri_and_revision() {
        let expected = hex::encode(Sha256::digest(b"/dap/x.das!r1"));
        assert_eq!(compute_etag(&uri("/dap/x.das"), "r1"), format!("\"{}\"", expected));
    }

    #[test]
    fn test_if_none_match() {
        let etag = compute_etag(&uri("/dap/a.das"), "rev");
        let mut headers = HeaderMap::new();
        assert!(!matches_if_none_match(&headers, &etag));

        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_str(&format!("\"other\", W/{}", etag)).unwrap(),
        );
        assert!(matches_if_none_match(&headers, &etag));

        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("*"));
        assert!(matches_if_none_match(&headers, &etag));
    }
}
