//! Client address extraction for access logs.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Resolves the client IP address of a request.
///
/// When `behind_proxy` is true, the first address in `X-Forwarded-For` is used,
/// then `X-Real-IP`. Values that do not parse as an IP address are ignored, so
/// the result always fits the 45-character `ip_address` column. Falls back to the
/// peer socket address.
///
/// Enable `behind_proxy` only behind a trusted reverse proxy; otherwise clients
/// can spoof the logged address.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// let ip = client_ip(&headers, "10.0.0.1:5000".parse().unwrap(), true);
/// assert_eq!(ip, "203.0.113.7");
/// ```
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy
        && let Some(ip) = forwarded_ip(headers)
    {
        return ip.to_string();
    }

    peer.ip().to_string()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_forwarded_for = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    from_forwarded_for.or_else(|| {
        headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "10.0.0.1:5000".parse().unwrap()
    }

    #[test]
    fn test_uses_peer_by_default() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer(), false), "10.0.0.1");
        assert_eq!(client_ip(&headers, peer(), true), "10.0.0.1");
    }

    #[test]
    fn test_ignores_forwarded_headers_when_not_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));

        assert_eq!(client_ip(&headers, peer(), false), "10.0.0.1");
    }

    #[test]
    fn test_first_forwarded_for_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.7, 198.51.100.2"),
        );

        assert_eq!(client_ip(&headers, peer(), true), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static("2001:db8::1"));

        assert_eq!(client_ip(&headers, peer(), true), "2001:db8::1");
    }

    #[test]
    fn test_garbage_forwarded_for_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("not-an-ip"));

        assert_eq!(client_ip(&headers, peer(), true), "10.0.0.1");
    }
}
