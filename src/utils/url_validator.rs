//! Well-formedness check for target URLs.

use url::Url;

/// Returns true if `url` parses as an absolute URL with a non-empty scheme and a
/// non-empty host.
///
/// No normalization is applied: dedup matching compares the submitted string
/// byte-for-byte, so the caller stores exactly what it validated.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_url("https://example.com/video.mp4"));
/// assert!(!validate_url("not-a-url"));
/// assert!(!validate_url("mailto:someone@example.com"));
/// ```
pub fn validate_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    !parsed.scheme().is_empty() && parsed.host_str().is_some_and(|host| !host.is_empty())
}
