//! Authentication utility functions.

use axum::http::Uri;

/// Path of the login page.
pub const LOGIN_URL: &str = "/accounts/login/";

/// Where a login without a usable `next` lands.
pub const LOGIN_REDIRECT_URL: &str = "/";

/// Build the login URL that sends the cook back to `uri` afterwards.
///
/// The `next` value keeps `/` unescaped, so `/dishes/?page=2` becomes
/// `/accounts/login/?next=/dishes/%3Fpage%3D2`.
pub fn login_redirect_url(uri: &Uri) -> String {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("{LOGIN_URL}?next={}", encoded.replace("%2F", "/"))
}

/// Accept a post-login redirect target only when it stays on this site.
///
/// Relative paths starting with a single `/` pass. Absolute URLs, protocol-relative `//host`
/// and backslash tricks do not.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next?.trim();
    if !next.starts_with('/') || next.starts_with("//") || next.starts_with("/\\") {
        return None;
    }
    if next.chars().any(|c| c.is_control() || c == '\\') {
        return None;
    }
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_url_keeps_slashes() {
        let uri: Uri = "/dishes/".parse().unwrap();
        assert_eq!(login_redirect_url(&uri), "/accounts/login/?next=/dishes/");

        let uri: Uri = "/dishes/1/update/".parse().unwrap();
        assert_eq!(login_redirect_url(&uri), "/accounts/login/?next=/dishes/1/update/");
    }

    #[test]
    fn test_login_redirect_url_encodes_query() {
        let uri: Uri = "/dishes/?name=soup&page=2".parse().unwrap();
        assert_eq!(
            login_redirect_url(&uri),
            "/accounts/login/?next=/dishes/%3Fname%3Dsoup%26page%3D2"
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/cooks/")), Some("/cooks/"));
        assert_eq!(safe_next(Some("/dishes/?page=2")), Some("/dishes/?page=2"));
        assert_eq!(safe_next(None), None);
        assert_eq!(safe_next(Some("")), None);
        assert_eq!(safe_next(Some("https://evil.example/")), None);
        assert_eq!(safe_next(Some("//evil.example/")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(Some("dishes/")), None);
    }
}
