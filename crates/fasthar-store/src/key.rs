use crate::{Result, StoreError};
use std::fmt;
use url::Url;

/// Trim a page URL and check it is absolute with a host. Every reader and
/// writer of a history goes through this so they agree on its key.
pub fn page_url(raw: &str) -> Result<&str> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(StoreError::MissingPageUrl);
    }

    match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => Ok(url),
        _ => Err(StoreError::InvalidPageUrl(url.to_string())),
    }
}

/// History key for a site: its URL, percent-encoded
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn for_url(url: &str) -> Self {
        Self(urlencoding::encode(url).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_percent_encoded_url() {
        let key = StoreKey::for_url("http://thephantomoftheopera.com/a b?x=1&y=2");

        assert_eq!(
            key.as_str(),
            "http%3A%2F%2Fthephantomoftheopera.com%2Fa%20b%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn test_page_url_is_trimmed_before_keying() {
        let url = page_url("  http://thephantomoftheopera.com\n").unwrap();

        assert_eq!(url, "http://thephantomoftheopera.com");
        assert_eq!(
            StoreKey::for_url(url),
            StoreKey::for_url("http://thephantomoftheopera.com")
        );
    }

    #[test]
    fn test_page_url_rejects_relative_and_hostless() {
        assert!(matches!(page_url(" "), Err(StoreError::MissingPageUrl)));
        assert!(matches!(
            page_url("thephantomoftheopera.com"),
            Err(StoreError::InvalidPageUrl(_))
        ));
        assert!(matches!(
            page_url("javascript:alert(1)"),
            Err(StoreError::InvalidPageUrl(_))
        ));
    }

    #[test]
    fn test_key_has_no_path_separators() {
        let key = StoreKey::for_url("https://example.com/../../etc/passwd");

        assert!(!key.as_str().contains('/'));
    }
}
