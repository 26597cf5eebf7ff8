//! Utility functions and helpers.

pub mod fs;
pub mod hash;
pub mod http;

use url::Url;

use crate::error::Result;

/// Parse a feed URL, making sure its path ends with `/` so relative
/// metadata locations resolve beneath it.
pub fn feed_base(url_str: &str) -> Result<Url> {
    let mut url = Url::parse(url_str)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolve a repository-relative location against a feed base URL.
pub fn resolve_location(base: &Url, href: &str) -> Result<Url> {
    Ok(base.join(href)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_base_adds_trailing_slash() {
        let base = feed_base("http://example.com/redos/7.3/x86_64/os").unwrap();
        assert_eq!(base.as_str(), "http://example.com/redos/7.3/x86_64/os/");

        let base = feed_base("http://example.com/redos/7.3/x86_64/os/").unwrap();
        assert_eq!(base.as_str(), "http://example.com/redos/7.3/x86_64/os/");
    }

    #[test]
    fn test_feed_base_rejects_garbage() {
        assert!(feed_base("not a url").is_err());
    }

    #[test]
    fn test_resolve_location() {
        let base = feed_base("http://example.com/os").unwrap();
        assert_eq!(
            resolve_location(&base, "repodata/abc-primary.xml.gz")
                .unwrap()
                .as_str(),
            "http://example.com/os/repodata/abc-primary.xml.gz"
        );
    }
}
